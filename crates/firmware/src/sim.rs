//! Simulated acquisition for bench and host runs.
//!
//! Produces one ramp-pattern record every [`SIM_RATE`] ticks instead of
//! touching the SPI bus, letting the host protocols be exercised with no
//! AFE hardware attached.

use afe::{Acquisition, SampleRecord};
use platform::peripheral::{AfeSpi, ChipSelect};
use platform::timer::Countdown;

/// Ticks between simulated records.
pub const SIM_RATE: u16 = 4;

/// Rate-limited ramp-pattern sample generator.
pub struct SampleSimulator {
    _private: (),
}

impl SampleSimulator {
    /// Create a simulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Produce one record when the pacing countdown has run out.
    ///
    /// Channel `x` carries the 24-bit-masked ramp value `x - 10`, a fixed
    /// recognizable pattern for host-side plumbing checks.
    pub fn poll<S: AfeSpi, C: ChipSelect>(
        &mut self,
        pace: &Countdown,
        engine: &mut Acquisition<S, C>,
    ) {
        if !pace.is_expired() {
            return;
        }
        pace.start(SIM_RATE);

        let mut record = SampleRecord::EMPTY;
        for (x, slot) in record.channels.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_wrap)] // Safety: x < 32
            {
                *slot = (x as i32 - 10) & 0x00FF_FFFF;
            }
        }
        engine.push_simulated(record);
    }
}

impl Default for SampleSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests use unwrap() for readable assertions
mod tests {
    use super::*;
    use afe::AfeBus;
    use platform::mocks::{RecordingChipSelect, ScriptedSpi};

    #[test]
    fn simulator_paces_itself_with_the_countdown() {
        let pace = Countdown::new();
        let mut sim = SampleSimulator::new();
        let mut engine = Acquisition::new(AfeBus::new(
            ScriptedSpi::new(),
            RecordingChipSelect::new(),
        ));

        // Expired countdown: produce and re-arm.
        sim.poll(&pace, &mut engine);
        assert_eq!(engine.store().backlog(), 1);
        assert_eq!(pace.remaining(), SIM_RATE);

        // Not yet expired: no new record.
        sim.poll(&pace, &mut engine);
        assert_eq!(engine.store().backlog(), 1);

        for _ in 0..SIM_RATE {
            pace.tick();
        }
        sim.poll(&pace, &mut engine);
        assert_eq!(engine.store().backlog(), 2);
    }

    #[test]
    fn ramp_pattern_is_masked_to_24_bits() {
        let pace = Countdown::new();
        let mut sim = SampleSimulator::new();
        let mut engine = Acquisition::new(AfeBus::new(
            ScriptedSpi::new(),
            RecordingChipSelect::new(),
        ));
        sim.poll(&pace, &mut engine);

        // Channel 1 carries -10 masked into the positive 24-bit range.
        assert_eq!(
            engine.latest_channel_value(1).unwrap(),
            (-10i32) & 0x00FF_FFFF
        );
        assert_eq!(engine.latest_channel_value(11).unwrap(), 0);
        assert_eq!(engine.latest_channel_value(32).unwrap(), 21);
    }
}
