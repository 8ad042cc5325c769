//! Sample acquisition engine.
//!
//! `Acquisition` owns the bus driver, the register image and the sample
//! store, and is the single entry point the host protocols go through for
//! register and channel operations. One `acquire_cycle` call drains one full
//! 32-channel sample set; pending register changes are flushed at the head
//! of the cycle so configuration updates always land on a cycle boundary,
//! never mid-conversion.

use embedded_hal::delay::DelayNs;
use platform::config::{AFE_COUNT, CHANNELS_PER_AFE, SAMPLE_RING_CAPACITY};
use platform::peripheral::{AfeSpi, ChipSelect, ControlLines, CsMask};

use crate::bus::{AfeBus, BusError, ResetError};
use crate::regs::{RegError, RegisterImage};
use crate::store::{SampleRecord, SampleRing};

/// ADC reference voltage, in volts.
const VREF_VOLTS: f64 = 9.0;
/// Full-scale divisor of the 24-bit converter.
const FULL_SCALE: f64 = 16_777_216.0; // 2^24

/// The acquisition engine and its owned components.
pub struct Acquisition<S, C> {
    bus: AfeBus<S, C>,
    image: RegisterImage,
    store: SampleRing<SAMPLE_RING_CAPACITY>,
}

impl<S: AfeSpi, C: ChipSelect> Acquisition<S, C> {
    /// Build the engine around a bus driver.
    pub fn new(bus: AfeBus<S, C>) -> Self {
        Self {
            bus,
            image: RegisterImage::new(),
            store: SampleRing::new(),
        }
    }

    /// Run one acquisition cycle.
    ///
    /// Applies pending register changes first (if any), then drains one
    /// data frame from each chip into a fresh record and commits it to the
    /// sample store.
    pub fn acquire_cycle(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        if self.image.is_dirty() {
            self.bus.apply_pending(&mut self.image)?;
        }

        let mut record = SampleRecord::EMPTY;
        for chip in 0..AFE_COUNT {
            let (status, channels) = self.bus.read_data_frame(chip)?;
            #[allow(clippy::indexing_slicing)] // Safety: chip < AFE_COUNT
            {
                record.status[chip] = status;
            }
            for (i, code) in channels.iter().enumerate() {
                #[allow(clippy::indexing_slicing)]
                // Safety: chip * 8 + i < CHANNEL_COUNT by construction
                #[allow(clippy::arithmetic_side_effects)] // Safety: bounded by CHANNEL_COUNT
                {
                    record.channels[chip * CHANNELS_PER_AFE + i] = *code;
                }
            }
        }
        self.store.push(record);
        Ok(())
    }

    /// Most recent code of a 1-based channel.
    ///
    /// Before the first completed cycle this reads as 0, matching the
    /// zero-initialized store.
    pub fn latest_channel_value(&self, channel: usize) -> Result<i32, RegError> {
        if !(1..=platform::config::CHANNEL_COUNT).contains(&channel) {
            return Err(RegError::ChannelOutOfRange);
        }
        #[allow(clippy::indexing_slicing)] // Safety: channel validated above
        let value = self
            .store
            .latest()
            .map_or(0, |record| record.channels[channel - 1]);
        Ok(value)
    }

    /// Latest value of a 1-based channel converted to millivolts:
    /// `1000 · code · (VREF / gain) / 2²⁴`, using the channel's currently
    /// requested (pending) gain.
    pub fn channel_millivolts(&self, channel: usize) -> Result<f64, RegError> {
        let code = self.latest_channel_value(channel)?;
        let gain = self.image.gain(channel)?;
        Ok(1000.0 * f64::from(code) * (VREF_VOLTS / f64::from(gain)) / FULL_SCALE)
    }

    // ── Register operations (host-facing) ───────────────────────────────────

    /// Request a value for a device-wide register index; lands on the next
    /// apply cycle.
    pub fn set_register(&mut self, index: usize, value: u8) -> Result<(), RegError> {
        self.image.set_pending(index, value)
    }

    /// Copy a host register payload over the pending image.
    pub fn load_register_payload(&mut self, payload: &[u8]) {
        self.image.load_payload(payload);
    }

    /// Full register read of every chip, resynchronizing shadow and pending.
    pub fn read_all_registers(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        self.bus.read_all(&mut self.image)
    }

    /// Shadow value of a device-wide register index.
    #[must_use]
    pub fn register_shadow(&self, index: usize) -> Option<u8> {
        self.image.shadow(index)
    }

    /// The full 96-byte shadow image.
    #[must_use]
    pub fn shadow_image(&self) -> &[u8; platform::config::REGISTER_COUNT] {
        self.image.shadow_image()
    }

    /// `true` while register changes await the next cycle boundary.
    #[must_use]
    pub fn changes_pending(&self) -> bool {
        self.image.is_dirty()
    }

    /// Set a 1-based channel's PGA gain (pending).
    pub fn set_gain(&mut self, channel: usize, gain: u8) -> Result<(), RegError> {
        self.image.set_gain(channel, gain)
    }

    /// A 1-based channel's requested PGA gain.
    pub fn gain(&self, channel: usize) -> Result<u8, RegError> {
        self.image.gain(channel)
    }

    /// Enable/disable a 1-based channel (pending, atomic logical update).
    pub fn set_channel_enabled(&mut self, channel: usize, enabled: bool) -> Result<(), RegError> {
        self.image.set_channel_enabled(channel, enabled)
    }

    /// Route all channels to the internal test signal (pending).
    pub fn enable_test_signal(&mut self) {
        self.image.enable_test_signal();
    }

    // ── Conversion control ──────────────────────────────────────────────────

    /// Broadcast START.
    pub fn start_conversions(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        self.bus.start_conversions()
    }

    /// Broadcast STOP.
    pub fn stop_conversions(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        self.bus.stop_conversions()
    }

    /// `true` while conversions are running.
    #[must_use]
    pub fn converting(&self) -> bool {
        self.bus.converting()
    }

    /// Full reset-and-restart: hardware reset sequence, restart conversions,
    /// then a full register read to resynchronize the images.
    pub fn reset_and_restart<L: ControlLines, D: DelayNs>(
        &mut self,
        lines: &mut L,
        delay: &mut D,
    ) -> Result<(), ResetError<S::Error, C::Error, L::Error>> {
        self.bus.reset_sequence(lines, delay)?;
        self.bus.start_conversions().map_err(ResetError::Bus)?;
        self.bus
            .read_all(&mut self.image)
            .map_err(ResetError::Bus)?;
        Ok(())
    }

    // ── Raw bus access (radio-link maintenance commands) ────────────────────

    /// Read one register directly, bypassing the image.
    pub fn read_register_raw(
        &mut self,
        offset: u8,
        mask: CsMask,
    ) -> Result<u8, BusError<S::Error, C::Error>> {
        self.bus.read_register(offset, mask)
    }

    /// Write one register directly, bypassing the image.
    ///
    /// The shadow goes stale until the next full read; maintenance use only.
    pub fn write_register_raw(
        &mut self,
        offset: u8,
        value: u8,
        mask: CsMask,
    ) -> Result<(), BusError<S::Error, C::Error>> {
        self.bus.write_register(offset, value, mask)
    }

    // ── Store access (telemetry / tests) ────────────────────────────────────

    /// The sample store, read-only.
    #[must_use]
    pub fn store(&self) -> &SampleRing<SAMPLE_RING_CAPACITY> {
        &self.store
    }

    /// The sample store, for the telemetry consumer.
    pub fn store_mut(&mut self) -> &mut SampleRing<SAMPLE_RING_CAPACITY> {
        &mut self.store
    }

    /// Push a record produced outside the bus path (simulated acquisition).
    pub fn push_simulated(&mut self, record: SampleRecord) {
        self.store.push(record);
    }

    /// The bus driver, for bring-up and scripted tests.
    pub fn bus_mut(&mut self) -> &mut AfeBus<S, C> {
        &mut self.bus
    }
}
