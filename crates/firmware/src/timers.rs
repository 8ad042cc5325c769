//! The device's named countdown bank.
//!
//! One `Countdown` per timeout consumer, grouped so the periodic timer
//! interrupt can decrement them all in one place. This is the entire ISR
//! workload: everything else in the firmware only *reads* expiry state.

use platform::timer::Countdown;

/// Every software countdown in the device.
pub struct DeviceTimers {
    /// Inter-byte idle timeout of the binary frame receiver.
    pub serial_rx: Countdown,
    /// Radio-link negotiation timeout.
    pub link: Countdown,
    /// Busy-wait delay used by the reset sequence on hardware.
    pub delay: Countdown,
    /// Simulated-acquisition pacing.
    pub sim: Countdown,
}

impl DeviceTimers {
    /// Create the bank with every countdown expired.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            serial_rx: Countdown::new(),
            link: Countdown::new(),
            delay: Countdown::new(),
            sim: Countdown::new(),
        }
    }

    /// One timer tick: decrement every countdown, saturating at zero.
    ///
    /// This is the periodic timer ISR body.
    pub fn tick_all(&self) {
        self.serial_rx.tick();
        self.link.tick();
        self.delay.tick();
        self.sim.tick();
    }
}

impl Default for DeviceTimers {
    fn default() -> Self {
        Self::new()
    }
}
