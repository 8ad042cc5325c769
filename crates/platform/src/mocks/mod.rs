//! Mock implementations for testing
//!
//! Scripted / recording doubles for every platform trait, used by unit and
//! integration tests across the workspace. All doubles record their calls
//! for assertion (and the scripted ones replay canned responses), so a test
//! can verify the exact opcode traffic a component produced.
//!
//! Available on host builds only (the `mock` feature implies `std`).

#![cfg(any(test, feature = "std"))]

use std::collections::VecDeque;
use std::vec::Vec;

use crate::identity::{
    serial_is_blank, BootControl, DeviceIdentity, IdentityError, RailMonitor, SERIAL_LEN,
};
use crate::peripheral::{AfeSpi, ChipSelect, ControlLines, CsMask, LinePort};

/// Scripted SPI bus: replays canned MISO bytes and records all MOSI traffic.
#[derive(Default)]
pub struct ScriptedSpi {
    replies: VecDeque<u8>,
    /// Every byte clocked out by the driver, in order.
    pub sent: Vec<u8>,
}

impl ScriptedSpi {
    /// Create a bus with an empty script; unscripted transfers read `0x00`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append canned reply bytes to the script.
    pub fn script(&mut self, bytes: &[u8]) {
        self.replies.extend(bytes.iter().copied());
    }

    /// Discard the recorded MOSI trace.
    pub fn clear_trace(&mut self) {
        self.sent.clear();
    }
}

impl AfeSpi for ScriptedSpi {
    type Error = core::convert::Infallible;

    fn xfer(&mut self, byte: u8) -> Result<u8, Self::Error> {
        self.sent.push(byte);
        Ok(self.replies.pop_front().unwrap_or(0x00))
    }
}

/// One chip-select event recorded by [`RecordingChipSelect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsEvent {
    /// `select` with the given raw mask bits.
    Select(u8),
    /// `release`.
    Release,
}

/// Chip-select recorder.
#[derive(Default)]
pub struct RecordingChipSelect {
    /// Every select/release call, in order.
    pub events: Vec<CsEvent>,
}

impl RecordingChipSelect {
    /// Create a recorder with no events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `select` events recorded.
    #[must_use]
    pub fn select_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CsEvent::Select(_)))
            .count()
    }
}

impl ChipSelect for RecordingChipSelect {
    type Error = core::convert::Infallible;

    fn select(&mut self, mask: CsMask) -> Result<(), Self::Error> {
        self.events.push(CsEvent::Select(mask.bits()));
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.events.push(CsEvent::Release);
        Ok(())
    }
}

/// A control line named in a [`RecordingControlLines`] trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLine {
    /// Shared RESET pin.
    Reset,
    /// Shared PWDN pin.
    PowerDown,
    /// Shared START pin.
    Start,
}

/// Control-line recorder.
#[derive(Default)]
pub struct RecordingControlLines {
    /// Every pin transition, in order.
    pub trace: Vec<(ControlLine, bool)>,
}

impl RecordingControlLines {
    /// Create a recorder with no transitions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ControlLines for RecordingControlLines {
    type Error = core::convert::Infallible;

    fn set_reset(&mut self, high: bool) -> Result<(), Self::Error> {
        self.trace.push((ControlLine::Reset, high));
        Ok(())
    }

    fn set_power_down(&mut self, high: bool) -> Result<(), Self::Error> {
        self.trace.push((ControlLine::PowerDown, high));
        Ok(())
    }

    fn set_start(&mut self, high: bool) -> Result<(), Self::Error> {
        self.trace.push((ControlLine::Start, high));
        Ok(())
    }
}

/// Scripted serial port: canned receive bytes, recorded transmit bytes.
#[derive(Default)]
pub struct ScriptedPort {
    rx: VecDeque<u8>,
    /// Every transmitted byte, in order.
    pub tx: Vec<u8>,
}

impl ScriptedPort {
    /// Create an idle port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes for reception.
    pub fn queue(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Queue an ASCII line for reception (no terminator appended).
    pub fn queue_str(&mut self, s: &str) {
        self.queue(s.as_bytes());
    }

    /// The transmit trace as a lossy string, for transcript assertions.
    #[must_use]
    pub fn tx_string(&self) -> std::string::String {
        std::string::String::from_utf8_lossy(&self.tx).into_owned()
    }

    /// Discard the transmit trace.
    pub fn clear_tx(&mut self) {
        self.tx.clear();
    }
}

impl LinePort for ScriptedPort {
    type Error = core::convert::Infallible;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.tx.extend_from_slice(bytes);
        Ok(())
    }

    fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        Ok(self.rx.pop_front())
    }
}

/// `DelayNs` double that returns immediately.
#[derive(Default)]
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Identity store double with program-once semantics.
pub struct FixedIdentity {
    serial: [u8; SERIAL_LEN],
    straps: u8,
    /// Number of `enter_bootloader` calls observed.
    pub bootloader_calls: usize,
}

impl FixedIdentity {
    /// Create a blank (unprogrammed) identity with the given strap bits.
    #[must_use]
    pub fn blank(straps: u8) -> Self {
        Self {
            serial: [0xFF; SERIAL_LEN],
            straps,
            bootloader_calls: 0,
        }
    }

    /// Create an identity pre-programmed with `serial`.
    #[must_use]
    pub fn programmed(serial: &str, straps: u8) -> Self {
        let mut this = Self::blank(straps);
        let n = serial.len().min(SERIAL_LEN);
        this.serial = [0u8; SERIAL_LEN];
        this.serial[..n].copy_from_slice(&serial.as_bytes()[..n]);
        this
    }
}

impl DeviceIdentity for FixedIdentity {
    fn read_serial(&mut self, out: &mut [u8; SERIAL_LEN]) {
        *out = self.serial;
    }

    fn program_serial(&mut self, serial: &[u8]) -> Result<(), IdentityError> {
        if serial.len() > SERIAL_LEN {
            return Err(IdentityError::TooLong);
        }
        if !serial_is_blank(&self.serial) {
            return Err(IdentityError::AlreadyProgrammed);
        }
        self.serial = [0u8; SERIAL_LEN];
        self.serial[..serial.len()].copy_from_slice(serial);
        Ok(())
    }

    fn revision_straps(&mut self) -> u8 {
        self.straps
    }
}

impl BootControl for FixedIdentity {
    fn enter_bootloader(&mut self) {
        self.bootloader_calls += 1;
    }
}

/// Rail monitor double returning fixed readings.
pub struct FixedRails {
    /// Readings as (vsys, 3v3, 2v5p, 2v5n) millivolts.
    pub mv: (i32, i32, i32, i32),
}

impl FixedRails {
    /// Nominal healthy rails.
    #[must_use]
    pub fn nominal() -> Self {
        Self {
            mv: (4960, 3300, 2500, -2500),
        }
    }
}

impl RailMonitor for FixedRails {
    fn vsys_mv(&mut self) -> i32 {
        self.mv.0
    }

    fn rail_3v3_mv(&mut self) -> i32 {
        self.mv.1
    }

    fn rail_2v5p_mv(&mut self) -> i32 {
        self.mv.2
    }

    fn rail_2v5n_mv(&mut self) -> i32 {
        self.mv.3
    }
}
