//! Boundary traits for device identity, diagnostics and boot hand-off.
//!
//! Serial-number storage, hardware-revision straps, the supply-rail ADC and
//! the vendor bootloader are external collaborators: the firmware core only
//! ever touches them through these traits, and the mechanics (flash IFR
//! records, ADC mux sequencing, vector-table hand-off) stay on the vendor
//! side of the seam.

use thiserror_no_std::Error;

/// Length of the stored serial number, in bytes.
pub const SERIAL_LEN: usize = 32;

/// Errors from serial-number storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdentityError {
    /// A serial number is already programmed; the store is program-once.
    #[error("serial number already programmed")]
    AlreadyProgrammed,
    /// The requested serial number exceeds [`SERIAL_LEN`] bytes.
    #[error("serial number too long")]
    TooLong,
    /// The storage operation itself failed.
    #[error("serial storage write failed")]
    WriteFailed,
}

/// Hardware revision, decoded from the board strap pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwRevision {
    /// Strap code 0xF.
    Rev3_0,
    /// Strap code 0xE.
    Rev3_1,
    /// Any other strap code.
    Unknown,
}

impl HwRevision {
    /// Decode the four revision strap bits.
    #[must_use]
    pub const fn from_straps(bits: u8) -> Self {
        match bits & 0x0F {
            0x0F => HwRevision::Rev3_0,
            0x0E => HwRevision::Rev3_1,
            _ => HwRevision::Unknown,
        }
    }

    /// Revision string as reported by the `ver` command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HwRevision::Rev3_0 => "3.0",
            HwRevision::Rev3_1 => "3.1",
            HwRevision::Unknown => "UNKNOWN",
        }
    }
}

/// Serial-number storage and revision straps.
pub trait DeviceIdentity {
    /// Copy the stored serial number into `out`.
    ///
    /// An unprogrammed store reads as all `0xFF`.
    fn read_serial(&mut self, out: &mut [u8; SERIAL_LEN]);

    /// Program the serial number.
    ///
    /// The store is program-once: fails with
    /// [`IdentityError::AlreadyProgrammed`] when a serial is present.
    fn program_serial(&mut self, serial: &[u8]) -> Result<(), IdentityError>;

    /// Read the raw hardware-revision strap bits.
    fn revision_straps(&mut self) -> u8;

    /// Decoded hardware revision.
    fn hardware_revision(&mut self) -> HwRevision {
        HwRevision::from_straps(self.revision_straps())
    }
}

/// Supply-rail diagnostics, in millivolts.
pub trait RailMonitor {
    /// System input rail.
    fn vsys_mv(&mut self) -> i32;

    /// +3.3 V digital rail.
    fn rail_3v3_mv(&mut self) -> i32;

    /// +2.5 V analog rail.
    fn rail_2v5p_mv(&mut self) -> i32;

    /// −2.5 V analog rail (negative reading).
    fn rail_2v5n_mv(&mut self) -> i32;
}

/// Hand-off to the resident vendor bootloader.
pub trait BootControl {
    /// Jump into the bootloader.
    ///
    /// On hardware this never returns: interrupts are disabled, the host
    /// ports are closed and execution continues in ROM. Host-side doubles
    /// record the call and return so tests stay runnable.
    fn enter_bootloader(&mut self);
}

/// `true` when a serial-number image is unprogrammed (leading `0xFF`).
#[must_use]
pub fn serial_is_blank(serial: &[u8; SERIAL_LEN]) -> bool {
    serial.first().copied() == Some(0xFF)
}
