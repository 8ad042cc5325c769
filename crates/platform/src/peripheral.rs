//! Peripheral abstraction layer
//!
//! Trait-based abstractions for the hardware touchpoints of the acquisition
//! core: the shared AFE SPI bus, the four chip-select lines, the AFE control
//! pins, and the byte-oriented host serial links.
//!
//! All traits are *blocking*: a transfer call returns only when the bus has
//! clocked the byte, and a port write returns only when the transmitter has
//! accepted every byte. A stuck peripheral therefore stalls the firmware —
//! this is the accepted fail-stop contract of the hardware-wait loops, so no
//! timeout plumbing exists at this layer.

use embedded_hal::digital::OutputPin;

/// Bit mask addressing one or more of the four AFE chips.
///
/// Bit `n` selects chip `n`. Register transactions use a single-chip mask;
/// conversion-control opcodes (START, STOP, SDATAC, RESET) are usually
/// broadcast with [`CsMask::all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CsMask(u8);

impl CsMask {
    /// Mask selecting no chip.
    pub const NONE: CsMask = CsMask(0);

    /// Select a single chip by index (0..=3).
    #[must_use]
    pub const fn single(chip: usize) -> CsMask {
        CsMask(1 << (chip & 0x03))
    }

    /// Select every chip on the bus.
    #[must_use]
    pub const fn all() -> CsMask {
        CsMask(0x0F)
    }

    /// Build a mask from raw bits (bits above the four chips are ignored).
    #[must_use]
    pub const fn from_bits(bits: u8) -> CsMask {
        CsMask(bits & 0x0F)
    }

    /// Raw mask bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` when the mask includes `chip`.
    #[must_use]
    pub const fn contains(self, chip: usize) -> bool {
        self.0 & (1 << (chip & 0x03)) != 0
    }
}

/// One full-duplex byte transfer on the shared AFE SPI bus.
///
/// Implementations must not touch chip-select lines; selection is managed by
/// the caller through [`ChipSelect`] so that multi-byte transactions stay
/// framed under one assertion.
pub trait AfeSpi {
    /// Bus error type.
    type Error: core::fmt::Debug;

    /// Clock one byte out while clocking one byte in, blocking until the
    /// transfer completes.
    fn xfer(&mut self, byte: u8) -> Result<u8, Self::Error>;
}

/// Chip-select multiplexing across the four AFE chips.
///
/// `select` asserts (drives low) every line in the mask; `release` deasserts
/// all four lines. Exactly one `select`/`release` pair frames each bus
/// transaction.
pub trait ChipSelect {
    /// Pin error type.
    type Error: core::fmt::Debug;

    /// Assert every chip-select line in `mask`.
    fn select(&mut self, mask: CsMask) -> Result<(), Self::Error>;

    /// Deassert all chip-select lines.
    fn release(&mut self) -> Result<(), Self::Error>;
}

/// The AFE RESET / PWDN / START control pins.
///
/// `true` drives the pin high (inactive for the active-low RESET and PWDN).
pub trait ControlLines {
    /// Pin error type.
    type Error: core::fmt::Debug;

    /// Drive the shared RESET line.
    fn set_reset(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Drive the shared PWDN line.
    fn set_power_down(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Drive the shared START line.
    fn set_start(&mut self, high: bool) -> Result<(), Self::Error>;
}

/// Byte-oriented host serial link (UART or radio modem).
///
/// `write_all` blocks until the transmitter has accepted every byte;
/// `poll_byte` never blocks and returns `None` when no byte is pending.
pub trait LinePort {
    /// Port error type.
    type Error: core::fmt::Debug;

    /// Transmit `bytes`, spinning until the transmitter accepts them all.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Fetch the next received byte, if any.
    fn poll_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

/// [`ChipSelect`] over four `embedded-hal` output pins (active-low).
pub struct GpioChipSelect<P> {
    pins: [P; 4],
}

impl<P: OutputPin> GpioChipSelect<P> {
    /// Wrap four chip-select pins, releasing (driving high) all of them.
    pub fn new(mut pins: [P; 4]) -> Result<Self, P::Error> {
        for pin in &mut pins {
            pin.set_high()?;
        }
        Ok(Self { pins })
    }
}

impl<P: OutputPin> ChipSelect for GpioChipSelect<P> {
    type Error = P::Error;

    fn select(&mut self, mask: CsMask) -> Result<(), Self::Error> {
        for (chip, pin) in self.pins.iter_mut().enumerate() {
            if mask.contains(chip) {
                pin.set_low()?;
            }
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        for pin in &mut self.pins {
            pin.set_high()?;
        }
        Ok(())
    }
}

/// [`ControlLines`] over three `embedded-hal` output pins.
pub struct GpioControlLines<P> {
    reset: P,
    power_down: P,
    start: P,
}

impl<P: OutputPin> GpioControlLines<P> {
    /// Wrap the RESET, PWDN and START pins.
    pub fn new(reset: P, power_down: P, start: P) -> Self {
        Self {
            reset,
            power_down,
            start,
        }
    }
}

impl<P: OutputPin> ControlLines for GpioControlLines<P> {
    type Error = P::Error;

    fn set_reset(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.reset.set_high()
        } else {
            self.reset.set_low()
        }
    }

    fn set_power_down(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.power_down.set_high()
        } else {
            self.power_down.set_low()
        }
    }

    fn set_start(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.start.set_high()
        } else {
            self.start.set_low()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_masks_are_one_hot() {
        assert_eq!(CsMask::single(0).bits(), 0x01);
        assert_eq!(CsMask::single(1).bits(), 0x02);
        assert_eq!(CsMask::single(2).bits(), 0x04);
        assert_eq!(CsMask::single(3).bits(), 0x08);
    }

    #[test]
    fn all_mask_covers_four_chips() {
        let all = CsMask::all();
        assert_eq!(all.bits(), 0x0F);
        for chip in 0..4 {
            assert!(all.contains(chip));
        }
    }

    #[test]
    fn contains_matches_single() {
        assert!(CsMask::single(2).contains(2));
        assert!(!CsMask::single(2).contains(1));
    }

    #[derive(Default)]
    struct MockPin {
        state: bool,
        transitions: usize,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.state = false;
            self.transitions += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.state = true;
            self.transitions += 1;
            Ok(())
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn gpio_chip_select_asserts_only_masked_lines() {
        let mut cs = GpioChipSelect::new([
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
        ])
        .unwrap();
        cs.select(CsMask::single(2)).unwrap();
        assert!(cs.pins[0].state);
        assert!(cs.pins[1].state);
        assert!(!cs.pins[2].state);
        assert!(cs.pins[3].state);
        cs.release().unwrap();
        assert!(cs.pins.iter().all(|p| p.state));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn gpio_control_lines_drive_the_right_pins() {
        let mut lines =
            GpioControlLines::new(MockPin::default(), MockPin::default(), MockPin::default());
        lines.set_reset(false).unwrap();
        lines.set_start(true).unwrap();
        assert!(!lines.reset.state);
        assert!(lines.start.state);
    }
}
