//! Register bus driver for the four-chip AFE bank.
//!
//! Drives the shared SPI bus with chip-select multiplexing: every
//! transaction is framed by one `select`/`release` pair, and the exact
//! opcode sequences (command byte, burst count, data bytes) are the contract
//! — scripted-bus tests assert them byte for byte.
//!
//! There is no write-verify step: a failed register write goes undetected
//! until the next full read resynchronizes the shadow image.

use embedded_hal::delay::DelayNs;
use platform::ads1299::{
    OP_RDATA, OP_RESET, OP_RREG, OP_SDATAC, OP_START, OP_STOP, OP_WREG, RESET_CONFIG1,
    RESET_CONFIG2, RESET_CONFIG3, RESET_LOFF, REG_CONFIG1, REG_CONFIG2, REG_CONFIG3, REG_LOFF,
};
use platform::config::{AFE_COUNT, CHANNELS_PER_AFE, REGISTER_COUNT, REGS_PER_AFE};
use platform::peripheral::{AfeSpi, ChipSelect, ControlLines, CsMask};
use thiserror_no_std::Error;

use crate::regs::RegisterImage;

/// Settle time between the steps of the power-on reset sequence, in
/// milliseconds.
const RESET_STEP_MS: u32 = 500;

/// Errors from bus transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError<SE, CE> {
    /// The SPI transfer failed.
    #[error("spi transfer failed")]
    Spi(SE),
    /// A chip-select line could not be driven.
    #[error("chip select failed")]
    ChipSelect(CE),
}

/// Errors from the reset-and-reinitialize sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResetError<SE, CE, LE> {
    /// A bus transaction inside the sequence failed.
    #[error("bus transaction failed")]
    Bus(BusError<SE, CE>),
    /// A control pin could not be driven.
    #[error("control line failed")]
    Control(LE),
}

/// The bus driver: SPI transfers plus chip-select framing.
pub struct AfeBus<S, C> {
    spi: S,
    cs: C,
    converting: bool,
}

impl<S: AfeSpi, C: ChipSelect> AfeBus<S, C> {
    /// Wrap a SPI bus and chip-select block.
    pub fn new(spi: S, cs: C) -> Self {
        Self {
            spi,
            cs,
            converting: false,
        }
    }

    /// `true` while conversions are running (START issued, STOP not yet).
    #[must_use]
    pub const fn converting(&self) -> bool {
        self.converting
    }

    /// Direct access to the underlying SPI transport (bring-up and scripted
    /// tests).
    pub fn transport_mut(&mut self) -> &mut S {
        &mut self.spi
    }

    /// Release the underlying bus resources.
    pub fn free(self) -> (S, C) {
        (self.spi, self.cs)
    }

    fn xfer(&mut self, byte: u8) -> Result<u8, BusError<S::Error, C::Error>> {
        self.spi.xfer(byte).map_err(BusError::Spi)
    }

    fn select(&mut self, mask: CsMask) -> Result<(), BusError<S::Error, C::Error>> {
        self.cs.select(mask).map_err(BusError::ChipSelect)
    }

    fn release(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        self.cs.release().map_err(BusError::ChipSelect)
    }

    /// Read one register from the chip(s) in `mask`.
    ///
    /// Sequence: `RREG|offset`, burst count 0, one data byte. With a
    /// multi-chip mask the returned byte is whatever the bus resolves the
    /// contention to — callers use single-chip masks for meaningful reads.
    pub fn read_register(
        &mut self,
        offset: u8,
        mask: CsMask,
    ) -> Result<u8, BusError<S::Error, C::Error>> {
        self.select(mask)?;
        self.xfer(OP_RREG | (offset & 0x1F))?;
        self.xfer(0)?;
        let value = self.xfer(0)?;
        self.release()?;
        Ok(value)
    }

    /// Write one register on the chip(s) in `mask`.
    ///
    /// Sequence: `WREG|offset`, burst count 0, the data byte.
    pub fn write_register(
        &mut self,
        offset: u8,
        value: u8,
        mask: CsMask,
    ) -> Result<(), BusError<S::Error, C::Error>> {
        self.select(mask)?;
        self.xfer(OP_WREG | (offset & 0x1F))?;
        self.xfer(0)?;
        self.xfer(value)?;
        self.release()?;
        Ok(())
    }

    /// Burst-read the full register block of every chip into `image`.
    ///
    /// One chip-select assertion per chip: `RREG` at offset 0, burst count
    /// 23, then all 24 register bytes. Both shadow and pending adopt the
    /// values read, resynchronizing the firmware after any external reset.
    pub fn read_all(
        &mut self,
        image: &mut RegisterImage,
    ) -> Result<(), BusError<S::Error, C::Error>> {
        for chip in 0..AFE_COUNT {
            self.select(CsMask::single(chip))?;
            self.xfer(OP_RREG)?;
            #[allow(clippy::cast_possible_truncation)] // Safety: REGS_PER_AFE - 1 == 23
            self.xfer((REGS_PER_AFE - 1) as u8)?;
            for reg in 0..REGS_PER_AFE {
                let value = self.xfer(0)?;
                // Index is in range by construction; adopt cannot fail.
                #[allow(clippy::arithmetic_side_effects)] // Safety: < REGISTER_COUNT
                let index = chip * REGS_PER_AFE + reg;
                let _ = image.adopt_readback(index, value);
            }
            self.release()?;
        }
        Ok(())
    }

    /// Write every pending register that differs from shadow.
    ///
    /// The forced-bit policy is enforced over the whole pending image first,
    /// then each differing register is written with a single-register WREG
    /// addressed at its own chip only; unchanged registers cost no bus
    /// traffic. Clears the changes-pending flag on completion.
    pub fn apply_pending(
        &mut self,
        image: &mut RegisterImage,
    ) -> Result<(), BusError<S::Error, C::Error>> {
        image.apply_policy();
        for index in 0..REGISTER_COUNT {
            if image.differs(index) {
                #[allow(clippy::cast_possible_truncation)] // Safety: offset < 24
                let offset = (index % REGS_PER_AFE) as u8;
                let chip = index / REGS_PER_AFE;
                let value = image.pending(index).unwrap_or(0);
                self.write_register(offset, value, CsMask::single(chip))?;
                image.commit(index);
            }
        }
        image.mark_clean();
        Ok(())
    }

    /// Broadcast SDATAC, leaving every chip in register-access mode.
    pub fn stop_continuous(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        self.command(OP_SDATAC, CsMask::all())
    }

    /// Broadcast START and begin conversions.
    pub fn start_conversions(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        self.command(OP_START, CsMask::all())?;
        self.converting = true;
        Ok(())
    }

    /// Broadcast STOP and halt conversions.
    pub fn stop_conversions(&mut self) -> Result<(), BusError<S::Error, C::Error>> {
        self.command(OP_STOP, CsMask::all())?;
        self.converting = false;
        Ok(())
    }

    /// Issue the RESET opcode to the chip(s) in `mask`.
    pub fn send_reset(&mut self, mask: CsMask) -> Result<(), BusError<S::Error, C::Error>> {
        self.command(OP_RESET, mask)
    }

    fn command(&mut self, opcode: u8, mask: CsMask) -> Result<(), BusError<S::Error, C::Error>> {
        self.select(mask)?;
        self.xfer(opcode)?;
        self.release()?;
        Ok(())
    }

    /// Read one conversion frame from `chip`: the 24-bit status word and
    /// eight sign-extended channel codes.
    ///
    /// Sequence: `RDATA`, 3 status bytes, then 8 × 3 channel bytes. Each
    /// 24-bit channel code is widened by shifting into the top of an `i32`
    /// and arithmetic-shifting back down 8 bits.
    pub fn read_data_frame(
        &mut self,
        chip: usize,
    ) -> Result<(u32, [i32; CHANNELS_PER_AFE]), BusError<S::Error, C::Error>> {
        self.select(CsMask::single(chip))?;
        self.xfer(OP_RDATA)?;

        let mut status: u32 = 0;
        for _ in 0..3 {
            status = (status << 8) | u32::from(self.xfer(0)?);
        }

        let mut channels = [0i32; CHANNELS_PER_AFE];
        for slot in &mut channels {
            let b0 = u32::from(self.xfer(0)?);
            let b1 = u32::from(self.xfer(0)?);
            let b2 = u32::from(self.xfer(0)?);
            #[allow(clippy::cast_possible_wrap)] // Safety: the wrap is the sign extension
            let wide = ((b0 << 24) | (b1 << 16) | (b2 << 8)) as i32;
            *slot = wide >> 8;
        }

        self.release()?;
        Ok((status, channels))
    }

    /// Hardware reset and reinitialization of the whole AFE bank.
    ///
    /// Drives the shared RESET/PWDN/START pins through the power-on dance
    /// with settle delays, stops continuous-read mode, then broadcasts the
    /// power-up register values (CONFIG1..3, LOFF).
    pub fn reset_sequence<L: ControlLines, D: DelayNs>(
        &mut self,
        lines: &mut L,
        delay: &mut D,
    ) -> Result<(), ResetError<S::Error, C::Error, L::Error>> {
        delay.delay_ms(RESET_STEP_MS);
        lines.set_reset(false).map_err(ResetError::Control)?;
        lines.set_power_down(false).map_err(ResetError::Control)?;
        lines.set_start(false).map_err(ResetError::Control)?;
        delay.delay_ms(RESET_STEP_MS);
        lines.set_reset(true).map_err(ResetError::Control)?;
        lines.set_power_down(true).map_err(ResetError::Control)?;
        delay.delay_ms(RESET_STEP_MS);
        lines.set_reset(false).map_err(ResetError::Control)?;
        delay.delay_ms(RESET_STEP_MS);
        lines.set_reset(true).map_err(ResetError::Control)?;
        delay.delay_ms(RESET_STEP_MS);

        self.stop_continuous().map_err(ResetError::Bus)?;
        self.write_register(REG_CONFIG1, RESET_CONFIG1, CsMask::all())
            .map_err(ResetError::Bus)?;
        self.write_register(REG_CONFIG2, RESET_CONFIG2, CsMask::all())
            .map_err(ResetError::Bus)?;
        self.write_register(REG_CONFIG3, RESET_CONFIG3, CsMask::all())
            .map_err(ResetError::Bus)?;
        self.write_register(REG_LOFF, RESET_LOFF, CsMask::all())
            .map_err(ResetError::Bus)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests use unwrap() for readable assertions
mod tests {
    use super::*;
    use platform::mocks::{
        CsEvent, NoDelay, RecordingChipSelect, RecordingControlLines, ScriptedSpi,
    };

    fn bus() -> AfeBus<ScriptedSpi, RecordingChipSelect> {
        AfeBus::new(ScriptedSpi::new(), RecordingChipSelect::new())
    }

    #[test]
    fn write_register_opcode_sequence() {
        let mut bus = bus();
        bus.write_register(0x05, 0x60, CsMask::single(2)).unwrap();
        assert_eq!(bus.spi.sent, vec![OP_WREG | 0x05, 0x00, 0x60]);
        assert_eq!(
            bus.cs.events,
            vec![CsEvent::Select(0x04), CsEvent::Release]
        );
    }

    #[test]
    fn read_register_returns_third_byte() {
        let mut bus = bus();
        bus.spi.script(&[0x00, 0x00, 0x3E]);
        let value = bus.read_register(0x01, CsMask::single(0)).unwrap();
        assert_eq!(value, 0x3E);
        assert_eq!(bus.spi.sent, vec![OP_RREG | 0x01, 0x00, 0x00]);
    }

    #[test]
    fn read_all_burst_reads_each_chip_once() {
        let mut bus = bus();
        // Chip c register r reads back as c*24 + r.
        for chip in 0u8..4 {
            bus.spi.script(&[0x00, 0x00]); // opcode + count replies
            for reg in 0u8..24 {
                bus.spi.script(&[chip * 24 + reg]);
            }
        }
        let mut image = RegisterImage::new();
        bus.read_all(&mut image).unwrap();

        assert_eq!(bus.cs.select_count(), 4, "one assertion per chip");
        assert_eq!(image.shadow(0), Some(0));
        assert_eq!(image.shadow(25), Some(25));
        assert_eq!(image.shadow(95), Some(95));
        // Pending resynchronized too.
        assert_eq!(image.pending(95), Some(95));
        // Each chip's transaction: RREG, burst count 23, 24 dummy bytes.
        assert_eq!(bus.spi.sent.len(), 4 * 26);
        assert_eq!(bus.spi.sent[0], OP_RREG);
        assert_eq!(bus.spi.sent[1], 23);
    }

    #[test]
    fn apply_pending_writes_only_differences() {
        let mut bus = bus();
        let mut image = RegisterImage::new();
        // Resynchronize so the zeroed startup state already satisfies the
        // forced-bit policy and only our change is a diff.
        for index in 0..REGISTER_COUNT {
            #[allow(clippy::cast_possible_truncation)]
            let offset = (index % REGS_PER_AFE) as u8;
            image
                .adopt_readback(index, platform::ads1299::constrain(offset, 0))
                .unwrap();
        }
        image.set_pending(0x18 + 0x05, 0x60).unwrap(); // chip 1 CH1SET
        bus.apply_pending(&mut image).unwrap();

        assert_eq!(bus.spi.sent, vec![OP_WREG | 0x05, 0x00, 0x60]);
        assert_eq!(
            bus.cs.events,
            vec![CsEvent::Select(0x02), CsEvent::Release]
        );
        assert!(!image.is_dirty());
        assert_eq!(image.shadow(0x18 + 0x05), Some(0x60));

        // A second apply has nothing left to write.
        bus.spi.clear_trace();
        bus.apply_pending(&mut image).unwrap();
        assert!(bus.spi.sent.is_empty());
    }

    #[test]
    fn conversion_control_is_broadcast() {
        let mut bus = bus();
        bus.start_conversions().unwrap();
        assert!(bus.converting());
        assert_eq!(bus.spi.sent, vec![OP_START]);
        assert_eq!(bus.cs.events, vec![CsEvent::Select(0x0F), CsEvent::Release]);

        bus.stop_conversions().unwrap();
        assert!(!bus.converting());
        assert_eq!(bus.spi.sent[1], OP_STOP);
    }

    #[test]
    fn data_frame_sign_extends_channel_codes() {
        let mut bus = bus();
        let mut script = vec![0x00]; // RDATA opcode reply
        script.extend_from_slice(&[0xC0, 0x00, 0x01]); // status word
        script.extend_from_slice(&[0xFF, 0xFF, 0xFF]); // ch1 = -1
        script.extend_from_slice(&[0x80, 0x00, 0x00]); // ch2 = -2^23
        script.extend_from_slice(&[0x7F, 0xFF, 0xFF]); // ch3 = 2^23 - 1
        script.extend_from_slice(&[0x00, 0x00, 0x2A]); // ch4 = 42
        script.extend_from_slice(&[0; 12]); // ch5..ch8 = 0
        bus.spi.script(&script);

        let (status, channels) = bus.read_data_frame(1).unwrap();
        assert_eq!(status, 0x00C0_0001);
        assert_eq!(channels[0], -1);
        assert_eq!(channels[1], -(1 << 23));
        assert_eq!(channels[2], (1 << 23) - 1);
        assert_eq!(channels[3], 42);
        assert_eq!(bus.spi.sent[0], OP_RDATA);
        assert_eq!(bus.spi.sent.len(), 1 + 3 + 24);
        assert_eq!(bus.cs.events, vec![CsEvent::Select(0x02), CsEvent::Release]);
    }

    #[test]
    fn reset_sequence_pin_dance_and_reinit() {
        use platform::mocks::ControlLine::{PowerDown, Reset, Start};

        let mut bus = bus();
        let mut lines = RecordingControlLines::new();
        bus.reset_sequence(&mut lines, &mut NoDelay).unwrap();

        assert_eq!(
            lines.trace,
            vec![
                (Reset, false),
                (PowerDown, false),
                (Start, false),
                (Reset, true),
                (PowerDown, true),
                (Reset, false),
                (Reset, true),
            ]
        );
        // SDATAC then the four power-up register writes, all broadcast.
        assert_eq!(bus.spi.sent[0], OP_SDATAC);
        assert_eq!(bus.spi.sent[1], OP_WREG | REG_CONFIG1);
        assert_eq!(bus.spi.sent[3], RESET_CONFIG1);
        assert_eq!(bus.spi.sent[4], OP_WREG | REG_CONFIG2);
        assert_eq!(bus.spi.sent[10], OP_WREG | REG_LOFF);
        assert!(bus
            .cs
            .events
            .iter()
            .filter(|e| matches!(e, CsEvent::Select(m) if *m == 0x0F))
            .count()
            >= 5);
    }
}
