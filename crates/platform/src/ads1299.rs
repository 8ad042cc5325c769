//! ADS1299 8-channel EEG AFE register addresses and constants.
//!
//! Reference: Texas Instruments ADS1299 datasheet (SBAS499C), Section 9.6
//! (Register Map) and Section 9.5.2 (SPI Command Definitions).
//!
//! Four ADS1299 chips share one SPI bus; each chip owns a dedicated
//! chip-select line and contributes 8 channels and 24 registers. Registers
//! are addressed device-wide as `chip_index * 24 + register_offset`.

use crate::config::REGS_PER_AFE;

// ── SPI opcodes (SBAS499C §9.5.2) ───────────────────────────────────────────

/// START: begin conversions.
pub const OP_START: u8 = 0x08;
/// STOP: halt conversions.
pub const OP_STOP: u8 = 0x0A;
/// RESET: reset the chip to default register values.
pub const OP_RESET: u8 = 0x06;
/// SDATAC: stop Read-Data-Continuous mode; required before register access.
pub const OP_SDATAC: u8 = 0x11;
/// RDATA: read one conversion result on demand.
pub const OP_RDATA: u8 = 0x12;
/// RREG: read register(s); OR the starting register offset into the opcode.
pub const OP_RREG: u8 = 0x20;
/// WREG: write register(s); OR the starting register offset into the opcode.
pub const OP_WREG: u8 = 0x40;

// ── Register offsets within one chip (SBAS499C §9.6) ────────────────────────

/// Register 0x00: chip ID (read-only in hardware).
pub const REG_ID: u8 = 0x00;
/// Register 0x01: CONFIG1 (daisy-chain, clock output, data rate).
pub const REG_CONFIG1: u8 = 0x01;
/// Register 0x02: CONFIG2 (test signal source, amplitude, frequency).
pub const REG_CONFIG2: u8 = 0x02;
/// Register 0x03: CONFIG3 (reference buffer, bias buffer and routing).
pub const REG_CONFIG3: u8 = 0x03;
/// Register 0x04: LOFF (lead-off comparator thresholds and current).
pub const REG_LOFF: u8 = 0x04;
/// Register 0x05: CH1SET; CH2SET..CH8SET follow at 0x06..=0x0C.
pub const REG_CH1SET: u8 = 0x05;
/// Register 0x0D: BIAS_SENSP (per-channel positive bias derivation).
pub const REG_BIAS_SENSP: u8 = 0x0D;
/// Register 0x0E: BIAS_SENSN (per-channel negative bias derivation).
pub const REG_BIAS_SENSN: u8 = 0x0E;
/// Register 0x0F: LOFF_SENSP.
pub const REG_LOFF_SENSP: u8 = 0x0F;
/// Register 0x10: LOFF_SENSN.
pub const REG_LOFF_SENSN: u8 = 0x10;
/// Register 0x11: LOFF_FLIP.
pub const REG_LOFF_FLIP: u8 = 0x11;
/// Register 0x12: LOFF_STATP (read-only lead-off status, positive).
pub const REG_LOFF_STATP: u8 = 0x12;
/// Register 0x13: LOFF_STATN (read-only lead-off status, negative).
pub const REG_LOFF_STATN: u8 = 0x13;
/// Register 0x14: GPIO.
pub const REG_GPIO: u8 = 0x14;
/// Register 0x15: MISC1 (SRB1 routing).
pub const REG_MISC1: u8 = 0x15;
/// Register 0x16: MISC2.
pub const REG_MISC2: u8 = 0x16;
/// Register 0x17: CONFIG4 (single-shot mode, lead-off comparator power).
pub const REG_CONFIG4: u8 = 0x17;

// ── CHnSET bit fields ───────────────────────────────────────────────────────

/// CHnSET bit 7: channel power-down.
pub const CH_POWER_DOWN: u8 = 0x80;
/// CHnSET bits 6:4: PGA gain field.
pub const CH_GAIN_MASK: u8 = 0x70;
/// Bit position of the PGA gain field within CHnSET.
pub const CH_GAIN_SHIFT: u8 = 4;
/// CHnSET bit 3: connect this channel's negative input to SRB2.
pub const CH_SRB2: u8 = 0x08;
/// CHnSET bits 2:0 = 0b001: inputs shorted (offset / noise measurement).
pub const CH_INPUT_SHORT: u8 = 0x01;
/// CHnSET mux value for the internal test signal.
pub const CH_MUX_TEST: u8 = 0x05;
/// Mask of the CHnSET bits preserved when a channel is (re)enabled:
/// the gain field and SRB2 routing; power-down and mux bits clear to the
/// normal-electrode configuration.
pub const CH_ENABLE_KEEP_MASK: u8 = 0x78;

// ── CONFIG3 bit fields ──────────────────────────────────────────────────────

/// CONFIG3 bit 7: internal reference buffer power (1 = powered).
pub const CF3_PD_REFBUF: u8 = 0x80;
/// CONFIG3 bit 3: bias reference derived internally.
pub const CF3_BIASREF_INT: u8 = 0x08;
/// CONFIG3 bit 2: bias buffer power (1 = powered).
pub const CF3_PD_BIAS: u8 = 0x04;
/// CONFIG3 value for the bias-driving chip: reference buffer on, internal
/// bias reference, bias buffer on (reserved bits 6:5 write 1).
pub const CF3_BIAS_DRIVER: u8 = 0xEC;
/// CONFIG3 value for the non-bias chips: bias circuitry off (reserved bits
/// 6:5 write 1).
pub const CF3_BIAS_IDLE: u8 = 0x60;

/// MISC1 bit 5: route SRB1 to all negative inputs.
pub const MISC1_SRB1: u8 = 0x20;

/// CONFIG2 value selecting the internal test signal (driven internally,
/// default amplitude and frequency).
pub const CF2_TEST_INTERNAL: u8 = 0xD0;

// ── Power-up defaults written by the reset sequence ─────────────────────────

/// CONFIG1 after reset: daisy-chain off, oscillator output off, 250 SPS.
pub const RESET_CONFIG1: u8 = 0b1101_0110;
/// CONFIG2 after reset: internal test source.
pub const RESET_CONFIG2: u8 = 0b1101_0000;
/// CONFIG3 after reset: reference and bias buffers powered.
pub const RESET_CONFIG3: u8 = 0b1110_1100;
/// LOFF after reset: lead-off detection idle.
pub const RESET_LOFF: u8 = 0x00;

/// Human-readable register names, indexed by register offset within a chip.
pub const REGISTER_NAMES: [&str; REGS_PER_AFE] = [
    "ID",
    "CONFIG1",
    "CONFIG2",
    "CONFIG3",
    "LOFF",
    "CH1SET",
    "CH2SET",
    "CH3SET",
    "CH4SET",
    "CH5SET",
    "CH6SET",
    "CH7SET",
    "CH8SET",
    "BIAS_SENSP",
    "BIAS_SENSN",
    "LOFF_SENSP",
    "LOFF_SENSN",
    "LOFF_FLIP",
    "LOFF_STATP",
    "LOFF_STATN",
    "GPIO",
    "MISC1",
    "MISC2",
    "CONFIG4",
];

// ── Forced-bit policy ───────────────────────────────────────────────────────

/// Per-register forced-bit masks, returned as `(set, clear)`.
///
/// A host may request any value for any register, but certain bits are
/// wired to the board design and must never leave their safe state: the ID
/// marker bit stays on, the reference/bias buffers stay powered, the
/// lead-off comparator and miscellaneous debug bits stay off, and CONFIG1
/// (clocking and data rate) is pinned outright. Every pending value passes
/// through [`constrain`] before it is allowed onto the bus, so the shadow
/// image can never hold an illegal pattern.
#[must_use]
pub const fn forced_bits(offset: u8) -> (u8, u8) {
    match offset {
        REG_ID => (0x01, 0x00),
        REG_CONFIG1 => (RESET_CONFIG1, !RESET_CONFIG1),
        REG_CONFIG2 => (0xC0, 0x24),
        REG_CONFIG3 => (0xE0, 0x00),
        REG_LOFF => (0x00, 0x10),
        REG_MISC1 => (0x00, 0xDF),
        REG_MISC2 => (0x00, 0xFF),
        REG_CONFIG4 => (0x00, 0xF5),
        _ => (0x00, 0x00),
    }
}

/// Apply the forced-bit policy for `offset` to a requested register value.
#[inline]
#[must_use]
pub const fn constrain(offset: u8, value: u8) -> u8 {
    let (set, clear) = forced_bits(offset);
    (value & !clear) | set
}

// ── PGA gain codec ──────────────────────────────────────────────────────────

/// Encode a PGA gain into the CHnSET gain field (bits 6:4).
///
/// Returns `None` for gains the PGA cannot realise; legal gains are
/// 1, 2, 4, 6, 8, 12 and 24.
#[must_use]
pub const fn gain_to_field(gain: u8) -> Option<u8> {
    match gain {
        1 => Some(0b000),
        2 => Some(0b001),
        4 => Some(0b010),
        6 => Some(0b011),
        8 => Some(0b100),
        12 => Some(0b101),
        24 => Some(0b110),
        _ => None,
    }
}

/// Decode the CHnSET gain field (bits 6:4) back into a PGA gain.
///
/// Returns `None` for the reserved field value 0b111.
#[must_use]
pub const fn field_to_gain(field: u8) -> Option<u8> {
    match field & 0x07 {
        0b000 => Some(1),
        0b001 => Some(2),
        0b010 => Some(4),
        0b011 => Some(6),
        0b100 => Some(8),
        0b101 => Some(12),
        0b110 => Some(24),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_match_datasheet() {
        assert_eq!(OP_START, 0x08);
        assert_eq!(OP_STOP, 0x0A);
        assert_eq!(OP_RESET, 0x06);
        assert_eq!(OP_SDATAC, 0x11);
        assert_eq!(OP_RDATA, 0x12);
        assert_eq!(OP_RREG, 0x20);
        assert_eq!(OP_WREG, 0x40);
    }

    #[test]
    fn register_offsets_match_datasheet() {
        assert_eq!(REG_ID, 0x00);
        assert_eq!(REG_CONFIG3, 0x03);
        assert_eq!(REG_CH1SET, 0x05);
        assert_eq!(REG_BIAS_SENSP, 0x0D);
        assert_eq!(REG_MISC1, 0x15);
        assert_eq!(REG_CONFIG4, 0x17);
    }

    #[test]
    fn register_names_cover_every_offset() {
        assert_eq!(REGISTER_NAMES.len(), REGS_PER_AFE);
        assert_eq!(REGISTER_NAMES[REG_CONFIG1 as usize], "CONFIG1");
        assert_eq!(REGISTER_NAMES[REG_CH1SET as usize], "CH1SET");
        assert_eq!(REGISTER_NAMES[REG_CONFIG4 as usize], "CONFIG4");
    }

    #[test]
    fn id_marker_bit_is_forced_on() {
        assert_eq!(constrain(REG_ID, 0x00) & 0x01, 0x01);
    }

    #[test]
    fn config1_is_pinned_regardless_of_request() {
        assert_eq!(constrain(REG_CONFIG1, 0x00), RESET_CONFIG1);
        assert_eq!(constrain(REG_CONFIG1, 0xFF), RESET_CONFIG1);
    }

    #[test]
    fn config3_keeps_reference_and_bias_buffers_on() {
        let v = constrain(REG_CONFIG3, 0x00);
        assert_eq!(v & CF3_PD_REFBUF, CF3_PD_REFBUF);
        assert_eq!(v & 0xE0, 0xE0);
    }

    #[test]
    fn misc2_is_forced_clear() {
        assert_eq!(constrain(REG_MISC2, 0xFF), 0x00);
    }

    #[test]
    fn test_signal_config2_survives_policy() {
        assert_eq!(constrain(REG_CONFIG2, CF2_TEST_INTERNAL), CF2_TEST_INTERNAL);
    }

    #[test]
    fn channel_registers_are_unconstrained() {
        assert_eq!(constrain(REG_CH1SET, 0xAB), 0xAB);
        assert_eq!(constrain(REG_BIAS_SENSP, 0x55), 0x55);
    }

    #[test]
    fn gain_codec_round_trips_every_legal_gain() {
        for gain in [1u8, 2, 4, 6, 8, 12, 24] {
            let field = gain_to_field(gain);
            assert!(field.is_some());
            assert_eq!(field.and_then(field_to_gain), Some(gain));
        }
    }

    #[test]
    fn gain_codec_rejects_illegal_values() {
        assert_eq!(gain_to_field(0), None);
        assert_eq!(gain_to_field(3), None);
        assert_eq!(gain_to_field(16), None);
        assert_eq!(field_to_gain(0b111), None);
    }

    #[test]
    fn enable_keep_mask_preserves_gain_and_srb2_only() {
        assert_eq!(CH_ENABLE_KEEP_MASK, CH_GAIN_MASK | CH_SRB2);
        assert_eq!(CH_ENABLE_KEEP_MASK & CH_POWER_DOWN, 0);
        assert_eq!(CH_ENABLE_KEEP_MASK & CH_INPUT_SHORT, 0);
    }
}
