//! Line-oriented ASCII command console.
//!
//! `parse` takes one received line (terminator included or not), runs it
//! through the editing rules — CR/LF stripping, literal-backspace editing,
//! ASCII case folding — and dispatches it as `command [arg1[,arg2]]`.
//!
//! Every numeric argument is range-checked against its domain before any
//! state is touched; invalid input produces a formatted error string and
//! leaves the device unchanged. Responses are single formatted lines
//! prefixed with a caller-supplied prefix; errors read
//! `<prefix>ERROR: <description>`.
//!
//! A leading `0xFF` byte is tolerated as line noise: it yields an empty
//! response and no action.

use core::fmt::Write as _;

use afe::Acquisition;
use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};
use platform::ads1299::REGISTER_NAMES;
use platform::config::{
    CHANNEL_COUNT, DEVICE_NAME, FW_VERSION, REGISTER_COUNT, REGS_PER_AFE,
};
use platform::identity::{serial_is_blank, BootControl, DeviceIdentity, RailMonitor, SERIAL_LEN};
use platform::peripheral::{AfeSpi, ChipSelect, ControlLines};

/// Maximum accepted input line length, in bytes.
pub const MAX_LINE_LEN: usize = 128;

/// Response buffer capacity (sized for the full register dump).
pub const RESPONSE_LEN: usize = 2048;

/// Sentinel byte treated as line noise rather than a command.
const NOISE_SENTINEL: u8 = 0xFF;

/// Everything a console command may need to touch.
pub struct ConsoleCtx<'a, S, C, L, D, I, R, B> {
    /// The acquisition engine (registers, channels, samples).
    pub engine: &'a mut Acquisition<S, C>,
    /// AFE control pins, for the reset sequence.
    pub lines: &'a mut L,
    /// Delay provider pacing the reset sequence.
    pub delay: &'a mut D,
    /// Serial-number store and revision straps.
    pub identity: &'a mut I,
    /// Supply-rail diagnostics.
    pub rails: &'a mut R,
    /// Bootloader hand-off.
    pub boot: &'a mut B,
}

/// The console interpreter state: currently just the telemetry marker.
pub struct Console {
    mark: i32,
}

impl Console {
    /// Create a console with the marker cleared.
    #[must_use]
    pub const fn new() -> Self {
        Self { mark: 0 }
    }

    /// Current marker value.
    #[must_use]
    pub const fn mark(&self) -> i32 {
        self.mark
    }

    /// Marker value for one telemetry record; a nonzero marker clears after
    /// being reported once.
    pub fn take_mark(&mut self) -> i32 {
        let mark = self.mark;
        if mark != 0 {
            self.mark = 0;
        }
        mark
    }

    /// Parse one input line and produce `(response, success)`.
    pub fn parse<S, C, L, D, I, R, B>(
        &mut self,
        raw: &[u8],
        prefix: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> (String<RESPONSE_LEN>, bool)
    where
        S: AfeSpi,
        C: ChipSelect,
        L: ControlLines,
        D: DelayNs,
        I: DeviceIdentity,
        R: RailMonitor,
        B: BootControl,
    {
        let mut out: String<RESPONSE_LEN> = String::new();

        if raw.len() > MAX_LINE_LEN {
            write!(out, "{prefix}ERROR: Input exceeds {MAX_LINE_LEN} bytes").ok();
            return (out, false);
        }

        let line = normalize(raw);
        if line.first().copied() == Some(NOISE_SENTINEL) {
            return (out, false);
        }

        let text = core::str::from_utf8(&line).unwrap_or("");
        let (command, args) = match text.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (text, ""),
        };

        let ok = match command {
            "sr" => self.cmd_set_register(&mut out, prefix, args, ctx),
            "rr" => self.cmd_read_registers(&mut out, prefix, args, ctx),
            "rq" => self.cmd_read_registers_quick(&mut out, prefix, ctx),
            "rc" => self.cmd_read_channel(&mut out, prefix, args, ctx),
            "sg" | "schg" => self.cmd_set_gain(&mut out, prefix, args, ctx),
            "mark" => self.cmd_mark(&mut out, prefix, args),
            "chon" => self.cmd_channel_on(&mut out, prefix, args, ctx),
            "rv" => self.cmd_read_voltage(&mut out, prefix, args, ctx),
            "test" => {
                ctx.engine.enable_test_signal();
                write!(out, "{prefix}Test mode turned on").ok();
                true
            }
            "reset" => self.cmd_reset(&mut out, prefix, ctx),
            "bootloader" => {
                ctx.boot.enter_bootloader();
                true
            }
            "ver" => {
                let hw = ctx.identity.hardware_revision();
                write!(
                    out,
                    "{prefix}FW VERSION:{FW_VERSION}, HW VERSION:{}",
                    hw.as_str()
                )
                .ok();
                true
            }
            "ser" => self.cmd_serial(&mut out, prefix, ctx),
            "setser" => self.cmd_set_serial(&mut out, prefix, args, ctx),
            "diag" => self.cmd_diag(&mut out, prefix, ctx),
            "help" => {
                write_help(&mut out, prefix);
                true
            }
            _ => {
                write!(out, "{prefix}ERROR: Unknown command [{command}]").ok();
                false
            }
        };
        (out, ok)
    }

    fn cmd_set_register<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        args: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
    {
        let (reg, value) = split_pair(args);
        let Some(reg) = parse_hex(reg).filter(|&r| (0..REGISTER_COUNT as i64).contains(&r)) else {
            write!(out, "{prefix}ERROR: SR: Register out of bounds").ok();
            return false;
        };
        let Some(value) = parse_hex(value).filter(|&v| (0..=255).contains(&v)) else {
            write!(out, "{prefix}ERROR: SR: Register value out of bounds").ok();
            return false;
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        // Safety: both ranges validated above
        let set = ctx.engine.set_register(reg as usize, value as u8);
        if set.is_err() {
            write!(out, "{prefix}ERROR: SR: Register out of bounds").ok();
            return false;
        }
        write!(out, "{prefix}OK: Register {reg:x} set to {value:x}").ok();
        true
    }

    #[allow(clippy::arithmetic_side_effects)] // Safety: module/index bounded by the register map
    fn cmd_read_registers<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        args: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
    {
        if ctx.engine.read_all_registers().is_err() {
            write!(out, "{prefix}ERROR: Bus fault").ok();
            return false;
        }

        if !args.is_empty() {
            let Some(reg) = parse_hex(args).filter(|&r| (0..REGISTER_COUNT as i64).contains(&r))
            else {
                write!(out, "{prefix}ERROR: RR: Register out of bounds").ok();
                return false;
            };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            // Safety: range validated above
            let index = reg as usize;
            let value = ctx.engine.register_shadow(index).unwrap_or(0);
            #[allow(clippy::indexing_slicing)] // Safety: index % 24 < 24
            let name = REGISTER_NAMES[index % REGS_PER_AFE];
            write!(out, "\t{index:02x}:{name}:{value:02x}\n\r").ok();
            return true;
        }

        let mut index = 0usize;
        for module in 0..platform::config::AFE_COUNT {
            write!(
                out,
                "\n\rModule {} (CH {}-{})\n\r",
                module + 1,
                module * 8 + 1,
                module * 8 + 8
            )
            .ok();
            for reg in 0..REGS_PER_AFE {
                let value = ctx.engine.register_shadow(index).unwrap_or(0);
                #[allow(clippy::indexing_slicing)] // Safety: reg < 24
                let name = REGISTER_NAMES[reg];
                write!(out, "\t{index:02x}:{name}:{value:02x}\n\r").ok();
                index += 1;
            }
        }
        true
    }

    fn cmd_read_registers_quick<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
    {
        if ctx.engine.read_all_registers().is_err() {
            write!(out, "{prefix}ERROR: Bus fault").ok();
            return false;
        }
        write!(out, "{prefix}").ok();
        for (i, value) in ctx.engine.shadow_image().iter().enumerate() {
            if i != 0 {
                write!(out, ",").ok();
            }
            write!(out, "{value:02x}").ok();
        }
        true
    }

    fn cmd_read_channel<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        args: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
    {
        if args.is_empty() {
            write!(out, "{prefix}ERROR:RC: No channel specified").ok();
            return false;
        }
        let Some(channel) = parse_channel(args) else {
            write!(out, "{prefix}ERROR:RC: Channel out of range").ok();
            return false;
        };
        match ctx.engine.latest_channel_value(channel) {
            Ok(value) => {
                write!(out, "{prefix}{value}").ok();
                true
            }
            Err(_) => {
                write!(out, "{prefix}ERROR:RC: Channel out of range").ok();
                false
            }
        }
    }

    fn cmd_set_gain<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        args: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
    {
        let (channel, gain) = split_pair(args);
        let Some(channel) = parse_channel(channel) else {
            write!(out, "{prefix}ERROR:SG: Channel out of bounds").ok();
            return false;
        };
        let Some(gain) = parse_dec(gain).filter(|&g| (1..=24).contains(&g)) else {
            write!(out, "{prefix}ERROR:SG: Invalid gain value").ok();
            return false;
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        // Safety: 1..=24 validated above
        let requested = gain as u8;
        match ctx.engine.set_gain(channel, requested) {
            Ok(()) => {
                write!(out, "{prefix}CH {channel} gain set to {gain}").ok();
                true
            }
            Err(_) => {
                write!(out, "{prefix}ERROR:SG: Invalid gain value").ok();
                false
            }
        }
    }

    fn cmd_mark(&mut self, out: &mut String<RESPONSE_LEN>, prefix: &str, args: &str) -> bool {
        if args.is_empty() {
            write!(out, "{prefix}MARK={}", self.mark).ok();
            return true;
        }
        let mark = parse_dec(args).unwrap_or(0);
        #[allow(clippy::cast_possible_truncation)] // Safety: marker domain is i32
        {
            self.mark = mark as i32;
        }
        write!(out, "{prefix}Mark set to [{}]", self.mark).ok();
        true
    }

    fn cmd_channel_on<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        args: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
    {
        let (target, state) = split_pair(args);
        let enabled = parse_dec(state).unwrap_or(0) != 0;

        if target.trim() == "all" {
            for channel in 1..=CHANNEL_COUNT {
                // Channel indices are in range by construction.
                ctx.engine.set_channel_enabled(channel, enabled).ok();
            }
            write!(
                out,
                "{prefix}All channels set to {}",
                if enabled { "ON" } else { "OFF" }
            )
            .ok();
            return true;
        }

        let Some(channel) = parse_channel(target) else {
            write!(out, "{prefix}ERROR:CHON: Channel out of range").ok();
            return false;
        };
        if ctx.engine.set_channel_enabled(channel, enabled).is_err() {
            write!(out, "{prefix}ERROR:CHON: Channel out of range").ok();
            return false;
        }
        write!(
            out,
            "{prefix}Channel [{channel}] turned [{}]",
            if enabled { "ON" } else { "OFF" }
        )
        .ok();
        true
    }

    fn cmd_read_voltage<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        args: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
    {
        let Some(channel) = parse_channel(args) else {
            write!(out, "{prefix}ERROR:RV: Channel out of range").ok();
            return false;
        };
        match ctx.engine.channel_millivolts(channel) {
            Ok(mv) => {
                write!(out, "{prefix}CH {channel}={mv:.6} mv").ok();
                true
            }
            Err(_) => {
                write!(out, "{prefix}ERROR:RV: Channel out of range").ok();
                false
            }
        }
    }

    fn cmd_reset<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        S: AfeSpi,
        C: ChipSelect,
        L: ControlLines,
        D: DelayNs,
    {
        if ctx.engine.reset_and_restart(ctx.lines, ctx.delay).is_err() {
            write!(out, "{prefix}ERROR: Bus fault").ok();
            return false;
        }
        write!(out, "{prefix}EEG Reset").ok();
        true
    }

    fn cmd_serial<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        I: DeviceIdentity,
    {
        let mut serial = [0u8; SERIAL_LEN];
        ctx.identity.read_serial(&mut serial);
        write!(out, "{prefix}Serial:").ok();
        if serial_is_blank(&serial) {
            write!(out, "NOT_SET").ok();
        } else {
            for &byte in serial.iter().take_while(|&&b| b != 0) {
                out.push(byte as char).ok();
            }
        }
        true
    }

    fn cmd_set_serial<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        args: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        I: DeviceIdentity,
    {
        match ctx.identity.program_serial(args.as_bytes()) {
            Ok(()) => {
                write!(out, "{prefix}Serial number set to:{args}").ok();
                true
            }
            Err(_) => {
                write!(out, "{prefix}ERROR:Could not set serial number").ok();
                false
            }
        }
    }

    fn cmd_diag<S, C, L, D, I, R, B>(
        &mut self,
        out: &mut String<RESPONSE_LEN>,
        prefix: &str,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> bool
    where
        R: RailMonitor,
    {
        let vsys = f64::from(ctx.rails.vsys_mv()) / 1000.0;
        let v3 = f64::from(ctx.rails.rail_3v3_mv()) / 1000.0;
        let v2p = f64::from(ctx.rails.rail_2v5p_mv()) / 1000.0;
        let v2n = f64::from(ctx.rails.rail_2v5n_mv()) / 1000.0;
        write!(
            out,
            "{prefix}+VSYS={vsys:.3}, +3.3V={v3:.3}, +2.5V={v2p:.3}, -2.5V={v2n:.3}"
        )
        .ok();
        true
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip CR/LF, apply literal-backspace editing, fold to lowercase.
fn normalize(raw: &[u8]) -> Vec<u8, MAX_LINE_LEN> {
    let mut line: Vec<u8, MAX_LINE_LEN> = Vec::new();
    for &byte in raw {
        match byte {
            b'\r' | b'\n' => {}
            0x08 => {
                // A backspace removes the previous character, if any.
                line.pop();
            }
            _ => {
                line.push(byte.to_ascii_lowercase()).ok();
            }
        }
    }
    line
}

/// Split an argument string at its first comma.
fn split_pair(args: &str) -> (&str, &str) {
    match args.split_once(',') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => (args.trim(), ""),
    }
}

/// Parse a hexadecimal integer argument.
fn parse_hex(s: &str) -> Option<i64> {
    i64::from_str_radix(s.trim(), 16).ok()
}

/// Parse a decimal integer argument.
fn parse_dec(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Parse and range-check a 1-based channel argument.
fn parse_channel(s: &str) -> Option<usize> {
    let channel = parse_dec(s).filter(|&c| (1..=CHANNEL_COUNT as i64).contains(&c))?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Safety: filtered into 1..=32 above
    let channel = channel as usize;
    Some(channel)
}

fn write_help(out: &mut String<RESPONSE_LEN>, prefix: &str) {
    write!(out, "{prefix}{DEVICE_NAME} COMMAND SET\n\r").ok();
    out.push_str("sr [reg],[value]\t\tSet register to value.\n\r").ok();
    out.push_str("rr [reg]\t\t\tRead register. Without [reg], reads the entire register set.\n\r")
        .ok();
    out.push_str("rq\t\t\t\tRead entire register set quickly.\n\r").ok();
    out.push_str("rc [chan]\t\t\tRead channel ADC value.\n\r").ok();
    out.push_str("sg [chan],[gain]\t\tSet channel gain.\n\r").ok();
    out.push_str("mark [value]\t\t\tSet mark to value.\n\r").ok();
    out.push_str("chon [chan],[state]\t\tTurn channel on/off. Use [all] to set all channels.\n\r")
        .ok();
    out.push_str("rv [chan]\t\t\tRead channel voltage.\n\r").ok();
    out.push_str("test\t\t\t\tSet registers to measure test signals.\n\r").ok();
    out.push_str("reset\t\t\t\tReset the AFE chips and restart conversions.\n\r")
        .ok();
    out.push_str("bootloader\t\t\tHand off to the resident bootloader.\n\r").ok();
    out.push_str("ver\t\t\t\tReport firmware/hardware versions.\n\r").ok();
    out.push_str("ser\t\t\t\tReport the serial number.\n\r").ok();
    out.push_str("setser [value]\t\t\tProgram the serial number (once).\n\r").ok();
    out.push_str("diag\t\t\t\tReport supply-rail voltages.\n\r").ok();
}
