//! Host-facing front ends: console, binary packet, radio link.
//!
//! Exactly one front end is wired into a [`Device`](crate::Device) — the
//! build picks its host transport, and the alternatives never share a port.
//! Each front end gets one non-blocking `poll` turn per main-loop
//! iteration.

use afe::Acquisition;
use embedded_hal::delay::DelayNs;
use heapless::Vec;
use platform::identity::{BootControl, DeviceIdentity, RailMonitor};
use platform::peripheral::{AfeSpi, ChipSelect, ControlLines, LinePort};
use platform::ring::ByteRing;
use platform::timer::Countdown;
use protocol::console::{Console, ConsoleCtx, MAX_LINE_LEN};
use protocol::packet::PacketReceiver;
use protocol::telemetry::format_record;
use wifi::{LinkConfig, WifiLink};

use crate::device::DeviceError;

/// Receive staging capacity of the console front end.
const LINE_STAGING: usize = 256;

/// Response prefix of the console transport.
const CONSOLE_PREFIX: &str = "CLI:";

/// Line-oriented console front end.
///
/// Received bytes stage through an interrupt-safe byte ring (the receive
/// ISR pushes on hardware); a carriage return completes a line, which is
/// parsed and answered in place. Each poll also drains at most one sample
/// record to the host as a telemetry line.
pub struct ConsoleFront {
    staging: ByteRing<LINE_STAGING>,
    console: Console,
    counter: u32,
}

impl ConsoleFront {
    /// Create an idle console front end.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            staging: ByteRing::new(),
            console: Console::new(),
            counter: 0,
        }
    }

    /// One cooperative turn: telemetry out, then any completed command in.
    pub fn poll<P, S, C, L, D, I, R, B>(
        &mut self,
        port: &mut P,
        ctx: &mut ConsoleCtx<'_, S, C, L, D, I, R, B>,
    ) -> Result<(), DeviceError<P::Error, S::Error, C::Error, L::Error>>
    where
        P: LinePort,
        S: AfeSpi,
        C: ChipSelect,
        L: ControlLines,
        D: DelayNs,
        I: DeviceIdentity,
        R: RailMonitor,
        B: BootControl,
    {
        // Telemetry: one record per loop turn keeps the console responsive.
        if let Some(record) = ctx.engine.store_mut().pop() {
            let line = format_record(self.counter, &record, self.console.take_mark());
            self.counter = self.counter.wrapping_add(1);
            port.write_all(line.as_bytes()).map_err(DeviceError::Port)?;
        }

        while let Some(byte) = port.poll_byte().map_err(DeviceError::Port)? {
            // A full staging ring simply drops input, like a UART FIFO.
            self.staging.push(byte).ok();
            if byte == b'\r' {
                let mut line: Vec<u8, { MAX_LINE_LEN + 8 }> = Vec::new();
                while let Ok(staged) = self.staging.pop() {
                    line.push(staged).ok();
                }
                let (mut response, _ok) = self.console.parse(&line, CONSOLE_PREFIX, ctx);
                response.push_str("\n\r").ok();
                port.write_all(response.as_bytes())
                    .map_err(DeviceError::Port)?;
            }
        }
        Ok(())
    }
}

impl Default for ConsoleFront {
    fn default() -> Self {
        Self::new()
    }
}

/// Binary packet front end: byte-fed receiver plus command dispatch.
pub struct PacketFront<'a> {
    rx: PacketReceiver<'a>,
}

impl<'a> PacketFront<'a> {
    /// Create a packet front end using `idle` as the frame idle timeout.
    pub fn new(idle: &'a Countdown) -> Self {
        Self {
            rx: PacketReceiver::new(idle),
        }
    }

    /// One cooperative turn: feed every pending byte, dispatch completed
    /// frames, transmit replies.
    pub fn poll<P, S, C, LE>(
        &mut self,
        port: &mut P,
        engine: &mut Acquisition<S, C>,
    ) -> Result<(), DeviceError<P::Error, S::Error, C::Error, LE>>
    where
        P: LinePort,
        S: AfeSpi,
        C: ChipSelect,
    {
        while let Some(byte) = port.poll_byte().map_err(DeviceError::Port)? {
            if let Some(packet) = self.rx.feed(byte) {
                if let Some(reply) =
                    protocol::packet::dispatch(&packet, engine).map_err(DeviceError::Bus)?
                {
                    port.write_all(&reply.encode()).map_err(DeviceError::Port)?;
                }
            }
        }
        Ok(())
    }
}

/// Radio-link front end: line assembly feeding the negotiation machine.
pub struct WifiFront<'a> {
    /// The negotiation state machine.
    pub link: WifiLink<'a>,
    line: Vec<u8, { MAX_LINE_LEN + 32 }>,
}

impl<'a> WifiFront<'a> {
    /// Create a radio front end negotiating with `config`.
    pub fn new(timer: &'a Countdown, config: LinkConfig) -> Self {
        Self {
            link: WifiLink::new(timer, config),
            line: Vec::new(),
        }
    }

    /// One cooperative turn: assemble received lines, then step the
    /// negotiation machine.
    pub fn poll<P, S, C, LE>(
        &mut self,
        port: &mut P,
        engine: &mut Acquisition<S, C>,
    ) -> Result<(), DeviceError<P::Error, S::Error, C::Error, LE>>
    where
        P: LinePort,
        S: AfeSpi,
        C: ChipSelect,
    {
        while let Some(byte) = port.poll_byte().map_err(DeviceError::Port)? {
            if byte == b'\n' {
                if let Ok(text) = core::str::from_utf8(&self.line) {
                    self.link.on_line(text.trim_end_matches('\r'));
                }
                self.line.clear();
            } else {
                self.line.push(byte).ok();
            }
        }
        self.link.poll(port, engine).map_err(DeviceError::from_link)
    }
}

/// The single host front end wired into a device.
pub enum FrontEnd<'a> {
    /// Text command console.
    Console(ConsoleFront),
    /// Binary framed packet protocol.
    Packet(PacketFront<'a>),
    /// Radio-link transport.
    Wifi(WifiFront<'a>),
}
