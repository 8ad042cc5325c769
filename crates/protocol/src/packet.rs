//! Binary packet framing and command dispatch.
//!
//! Wire format: `[header '$'][command][length][payload 0..=200][checksum]`,
//! where the checksum is the truncated 8-bit sum of every preceding byte.
//!
//! The receiver is a five-state machine fed one byte per call. An idle
//! countdown is re-armed on every accepted byte; if it has already expired
//! when a byte arrives, the machine is forced back to the header-wait state
//! before that byte is processed, discarding any partial frame. This is the
//! byte-stream resynchronization guard: a host that pauses mid-frame never
//! wedges the receiver.
//!
//! Malformed lengths and checksum mismatches are silently discarded — no
//! negative acknowledgement is ever sent.

use afe::{Acquisition, BusError};
use heapless::Vec;
use platform::config::MAX_PAYLOAD_LEN;
use platform::peripheral::{AfeSpi, ChipSelect};
use platform::timer::Countdown;
use thiserror_no_std::Error;

/// Frame header marker byte.
pub const HEADER: u8 = b'$';

/// Idle timeout between frame bytes, in timer ticks.
pub const RX_IDLE_TIMEOUT: u16 = 10;

/// Encoded frame overhead: header, command, length, checksum.
const FRAME_OVERHEAD: usize = 4;

/// Host command: copy the payload over the pending register image.
pub const CMD_UPDATE_REGS: u8 = 0x10;
/// Reply to [`CMD_UPDATE_REGS`]: empty acknowledgement.
pub const CMD_UPDATE_REGS_ACK: u8 = 0x11;
/// Host command: full register read, reply with the shadow image.
pub const CMD_READ_REGS: u8 = 0x20;
/// Reply to [`CMD_READ_REGS`]: the 96-byte shadow image.
pub const CMD_READ_REGS_REPLY: u8 = 0x21;

/// Errors from packet construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Payload exceeds [`MAX_PAYLOAD_LEN`] bytes.
    #[error("payload too long")]
    PayloadTooLong,
}

/// One framed packet: command byte plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command byte.
    pub command: u8,
    /// Payload bytes (length byte on the wire is `payload.len()`).
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl Packet {
    /// Build a packet, rejecting oversized payloads.
    pub fn new(command: u8, payload: &[u8]) -> Result<Self, PacketError> {
        let mut buf: Vec<u8, MAX_PAYLOAD_LEN> = Vec::new();
        buf.extend_from_slice(payload)
            .map_err(|_| PacketError::PayloadTooLong)?;
        Ok(Self {
            command,
            payload: buf,
        })
    }

    /// Truncated 8-bit sum of header, command, length and payload.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Safety: payload.len() <= 200
    pub fn checksum(&self) -> u8 {
        let mut sum = HEADER
            .wrapping_add(self.command)
            .wrapping_add(self.payload.len() as u8);
        for byte in &self.payload {
            sum = sum.wrapping_add(*byte);
        }
        sum
    }

    /// Serialise the packet into its wire form.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Safety: payload.len() <= 200
    pub fn encode(&self) -> Vec<u8, { MAX_PAYLOAD_LEN + FRAME_OVERHEAD }> {
        let mut out = Vec::new();
        // The frame always fits: payload.len() <= MAX_PAYLOAD_LEN.
        out.push(HEADER).ok();
        out.push(self.command).ok();
        out.push(self.payload.len() as u8).ok();
        out.extend_from_slice(&self.payload).ok();
        out.push(self.checksum()).ok();
        out
    }
}

/// Receiver states, one per frame field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    AwaitHeader,
    AwaitCommand,
    AwaitLength,
    AwaitPayload,
    AwaitChecksum,
}

/// Byte-fed frame receiver with timeout resynchronization.
///
/// Holds exactly one in-flight packet; a completed frame is returned from
/// [`feed`](PacketReceiver::feed) and the machine returns to header-wait.
pub struct PacketReceiver<'a> {
    state: RxState,
    command: u8,
    length: usize,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
    idle: &'a Countdown,
}

impl<'a> PacketReceiver<'a> {
    /// Create a receiver using `idle` as its inter-byte timeout.
    pub fn new(idle: &'a Countdown) -> Self {
        Self {
            state: RxState::AwaitHeader,
            command: 0,
            length: 0,
            payload: Vec::new(),
            idle,
        }
    }

    /// Feed one received byte; returns a packet when a frame completes with
    /// a valid checksum.
    pub fn feed(&mut self, byte: u8) -> Option<Packet> {
        // Resynchronization guard: a stale partial frame is abandoned before
        // the new byte is interpreted.
        if self.idle.is_expired() {
            self.state = RxState::AwaitHeader;
        }
        self.idle.start(RX_IDLE_TIMEOUT);

        match self.state {
            RxState::AwaitHeader => {
                if byte == HEADER {
                    self.payload.clear();
                    self.state = RxState::AwaitCommand;
                }
                None
            }
            RxState::AwaitCommand => {
                self.command = byte;
                self.state = RxState::AwaitLength;
                None
            }
            RxState::AwaitLength => {
                self.length = usize::from(byte);
                if self.length > MAX_PAYLOAD_LEN {
                    self.state = RxState::AwaitHeader;
                } else if self.length == 0 {
                    self.state = RxState::AwaitChecksum;
                } else {
                    self.state = RxState::AwaitPayload;
                }
                None
            }
            RxState::AwaitPayload => {
                // Capacity is MAX_PAYLOAD_LEN >= length; push cannot fail.
                self.payload.push(byte).ok();
                if self.payload.len() == self.length {
                    self.state = RxState::AwaitChecksum;
                }
                None
            }
            RxState::AwaitChecksum => {
                self.state = RxState::AwaitHeader;
                let packet = Packet {
                    command: self.command,
                    payload: self.payload.clone(),
                };
                if byte == packet.checksum() {
                    Some(packet)
                } else {
                    // Silent discard; the next header byte starts over.
                    None
                }
            }
        }
    }
}

/// Handle one completed packet, returning the reply to transmit (if any).
///
/// - [`CMD_UPDATE_REGS`]: payload is copied over the pending register image
///   (applied at the next cycle boundary); replies with an empty ack.
/// - [`CMD_READ_REGS`]: triggers a full register read and replies with the
///   entire 96-byte shadow image.
///
/// Unknown commands are ignored without a reply.
pub fn dispatch<S: AfeSpi, C: ChipSelect>(
    packet: &Packet,
    engine: &mut Acquisition<S, C>,
) -> Result<Option<Packet>, BusError<S::Error, C::Error>> {
    match packet.command {
        CMD_UPDATE_REGS => {
            engine.load_register_payload(&packet.payload);
            // Empty ack always fits.
            Ok(Packet::new(CMD_UPDATE_REGS_ACK, &[]).ok())
        }
        CMD_READ_REGS => {
            engine.read_all_registers()?;
            // The 96-byte image always fits in a 200-byte payload.
            Ok(Packet::new(CMD_READ_REGS_REPLY, engine.shadow_image()).ok())
        }
        _ => Ok(None),
    }
}
