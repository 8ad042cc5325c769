//! Inbound application frames and the double-buffered command channel.
//!
//! Application data from the radio arrives as `+IPD,<channel>,<length>:`
//! frames. The payload is accumulated into the *active* staging buffer; a
//! line terminator completes the command, marks that buffer ready, and
//! flips accumulation to the alternate buffer — so a new command can start
//! arriving while the main loop is still interpreting the previous one.
//!
//! Completed commands use one of three shapes:
//!
//! - `var=value` — set
//! - `var?` — query
//! - `var` — execute

use heapless::{String, Vec};

/// Capacity of one staged command.
pub const COMMAND_CAPACITY: usize = 256;

/// The parsed shape of a completed inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind<'a> {
    /// `var=value`.
    Set {
        /// Variable name.
        var: &'a str,
        /// Requested value (may itself be comma-separated).
        value: &'a str,
    },
    /// `var?`.
    Query {
        /// Variable name.
        var: &'a str,
    },
    /// Bare `var`.
    Execute {
        /// Command name.
        var: &'a str,
    },
}

/// Classify a completed (already lowercased) command string.
#[must_use]
pub fn classify_command(cmd: &str) -> CommandKind<'_> {
    if let Some((var, value)) = cmd.split_once('=') {
        CommandKind::Set { var, value }
    } else if let Some((var, _)) = cmd.split_once('?') {
        CommandKind::Query { var }
    } else {
        CommandKind::Execute { var: cmd }
    }
}

/// Frame-payload accumulation state within one `+IPD` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpdField {
    BeforeChannel,
    Channel,
    Length,
    Payload,
}

/// Double-buffered inbound command staging.
pub struct CommandBuffers {
    bufs: [Vec<u8, COMMAND_CAPACITY>; 2],
    /// Buffer currently accumulating payload bytes.
    active: usize,
    /// Buffer holding a completed, not-yet-consumed command.
    ready: Option<usize>,
}

impl CommandBuffers {
    /// Create empty staging buffers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bufs: [Vec::new(), Vec::new()],
            active: 0,
            ready: None,
        }
    }

    /// Accumulate one `+IPD` frame line into the active buffer.
    ///
    /// The line layout is `+IPD,<channel>,<length>:<payload…>`, where the
    /// declared length counts the payload including its terminator. Payload
    /// bytes are copied until a terminator completes the command; a frame
    /// that exhausts its declared length with no terminator leaves the
    /// command open for a later frame to continue. A line that simply ends
    /// short of the declared length had its terminator stripped upstream and
    /// also completes the command.
    #[allow(clippy::arithmetic_side_effects)] // Safety: copied < declared_len <= line length
    pub fn on_ipd_line(&mut self, line: &str) {
        let mut field = IpdField::BeforeChannel;
        let mut declared_len: usize = 0;
        let mut digits: String<8> = String::new();
        let mut copied = 0usize;

        for byte in line.bytes() {
            match field {
                IpdField::BeforeChannel => {
                    if byte == b',' {
                        field = IpdField::Channel;
                    }
                }
                IpdField::Channel => {
                    if byte == b',' {
                        field = IpdField::Length;
                        digits.clear();
                    }
                    // The channel id itself is not used: the link owns a
                    // single connection slot.
                }
                IpdField::Length => {
                    if byte == b':' {
                        declared_len = digits.parse().unwrap_or(0);
                        field = IpdField::Payload;
                    } else {
                        digits.push(byte as char).ok();
                    }
                }
                IpdField::Payload => {
                    if byte == b'\r' || byte == b'\n' {
                        self.complete_active();
                        return;
                    }
                    if copied >= declared_len {
                        // Frame exhausted without a terminator: the command
                        // continues in a later frame.
                        return;
                    }
                    #[allow(clippy::indexing_slicing)] // Safety: active is 0 or 1
                    {
                        self.bufs[self.active].push(byte).ok();
                    }
                    copied += 1;
                }
            }
        }
        if field == IpdField::Payload && copied < declared_len {
            // The line ended before the declared payload length: the
            // terminator was stripped by the line assembler upstream.
            self.complete_active();
        }
    }

    /// Mark the active buffer complete and flip accumulation to the
    /// alternate buffer.
    fn complete_active(&mut self) {
        self.ready = Some(self.active);
        self.active ^= 1;
        #[allow(clippy::indexing_slicing)] // Safety: active is 0 or 1
        self.bufs[self.active].clear();
    }

    /// Take the completed command, if any, lowercased.
    pub fn take_ready(&mut self) -> Option<String<COMMAND_CAPACITY>> {
        let index = self.ready.take()?;
        #[allow(clippy::indexing_slicing)] // Safety: index is 0 or 1
        let buf = &mut self.bufs[index];
        let mut out: String<COMMAND_CAPACITY> = String::new();
        for &byte in buf.iter() {
            out.push(byte.to_ascii_lowercase() as char).ok();
        }
        buf.clear();
        Some(out)
    }

    /// `true` when a completed command awaits interpretation.
    #[must_use]
    pub const fn has_ready(&self) -> bool {
        self.ready.is_some()
    }
}

impl Default for CommandBuffers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests use unwrap() for readable assertions
mod tests {
    use super::*;

    #[test]
    fn classify_covers_all_three_shapes() {
        assert_eq!(
            classify_command("rr=5,1"),
            CommandKind::Set { var: "rr", value: "5,1" }
        );
        assert_eq!(classify_command("debug?"), CommandKind::Query { var: "debug" });
        assert_eq!(classify_command("start"), CommandKind::Execute { var: "start" });
    }

    #[test]
    fn ipd_payload_completes_on_terminator() {
        let mut bufs = CommandBuffers::new();
        bufs.on_ipd_line("+IPD,0,6:start\r");
        assert!(bufs.has_ready());
        assert_eq!(bufs.take_ready().unwrap().as_str(), "start");
        assert!(!bufs.has_ready());
    }

    #[test]
    fn command_case_is_folded() {
        let mut bufs = CommandBuffers::new();
        bufs.on_ipd_line("+IPD,0,6:START\r");
        assert_eq!(bufs.take_ready().unwrap().as_str(), "start");
    }

    #[test]
    fn unterminated_frame_continues_in_the_next_one() {
        let mut bufs = CommandBuffers::new();
        bufs.on_ipd_line("+IPD,0,3:sta");
        assert!(!bufs.has_ready(), "no terminator yet");
        bufs.on_ipd_line("+IPD,0,3:rt\r");
        assert_eq!(bufs.take_ready().unwrap().as_str(), "start");
    }

    #[test]
    fn new_command_can_arrive_while_previous_is_staged() {
        let mut bufs = CommandBuffers::new();
        bufs.on_ipd_line("+IPD,0,6:first\r");
        assert!(bufs.has_ready());

        // The alternate buffer captures the next command before the first
        // has been consumed.
        bufs.on_ipd_line("+IPD,0,7:second\r");
        let got = bufs.take_ready().unwrap();
        assert_eq!(got.as_str(), "second");
    }

    #[test]
    fn stripped_terminator_still_completes_the_command() {
        // A line assembler upstream may strip the CR before handing the
        // line over; the declared length then exceeds the visible payload.
        let mut bufs = CommandBuffers::new();
        bufs.on_ipd_line("+IPD,0,6:start");
        assert_eq!(bufs.take_ready().unwrap().as_str(), "start");
    }

    #[test]
    fn malformed_frames_are_ignored() {
        let mut bufs = CommandBuffers::new();
        bufs.on_ipd_line("garbage with no commas");
        bufs.on_ipd_line("+IPD");
        assert!(!bufs.has_ready());
    }
}
