//! Host link protocols: binary packet framing and the text console.
//!
//! Two mutually exclusive front ends share this crate: the checksummed
//! binary packet protocol (framing state machine plus command dispatcher)
//! and the line-oriented ASCII console. Telemetry line formatting lives
//! here too, since both the console transport and the data stream share the
//! marker value.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod console;
pub mod packet;
pub mod telemetry;

pub use console::{Console, ConsoleCtx, RESPONSE_LEN};
pub use packet::{dispatch, Packet, PacketError, PacketReceiver, CMD_READ_REGS, CMD_UPDATE_REGS};
pub use telemetry::format_record;
