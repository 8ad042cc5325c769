//! Alternate radio-link transport: AT-style negotiation plus the inbound
//! application command channel.
//!
//! The link is brought up by a command/response state machine (join the
//! network, start the TCP server, then stream sample records on demand);
//! any failure or timeout in a wait state restarts the whole negotiation
//! from scratch — there is no partial retry. Inbound application frames are
//! staged in a double-buffered command channel so a newly arriving command
//! can be captured while the previous one is still being interpreted.

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

pub mod inbound;
pub mod link;

pub use inbound::CommandBuffers;
pub use link::{LinkConfig, LinkError, LinkState, Response, WifiLink};
