//! Device composition: the cooperative main loop and its front ends.
//!
//! No operating system and no executor: the firmware is one loop that
//! repeatedly runs the acquisition-or-simulation step and then gives the
//! single configured host front end (console, binary packet, or radio link)
//! one non-blocking turn. The only other execution contexts are the
//! periodic tick interrupt — which does nothing but decrement the countdown
//! bank — and pin-edge interrupts that raise single-bit flags such as
//! data-ready.
//!
//! On hardware, `DeviceTimers::tick_all` is the timer ISR body and
//! [`DataReady::set`] the data-ready pin ISR body; on the host, tests and
//! the simulator drive both explicitly.

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

pub mod device;
pub mod fronts;
pub mod sim;
pub mod timers;

pub use device::{DataReady, Device, DeviceError};
pub use fronts::{ConsoleFront, FrontEnd, PacketFront, WifiFront};
pub use sim::SampleSimulator;
pub use timers::DeviceTimers;
