//! Analog-front-end core: register shadowing, bus driving, acquisition.
//!
//! This crate owns everything between the raw SPI byte transfers exposed by
//! `platform` and the host-facing protocols: the shadow/pending register
//! image with its forced-bit policy, the chip-select-multiplexed bus driver,
//! the lossy circular sample store, and the per-cycle acquisition engine.
//!
//! Components are explicit instances constructed once and wired together —
//! no globals — so each piece is unit-testable against the scripted bus
//! doubles in `platform::mocks`.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::doc_markdown)] // hex values and register names in doc comments
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod acquisition;
pub mod bus;
pub mod regs;
pub mod store;

pub use acquisition::Acquisition;
pub use bus::{AfeBus, BusError, ResetError};
pub use regs::{RegError, RegisterImage};
pub use store::{DeviceSampleRing, SampleRecord, SampleRing};
