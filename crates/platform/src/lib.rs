//! Hardware Abstraction Layer (HAL) for the Tetra32 acquisition front-end
//!
//! This crate provides trait-based abstractions for every hardware touchpoint
//! of the firmware, enabling development and testing without physical
//! hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate)
//!         ↓
//! Feature Layers (afe, protocol, wifi)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (vendor SPI/UART/GPIO drivers)
//! ```
//!
//! # Contents
//!
//! - [`peripheral`] - SPI byte transfer, chip-select multiplexing, control
//!   lines, line-oriented serial ports
//! - [`ads1299`] - AFE chip register map, opcodes, forced-bit policy
//! - [`ring`] - interrupt-safe byte ring buffer
//! - [`timer`] - tick-driven saturating countdowns
//! - [`identity`] - serial number / hardware revision / rail monitor /
//!   bootloader boundary traits
//!
//! # Features
//!
//! - `std`: standard library support (host testing)
//! - `mock`: expose the scripted/recording test doubles to downstream crates
//! - `defmt`: enable defmt logging derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod ads1299;
pub mod config;
pub mod identity;
pub mod mocks;
pub mod peripheral;
pub mod ring;
pub mod timer;

pub use identity::{BootControl, DeviceIdentity, HwRevision, IdentityError, RailMonitor};
pub use peripheral::{
    AfeSpi, ChipSelect, ControlLines, CsMask, GpioChipSelect, GpioControlLines, LinePort,
};
pub use ring::{ByteRing, RingError};
pub use timer::{Countdown, TickDelay};
