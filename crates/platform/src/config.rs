//! Device configuration and constants
//!
//! Central configuration values used across the firmware. All naming and
//! sizing should reference these constants rather than hardcoding values.

/// The device name, as reported over every host transport.
pub const DEVICE_NAME: &str = "TETRA32";

/// Firmware version (synchronized with Cargo.toml).
pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of analog-front-end chips sharing the SPI bus.
pub const AFE_COUNT: usize = 4;

/// Registers per AFE chip (0x00..=0x17).
pub const REGS_PER_AFE: usize = 0x18;

/// Total registers across all chips, addressed `chip * REGS_PER_AFE + offset`.
pub const REGISTER_COUNT: usize = AFE_COUNT * REGS_PER_AFE;

/// Acquisition channels per AFE chip.
pub const CHANNELS_PER_AFE: usize = 8;

/// Total acquisition channels. Channel arguments on the host interfaces are
/// 1-based (`1..=CHANNEL_COUNT`).
pub const CHANNEL_COUNT: usize = AFE_COUNT * CHANNELS_PER_AFE;

/// Capacity of the circular sample store, in per-cycle records.
pub const SAMPLE_RING_CAPACITY: usize = 100;

/// Maximum payload length of a framed binary packet.
pub const MAX_PAYLOAD_LEN: usize = 200;
