//! Telemetry line formatting for the sample stream.
//!
//! Each drained sample record becomes one ASCII line:
//!
//! ```text
//! DATA:<counter>,<ch1>,<ch2>,…,<ch32>,<mark>\n\r
//! ```
//!
//! The counter is the host-visible record sequence number; the marker comes
//! from the console's `mark` command and is reported on exactly one record
//! before clearing (the console owns that clear-on-read rule).

use core::fmt::Write as _;

use afe::SampleRecord;
use heapless::String;

/// Capacity of one formatted telemetry line.
///
/// Worst case: 5 + 10 digits counter + 32 × (1 + 11 digits) + 12 + 2.
pub const TELEMETRY_LINE_LEN: usize = 512;

/// Format one sample record as a `DATA:` line.
#[must_use]
pub fn format_record(counter: u32, record: &SampleRecord, mark: i32) -> String<TELEMETRY_LINE_LEN> {
    let mut out: String<TELEMETRY_LINE_LEN> = String::new();
    write!(out, "DATA:{counter}").ok();
    for value in &record.channels {
        write!(out, ",{value}").ok();
    }
    write!(out, ",{mark}\n\r").ok();
    out
}
