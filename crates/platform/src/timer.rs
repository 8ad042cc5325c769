//! Tick-driven software countdown timers.
//!
//! The periodic timer interrupt does exactly one thing: it decrements every
//! live [`Countdown`] by one tick, saturating at zero. All timeout and delay
//! logic above this layer (frame resynchronization, link negotiation,
//! reset-sequence pacing) is expressed as "start a countdown, poll
//! `is_expired`". The ISR side never does more work than the decrements.
//!
//! `Countdown` methods take `&self` and guard the counter with a
//! `critical_section`, so one instance can be shared between the tick ISR
//! and the main loop through a `&'static`.

use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

/// Software timer tick rate, in ticks per second.
pub const TICK_HZ: u32 = 1000;

/// A saturating countdown decremented once per timer tick.
pub struct Countdown {
    ticks: Mutex<Cell<u16>>,
}

impl Countdown {
    /// Create an expired countdown.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: Mutex::new(Cell::new(0)),
        }
    }

    /// Arm the countdown with `ticks` ticks.
    pub fn start(&self, ticks: u16) {
        critical_section::with(|cs| self.ticks.borrow(cs).set(ticks));
    }

    /// Force the countdown to the expired state.
    pub fn cancel(&self) {
        self.start(0);
    }

    /// Ticks left before expiry.
    #[must_use]
    pub fn remaining(&self) -> u16 {
        critical_section::with(|cs| self.ticks.borrow(cs).get())
    }

    /// `true` once the countdown has reached zero.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining() == 0
    }

    /// Decrement by one tick, saturating at zero.
    ///
    /// Called from the periodic timer interrupt.
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let cell = self.ticks.borrow(cs);
            cell.set(cell.get().saturating_sub(1));
        });
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking delay that spins on a [`Countdown`].
///
/// The on-target equivalent of the classic busy-wait delay: arm the shared
/// delay countdown, then spin until the tick interrupt has drained it. Host
/// tests use a mock delay instead of this type.
pub struct TickDelay<'a> {
    countdown: &'a Countdown,
}

impl<'a> TickDelay<'a> {
    /// Create a delay spinning on `countdown`.
    #[must_use]
    pub fn new(countdown: &'a Countdown) -> Self {
        Self { countdown }
    }
}

impl DelayNs for TickDelay<'_> {
    #[allow(clippy::arithmetic_side_effects)] // Safety: div/round-up on u64 widened values
    fn delay_ns(&mut self, ns: u32) {
        // Round up to whole ticks so a requested delay is never shortened.
        let ns_per_tick = 1_000_000_000u64 / u64::from(TICK_HZ);
        let ticks = (u64::from(ns) + ns_per_tick - 1) / ns_per_tick;
        #[allow(clippy::cast_possible_truncation)] // Safety: clamped to u16::MAX below
        self.countdown
            .start(ticks.min(u64::from(u16::MAX)) as u16);
        while !self.countdown.is_expired() {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests use unwrap() for readable assertions
mod tests {
    use super::*;

    #[test]
    fn countdown_counts_down_and_saturates() {
        let timer = Countdown::new();
        timer.start(2);
        assert!(!timer.is_expired());
        timer.tick();
        assert_eq!(timer.remaining(), 1);
        timer.tick();
        assert!(timer.is_expired());
        // Further ticks must not wrap below zero.
        timer.tick();
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn new_countdown_starts_expired() {
        let timer = Countdown::new();
        assert!(timer.is_expired());
    }

    #[test]
    fn cancel_forces_expiry() {
        let timer = Countdown::new();
        timer.start(1000);
        timer.cancel();
        assert!(timer.is_expired());
    }

    #[test]
    fn restart_rearms_a_running_countdown() {
        let timer = Countdown::new();
        timer.start(5);
        timer.tick();
        timer.start(5);
        assert_eq!(timer.remaining(), 5);
    }

    #[test]
    fn tick_delay_returns_once_ticked_out() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let timer = Countdown::new();
        let done = AtomicBool::new(false);
        std::thread::scope(|scope| {
            // Stand-in for the periodic timer interrupt.
            scope.spawn(|| {
                while !done.load(Ordering::Relaxed) {
                    timer.tick();
                    std::thread::yield_now();
                }
            });
            TickDelay::new(&timer).delay_ms(3);
            done.store(true, Ordering::Relaxed);
        });
        assert!(timer.is_expired());
    }
}
