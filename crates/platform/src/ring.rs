//! Interrupt-safe, const-generic byte ring buffer.
//!
//! `ByteRing<N>` is the reusable single-producer / single-consumer staging
//! buffer between interrupt context and the main loop (receive ISRs push,
//! the loop pops). Every operation runs inside a `critical_section`, so the
//! two contexts may share one instance through a `&'static` without further
//! locking; methods therefore take `&self`.
//!
//! Cursors wrap modulo `N` and an explicit `count` field distinguishes the
//! empty and full states — Full and Empty are derived, never stored.

use core::cell::RefCell;

use critical_section::Mutex;
use thiserror_no_std::Error;

/// Errors returned by ring buffer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingError {
    /// The buffer holds `N` bytes; the push was rejected.
    #[error("ring buffer full")]
    Full,
    /// The buffer holds no bytes.
    #[error("ring buffer empty")]
    Empty,
    /// A peek offset referred past the last valid byte.
    #[error("peek offset out of bounds")]
    OutOfBounds,
}

struct Inner<const N: usize> {
    buf: [u8; N],
    /// Index of the next slot to write.
    producer: usize,
    /// Index of the next slot to read.
    consumer: usize,
    /// Number of valid bytes currently held; never exceeds `N`.
    count: usize,
}

/// A fixed-capacity, interrupt-safe byte ring.
pub struct ByteRing<const N: usize> {
    inner: Mutex<RefCell<Inner<N>>>,
}

impl<const N: usize> ByteRing<N> {
    /// Create a new, empty ring.
    ///
    /// `const` so rings can live in `static`s shared with interrupt context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                buf: [0; N],
                producer: 0,
                consumer: 0,
                count: 0,
            })),
        }
    }

    /// Append one byte at the producer cursor.
    #[allow(clippy::indexing_slicing)] // Safety: producer < N invariant
    #[allow(clippy::arithmetic_side_effects)] // Safety: wrap via % N; count < N checked
    pub fn push(&self, byte: u8) -> Result<(), RingError> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.count == N {
                return Err(RingError::Full);
            }
            let at = inner.producer;
            inner.buf[at] = byte;
            inner.producer = (at + 1) % N;
            inner.count += 1;
            Ok(())
        })
    }

    /// Remove and return the oldest byte.
    #[allow(clippy::indexing_slicing)] // Safety: consumer < N invariant
    #[allow(clippy::arithmetic_side_effects)] // Safety: wrap via % N; count > 0 checked
    pub fn pop(&self) -> Result<u8, RingError> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.count == 0 {
                return Err(RingError::Empty);
            }
            let at = inner.consumer;
            let byte = inner.buf[at];
            inner.consumer = (at + 1) % N;
            inner.count -= 1;
            Ok(byte)
        })
    }

    /// Read the byte `offset` positions past the consumer cursor without
    /// removing anything.
    #[allow(clippy::indexing_slicing)] // Safety: (consumer + offset) % N < N
    #[allow(clippy::arithmetic_side_effects)] // Safety: wrap via % N; offset < count checked
    pub fn peek(&self, offset: usize) -> Result<u8, RingError> {
        critical_section::with(|cs| {
            let inner = self.inner.borrow_ref(cs);
            if offset >= inner.count {
                return Err(RingError::OutOfBounds);
            }
            Ok(inner.buf[(inner.consumer + offset) % N])
        })
    }

    /// Discard the most recently pushed byte, rolling the producer cursor
    /// back one slot.
    ///
    /// This is the "discard partial frame" operation — it undoes a push, it
    /// does not dequeue.
    #[allow(clippy::arithmetic_side_effects)] // Safety: producer > 0 in the else branch; count > 0 checked
    pub fn drop_last(&self) -> Result<(), RingError> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.count == 0 {
                return Err(RingError::Empty);
            }
            inner.producer = if inner.producer == 0 {
                N - 1
            } else {
                inner.producer - 1
            };
            inner.count -= 1;
            Ok(())
        })
    }

    /// Discard every byte and reset both cursors.
    pub fn clear(&self) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            inner.producer = 0;
            inner.consumer = 0;
            inner.count = 0;
        });
    }

    /// Number of bytes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).count)
    }

    /// `true` when no bytes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when the buffer holds `N` bytes.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Maximum number of bytes the ring can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
