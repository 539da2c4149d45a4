//! Atomic state machine for the consumer-side checkout cursor.
//!
//! The source of truth for "is anything checked out, and if so which ring
//! position" is a single atomic word with three logical states:
//!
//! ```text
//! Idle ──try_begin()──▶ Swapping ──commit(pos)──▶ CheckedOut(pos)
//!   ▲                      │                           │
//!   └──────abort()─────────┘◀──────────release()───────┘
//! ```
//!
//! `try_begin` is the only Idle → Swapping transition and is a CAS, so two
//! racing consumers cannot both claim the spare slot: the loser sees the
//! claim and either spins (blocking variant) or fails fast (non-blocking
//! variant). Splitting Swapping from `CheckedOut(pos)` removes the window
//! in which "busy" is set but the position is not yet recorded.

use std::sync::atomic::{AtomicUsize, Ordering};

/// No checkout outstanding.
const IDLE: usize = usize::MAX;
/// A consumer has claimed the spare and is mid-swap.
const SWAPPING: usize = usize::MAX - 1;

/// Decoded checkout state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkout {
    Idle,
    Swapping,
    CheckedOut(usize),
}

/// The atomic word holding the checkout state.
///
/// Positions must stay below `SWAPPING`; with `usize`-indexed rings that
/// leaves the top two values free for the sentinels.
#[derive(Debug)]
pub(crate) struct CheckoutCell(AtomicUsize);

impl CheckoutCell {
    pub(crate) fn new() -> Self {
        Self(AtomicUsize::new(IDLE))
    }

    /// Attempts the Idle → Swapping transition.
    ///
    /// On success the caller owns the spare handle until `abort` or the
    /// `commit`/`release` pair. The Acquire ordering synchronizes with the
    /// Release in `release`, so the new owner observes the previous
    /// consumer's writes to the spare.
    #[inline]
    pub(crate) fn try_begin(&self) -> bool {
        self.0
            .compare_exchange(IDLE, SWAPPING, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Records which ring position was swapped (Swapping → CheckedOut).
    #[inline]
    pub(crate) fn commit(&self, position: usize) {
        debug_assert!(position < SWAPPING, "position collides with sentinel");
        debug_assert_eq!(self.0.load(Ordering::Relaxed), SWAPPING);
        self.0.store(position, Ordering::Release);
    }

    /// Rolls back a claim whose swap never happened (Swapping → Idle).
    #[inline]
    pub(crate) fn abort(&self) {
        debug_assert_eq!(self.0.load(Ordering::Relaxed), SWAPPING);
        self.0.store(IDLE, Ordering::Release);
    }

    /// Ends an outstanding checkout (CheckedOut → Idle).
    ///
    /// The Release ordering publishes the consumer's final accesses to the
    /// checked-out slot before the next `try_begin` can hand it out again.
    #[inline]
    pub(crate) fn release(&self) {
        debug_assert!(matches!(self.load(), Checkout::CheckedOut(_)));
        self.0.store(IDLE, Ordering::Release);
    }

    /// Advisory snapshot of the current state.
    #[inline]
    pub(crate) fn load(&self) -> Checkout {
        match self.0.load(Ordering::Acquire) {
            IDLE => Checkout::Idle,
            SWAPPING => Checkout::Swapping,
            position => Checkout::CheckedOut(position),
        }
    }

    /// Resets to Idle. Requires external quiescence (`&mut` on the ring).
    pub(crate) fn reset(&mut self) {
        *self.0.get_mut() = IDLE;
    }
}
