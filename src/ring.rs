use crate::checkout::{Checkout, CheckoutCell};
use crate::error::{ConfigError, FrameLenError, LockOutError};
use crate::invariants::{
    debug_assert_count_monotonic, debug_assert_handle_live, debug_assert_position,
};
use crate::{CheckedOutFrame, Config, HeadSlot};
use crossbeam_utils::{Backoff, CachePadded};
use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::mem;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// OWNERSHIP & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Slot storage lives in a fixed arena of `ring_size + 1` entries that is
// allocated once and never moves. What moves between roles are integer
// *handles* into the arena:
//
// - `ring[p]` holds the handle currently playing ring position `p`,
//   guarded by that position's mutex;
// - exactly one further handle is either idle in `spare` or owned by the
//   outstanding `CheckedOutFrame` guard.
//
// A lock-out never copies frame data. It swaps the spare handle into the
// requested position (under that position's mutex) and walks away with the
// handle that was there, so the producer keeps pushing into the ring while
// the consumer reads storage no position can reach. Release swaps the
// frame back into its position unless the producer lapped it meanwhile,
// in which case the newer frame stays and the old one becomes the spare.
//
// ## Who touches what
//
// - `ring[p]` handle + the slot it designates: any actor, but only while
//   holding position `p`'s mutex. Producer critical sections are one frame
//   copy; consumer critical sections are one handle exchange. Both O(1).
// - `spare`: exclusively owned between a successful Idle -> Swapping claim
//   of `checkout` and the matching release. The claim is a CAS, so the
//   owner is unique even under (unsupported) concurrent consumers.
// - the checked-out slot: reachable only through the guard; no lock needed
//   while reading it.
// - `count`: advanced only by the producer (single-producer contract),
//   read advisorily by everyone else.
//
// ## Happens-before
//
// - producer frame write -> position unlock -> consumer position lock
//   during swap -> consumer reads of the checked-out slot;
// - consumer reads -> `checkout` Release store on guard drop -> next
//   claim's Acquire CAS -> position lock -> producer write into the
//   storage that was just returned to the spare role.
//
// =============================================================================

/// One storage unit of the arena: a fixed-length frame buffer plus the
/// sequence stamped at the moment it was last written.
///
/// `seq == None` means the slot has never been written since construction
/// or the last [`AcqRing::clear`].
#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub(crate) seq: Option<u64>,
    pub(crate) data: Box<[T]>,
}

/// Push-only acquisition ring buffer with zero-copy lock-out.
///
/// A single producer streams fixed-size frames via [`push`](Self::push) or
/// the [`lock_out_head`](Self::lock_out_head) write path; each frame gets a
/// 1-based, monotonically increasing sequence number. A single consumer
/// checks any frame out of the ring by sequence number via
/// [`lock_out_wait`](Self::lock_out_wait) /
/// [`lock_out_nowait`](Self::lock_out_nowait); if the requested frame has
/// been evicted by newer pushes the closest remaining frame is substituted
/// and the guard reports the sequence actually obtained.
///
/// Eviction is load-shedding by design: a push never waits for the
/// consumer, and overwriting an unconsumed frame is not an error.
pub struct AcqRing<T> {
    /// Ring position -> arena handle. Each position's mutex guards both
    /// the handle value and the slot it designates.
    ring: Box<[Mutex<usize>]>,
    /// The slot arena: `ring_size + 1` fixed storage units.
    slots: Box<[UnsafeCell<Slot<T>>]>,
    /// The one handle not addressed by any ring position. Guarded by the
    /// checkout state machine, not a lock.
    spare: UnsafeCell<usize>,
    /// Cumulative successful pushes; sequence of the newest frame.
    count: CachePadded<AtomicU64>,
    /// Idle / Swapping / CheckedOut(position).
    checkout: CachePadded<CheckoutCell>,
    config: Config,
}

// SAFETY: the UnsafeCell contents are governed by the protocol above: slots
// reachable from ring positions are accessed only under the position mutex,
// the spare cell only under the checkout claim, and the checked-out slot
// only through the unique guard. `T: Send` is required because frames move
// between the producer and consumer threads.
unsafe impl<T: Send> Send for AcqRing<T> {}
unsafe impl<T: Send> Sync for AcqRing<T> {}

impl<T> AcqRing<T> {
    /// Creates a ring with all slot storage pre-allocated.
    ///
    /// `T: Clone + Default` keeps every slot initialized from the start, so
    /// a lock-out that lands on a never-written slot still hands out
    /// defined data (with [`CheckedOutFrame::sequence`] reporting `None`).
    pub fn new(config: Config) -> Result<Self, ConfigError>
    where
        T: Clone + Default,
    {
        config.validate()?;

        let slots = (0..config.slot_count())
            .map(|_| {
                UnsafeCell::new(Slot {
                    seq: None,
                    data: vec![T::default(); config.frame_len].into_boxed_slice(),
                })
            })
            .collect();
        let ring = (0..config.ring_size).map(Mutex::new).collect();

        Ok(Self {
            ring,
            slots,
            // The extra slot starts life as the spare.
            spare: UnsafeCell::new(config.ring_size),
            count: CachePadded::new(AtomicU64::new(0)),
            checkout: CachePadded::new(CheckoutCell::new()),
            config,
        })
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Number of ring positions.
    #[inline]
    pub fn ring_size(&self) -> usize {
        self.config.ring_size
    }

    /// Elements per frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.config.frame_len
    }

    /// Cumulative number of successful pushes, which is also the sequence
    /// number of the newest frame (0 before the first push).
    ///
    /// Advisory: no locking, approximate under a concurrent push.
    #[inline]
    pub fn latest_count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Whether a frame is currently checked out (or a swap is in flight).
    ///
    /// Advisory, like [`latest_count`](Self::latest_count).
    pub fn is_checked_out(&self) -> bool {
        !matches!(self.checkout.load(), Checkout::Idle)
    }

    /// Range of sequence numbers currently resident in the ring, `None`
    /// before the first push. Advisory under a concurrent push; the
    /// authoritative staleness check is comparing a guard's
    /// [`sequence`](CheckedOutFrame::sequence) against the request.
    pub fn retained(&self) -> Option<RangeInclusive<u64>> {
        let count = self.latest_count();
        if count == 0 {
            return None;
        }
        Some(self.oldest_resident(count)..=count)
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Copies `frame` into the slot at the head position, stamps the next
    /// sequence number and advances the cursor. Returns the ring position
    /// written.
    ///
    /// Blocks only if the consumer is mid-swap of that exact position,
    /// which is a bounded O(1) wait. May overwrite a frame the consumer
    /// never obtained; that is eviction, not an error.
    pub fn push(&self, frame: &[T]) -> Result<usize, FrameLenError>
    where
        T: Copy,
    {
        if frame.len() != self.config.frame_len {
            return Err(FrameLenError {
                expected: self.config.frame_len,
                actual: frame.len(),
            });
        }
        let mut head = self.lock_out_head();
        head.frame_mut().copy_from_slice(frame);
        Ok(head.commit())
    }

    /// Zero-copy producer path: blocking-acquires the head position's lock
    /// and returns a guard for writing the frame in place.
    ///
    /// [`HeadSlot::commit`] stamps the sequence and advances the cursor;
    /// dropping the guard without committing abandons the write. The guard
    /// holds the position lock for its whole lifetime, so this path and
    /// [`push`](Self::push) must not be driven from two producer threads
    /// at once.
    pub fn lock_out_head(&self) -> HeadSlot<'_, T> {
        let position = self.head_position();
        let handle = self.ring[position].lock();
        debug_assert_handle_live!(*handle, self.config.slot_count());
        HeadSlot::new(self, handle, position)
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Checks the frame with sequence `n` out of the ring, blocking until
    /// no other checkout is outstanding and the target slot is free.
    ///
    /// The returned guard reads the frame without any copy; its
    /// [`sequence`](CheckedOutFrame::sequence) equals `n` only on an exact
    /// hit. If `n` was evicted, the oldest still-resident frame is
    /// substituted; if `n` has not been produced yet, the newest one is.
    ///
    /// The wait has no timeout. Calling this while a guard from the same
    /// ring is still alive on the same thread deadlocks; drop or
    /// [`release`](CheckedOutFrame::release) the previous guard first.
    pub fn lock_out_wait(&self, n: u64) -> CheckedOutFrame<'_, T> {
        let backoff = Backoff::new();
        while !self.checkout.try_begin() {
            backoff.snooze();
        }
        let position = self.position_for(n);
        let mut slot = self.ring[position].lock();
        let handle = self.swap_in_spare(&mut slot);
        drop(slot);
        self.checkout.commit(position);
        CheckedOutFrame::new(self, handle, position)
    }

    /// Non-blocking variant of [`lock_out_wait`](Self::lock_out_wait).
    ///
    /// Fails immediately with [`LockOutError::AlreadyCheckedOut`] if a
    /// checkout is outstanding, or [`LockOutError::SlotBusy`] if the
    /// producer holds the target slot's lock. Failure has no partial
    /// effects: the spare and the cursor state are untouched.
    pub fn lock_out_nowait(&self, n: u64) -> Result<CheckedOutFrame<'_, T>, LockOutError> {
        if !self.checkout.try_begin() {
            return Err(LockOutError::AlreadyCheckedOut);
        }
        let position = self.position_for(n);
        match self.ring[position].try_lock() {
            Some(mut slot) => {
                let handle = self.swap_in_spare(&mut slot);
                drop(slot);
                self.checkout.commit(position);
                Ok(CheckedOutFrame::new(self, handle, position))
            }
            None => {
                self.checkout.abort();
                Err(LockOutError::SlotBusy)
            }
        }
    }

    // ---------------------------------------------------------------------
    // LIFECYCLE
    // ---------------------------------------------------------------------

    /// Resets the ring to its initial state: every slot's sequence becomes
    /// empty, the push count returns to 0 and the handle layout to the
    /// identity. No storage is deallocated.
    ///
    /// Taking `&mut self` makes the quiescence requirement structural: the
    /// borrow checker rules out an in-flight push or lock-out.
    pub fn clear(&mut self) {
        for (position, handle) in self.ring.iter_mut().enumerate() {
            *handle.get_mut() = position;
        }
        for slot in &mut self.slots {
            slot.get_mut().seq = None;
        }
        *self.spare.get_mut() = self.config.ring_size;
        *self.count.get_mut() = 0;
        self.checkout.reset();
    }

    // ---------------------------------------------------------------------
    // INTERNAL
    // ---------------------------------------------------------------------

    /// Next ring position to receive a push. Derived from the push count,
    /// so the `push_index = (count - 1) mod ring_size` invariant cannot
    /// drift: there is no second cursor to keep consistent.
    #[inline]
    fn head_position(&self) -> usize {
        // Relaxed: the producer is the only writer of `count`.
        (self.count.load(Ordering::Relaxed) % self.config.ring_size as u64) as usize
    }

    /// Sequence of the oldest frame still resident, given the newest.
    #[inline]
    fn oldest_resident(&self, count: u64) -> u64 {
        count.saturating_sub(self.config.ring_size as u64 - 1).max(1)
    }

    /// Maps a requested sequence number to the ring position to lock.
    ///
    /// The request is first clamped into the resident window
    /// `[oldest, count]`, which realizes the substitution contract: an
    /// evicted request lands on the oldest still-resident frame, a
    /// not-yet-produced request on the newest. The clamp uses an advisory
    /// counter read; under a concurrent push the guard's stamped sequence
    /// remains the source of truth.
    fn position_for(&self, n: u64) -> usize {
        let count = self.latest_count();
        let target = if count == 0 {
            // Nothing produced yet: land on the natural position for `n`;
            // the slot there reports an empty sequence.
            n.max(1)
        } else {
            n.clamp(self.oldest_resident(count), count)
        };
        let position = ((target - 1) % self.config.ring_size as u64) as usize;
        debug_assert_position!(position, self.config.ring_size);
        position
    }

    /// Exchanges the spare handle with the one at a locked position,
    /// returning the handle now owned by the checkout.
    ///
    /// Caller must hold the Swapping claim (exclusive spare access) and
    /// the position's mutex.
    fn swap_in_spare(&self, slot: &mut usize) -> usize {
        // SAFETY: the Swapping claim makes this thread the unique spare
        // accessor until commit/abort.
        let spare = unsafe { *self.spare.get() };
        debug_assert_handle_live!(spare, self.config.slot_count());
        mem::replace(slot, spare)
    }

    /// Raw access to a slot by handle. Callers uphold the access protocol
    /// documented at the top of this module.
    pub(crate) fn slot_ptr(&self, handle: usize) -> *mut Slot<T> {
        debug_assert_handle_live!(handle, self.config.slot_count());
        self.slots[handle].get()
    }

    /// Advances the push count by one and returns the new value, which is
    /// the sequence to stamp. Called with the head position lock held.
    pub(crate) fn advance_count(&self) -> u64 {
        let old = self.count.fetch_add(1, Ordering::Release);
        debug_assert_count_monotonic!(old, old + 1);
        old + 1
    }

    /// Ends a checkout, restoring the frame's residency where possible.
    /// Called from the guard's drop path.
    ///
    /// If the position the frame came from has not been re-pushed in the
    /// meantime, the checked-out handle is swapped back in so the frame
    /// stays resident and a repeat request is still an exact hit. If the
    /// producer has lapped the position, the newer frame wins and the
    /// checked-out handle retires to the spare role. Handles move, data
    /// never does, and the position lock is held for one comparison.
    pub(crate) fn end_checkout(&self, handle: usize, position: usize) {
        debug_assert_handle_live!(handle, self.config.slot_count());
        debug_assert_position!(position, self.config.ring_size);
        {
            let mut slot = self.ring[position].lock();
            // SAFETY: the outstanding checkout keeps the checked-out slot
            // exclusive to this thread, and the position lock covers the
            // resident slot. `None < Some(_)`, so a never-written resident
            // always loses to a stamped frame.
            let retired = unsafe {
                let ours = (*self.slot_ptr(handle)).seq;
                let theirs = (*self.slot_ptr(*slot)).seq;
                if ours > theirs {
                    mem::replace(&mut *slot, handle)
                } else {
                    handle
                }
            };
            // SAFETY: exclusive spare access until the release below; the
            // Release store publishes this write before the next claim.
            unsafe {
                *self.spare.get() = retired;
            }
        }
        self.checkout.release();
    }
}

impl<T> std::fmt::Debug for AcqRing<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcqRing")
            .field("ring_size", &self.config.ring_size)
            .field("frame_len", &self.config.frame_len)
            .field("count", &self.latest_count())
            .field("checkout", &self.checkout.load())
            .finish_non_exhaustive()
    }
}
