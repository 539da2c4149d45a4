use crate::ring::AcqRing;
use parking_lot::MutexGuard;
use std::fmt;
use std::ops::Deref;

/// Exclusive, copy-free view of a frame checked out of the ring.
///
/// The guard owns the slot that was swapped out of the consumer's
/// requested position; the producer cannot reach it through any ring
/// position, so reads need no lock and never block a push. Dropping the
/// guard (or calling [`release`](Self::release)) ends the checkout: the
/// frame goes back to its ring position if the producer has not lapped it
/// (so a repeat request is still an exact hit), otherwise the slot retires
/// to the spare role. Release also runs on panic-unwind, so a crashing
/// consumer does not wedge the ring.
///
/// # Example
///
/// ```
/// use acqring::{AcqRing, Config};
///
/// let ring = AcqRing::<u8>::new(Config::new(4, 3)).unwrap();
/// ring.push(&[1, 2, 3]).unwrap();
///
/// let frame = ring.lock_out_wait(1);
/// assert_eq!(frame.sequence(), Some(1));
/// assert_eq!(&*frame, &[1, 2, 3]);
/// frame.release();
/// ```
pub struct CheckedOutFrame<'a, T> {
    ring: &'a AcqRing<T>,
    handle: usize,
    position: usize,
}

impl<'a, T> CheckedOutFrame<'a, T> {
    pub(crate) fn new(ring: &'a AcqRing<T>, handle: usize, position: usize) -> Self {
        Self {
            ring,
            handle,
            position,
        }
    }

    /// Sequence number of the frame actually obtained, or `None` if the
    /// slot was never written (nothing produced, or the ring was cleared).
    ///
    /// Compare this against the requested sequence to detect substitution:
    /// a stale request is answered with a newer frame, not an error.
    pub fn sequence(&self) -> Option<u64> {
        // SAFETY: the checked-out slot is reachable only through this
        // guard; no other actor can touch it until drop.
        unsafe { (*self.ring.slot_ptr(self.handle)).seq }
    }

    /// Ring position this frame was checked out of.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The frame data. Also available through `Deref`.
    pub fn frame(&self) -> &[T] {
        // SAFETY: same unique-reachability argument as `sequence`.
        unsafe { &(*self.ring.slot_ptr(self.handle)).data }
    }

    /// Ends the checkout. Equivalent to dropping the guard; the explicit
    /// form reads better at call sites that hold a frame for a while.
    pub fn release(self) {}
}

impl<T> Deref for CheckedOutFrame<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.frame()
    }
}

impl<T> Drop for CheckedOutFrame<'_, T> {
    fn drop(&mut self) {
        self.ring.end_checkout(self.handle, self.position);
    }
}

impl<T: fmt::Debug> fmt::Debug for CheckedOutFrame<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedOutFrame")
            .field("sequence", &self.sequence())
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Writable reservation of the slot at the head position.
///
/// The zero-copy producer path: instead of building a frame elsewhere and
/// handing it to [`AcqRing::push`], the caller writes directly into the
/// slot that the next push would target. [`commit`](Self::commit) stamps
/// the sequence number and advances the cursor; dropping the guard without
/// committing abandons the write and the cursor does not move.
///
/// The guard holds the head position's lock for its whole lifetime, so the
/// consumer's swap of that exact position waits until commit or drop. Keep
/// the write short.
pub struct HeadSlot<'a, T> {
    ring: &'a AcqRing<T>,
    handle: MutexGuard<'a, usize>,
    position: usize,
}

impl<'a, T> HeadSlot<'a, T> {
    pub(crate) fn new(ring: &'a AcqRing<T>, handle: MutexGuard<'a, usize>, position: usize) -> Self {
        Self {
            ring,
            handle,
            position,
        }
    }

    /// Ring position being written.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The slot's frame buffer, for writing in place.
    pub fn frame_mut(&mut self) -> &mut [T] {
        // SAFETY: holding the position lock grants exclusive access to the
        // slot it designates.
        unsafe { &mut (*self.ring.slot_ptr(*self.handle)).data }
    }

    /// Publishes the written frame: stamps the next sequence number and
    /// advances the cursor. Returns the ring position written.
    pub fn commit(self) -> usize {
        let seq = self.ring.advance_count();
        // SAFETY: the position lock is held until `self` drops at the end
        // of this function.
        unsafe {
            (*self.ring.slot_ptr(*self.handle)).seq = Some(seq);
        }
        self.position
    }
}

impl<T: fmt::Debug> fmt::Debug for HeadSlot<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadSlot")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
