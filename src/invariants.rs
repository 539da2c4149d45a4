//! Debug assertion macros for the structural invariants of the ring.
//!
//! Active only in debug builds, zero overhead in release. The invariants
//! guarded here are the ones that cannot be expressed in the type system:
//! handle conservation (every handle indexes the arena), cursor
//! monotonicity, and slot/frame shape.

/// Assert that a slot handle indexes the arena.
///
/// Handle conservation: the ring positions plus the spare/checked-out
/// handle are a permutation of `0..slot_count`, so any handle read from a
/// position or the spare cell must be in range.
macro_rules! debug_assert_handle_live {
    ($handle:expr, $slot_count:expr) => {
        debug_assert!(
            $handle < $slot_count,
            "handle {} outside slot arena of {} slots",
            $handle,
            $slot_count
        )
    };
}

/// Assert that the cumulative push count only moves forward.
///
/// Used at the single point where the counter advances (head commit).
macro_rules! debug_assert_count_monotonic {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new > $old,
            "push count went backwards: {} -> {}",
            $old,
            $new
        )
    };
}

/// Assert that a ring position is addressable.
macro_rules! debug_assert_position {
    ($position:expr, $ring_size:expr) => {
        debug_assert!(
            $position < $ring_size,
            "position {} outside ring of size {}",
            $position,
            $ring_size
        )
    };
}

pub(crate) use debug_assert_count_monotonic;
pub(crate) use debug_assert_handle_live;
pub(crate) use debug_assert_position;
