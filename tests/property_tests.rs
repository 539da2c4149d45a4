//! Property-based tests for the acquisition ring.
//!
//! These verify the sequence/substitution contract over arbitrary ring
//! shapes and request patterns rather than hand-picked scenarios.

use acqring::{AcqRing, Config};
use proptest::prelude::*;

proptest! {
    /// The cumulative count equals the number of successful pushes, and
    /// positions cycle as `(seq - 1) mod ring_size`.
    #[test]
    fn prop_count_and_positions(
        ring_size in 1usize..16,
        pushes in 0u64..100,
    ) {
        let ring = AcqRing::<u64>::new(Config::new(ring_size, 1)).unwrap();
        for seq in 1..=pushes {
            let position = ring.push(&[seq]).unwrap();
            prop_assert_eq!(position, ((seq - 1) % ring_size as u64) as usize);
            prop_assert_eq!(ring.latest_count(), seq);
        }
        prop_assert_eq!(ring.latest_count(), pushes);
    }

    /// A lock-out always lands inside the resident window, with exact hits
    /// for resident requests and the documented substitutions at either
    /// end of the window.
    #[test]
    fn prop_substitution_contract(
        ring_size in 1usize..16,
        pushes in 0u64..64,
        request in 0u64..96,
    ) {
        let ring = AcqRing::<u64>::new(Config::new(ring_size, 2)).unwrap();
        for seq in 1..=pushes {
            ring.push(&[seq, seq * 3]).unwrap();
        }

        let frame = ring.lock_out_wait(request);
        match frame.sequence() {
            None => prop_assert_eq!(pushes, 0, "empty slot with {} pushes", pushes),
            Some(seq) => {
                let oldest = pushes.saturating_sub(ring_size as u64 - 1).max(1);
                prop_assert!(seq >= oldest && seq <= pushes,
                    "sequence {} outside resident window [{}, {}]", seq, oldest, pushes);

                if request >= oldest && request <= pushes {
                    prop_assert_eq!(seq, request, "resident request must be an exact hit");
                } else if request < oldest {
                    prop_assert_eq!(seq, oldest, "evicted request must yield the oldest resident");
                    prop_assert!(seq > request);
                } else {
                    prop_assert_eq!(seq, pushes, "future request must yield the newest frame");
                }

                // The payload always matches the stamped sequence.
                prop_assert_eq!(&*frame, &[seq, seq * 3]);
            }
        }
    }

    /// Push followed by an immediate lock-out of that sequence returns
    /// bit-identical data.
    #[test]
    fn prop_round_trip(
        frame in prop::collection::vec(any::<u32>(), 1..64),
    ) {
        let ring = AcqRing::<u32>::new(Config::new(4, frame.len())).unwrap();
        ring.push(&frame).unwrap();
        let out = ring.lock_out_wait(ring.latest_count());
        prop_assert_eq!(out.sequence(), Some(1));
        prop_assert_eq!(&*out, frame.as_slice());
    }

    /// clear() restores the initial state regardless of prior traffic,
    /// including an interleaved checkout.
    #[test]
    fn prop_clear_resets(
        ring_size in 1usize..8,
        pushes in 0u64..32,
        request in 0u64..32,
    ) {
        let mut ring = AcqRing::<u64>::new(Config::new(ring_size, 1)).unwrap();
        for seq in 1..=pushes {
            ring.push(&[seq]).unwrap();
        }
        drop(ring.lock_out_wait(request));
        ring.clear();

        prop_assert_eq!(ring.latest_count(), 0);
        prop_assert_eq!(ring.retained(), None);
        prop_assert_eq!(ring.lock_out_wait(request.max(1)).sequence(), None);
    }
}
