//! acqring - Push-Only Acquisition Ring with Zero-Copy Lock-Out
//!
//! A fixed-capacity circular buffer for single-producer single-consumer
//! frame streaming. The producer pushes fixed-size frames that are stamped
//! with a monotonically increasing sequence number; the consumer can "lock
//! out" any frame by sequence number and read it in place, without copying
//! and without ever stalling the producer.
//!
//! The trick is one spare slot: a lock-out swaps the spare *handle* into
//! the requested ring position and walks away with the slot that was
//! there. The producer keeps writing into the ring; the consumer reads
//! storage no ring position can reach. If the requested frame was already
//! evicted by newer pushes, the closest remaining frame is substituted and
//! the guard reports the sequence it actually holds.
//!
//! # Key properties
//!
//! - All slot storage allocated once at construction; no allocation, no
//!   data movement in steady state
//! - A push never waits for the consumer (eviction is load-shedding, not
//!   an error)
//! - Per-position locks with O(1) critical sections; checkout state is a
//!   single atomic word
//! - RAII guards: dropping a checked-out frame releases it, even on panic
//!
//! # Example
//!
//! ```
//! use acqring::{AcqRing, Config};
//!
//! let ring = AcqRing::<u16>::new(Config::new(4, 2)).unwrap();
//!
//! // Producer side: copy a frame in, or write one in place.
//! ring.push(&[10, 11]).unwrap();
//! let mut head = ring.lock_out_head();
//! head.frame_mut().copy_from_slice(&[20, 21]);
//! head.commit();
//!
//! // Consumer side: check a frame out by sequence number.
//! let frame = ring.lock_out_wait(2);
//! assert_eq!(frame.sequence(), Some(2)); // exact hit
//! assert_eq!(&*frame, &[20, 21]);
//! drop(frame); // releases the checkout
//! ```

mod checkout;
mod config;
mod error;
mod frame;
mod invariants;
mod ring;

pub use config::Config;
pub use error::{ConfigError, FrameLenError, LockOutError};
pub use frame::{CheckedOutFrame, HeadSlot};
pub use ring::AcqRing;
