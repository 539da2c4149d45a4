use thiserror::Error;

/// Errors raised when constructing an [`AcqRing`](crate::AcqRing) with
/// degenerate dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The ring must hold at least one frame.
    #[error("ring_size must be greater than zero")]
    ZeroRingSize,
    /// Frames must contain at least one element.
    #[error("frame_len must be greater than zero")]
    ZeroFrameLen,
}

/// Error returned when a pushed frame does not match the configured
/// frame length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("frame length mismatch: expected {expected} elements, got {actual}")]
pub struct FrameLenError {
    /// The configured `frame_len`.
    pub expected: usize,
    /// The length of the frame supplied to `push`.
    pub actual: usize,
}

/// Failure modes of [`AcqRing::lock_out_nowait`](crate::AcqRing::lock_out_nowait).
///
/// Neither variant is a fault: both are normal non-blocking-try outcomes and
/// carry no partial effects. The caller retries or gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LockOutError {
    /// A frame is already checked out; only one lock-out may be
    /// outstanding at a time.
    #[error("a frame is already checked out")]
    AlreadyCheckedOut,
    /// The producer currently holds the target slot's lock (mid-copy).
    #[error("target slot is busy with a producer write")]
    SlotBusy,
}
