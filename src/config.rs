use crate::error::ConfigError;

/// Construction parameters for [`AcqRing`](crate::AcqRing).
///
/// Both values are fixed for the lifetime of the ring: all slot storage is
/// allocated once at construction and never grows, shrinks or moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of ring positions (frames retained before eviction).
    pub ring_size: usize,
    /// Elements per frame. Every pushed frame must have exactly this length.
    pub frame_len: usize,
}

impl Config {
    /// Creates a new configuration.
    pub const fn new(ring_size: usize, frame_len: usize) -> Self {
        Self {
            ring_size,
            frame_len,
        }
    }

    /// Total slots backing the ring: one per position plus the spare that
    /// is swapped in during a lock-out.
    #[inline]
    pub const fn slot_count(&self) -> usize {
        self.ring_size + 1
    }

    /// Rejects degenerate dimensions before any allocation happens.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_size == 0 {
            return Err(ConfigError::ZeroRingSize);
        }
        if self.frame_len == 0 {
            return Err(ConfigError::ZeroFrameLen);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring_size: 32,
            frame_len: 4096,
        }
    }
}
