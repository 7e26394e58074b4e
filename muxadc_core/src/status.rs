//! Outcome of a single drain attempt.

/// Result of `MultiChannelAdc::drain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Not enough full scan cycles yet; the output store was left untouched.
    Pending { cycles: u32, needed: u32 },
    /// Every channel was filtered and written to the output store.
    Published,
}

impl DrainStatus {
    #[inline]
    pub fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }
}
