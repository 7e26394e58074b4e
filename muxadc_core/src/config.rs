//! Configuration types for the acquisition pipeline.
//!
//! These are the runtime structs used by `MultiChannelAdc` and the runner.
//! They are separate from the TOML-deserialized config in `muxadc_config`.

use crate::error::BuildError;

/// Median window, which is also the per-channel ring capacity.
///
/// Filtering cost grows linearly with the window; 5 is the reference size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowSize {
    #[default]
    Five = 5,
    Seven = 7,
    Nine = 9,
    Eleven = 11,
}

impl WindowSize {
    /// Largest supported window, used to size stack snapshots.
    pub const MAX: usize = 11;

    #[inline]
    pub const fn get(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for WindowSize {
    type Error = BuildError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        match n {
            5 => Ok(Self::Five),
            7 => Ok(Self::Seven),
            9 => Ok(Self::Nine),
            11 => Ok(Self::Eleven),
            _ => Err(BuildError::InvalidConfig("window must be 5, 7, 9 or 11")),
        }
    }
}

/// Filter stage configuration.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    pub window: WindowSize,
    /// Readings strictly below this are stored as 0.
    pub noise_floor: u16,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            window: WindowSize::Five,
            noise_floor: 20,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max wait for one conversion (ms).
    pub conversion_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { conversion_ms: 50 }
    }
}

/// Foreground drain loop configuration.
#[derive(Debug, Clone)]
pub struct DrainCfg {
    /// Drain cadence (ms).
    pub interval_ms: u64,
    /// Fail the run when no conversion completes for this long. 0 disables.
    pub stall_ms: u64,
}

impl Default for DrainCfg {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            stall_ms: 0,
        }
    }
}
