//! Conversions bridging `muxadc_config` types to `muxadc_core` types.

use crate::config::{DrainCfg, FilterCfg, Timeouts, WindowSize};
use crate::error::BuildError;

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl TryFrom<&muxadc_config::FilterCfg> for FilterCfg {
    type Error = BuildError;

    fn try_from(c: &muxadc_config::FilterCfg) -> Result<Self, Self::Error> {
        Ok(Self {
            window: WindowSize::try_from(c.window)?,
            noise_floor: c.noise_floor,
        })
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&muxadc_config::AcquisitionCfg> for Timeouts {
    fn from(c: &muxadc_config::AcquisitionCfg) -> Self {
        Self {
            conversion_ms: c.conversion_timeout_ms,
        }
    }
}

// ── DrainCfg ─────────────────────────────────────────────────────────────────

impl From<&muxadc_config::Config> for DrainCfg {
    fn from(c: &muxadc_config::Config) -> Self {
        Self {
            interval_ms: c.drain.interval_ms,
            stall_ms: c.acquisition.stall_ms,
        }
    }
}
