//! Round-robin channel scheduler and completion handler.
//!
//! The scheduler owns the converter. Each completed conversion is clamped, pushed into
//! its channel's ring and the next channel in the route table is armed before the
//! handler returns, so the converter never idles.

use std::sync::Arc;
use std::time::Duration;

use muxadc_traits::{CHANNEL_COUNT, Channel, Conversion, Converter};

use crate::error::AdcError;
use crate::hw_error::map_hw_error;
use crate::state::AcquisitionState;

/// Scan route: `ROUTES[k]` is the channel armed after channel `k` completes.
pub const ROUTES: [Channel; CHANNEL_COUNT] = [
    Channel::ALL[1],
    Channel::ALL[2],
    Channel::ALL[3],
    Channel::ALL[4],
    Channel::ALL[5],
    Channel::ALL[6],
    Channel::ALL[7],
    Channel::ALL[0],
];

#[inline]
pub fn next_channel(channel: Channel) -> Channel {
    ROUTES[channel.index()]
}

/// Readings strictly below `threshold` become 0; everything else passes unchanged.
#[inline]
pub const fn clamp_noise_floor(raw: u16, threshold: u16) -> u16 {
    if raw < threshold { 0 } else { raw }
}

pub struct Scheduler {
    converter: Box<dyn Converter + Send>,
    state: Arc<AcquisitionState>,
    /// Channel most recently targeted by `arm`, `None` before `start`. Set even when
    /// the arm fails so that `rearm` retries the same channel.
    armed: Option<Channel>,
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("armed", &self.armed)
            .finish()
    }
}

impl Scheduler {
    pub fn new(converter: Box<dyn Converter + Send>, state: Arc<AcquisitionState>) -> Self {
        Self {
            converter,
            state,
            armed: None,
        }
    }

    /// Arm channel 0. Must run once before any completion is handled.
    pub fn start(&mut self) -> Result<(), AdcError> {
        self.arm(Channel::FIRST)
    }

    #[inline]
    pub fn armed(&self) -> Option<Channel> {
        self.armed
    }

    fn arm(&mut self, channel: Channel) -> Result<(), AdcError> {
        self.armed = Some(channel);
        self.converter.arm(channel).map_err(|e| map_hw_error(&*e))
    }

    /// Re-arm the pending channel after a failed conversion or a failed arm.
    pub fn rearm(&mut self) -> Result<(), AdcError> {
        self.arm(self.armed.unwrap_or(Channel::FIRST))
    }

    /// Completion handler: store the reading and arm the next channel.
    ///
    /// Returns the channel that was armed.
    pub fn on_complete(&mut self, conversion: Conversion) -> Result<Channel, AdcError> {
        let Conversion { channel, raw } = conversion;
        if self.armed != Some(channel) {
            tracing::warn!(
                expected = ?self.armed.map(Channel::index),
                reported = channel.index(),
                "completion for a channel that was not armed"
            );
        }
        let value = clamp_noise_floor(raw, self.state.noise_floor());
        self.state.record(channel, value);
        tracing::trace!(channel = channel.index(), raw, value, "conversion complete");

        let next = next_channel(channel);
        self.arm(next)?;
        Ok(next)
    }

    /// Block until the armed conversion completes, then run the handler.
    pub fn wait_and_handle(&mut self, timeout: Duration) -> Result<Conversion, AdcError> {
        let conversion = self
            .converter
            .wait_complete(timeout)
            .map_err(|e| map_hw_error(&*e))?;
        self.on_complete(conversion)?;
        Ok(conversion)
    }

    pub fn state(&self) -> &Arc<AcquisitionState> {
        &self.state
    }
}
