//! The acquisition pipeline front end (`MultiChannelAdc`).
//!
//! Owns the shared context, the single median filter used by the drain step and, until
//! acquisition moves to its own thread, the scheduler.

use std::sync::Arc;
use std::time::Duration;

use muxadc_traits::{CHANNEL_COUNT, Channel, Clock, Conversion};

use crate::config::{Timeouts, WindowSize};
use crate::error::AdcError;
use crate::median::MedianFilter;
use crate::sampler::AcquisitionThread;
use crate::scheduler::Scheduler;
use crate::state::AcquisitionState;
use crate::status::DrainStatus;
use crate::store::OutputStore;

pub struct MultiChannelAdc {
    pub(crate) state: Arc<AcquisitionState>,
    /// Shared across channels; drain resets it before each channel.
    pub(crate) filter: MedianFilter<u16>,
    pub(crate) scheduler: Option<Scheduler>,
    pub(crate) thread: Option<AcquisitionThread>,
    pub(crate) timeouts: Timeouts,
}

impl core::fmt::Debug for MultiChannelAdc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MultiChannelAdc")
            .field("window", &self.state.window().get())
            .field("noise_floor", &self.state.noise_floor())
            .field("threaded", &self.thread.is_some())
            .field("published", &self.state.store().is_published())
            .finish()
    }
}

impl MultiChannelAdc {
    /// Start building a pipeline.
    pub fn builder() -> crate::builder::MultiChannelAdcBuilder {
        crate::builder::MultiChannelAdcBuilder::default()
    }

    /// Arm channel 0. Idempotent; must run before completions are handled.
    pub fn begin(&mut self) -> Result<(), AdcError> {
        match self.scheduler.as_mut() {
            Some(s) if s.armed().is_none() => s.start(),
            Some(_) => Ok(()),
            None if self.thread.is_some() => Ok(()),
            None => Err(AdcError::State("scheduler unavailable".into())),
        }
    }

    /// Move the completion handler onto its own thread.
    pub fn spawn_acquisition(&mut self) -> Result<(), AdcError> {
        if self.thread.is_some() {
            return Ok(());
        }
        self.begin()?;
        let scheduler = self
            .scheduler
            .take()
            .ok_or_else(|| AdcError::State("scheduler unavailable".into()))?;
        let timeout = Duration::from_millis(self.timeouts.conversion_ms);
        self.thread = Some(AcquisitionThread::spawn(scheduler, timeout)?);
        tracing::debug!(window = self.state.window().get(), "acquisition thread started");
        Ok(())
    }

    #[inline]
    pub fn is_threaded(&self) -> bool {
        self.thread.is_some()
    }

    /// Deliver a completion directly to the handler (foreground-driven acquisition).
    ///
    /// Returns the channel armed next.
    pub fn on_complete(&mut self, conversion: Conversion) -> Result<Channel, AdcError> {
        let scheduler = self.foreground_scheduler()?;
        scheduler.on_complete(conversion)
    }

    /// Wait for the armed conversion in the caller's thread and handle it.
    pub fn poll_once(&mut self) -> Result<Conversion, AdcError> {
        let timeout = Duration::from_millis(self.timeouts.conversion_ms);
        let scheduler = self.foreground_scheduler()?;
        scheduler.wait_and_handle(timeout)
    }

    fn foreground_scheduler(&mut self) -> Result<&mut Scheduler, AdcError> {
        if self.thread.is_some() {
            return Err(AdcError::State(
                "completions are handled by the acquisition thread".into(),
            ));
        }
        self.begin()?;
        self.scheduler
            .as_mut()
            .ok_or_else(|| AdcError::State("scheduler unavailable".into()))
    }

    /// True once enough full scan cycles have accumulated for a drain to publish.
    pub fn drain_due(&self) -> bool {
        self.state.cycles() >= self.needed_cycles() && self.state.all_rings_full()
    }

    fn needed_cycles(&self) -> u32 {
        self.state.window().get() as u32
    }

    /// Filter every channel's ring and publish the medians, if a drain is due.
    ///
    /// Each ring is copied under its own lock, so the handler can keep pushing into the
    /// other channels while one is being read. Channels 1..=7 may hold one sample more
    /// than channel 0 because only channel 0 completions are counted.
    pub fn drain(&mut self) -> DrainStatus {
        let needed = self.needed_cycles();
        if !self.drain_due() {
            return DrainStatus::Pending {
                cycles: self.state.cycles(),
                needed,
            };
        }

        let store = self.state.store().clone();
        let mut snapshot = [0u16; WindowSize::MAX];
        for channel in Channel::ALL {
            let n = self.state.snapshot_ring(channel, &mut snapshot);
            self.filter.reset();
            for &v in &snapshot[..n] {
                self.filter.add(v);
            }
            if let Some(m) = self.filter.median() {
                store.set(channel, m);
            }
        }
        self.state.reset_cycles();
        store.mark_published();
        tracing::debug!(values = ?store.snapshot(), "drain published");
        DrainStatus::Published
    }

    /// Last published value; 0 for out-of-range channels and before the first drain.
    pub fn get_channel_value<I: TryInto<usize>>(&self, channel: I) -> u16 {
        self.state.store().get_channel_value(channel)
    }

    pub fn value(&self, channel: Channel) -> u16 {
        self.state.store().value(channel)
    }

    pub fn try_value(&self, channel: Channel) -> Option<u16> {
        self.state.store().try_value(channel)
    }

    pub fn snapshot(&self) -> [u16; CHANNEL_COUNT] {
        self.state.store().snapshot()
    }

    /// Shareable read handle for other threads.
    pub fn output_store(&self) -> Arc<OutputStore> {
        self.state.store().clone()
    }

    pub fn state(&self) -> &Arc<AcquisitionState> {
        &self.state
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        self.state.clock()
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Milliseconds since the last completed conversion.
    pub fn stalled_for_ms(&self) -> u64 {
        self.state.stalled_for_ms()
    }
}
