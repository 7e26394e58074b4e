//! Builder for `MultiChannelAdc`.
//!
//! The converter is the only required part; everything else falls back to the
//! reference configuration (window 5, noise floor 20, 50 ms conversion timeout).

use std::sync::Arc;

use muxadc_traits::clock::{Clock, MonotonicClock};
use muxadc_traits::Converter;

use crate::acquisition::MultiChannelAdc;
use crate::config::{FilterCfg, Timeouts, WindowSize};
use crate::error::{BuildError, Result};
use crate::median::MedianFilter;
use crate::scheduler::Scheduler;
use crate::state::AcquisitionState;

#[derive(Default)]
pub struct MultiChannelAdcBuilder {
    converter: Option<Box<dyn Converter + Send>>,
    filter: Option<FilterCfg>,
    window_len: Option<usize>,
    noise_floor: Option<u16>,
    timeouts: Option<Timeouts>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl MultiChannelAdcBuilder {
    pub fn with_converter(mut self, converter: impl Converter + Send + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    pub fn with_boxed_converter(mut self, converter: Box<dyn Converter + Send>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_window(mut self, window: WindowSize) -> Self {
        self.window_len = Some(window.get());
        self
    }

    /// Window as a plain length; validated by `build`.
    pub fn with_window_len(mut self, n: usize) -> Self {
        self.window_len = Some(n);
        self
    }

    pub fn with_noise_floor(mut self, threshold: u16) -> Self {
        self.noise_floor = Some(threshold);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Assemble the pipeline. Explicit `with_window*`/`with_noise_floor` values
    /// override those from `with_filter`.
    pub fn build(self) -> Result<MultiChannelAdc> {
        let converter = self
            .converter
            .ok_or_else(|| eyre::Report::new(BuildError::MissingConverter))?;

        let filter = self.filter.unwrap_or_default();
        let window = match self.window_len {
            Some(n) => WindowSize::try_from(n).map_err(eyre::Report::new)?,
            None => filter.window,
        };
        let noise_floor = self.noise_floor.unwrap_or(filter.noise_floor);

        let timeouts = self.timeouts.unwrap_or_default();
        if timeouts.conversion_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "conversion timeout must be >= 1 ms",
            )));
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let state = Arc::new(AcquisitionState::new(window, noise_floor, clock));
        let scheduler = Scheduler::new(converter, state.clone());

        Ok(MultiChannelAdc {
            state,
            filter: MedianFilter::new(window.get()),
            scheduler: Some(scheduler),
            thread: None,
            timeouts,
        })
    }
}
