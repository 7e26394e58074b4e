//! Periodic drain loop with a stall watchdog, in direct or threaded sampling mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use muxadc_traits::{CHANNEL_COUNT, Clock};

use crate::acquisition::MultiChannelAdc;
use crate::config::DrainCfg;
use crate::error::{AdcError, Result as CoreResult};
use crate::status::DrainStatus;
use crate::util::{elapsed_us, stall_warn_threshold_ms};

/// How completions reach the handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplingMode {
    /// Conversions are waited on inside the drain loop; each drain follows one batch
    /// of N full scan cycles.
    Direct,
    /// A dedicated acquisition thread runs the handler; the loop only drains.
    #[default]
    Threaded,
}

#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub mode: SamplingMode,
    pub drain: DrainCfg,
    /// Stop after this many publications. `None` runs until shutdown.
    pub max_cycles: Option<u64>,
}

/// One publication, handed to the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// 1-based publication counter for this run.
    pub cycle: u64,
    pub elapsed_us: u64,
    pub values: [u16; CHANNEL_COUNT],
}

/// Drive acquisition and draining until `shutdown` is set, `max_cycles` publications
/// have happened or the stall watchdog fires. Returns the number of publications.
pub fn run<F>(
    adc: &mut MultiChannelAdc,
    params: &RunParams,
    shutdown: &AtomicBool,
    on_report: F,
) -> CoreResult<u64>
where
    F: FnMut(&Report),
{
    adc.begin().map_err(crate::error::Report::new)?;
    tracing::info!(
        mode = ?params.mode,
        window = adc.state().window().get(),
        interval_ms = params.drain.interval_ms,
        "acquisition start"
    );
    let published = match params.mode {
        SamplingMode::Direct => run_direct(adc, params, shutdown, on_report),
        SamplingMode::Threaded => {
            adc.spawn_acquisition().map_err(crate::error::Report::new)?;
            run_threaded(adc, params, shutdown, on_report)
        }
    }?;
    tracing::info!(published, "acquisition stop");
    Ok(published)
}

struct Watchdog {
    warn_ms: u64,
    fail_ms: u64,
    warned: bool,
}

impl Watchdog {
    fn new(adc: &MultiChannelAdc, drain: &DrainCfg) -> Self {
        Self {
            warn_ms: stall_warn_threshold_ms(adc.timeouts().conversion_ms, drain.interval_ms),
            fail_ms: drain.stall_ms,
            warned: false,
        }
    }

    fn check(&mut self, adc: &MultiChannelAdc) -> Result<(), AdcError> {
        let stalled = adc.stalled_for_ms();
        if self.fail_ms > 0 && stalled > self.fail_ms {
            tracing::error!(stalled_ms = stalled, "acquisition stalled");
            return Err(AdcError::Stalled { ms: stalled });
        }
        if stalled > self.warn_ms {
            if !self.warned {
                tracing::warn!(stalled_ms = stalled, "no conversion completed recently");
                self.warned = true;
            }
        } else {
            self.warned = false;
        }
        Ok(())
    }
}

fn done(published: u64, params: &RunParams, shutdown: &AtomicBool) -> bool {
    shutdown.load(Ordering::Relaxed) || params.max_cycles.is_some_and(|max| published >= max)
}

fn publish<F: FnMut(&Report)>(
    adc: &mut MultiChannelAdc,
    published: &mut u64,
    start: std::time::Instant,
    on_report: &mut F,
) -> DrainStatus {
    let status = adc.drain();
    if !status.is_published() {
        return status;
    }
    *published += 1;
    let report = Report {
        cycle: *published,
        elapsed_us: elapsed_us(adc.clock().as_ref(), start),
        values: adc.snapshot(),
    };
    on_report(&report);
    status
}

fn run_threaded<F: FnMut(&Report)>(
    adc: &mut MultiChannelAdc,
    params: &RunParams,
    shutdown: &AtomicBool,
    mut on_report: F,
) -> CoreResult<u64> {
    let interval = Duration::from_millis(params.drain.interval_ms.max(1));
    let clock = adc.clock().clone();
    let start = clock.now();
    let mut watchdog = Watchdog::new(adc, &params.drain);
    let mut published = 0u64;

    while !done(published, params, shutdown) {
        clock.sleep(interval);
        watchdog.check(adc).map_err(crate::error::Report::new)?;
        if let DrainStatus::Pending { cycles, needed } =
            publish(adc, &mut published, start, &mut on_report)
        {
            tracing::trace!(cycles, needed, "drain pending");
        }
    }
    Ok(published)
}

fn run_direct<F: FnMut(&Report)>(
    adc: &mut MultiChannelAdc,
    params: &RunParams,
    shutdown: &AtomicBool,
    mut on_report: F,
) -> CoreResult<u64> {
    let clock = adc.clock().clone();
    let start = clock.now();
    let mut watchdog = Watchdog::new(adc, &params.drain);
    let mut published = 0u64;

    while !done(published, params, shutdown) {
        if adc.drain_due() {
            publish(adc, &mut published, start, &mut on_report);
            continue;
        }
        match adc.poll_once() {
            Ok(_) => {}
            Err(AdcError::Timeout) => {
                watchdog.check(adc).map_err(crate::error::Report::new)?;
            }
            Err(e) => {
                tracing::error!(error = %e, "conversion failed");
                return Err(crate::error::Report::new(e));
            }
        }
    }
    Ok(published)
}
