//! Background completion-handler thread.
//!
//! Spawns a thread that owns the `Scheduler` (and through it the converter), waits for
//! each conversion to complete and runs the handler, which stores the reading and arms
//! the next channel. The foreground never blocks on a conversion.
//!
//! Each `AcquisitionThread` spawns exactly one thread that is shut down and joined
//! when it is dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::AdcError;
use crate::scheduler::Scheduler;

pub struct AcquisitionThread {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl AcquisitionThread {
    /// `scheduler` must already be started (channel 0 armed).
    pub fn spawn(mut scheduler: Scheduler, timeout: Duration) -> Result<Self, AdcError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::Builder::new()
            .name("muxadc-acq".into())
            .spawn(move || {
                loop {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        tracing::debug!("acquisition thread received shutdown signal");
                        break;
                    }

                    match scheduler.wait_and_handle(timeout) {
                        Ok(_) => {}
                        Err(AdcError::Timeout) => {
                            // Converter not delivering; the stall watchdog reports it
                            tracing::trace!("conversion wait timed out");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, armed = ?scheduler.armed().map(|c| c.index()), "conversion failed, re-arming");
                            if let Err(e) = scheduler.rearm() {
                                tracing::warn!(error = %e, "re-arm failed");
                            }
                            // Back off so a dead converter cannot spin this thread
                            std::thread::sleep(timeout);
                        }
                    }
                }
                tracing::trace!("acquisition thread exiting cleanly");
            })
            .map_err(|e| AdcError::State(format!("spawn acquisition thread: {e}")))?;

        Ok(Self {
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AcquisitionThread {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after the in-flight wait returns (at most one conversion
        // timeout, plus one backoff after a converter fault).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("acquisition thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "acquisition thread panicked during shutdown");
                }
            }
        }
    }
}
