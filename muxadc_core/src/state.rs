//! Shared acquisition context.
//!
//! One instance per pipeline, shared through `Arc` between the completion handler
//! (writer of the rings and the cycle counter) and the drain step (reader of the rings,
//! writer of the output store).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use muxadc_traits::{CHANNEL_COUNT, Channel, Clock};

use crate::config::WindowSize;
use crate::ring::RingBuffer;
use crate::store::OutputStore;

pub struct AcquisitionState {
    rings: [Mutex<RingBuffer<u16>>; CHANNEL_COUNT],
    /// Channel-0 completions since the last drain.
    cycles: AtomicU32,
    completions: AtomicU64,
    last_ok_ms: AtomicU64,
    window: WindowSize,
    noise_floor: u16,
    store: Arc<OutputStore>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
}

impl core::fmt::Debug for AcquisitionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AcquisitionState")
            .field("window", &self.window.get())
            .field("noise_floor", &self.noise_floor)
            .field("cycles", &self.cycles())
            .field("completions", &self.completions())
            .finish()
    }
}

impl AcquisitionState {
    pub fn new(window: WindowSize, noise_floor: u16, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        Self {
            rings: std::array::from_fn(|_| Mutex::new(RingBuffer::new(window.get()))),
            cycles: AtomicU32::new(0),
            completions: AtomicU64::new(0),
            last_ok_ms: AtomicU64::new(0),
            window,
            noise_floor,
            store: Arc::new(OutputStore::new()),
            clock,
            epoch,
        }
    }

    // Ring pushes are single writes; recover the guard from a poisoned lock.
    fn ring(&self, channel: Channel) -> MutexGuard<'_, RingBuffer<u16>> {
        self.rings[channel.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one completed conversion. Called only from the completion handler.
    pub(crate) fn record(&self, channel: Channel, value: u16) {
        self.ring(channel).push(value);
        if channel == Channel::FIRST {
            self.cycles.fetch_add(1, Ordering::AcqRel);
        }
        self.completions.fetch_add(1, Ordering::Relaxed);
        self.last_ok_ms
            .store(self.clock.ms_since(self.epoch), Ordering::Relaxed);
    }

    /// Copy `channel`'s ring oldest-first into `out` under its lock.
    pub(crate) fn snapshot_ring(&self, channel: Channel, out: &mut [u16]) -> usize {
        self.ring(channel).copy_to(out)
    }

    pub fn ring_len(&self, channel: Channel) -> usize {
        self.ring(channel).len()
    }

    pub(crate) fn all_rings_full(&self) -> bool {
        Channel::ALL.iter().all(|&ch| self.ring(ch).is_full())
    }

    pub(crate) fn reset_cycles(&self) {
        self.cycles.store(0, Ordering::Release);
    }

    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Total conversions handled since construction.
    pub fn completions(&self) -> u64 {
        self.completions.load(Ordering::Relaxed)
    }

    /// Milliseconds since the last completed conversion (or since construction when
    /// none has completed yet).
    pub fn stalled_for_ms(&self) -> u64 {
        let now = self.clock.ms_since(self.epoch);
        now.saturating_sub(self.last_ok_ms.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn window(&self) -> WindowSize {
        self.window
    }

    #[inline]
    pub fn noise_floor(&self) -> u16 {
        self.noise_floor
    }

    pub fn store(&self) -> &Arc<OutputStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muxadc_traits::clock::ManualClock;
    use std::time::Duration;

    #[test]
    fn counts_cycles_only_on_first_channel() {
        let state = AcquisitionState::new(WindowSize::Five, 20, Arc::new(ManualClock::new()));
        state.record(Channel::ALL[1], 5);
        state.record(Channel::ALL[7], 5);
        assert_eq!(state.cycles(), 0);
        state.record(Channel::FIRST, 5);
        assert_eq!(state.cycles(), 1);
        assert_eq!(state.completions(), 3);
        assert_eq!(state.ring_len(Channel::ALL[1]), 1);
    }

    #[test]
    fn stall_timer_restarts_on_completion() {
        let clock = ManualClock::new();
        let state = AcquisitionState::new(WindowSize::Five, 20, Arc::new(clock.clone()));
        clock.advance(Duration::from_millis(40));
        assert_eq!(state.stalled_for_ms(), 40);
        state.record(Channel::FIRST, 1);
        clock.advance(Duration::from_millis(5));
        assert_eq!(state.stalled_for_ms(), 5);
    }
}
