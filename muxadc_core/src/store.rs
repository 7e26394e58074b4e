//! Published filtered values, one slot per channel.
//!
//! Written only by the drain step, readable from any thread at any time.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};

use muxadc_traits::{CHANNEL_COUNT, Channel};

/// Value every slot holds until the first drain publishes.
pub const UNFILLED: u16 = 0;
/// Value returned for channel indices outside 0..=7.
pub const OUT_OF_RANGE: u16 = 0;

#[derive(Debug)]
pub struct OutputStore {
    slots: [AtomicU16; CHANNEL_COUNT],
    published: AtomicBool,
    publications: AtomicU64,
}

impl Default for OutputStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputStore {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| AtomicU16::new(UNFILLED)),
            published: AtomicBool::new(false),
            publications: AtomicU64::new(0),
        }
    }

    /// Last published value for `channel`, `UNFILLED` before the first drain, and
    /// `OUT_OF_RANGE` for anything that is not a channel index (8, -1, ...).
    pub fn get_channel_value<I: TryInto<usize>>(&self, channel: I) -> u16 {
        channel
            .try_into()
            .ok()
            .and_then(|i| Channel::try_from(i).ok())
            .map_or(OUT_OF_RANGE, |ch| self.value(ch))
    }

    #[inline]
    pub fn value(&self, channel: Channel) -> u16 {
        self.slots[channel.index()].load(Ordering::Acquire)
    }

    /// `None` until the first drain has published.
    pub fn try_value(&self, channel: Channel) -> Option<u16> {
        self.is_published().then(|| self.value(channel))
    }

    pub fn snapshot(&self) -> [u16; CHANNEL_COUNT] {
        std::array::from_fn(|i| self.slots[i].load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }

    /// Number of completed drains.
    pub fn publications(&self) -> u64 {
        self.publications.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, channel: Channel, value: u16) {
        self.slots[channel.index()].store(value, Ordering::Release);
    }

    pub(crate) fn mark_published(&self) {
        self.publications.fetch_add(1, Ordering::AcqRel);
        self.published.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_queries_return_default() {
        let store = OutputStore::new();
        store.set(Channel::ALL[7], 42);
        store.mark_published();
        assert_eq!(store.get_channel_value(7u8), 42);
        assert_eq!(store.get_channel_value(8u8), OUT_OF_RANGE);
        assert_eq!(store.get_channel_value(-1i32), OUT_OF_RANGE);
        assert_eq!(store.get_channel_value(usize::MAX), OUT_OF_RANGE);
    }

    #[test]
    fn unfilled_until_published() {
        let store = OutputStore::new();
        assert_eq!(store.snapshot(), [UNFILLED; CHANNEL_COUNT]);
        assert_eq!(store.try_value(Channel::FIRST), None);
        store.mark_published();
        assert_eq!(store.try_value(Channel::FIRST), Some(UNFILLED));
        assert_eq!(store.publications(), 1);
    }
}
