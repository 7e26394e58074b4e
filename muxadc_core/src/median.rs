//! Sliding-window median (Ekstrom's method).
//!
//! Values live in a circular age-ordered store; a rank array holds store slots sorted by
//! value. Adding a value into a full window evicts the oldest slot from the ranks (linear
//! scan), reuses that slot for the new value and re-inserts it at its upper-bound rank
//! (binary search plus shift). Each `add` is O(N), `median` is O(1).

/// Running median over the last `window` inserted values.
#[derive(Debug, Clone)]
pub struct MedianFilter<T> {
    window: usize,
    values: Vec<T>,
    /// Slot overwritten by the next `add` once the window is full.
    oldest: usize,
    /// Slots ordered by value; equal values keep insertion order.
    ranks: Vec<usize>,
}

impl<T: Copy + Ord> MedianFilter<T> {
    /// Window is clamped to at least 1.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            values: Vec::with_capacity(window),
            oldest: 0,
            ranks: Vec::with_capacity(window),
        }
    }

    /// Empty the filter, keeping its allocations.
    pub fn reset(&mut self) {
        self.values.clear();
        self.ranks.clear();
        self.oldest = 0;
    }

    pub fn add(&mut self, value: T) {
        let slot = if self.values.len() < self.window {
            self.values.push(value);
            self.values.len() - 1
        } else {
            let slot = self.oldest;
            if let Some(pos) = self.ranks.iter().position(|&s| s == slot) {
                self.ranks.remove(pos);
            }
            self.values[slot] = value;
            self.oldest = (slot + 1) % self.window;
            slot
        };
        let values = &self.values;
        let at = self.ranks.partition_point(|&s| values[s] <= value);
        self.ranks.insert(at, slot);
    }

    /// Middle element in rank order. With an even count (partially filled window) this
    /// is the upper of the two middle values; no interpolation.
    #[inline]
    pub fn median(&self) -> Option<T> {
        self.ranks.get(self.ranks.len() / 2).map(|&s| self.values[s])
    }

    /// Smallest value in the window.
    pub fn min(&self) -> Option<T> {
        self.ranks.first().map(|&s| self.values[s])
    }

    /// Largest value in the window.
    pub fn max(&self) -> Option<T> {
        self.ranks.last().map(|&s| self.values[s])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }
}
