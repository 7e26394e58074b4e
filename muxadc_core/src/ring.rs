//! Fixed-capacity circular buffer with overwrite-oldest semantics.

/// Holds the most recent `capacity` values pushed.
///
/// Index 0 of `at` is the oldest retained value and `len() - 1` the newest.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Box<[T]>,
    head: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![T::default(); capacity.max(1)].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// O(1); overwrites the oldest element when full.
    pub fn push(&mut self, value: T) {
        let cap = self.buf.len();
        if self.len < cap {
            self.buf[(self.head + self.len) % cap] = value;
            self.len += 1;
        } else {
            self.buf[self.head] = value;
            self.head = (self.head + 1) % cap;
        }
    }

    /// Element `i` counted from the oldest; `None` when `i >= len()`.
    pub fn at(&self, i: usize) -> Option<T> {
        (i < self.len).then(|| self.buf[(self.head + i) % self.buf.len()])
    }

    /// Copies the contents oldest-first into `out`, returning how many were written.
    pub fn copy_to(&self, out: &mut [T]) -> usize {
        let n = self.len.min(out.len());
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.buf[(self.head + i) % self.buf.len()];
        }
        n
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.buf[(self.head + i) % self.buf.len()])
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;

    #[test]
    fn fills_then_overwrites_oldest() {
        let mut rb = RingBuffer::<u16>::new(5);
        for v in 1..=5 {
            rb.push(v);
        }
        assert!(rb.is_full());
        rb.push(6);
        assert_eq!(rb.len(), 5);
        assert_eq!(rb.iter().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6]);
        assert_eq!(rb.at(0), Some(2));
        assert_eq!(rb.at(4), Some(6));
        assert_eq!(rb.at(5), None);
    }

    #[test]
    fn partial_fill_and_clear() {
        let mut rb = RingBuffer::<u16>::new(7);
        rb.push(9);
        rb.push(8);
        assert_eq!(rb.len(), 2);
        assert!(!rb.is_full());
        let mut out = [0u16; 11];
        assert_eq!(rb.copy_to(&mut out), 2);
        assert_eq!(&out[..2], &[9, 8]);
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.at(0), None);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut rb = RingBuffer::<u16>::new(0);
        rb.push(1);
        rb.push(2);
        assert_eq!(rb.capacity(), 1);
        assert_eq!(rb.at(0), Some(2));
    }
}
