use std::collections::VecDeque;

/// Fixed-capacity FIFO that evicts the oldest entry when full.
///
/// Backed by a `VecDeque`. Pop order is oldest → newest.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty ring buffer with the given maximum capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, returning the evicted oldest entry when at capacity.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    /// Remove and return the oldest entry.
    pub fn pop(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Remove all elements, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let n = self.buf.len();
        self.buf.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_over_capacity_evicts_oldest() {
        let mut rb = RingBuffer::new(3);
        assert_eq!(rb.push(1), None);
        assert_eq!(rb.push(2), None);
        assert_eq!(rb.push(3), None);
        assert_eq!(rb.push(4), Some(1));
        assert_eq!(rb.push(5), Some(2));

        assert_eq!(rb.len(), 3);
        assert_eq!(rb.pop(), Some(3));
        assert_eq!(rb.pop(), Some(4));
        assert_eq!(rb.pop(), Some(5));
    }

    #[test]
    fn pop_is_fifo() {
        let mut rb = RingBuffer::new(4);
        rb.push("a");
        rb.push("b");
        assert_eq!(rb.pop(), Some("a"));
        assert_eq!(rb.pop(), Some("b"));
        assert_eq!(rb.pop(), None);
    }

    #[test]
    fn clear_reports_discarded() {
        let mut rb = RingBuffer::new(3);
        rb.push(1);
        rb.push(2);

        assert_eq!(rb.clear(), 2);
        assert_eq!(rb.len(), 0);
        assert_eq!(rb.push(3), None);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = RingBuffer::<i32>::new(0);
    }
}
