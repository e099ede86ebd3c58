//! # Bounded history buffer.
//!
//! [`HistoryBuffer`] is an insertion-ordered FIFO with a fixed capacity: a push
//! beyond capacity evicts the oldest entry first. It backs the results and
//! errors caches, the health history and the echo lines.
//!
//! ## Rules
//! - `len() <= capacity()` always.
//! - `tail(n)` returns the last `min(n, len)` entries, oldest first, without mutating.
//! - Capacity `0` is legal: every push is dropped.
//!
//! ## Example
//! ```rust
//! use pickvisor::HistoryBuffer;
//!
//! let mut h = HistoryBuffer::new(3);
//! for i in 1..=5 {
//!     h.push(i);
//! }
//! assert_eq!(h.to_vec(), vec![3, 4, 5]);
//! assert_eq!(h.tail(2), vec![4, 5]);
//! ```

use std::collections::VecDeque;

/// Fixed-capacity FIFO that evicts its oldest entry when full.
#[derive(Clone, Debug)]
pub struct HistoryBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Appends `item`, evicting the oldest entry if the buffer is full.
    ///
    /// Returns the evicted entry (or `item` itself when the capacity is zero).
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest entry.
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}

impl<T: Clone> HistoryBuffer<T> {
    /// The last `min(n, len)` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }

    /// All retained entries, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
