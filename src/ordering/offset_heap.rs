//! Min-heap keyed by message offset.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Entry<T> {
    offset: u64,
    // Insertion order breaks ties, so equal offsets pop FIFO.
    seq: u64,
    item: T,
}

impl<T> Entry<T> {
    fn key(&self) -> (u64, u64) {
        (self.offset, self.seq)
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Priority queue returning the item with the smallest offset first.
pub struct OffsetHeap<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

impl<T> OffsetHeap<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Insert `item` at `offset`.
    pub fn push(&mut self, offset: u64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { offset, seq, item }));
    }

    /// Remove and return the item with the smallest offset.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|Reverse(entry)| entry.item)
    }

    /// Pop the smallest item only if its offset is exactly `expected`.
    ///
    /// Lets a consumer release messages strictly in sequence, holding back
    /// everything behind a gap.
    pub fn pop_next(&mut self, expected: u64) -> Option<T> {
        if self.peek_offset()? == expected {
            self.pop()
        } else {
            None
        }
    }

    /// Smallest offset currently held.
    pub fn peek_offset(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(entry)| entry.offset)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for OffsetHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<(u64, T)> for OffsetHeap<T> {
    fn extend<I: IntoIterator<Item = (u64, T)>>(&mut self, iter: I) {
        for (offset, item) in iter {
            self.push(offset, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_smallest_offset_first() {
        let mut heap = OffsetHeap::new();
        heap.extend([(42, "c"), (7, "a"), (19, "b")]);
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek_offset(), Some(7));

        assert_eq!(heap.pop(), Some("a"));
        assert_eq!(heap.pop(), Some("b"));
        assert_eq!(heap.pop(), Some("c"));
        assert!(heap.is_empty());
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn equal_offsets_keep_insertion_order() {
        let mut heap = OffsetHeap::with_capacity(3);
        heap.push(5, "first");
        heap.push(5, "second");
        heap.push(1, "zero");

        assert_eq!(heap.pop(), Some("zero"));
        assert_eq!(heap.pop(), Some("first"));
        assert_eq!(heap.pop(), Some("second"));
    }

    #[test]
    fn pop_next_holds_back_gaps() {
        let mut heap = OffsetHeap::default();
        heap.extend([(2, 'c'), (0, 'a')]);

        assert_eq!(heap.pop_next(0), Some('a'));
        // Offset 1 has not arrived yet.
        assert_eq!(heap.pop_next(1), None);
        assert_eq!(heap.len(), 1);

        heap.push(1, 'b');
        assert_eq!(heap.pop_next(1), Some('b'));
        assert_eq!(heap.pop_next(2), Some('c'));
        assert_eq!(heap.pop_next(3), None);
    }

    #[test]
    fn reorders_shuffled_stream() {
        let mut heap = OffsetHeap::new();
        for offset in [9u64, 3, 0, 7, 1, 8, 2, 6, 4, 5] {
            heap.push(offset, offset * 10);
        }
        let drained: Vec<u64> = std::iter::from_fn(|| heap.pop()).collect();
        assert_eq!(drained, (0..10).map(|o| o * 10).collect::<Vec<_>>());
    }
}
