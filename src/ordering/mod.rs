//! Message ordering.
//!
//! Consumers that receive messages out of order push them into an
//! [`OffsetHeap`] and pop them back by increasing offset.

pub mod offset_heap;

pub use offset_heap::OffsetHeap;
