//! Heap Module
//!
//! Keyed Fibonacci-style priority heap used by the cache to find the least
//! recently used entry.

mod arena;
mod priority_heap;

#[cfg(test)]
mod property_tests;

pub use priority_heap::PriorityHeap;
