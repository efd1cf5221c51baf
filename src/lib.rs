//! LRU Cache - an in-process least-recently-used cache
//!
//! Provides per-entry TTL expiration, LRU eviction backed by a Fibonacci-style
//! priority heap, and stale-while-revalidate refresh on read.
//!
//! Not internally synchronized: share it across threads behind one exclusive
//! lock such as `Arc<Mutex<LruCache<K, V>>>`.

pub mod cache;
pub mod config;
pub mod error;
pub mod heap;

pub use cache::{
    CacheEntry, CacheStats, Clock, EntryOptions, LruCache, LruCacheBuilder, ManualClock,
    SystemClock, Ttl,
};
pub use config::CacheConfig;
pub use error::{CacheError, FetchError, HeapError, RecomputeError, Result};
pub use heap::PriorityHeap;
