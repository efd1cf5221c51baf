//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and
//! stale-while-revalidate refresh.

mod builder;
mod clock;
mod entry;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use builder::{LruCacheBuilder, DEFAULT_MAX_SIZE};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{EvictionHandler, LruCache};
pub use ttl::{EntryOptions, Ttl};
