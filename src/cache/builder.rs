//! Cache Builder Module
//!
//! Validated construction of [`LruCache`].

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use crate::cache::store::{EvictionHandler, LruCache};
use crate::cache::ttl::duration_from_secs;
use crate::cache::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Capacity used when none is configured.
pub const DEFAULT_MAX_SIZE: usize = 100;

// == Builder ==
/// Collects cache options; [`build`](Self::build) validates them.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lrucache::LruCache;
///
/// let cache: LruCache<String, i32> = LruCache::builder()
///     .max_size(3)
///     .default_ttl(Duration::from_secs(20))
///     .default_value(-1)
///     .build()
///     .unwrap();
/// assert_eq!(cache.max_size(), 3);
/// ```
pub struct LruCacheBuilder<K, V, C = SystemClock> {
    max_size: usize,
    default_ttl: Result<Duration>,
    default_value: Option<V>,
    eviction_handler: Option<EvictionHandler<K, V>>,
    clock: C,
}

impl<K, V> LruCacheBuilder<K, V, SystemClock> {
    pub fn new() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_ttl: Ok(Duration::ZERO),
            default_value: None,
            eviction_handler: None,
            clock: SystemClock,
        }
    }
}

impl<K, V> Default for LruCacheBuilder<K, V, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> LruCacheBuilder<K, V, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    C: Clock,
{
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// TTL for entries stored without one. Zero means never expires.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Ok(ttl);
        self
    }

    /// Like [`default_ttl`](Self::default_ttl) from fractional seconds;
    /// negative or non-finite input fails at `build`.
    pub fn default_ttl_secs(mut self, secs: f64) -> Self {
        self.default_ttl = duration_from_secs(secs, "default_ttl");
        self
    }

    /// Value returned by `fetch` on a miss.
    pub fn default_value(mut self, value: V) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Called with each entry evicted for capacity. Errors are logged and
    /// dropped.
    pub fn eviction_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&K, V) -> anyhow::Result<()> + Send + 'static,
    {
        self.eviction_handler = Some(Box::new(handler));
        self
    }

    /// Applies `max_size` and `default_ttl_secs` from a config.
    pub fn config(self, config: &CacheConfig) -> Self {
        self.max_size(config.max_size)
            .default_ttl_secs(config.default_ttl_secs)
    }

    pub fn clock<C2: Clock>(self, clock: C2) -> LruCacheBuilder<K, V, C2> {
        LruCacheBuilder {
            max_size: self.max_size,
            default_ttl: self.default_ttl,
            default_value: self.default_value,
            eviction_handler: self.eviction_handler,
            clock,
        }
    }

    /// # Errors
    /// [`CacheError::InvalidArgument`] if `max_size` is zero or the default
    /// TTL is invalid.
    pub fn build(self) -> Result<LruCache<K, V, C>> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidArgument(
                "max_size must be greater than zero".to_string(),
            ));
        }
        let default_ttl = self.default_ttl?;
        Ok(LruCache::from_parts(
            self.max_size,
            default_ttl,
            self.default_value,
            self.eviction_handler,
            self.clock,
        ))
    }
}

impl<K, V: fmt::Debug, C: fmt::Debug> fmt::Debug for LruCacheBuilder<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCacheBuilder")
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("default_value", &self.default_value)
            .field("eviction_handler", &self.eviction_handler.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}
