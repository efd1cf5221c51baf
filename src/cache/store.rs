//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with heap-ordered LRU tracking,
//! TTL expiration and stale-while-revalidate refresh.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::ttl::offset;
use crate::cache::{CacheEntry, CacheStats, Clock, EntryOptions, LruCacheBuilder, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, FetchError, HeapError, RecomputeError, Result};
use crate::heap::PriorityHeap;

/// Observer for entries evicted to make room.
pub type EvictionHandler<K, V> = Box<dyn FnMut(&K, V) -> anyhow::Result<()> + Send>;

// == LRU Cache ==
/// Least-recently-used cache with per-entry TTL.
///
/// Every touch of a live entry gives it the next value of a growing access
/// counter as its heap priority, so the heap minimum is always the least
/// recently used entry. Expiration is checked lazily on access.
///
/// # Example
///
/// ```
/// use lrucache::LruCache;
///
/// let mut cache: LruCache<u32, &str> = LruCache::builder().max_size(2).build().unwrap();
/// cache.store(1, "a").unwrap();
/// cache.store(2, "b").unwrap();
/// cache.fetch(&1).unwrap();
/// cache.store(3, "c").unwrap();
///
/// assert!(cache.include(&1).unwrap());
/// assert!(!cache.include(&2).unwrap());
/// ```
pub struct LruCache<K, V, C = SystemClock> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Access order, keyed identically to `entries`
    heap: PriorityHeap<K, u64>,
    /// Last priority handed out
    access_counter: u64,
    max_size: usize,
    default_ttl: Duration,
    default_value: Option<V>,
    eviction_handler: Option<EvictionHandler<K, V>>,
    clock: C,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn builder() -> LruCacheBuilder<K, V, SystemClock> {
        LruCacheBuilder::new()
    }

    /// Creates a cache holding at most `max_size` entries with no default TTL.
    pub fn new(max_size: usize) -> Result<Self> {
        Self::builder().max_size(max_size).build()
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }
}

impl<K, V, C> LruCache<K, V, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    C: Clock,
{
    pub(crate) fn from_parts(
        max_size: usize,
        default_ttl: Duration,
        default_value: Option<V>,
        eviction_handler: Option<EvictionHandler<K, V>>,
        clock: C,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            heap: PriorityHeap::new(),
            access_counter: 0,
            max_size,
            default_ttl,
            default_value,
            eviction_handler,
            clock,
            stats: CacheStats::new(),
        }
    }

    // == Accessors ==
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn default_value(&self) -> Option<&V> {
        self.default_value.as_ref()
    }

    /// Number of entries, possibly including expired ones not yet observed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently held, possibly including expired ones not yet observed.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the raw entry without touching it or checking expiration.
    pub fn entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Returns a live value without changing its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| &entry.value)
    }

    // == Store ==
    /// Stores a value using the cache's default TTL.
    pub fn store(&mut self, key: K, value: V) -> Result<()> {
        self.store_with(key, value, &EntryOptions::default())
    }

    /// Stores a value, evicting the least recently used entry first if `key`
    /// is new and the cache is full.
    ///
    /// # Errors
    /// [`CacheError::InvalidArgument`] if a TTL cannot be resolved; the cache
    /// is left untouched.
    pub fn store_with(&mut self, key: K, value: V, options: &EntryOptions) -> Result<()> {
        let now = self.clock.now();
        let expiration = match &options.ttl {
            Some(ttl) => ttl.resolve(now)?,
            None => self.default_expiration(now)?,
        };
        let soft_expiration = match &options.soft_ttl {
            Some(soft_ttl) => soft_ttl.resolve(now)?,
            None => None,
        };

        let is_new = !self.entries.contains_key(&key);
        if is_new && self.entries.len() >= self.max_size {
            self.evict_lru();
        }

        let entry = CacheEntry::new(value, expiration)
            .with_soft_expiration(soft_expiration, options.retry_delay);
        self.entries.insert(key.clone(), entry);
        if is_new {
            self.push_recent(key)
        } else {
            self.touch(&key)
        }
    }

    // == Fetch ==
    /// Returns the live value for `key`, or the default value on a miss.
    ///
    /// A hard-expired entry is removed and treated as a miss.
    pub fn fetch(&mut self, key: &K) -> Result<Option<V>> {
        let now = self.clock.now();
        if !self.observe(key, now) {
            self.stats.record_miss();
            return Ok(self.default_value.clone());
        }

        self.touch(key)?;
        self.stats.record_hit();
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    /// Returns the live value for `key`, computing and storing it on a miss
    /// and refreshing it once its soft expiration has passed.
    ///
    /// # Errors
    /// - [`FetchError::Recompute`] if `recompute` fails on a miss, or fails
    ///   fatally while refreshing; the cache is left as it was
    /// - [`FetchError::Cache`] if storing the computed value fails
    ///
    /// A recoverable refresh failure is not an error: the stale value is
    /// returned and the next refresh is pushed back by the retry delay.
    pub fn fetch_with<F, E>(
        &mut self,
        key: K,
        options: &EntryOptions,
        recompute: F,
    ) -> std::result::Result<V, FetchError<E>>
    where
        F: FnOnce() -> std::result::Result<V, RecomputeError<E>>,
    {
        let now = self.clock.now();
        if !self.observe(&key, now) {
            self.stats.record_miss();
            let value = recompute().map_err(|err| FetchError::Recompute(err.into_inner()))?;
            self.store_with(key, value.clone(), options)?;
            return Ok(value);
        }

        self.touch(&key)?;
        self.stats.record_hit();

        let stale = self
            .entries
            .get(&key)
            .map(|entry| entry.is_stale(now))
            .ok_or_else(missing_entry)?;
        if !stale {
            return self.value_of(&key).map_err(FetchError::from);
        }

        match recompute() {
            Ok(value) => {
                self.stats.record_refresh();
                debug!("refreshed stale cache entry");
                self.store_with(key, value.clone(), options)?;
                Ok(value)
            }
            Err(RecomputeError::Recoverable(_)) => {
                self.stats.record_refresh_failure();
                let entry = self.entries.get_mut(&key).ok_or_else(missing_entry)?;
                if let Some(delay) = entry.retry_delay.or(options.retry_delay) {
                    entry.soft_expiration = Some(offset(now, delay)?);
                }
                warn!(
                    retry_at = ?entry.soft_expiration,
                    "refresh of stale cache entry failed, serving stale value"
                );
                Ok(entry.value.clone())
            }
            Err(RecomputeError::Fatal(err)) => Err(FetchError::Recompute(err)),
        }
    }

    // == Include ==
    /// Returns whether `key` holds a live entry, touching it if so.
    pub fn include(&mut self, key: &K) -> Result<bool> {
        let now = self.clock.now();
        if !self.observe(key, now) {
            return Ok(false);
        }
        self.touch(key)?;
        Ok(true)
    }

    // == Delete ==
    /// Removes an entry, returning its value. Never calls the eviction
    /// handler.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|entry| entry.value)
    }

    // == Clear ==
    /// Drops every entry and resets the access counter and statistics.
    /// Never calls the eviction handler.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.heap.clear();
        self.access_counter = 0;
        self.stats = CacheStats::new();
    }

    // == Evict ==
    /// Removes the least recently used entry and hands its value to the
    /// eviction handler. Returns the evicted key.
    pub fn evict_lru(&mut self) -> Option<K> {
        let (key, _) = self.heap.pop()?;
        let entry = match self.entries.remove(&key) {
            Some(entry) => entry,
            None => panic!("least recently used key missing from entry map"),
        };
        self.stats.record_eviction();
        debug!(evictions = self.stats.evictions, "evicted least recently used entry");

        if let Some(handler) = self.eviction_handler.as_mut() {
            if let Err(err) = handler(&key, entry.value) {
                warn!(error = %err, "eviction handler failed");
            }
        }
        Some(key)
    }

    // == Purge Expired ==
    /// Removes all hard-expired entries. Never calls the eviction handler.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.remove_entry(&key);
            self.stats.record_expiration();
        }

        if count > 0 {
            debug!(count, "purged expired cache entries");
        }
        count
    }

    // == Check Invariants ==
    /// Verifies that the entry map and the heap agree and that the heap is
    /// structurally sound.
    pub fn check_invariants(&self) -> Result<()> {
        self.heap.check_invariants()?;
        if self.entries.len() > self.max_size {
            return Err(HeapError::Corrupted(format!(
                "{} entries exceed max_size {}",
                self.entries.len(),
                self.max_size
            ))
            .into());
        }
        if self.heap.len() != self.entries.len()
            || self.entries.keys().any(|key| !self.heap.contains(key))
        {
            return Err(HeapError::Corrupted("entry map and heap disagree".to_string()).into());
        }
        Ok(())
    }

    // == Internals ==

    /// Moves `key` to most recently used. Counter values only grow, so a live
    /// key goes through delete and a fresh insert.
    fn touch(&mut self, key: &K) -> Result<()> {
        if self.heap.delete(key).is_none() {
            panic!("live cache key missing from access heap");
        }
        self.push_recent(key.clone())
    }

    /// Inserts a key absent from the heap as most recently used.
    fn push_recent(&mut self, key: K) -> Result<()> {
        self.access_counter += 1;
        self.heap.set(key, self.access_counter)?;
        Ok(())
    }

    /// Returns whether `key` is live, dropping it if it has hard-expired.
    fn observe(&mut self, key: &K, now: DateTime<Utc>) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };
        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            debug!("dropped expired cache entry");
        }
        !expired
    }

    fn remove_entry(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        if self.heap.delete(key).is_none() {
            panic!("cache key missing from access heap");
        }
        Some(entry)
    }

    fn value_of(&self, key: &K) -> Result<V> {
        self.entries
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(missing_entry)
    }

    fn default_expiration(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        if self.default_ttl.is_zero() {
            Ok(None)
        } else {
            offset(now, self.default_ttl).map(Some)
        }
    }
}

fn missing_entry() -> CacheError {
    HeapError::Corrupted("touched key missing from entry map".to_string()).into()
}

impl<K: fmt::Debug, V: fmt::Debug, C: fmt::Debug> fmt::Debug for LruCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("entries", &self.entries)
            .field("access_counter", &self.access_counter)
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("default_value", &self.default_value)
            .field("eviction_handler", &self.eviction_handler.is_some())
            .field("clock", &self.clock)
            .field("stats", &self.stats)
            .finish()
    }
}
