//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with hard and soft
//! expiration.

use std::time::Duration;

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Hard expiration, None = no expiration
    pub expiration: Option<DateTime<Utc>>,
    /// When a read should attempt a refresh, None = never
    pub soft_expiration: Option<DateTime<Utc>>,
    /// How far to push `soft_expiration` after a recoverable refresh failure
    pub retry_delay: Option<Duration>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry without a refresh deadline.
    pub fn new(value: V, expiration: Option<DateTime<Utc>>) -> Self {
        Self {
            value,
            expiration,
            soft_expiration: None,
            retry_delay: None,
        }
    }

    pub fn with_soft_expiration(
        mut self,
        soft_expiration: Option<DateTime<Utc>>,
        retry_delay: Option<Duration>,
    ) -> Self {
        self.soft_expiration = soft_expiration;
        self.retry_delay = retry_delay;
        self
    }

    // == Is Expired ==
    /// Checks if the entry has hard-expired.
    ///
    /// An entry is expired once `now` reaches the expiration instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiration {
            Some(expiration) => now >= expiration,
            None => false,
        }
    }

    // == Is Stale ==
    /// Checks if the refresh deadline has been reached.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.soft_expiration {
            Some(soft_expiration) => now >= soft_expiration,
            None => false,
        }
    }
}
