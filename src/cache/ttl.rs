//! TTL Module
//!
//! Per-entry expiration arguments and the unified options accepted by
//! `store_with` and `fetch_with`.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{CacheError, Result};

// == Ttl ==
/// An expiration argument: an absolute instant or a duration from now.
///
/// A zero duration means "never expires".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    At(DateTime<Utc>),
    After(Duration),
}

impl Ttl {
    /// Builds a relative TTL from fractional seconds.
    ///
    /// # Errors
    /// [`CacheError::InvalidArgument`] for negative or non-finite input.
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        duration_from_secs(secs, "ttl").map(Ttl::After)
    }

    /// Resolves to an absolute expiration, `None` meaning never.
    pub(crate) fn resolve(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        match *self {
            Ttl::At(instant) => Ok(Some(instant)),
            Ttl::After(duration) if duration.is_zero() => Ok(None),
            Ttl::After(duration) => offset(now, duration).map(Some),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::After(duration)
    }
}

impl From<DateTime<Utc>> for Ttl {
    fn from(instant: DateTime<Utc>) -> Self {
        Ttl::At(instant)
    }
}

impl FromStr for Ttl {
    type Err = CacheError;

    /// Accepts seconds (`"98.6"`) or an RFC 3339 instant.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<f64>() {
            return Ttl::from_secs_f64(secs);
        }
        DateTime::parse_from_rfc3339(s)
            .map(|instant| Ttl::At(instant.with_timezone(&Utc)))
            .map_err(|_| CacheError::InvalidArgument(format!("cannot interpret {:?} as a ttl", s)))
    }
}

// == Entry Options ==
/// Hard TTL, soft TTL and retry delay for one `store_with`/`fetch_with` call.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lrucache::EntryOptions;
///
/// let options = EntryOptions::new()
///     .ttl(Duration::from_secs(3600))
///     .soft_ttl(Duration::from_secs(60))
///     .retry_delay(Duration::from_secs(10));
/// assert!(options.soft_ttl.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Hard expiration; `None` falls back to the cache's default TTL
    pub ttl: Option<Ttl>,
    /// Refresh deadline; `None` disables stale-while-revalidate
    pub soft_ttl: Option<Ttl>,
    /// Push-back applied to the refresh deadline after a recoverable failure
    pub retry_delay: Option<Duration>,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    pub fn soft_ttl(mut self, soft_ttl: impl Into<Ttl>) -> Self {
        self.soft_ttl = Some(soft_ttl.into());
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = Some(retry_delay);
        self
    }
}

impl From<Ttl> for EntryOptions {
    fn from(ttl: Ttl) -> Self {
        Self::new().ttl(ttl)
    }
}

// == Utility Functions ==
/// Validates fractional seconds as a non-negative duration.
pub(crate) fn duration_from_secs(secs: f64, what: &str) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(CacheError::InvalidArgument(format!(
            "{} must be a non-negative number of seconds, got {}",
            what, secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|err| CacheError::InvalidArgument(format!("{} out of range: {}", what, err)))
}

/// Returns `now + duration`.
pub(crate) fn offset(now: DateTime<Utc>, duration: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| CacheError::InvalidArgument(format!("duration {:?} out of range", duration)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        let ttl: Ttl = "98.6".parse().unwrap();
        assert_eq!(ttl, Ttl::After(Duration::from_secs_f64(98.6)));
    }

    #[test]
    fn test_parse_instant() {
        let ttl: Ttl = "2030-01-02T03:04:05Z".parse().unwrap();
        let expected = DateTime::parse_from_rfc3339("2030-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(ttl, Ttl::At(expected));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "moocow".parse::<Ttl>().unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        assert!(Ttl::from_secs_f64(-1.0).is_err());
        assert!(Ttl::from_secs_f64(f64::NAN).is_err());
        assert!("inf".parse::<Ttl>().is_err());
        assert!("-5".parse::<Ttl>().is_err());
    }

    #[test]
    fn test_resolve() {
        let now = Utc::now();

        assert_eq!(Ttl::After(Duration::ZERO).resolve(now).unwrap(), None);
        assert_eq!(
            Ttl::After(Duration::from_secs(10)).resolve(now).unwrap(),
            Some(now + chrono::Duration::seconds(10))
        );

        let instant = now - chrono::Duration::seconds(60);
        assert_eq!(Ttl::At(instant).resolve(now).unwrap(), Some(instant));
    }

    #[test]
    fn test_resolve_out_of_range() {
        let ttl = Ttl::After(Duration::from_secs(u64::MAX));
        assert!(matches!(ttl.resolve(Utc::now()), Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_options_builder() {
        let options = EntryOptions::new()
            .ttl(Duration::from_secs(5))
            .retry_delay(Duration::from_secs(1));
        assert_eq!(options.ttl, Some(Ttl::After(Duration::from_secs(5))));
        assert_eq!(options.soft_ttl, None);
        assert_eq!(options.retry_delay, Some(Duration::from_secs(1)));

        let from_ttl: EntryOptions = Ttl::After(Duration::from_secs(5)).into();
        assert_eq!(from_ttl.ttl, options.ttl);
    }
}
