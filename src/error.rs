//! Error types for the cache and its priority heap
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Heap Error Enum ==
/// Contract violations reported by [`PriorityHeap`](crate::heap::PriorityHeap).
///
/// These indicate a caller bug, not a recoverable runtime state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    /// `set` on a live key with a priority that is not strictly smaller
    #[error("Priority of a live key may only decrease")]
    PriorityNotDecreased,

    /// `set` of a new key with a priority another live key already holds
    #[error("Priority is already held by another key")]
    DuplicatePriority,

    /// Structural check failed
    #[error("Heap corrupted: {0}")]
    Corrupted(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Invalid configuration or per-call argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying heap rejected an operation
    #[error(transparent)]
    Heap(#[from] HeapError),
}

// == Recompute Error Enum ==
/// Failure reported by a `fetch_with` recompute callback.
///
/// A recoverable failure on a stale entry keeps serving the old value; a
/// fatal one is always handed back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecomputeError<E> {
    #[error("recoverable: {0}")]
    Recoverable(E),

    #[error("fatal: {0}")]
    Fatal(E),
}

impl<E> RecomputeError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RecomputeError::Recoverable(err) | RecomputeError::Fatal(err) => err,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RecomputeError::Fatal(_))
    }
}

// == Fetch Error Enum ==
/// Error returned by [`LruCache::fetch_with`](crate::cache::LruCache::fetch_with).
///
/// `E` is the recompute callback's own error type, handed back unmodified.
#[derive(Error, Debug)]
pub enum FetchError<E> {
    /// The cache itself failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The recompute callback failed and there was no value to fall back on,
    /// or it failed fatally
    #[error("Recompute failed: {0}")]
    Recompute(E),
}

impl<E> FetchError<E> {
    /// Returns the recompute error, if this is one.
    pub fn into_recompute(self) -> Option<E> {
        match self {
            FetchError::Recompute(err) => Some(err),
            FetchError::Cache(_) => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_error_converts_into_cache_error() {
        let err: CacheError = HeapError::PriorityNotDecreased.into();
        assert_eq!(err, CacheError::Heap(HeapError::PriorityNotDecreased));
        assert_eq!(err.to_string(), "Priority of a live key may only decrease");
    }

    #[test]
    fn test_fetch_error_messages() {
        let err: FetchError<String> = FetchError::Recompute("backend down".to_string());
        assert_eq!(err.to_string(), "Recompute failed: backend down");

        let err: FetchError<String> = CacheError::InvalidArgument("ttl".to_string()).into();
        assert_eq!(err.to_string(), "Invalid argument: ttl");
        assert!(err.into_recompute().is_none());
    }

    #[test]
    fn test_recompute_error_into_inner() {
        let recoverable = RecomputeError::Recoverable("timeout");
        assert!(!recoverable.is_fatal());
        assert_eq!(recoverable.into_inner(), "timeout");

        let fatal = RecomputeError::Fatal("out of memory");
        assert!(fatal.is_fatal());
        assert_eq!(fatal.to_string(), "fatal: out of memory");
    }
}
