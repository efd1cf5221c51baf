//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment
//! variables or a host application's config file.

use std::env;

use serde::Deserialize;

use crate::cache::DEFAULT_MAX_SIZE;
use crate::error::{CacheError, Result};

/// Cache construction parameters.
///
/// Invalid values are reported, never silently replaced by defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Default TTL in seconds for entries without explicit TTL, 0 = never
    pub default_ttl_secs: f64,
}

impl CacheConfig {
    /// Loads values from environment variables.
    ///
    /// # Environment Variables
    /// - `LRUCACHE_MAX_SIZE` - Maximum cache entries (default: 100)
    /// - `LRUCACHE_DEFAULT_TTL` - Default TTL in seconds (default: 0)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads values through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            max_size: parse_var(&lookup, "LRUCACHE_MAX_SIZE")?.unwrap_or(defaults.max_size),
            default_ttl_secs: parse_var(&lookup, "LRUCACHE_DEFAULT_TTL")?
                .unwrap_or(defaults.default_ttl_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks `max_size > 0` and a finite, non-negative default TTL.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidArgument(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if !self.default_ttl_secs.is_finite() || self.default_ttl_secs < 0.0 {
            return Err(CacheError::InvalidArgument(format!(
                "default_ttl must be a non-negative number of seconds, got {}",
                self.default_ttl_secs
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_ttl_secs: 0.0,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            CacheError::InvalidArgument(format!("{} has an invalid value: {:?}", name, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 100);
        assert_eq!(config.default_ttl_secs, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = CacheConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_from_lookup_values() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("LRUCACHE_MAX_SIZE", "7"),
            ("LRUCACHE_DEFAULT_TTL", " 98.6 "),
        ]))
        .unwrap();
        assert_eq!(config.max_size, 7);
        assert_eq!(config.default_ttl_secs, 98.6);
    }

    #[test]
    fn test_config_rejects_unparsable_values() {
        let err = CacheConfig::from_lookup(lookup_from(&[("LRUCACHE_MAX_SIZE", "moocow")]))
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));

        let err = CacheConfig::from_lookup(lookup_from(&[("LRUCACHE_MAX_SIZE", "-1")]))
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));

        let err = CacheConfig::from_lookup(lookup_from(&[("LRUCACHE_DEFAULT_TTL", "moocow")]))
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        assert!(CacheConfig::from_lookup(lookup_from(&[("LRUCACHE_MAX_SIZE", "0")])).is_err());
        assert!(CacheConfig::from_lookup(lookup_from(&[("LRUCACHE_DEFAULT_TTL", "-1")])).is_err());
        assert!(CacheConfig::from_lookup(lookup_from(&[("LRUCACHE_DEFAULT_TTL", "NaN")])).is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"max_size": 5}"#).unwrap();
        assert_eq!(config.max_size, 5);
        assert_eq!(config.default_ttl_secs, 0.0);
    }
}
