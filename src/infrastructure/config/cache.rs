//! Product cache configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::cache::CacheSettings;
use crate::application::product::DEFAULT_LOOKUP_CONCURRENCY;

/// Cache TTL, lock and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Expiry of cached products in the shared store (hours).
    #[serde(default = "default_timeout_hours")]
    pub timeout_hours: u64,
    /// Retries after the first attempt on the retrying read path.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between retrying reads (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Lease TTL for single-product writes (seconds).
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
    /// Lease TTL for bulk writes (seconds).
    #[serde(default = "default_bulk_lock_ttl_secs")]
    pub bulk_lock_ttl_secs: u64,
    /// Maximum in-flight lookups for batch product resolution.
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
}

const fn default_timeout_hours() -> u64 {
    24
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_lock_ttl_secs() -> u64 {
    5
}

const fn default_bulk_lock_ttl_secs() -> u64 {
    30
}

const fn default_lookup_concurrency() -> usize {
    DEFAULT_LOOKUP_CONCURRENCY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            timeout_hours: default_timeout_hours(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            lock_ttl_secs: default_lock_ttl_secs(),
            bulk_lock_ttl_secs: default_bulk_lock_ttl_secs(),
            lookup_concurrency: default_lookup_concurrency(),
        }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            entry_ttl: Duration::from_secs(config.timeout_hours.saturating_mul(60 * 60)),
            lock_ttl: Duration::from_secs(config.lock_ttl_secs),
            bulk_lock_ttl: Duration::from_secs(config.bulk_lock_ttl_secs),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cache_settings_defaults() {
        let settings = CacheSettings::from(&CacheConfig::default());
        assert_eq!(settings, CacheSettings::default());
    }
}
