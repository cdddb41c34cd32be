//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file. The Redis URL may be overridden
//! with the `TRADE_ENRICHER_REDIS_URL` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use trade_enricher::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::cache::CacheConfig;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use super::store::{StoreBackend, StoreConfig, REDIS_URL_ENV};
use crate::error::{ConfigError, Result};

/// Top-level application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value fails validation.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(url) = std::env::var(REDIS_URL_ENV) {
            if !url.trim().is_empty() {
                config.store.redis_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "server.bind",
            }
            .into());
        }

        if self.store.backend == StoreBackend::Redis && self.store.redis_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "store.redis_url",
            }
            .into());
        }

        let cache = &self.cache;
        if cache.timeout_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.timeout_hours",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if cache.lock_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.lock_ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if cache.bulk_lock_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.bulk_lock_ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if cache.lookup_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.lookup_concurrency",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            }
            .into());
        }

        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
