use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use trade_enricher::application::cache::CacheSettings;
use trade_enricher::error::{ConfigError, Error};
use trade_enricher::infrastructure::config::settings::Config;
use trade_enricher::infrastructure::config::store::{StoreBackend, REDIS_URL_ENV};

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes())
        .expect("write temp config");
    file
}

fn expect_invalid(toml: &str, expected: &str) {
    match Config::parse_toml(toml) {
        Err(Error::Config(ConfigError::InvalidValue { field, .. })) => assert_eq!(field, expected),
        Err(err) => panic!("Expected invalid {expected}, got {err}"),
        Ok(_) => panic!("Expected {expected} to be rejected"),
    }
}

#[test]
fn config_loads_full_file() {
    let file = write_temp_config(
        r#"
[server]
bind = "127.0.0.1:9000"

[store]
backend = "memory"

[cache]
timeout_hours = 2
max_retries = 5
retry_delay_ms = 250
lock_ttl_secs = 7
bulk_lock_ttl_secs = 60
lookup_concurrency = 4

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = Config::load(file.path()).expect("valid config");

    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.cache.lookup_concurrency, 4);
    assert_eq!(config.logging.format, "json");

    let settings = CacheSettings::from(&config.cache);
    assert_eq!(settings.entry_ttl, Duration::from_secs(2 * 3600));
    assert_eq!(settings.max_retries, 5);
    assert_eq!(settings.retry_delay, Duration::from_millis(250));
    assert_eq!(settings.lock_ttl, Duration::from_secs(7));
    assert_eq!(settings.bulk_lock_ttl, Duration::from_secs(60));
}

#[test]
fn empty_config_uses_defaults() {
    let config = Config::parse_toml("").expect("defaults are valid");

    assert_eq!(config.server.bind, "0.0.0.0:8080");
    assert_eq!(config.store.backend, StoreBackend::Redis);
    assert_eq!(config.cache.timeout_hours, 24);
    assert_eq!(config.cache.max_retries, 3);
    assert_eq!(config.cache.retry_delay_ms, 1000);
    assert_eq!(config.logging.level, "info");
    assert_eq!(CacheSettings::from(&config.cache), CacheSettings::default());
}

#[test]
fn config_allows_zero_retries() {
    let config = Config::parse_toml("[cache]\nmax_retries = 0\n").expect("zero retries is valid");
    assert_eq!(config.cache.max_retries, 0);
}

#[test]
fn config_rejects_zero_timeout() {
    expect_invalid("[cache]\ntimeout_hours = 0\n", "cache.timeout_hours");
}

#[test]
fn config_rejects_zero_lock_ttls() {
    expect_invalid("[cache]\nlock_ttl_secs = 0\n", "cache.lock_ttl_secs");
    expect_invalid("[cache]\nbulk_lock_ttl_secs = 0\n", "cache.bulk_lock_ttl_secs");
}

#[test]
fn config_rejects_zero_lookup_concurrency() {
    expect_invalid("[cache]\nlookup_concurrency = 0\n", "cache.lookup_concurrency");
}

#[test]
fn config_rejects_unknown_log_format() {
    expect_invalid("[logging]\nformat = \"xml\"\n", "logging.format");
}

#[test]
fn config_rejects_unknown_backend() {
    let result = Config::parse_toml("[store]\nbackend = \"memcached\"\n");
    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}

#[test]
fn missing_file_is_a_read_error() {
    let result = Config::load("/nonexistent/trade-enricher.toml");
    assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))));
}

#[test]
fn redis_url_can_come_from_environment() {
    let url = "redis://env-override.test:6390";
    std::env::set_var(REDIS_URL_ENV, url);
    let result = Config::parse_toml("[store]\nredis_url = \"redis://file:6379\"\n");
    std::env::remove_var(REDIS_URL_ENV);

    assert_eq!(result.expect("valid config").store.redis_url, url);
}
