use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures raised by a shared cache store.
///
/// Every variant is recoverable from the cache's point of view: reads degrade
/// to a miss and writes degrade to local-only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store transport error: {0}")]
    Transport(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt entry at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Per-record decoding errors. These drop a single record, never a stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("field '{field}' is empty")]
    EmptyField { field: &'static str },

    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("invalid price '{value}': {reason}")]
    InvalidPrice { value: String, reason: String },

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors surfaced by the product cache's bounded-retry read path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("product {product_id} not available after {attempts} attempts")]
    RetriesExhausted { product_id: String, attempts: u32 },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
