//! Shared cache store port.
//!
//! A network-reachable key/value store with per-key expiry. Values are opaque
//! strings; the product cache decides how to encode them. Every call may fail
//! with a [`StoreError`], which callers are expected to absorb.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ProductId;
use crate::error::StoreError;

/// Key prefix for cached products: `product:<id>`.
pub const PRODUCT_KEY_PREFIX: &str = "product:";

/// Key prefix for write locks: `lock:product:<id>`.
pub const LOCK_KEY_PREFIX: &str = "lock:product:";

/// Pseudo-key guarding bulk writes.
///
/// Kept outside [`LOCK_KEY_PREFIX`] so no product id can map onto it.
pub const BULK_LOCK_KEY: &str = "lock:product-bulk";

/// Shared store key for a cached product.
#[must_use]
pub fn product_key(id: &ProductId) -> String {
    format!("{PRODUCT_KEY_PREFIX}{id}")
}

/// Shared store key for the write lock of a single product.
#[must_use]
pub fn lock_key(id: &ProductId) -> String {
    format!("{LOCK_KEY_PREFIX}{id}")
}

/// Key/value operations the cache needs from a shared store.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Fetch the value at `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` at `key`, replacing any existing value, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Store `value` at `key` only if no live value exists.
    ///
    /// Returns `true` if this call created the entry.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
