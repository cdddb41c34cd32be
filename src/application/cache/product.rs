//! Two-tier product cache.
//!
//! Reads go to the in-process mirror first and fall back to the shared store.
//! Writes go to both tiers; the shared tier is guarded by a lease per product
//! (or one lease for a bulk write). The shared tier is fail-open: any store
//! fault degrades a read to a miss and a write to local-only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::lease::with_lease;
use crate::domain::{Product, ProductId};
use crate::error::{CacheError, StoreError};
use crate::port::outbound::store::{lock_key, product_key, SharedStore, BULK_LOCK_KEY};

/// Tunables for [`ProductCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Expiry of product entries in the shared store.
    pub entry_ttl: Duration,
    /// Lease TTL for single-product writes.
    pub lock_ttl: Duration,
    /// Lease TTL for bulk writes.
    pub bulk_lock_ttl: Duration,
    /// Retries after the first attempt in [`ProductCache::read_one_with_retry`].
    pub max_retries: u32,
    /// Fixed delay between retry attempts.
    pub retry_delay: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(24 * 60 * 60),
            lock_ttl: Duration::from_secs(5),
            bulk_lock_ttl: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

/// Outcome of a single cache lookup.
///
/// Callers outside the cache usually collapse `NotFound` and
/// `TransportError` into the same fallback; the distinction is kept for
/// logging and [`CacheStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Product),
    NotFound,
    TransportError(StoreError),
}

impl Lookup {
    /// Collapse to an option, treating transport errors as a miss.
    #[must_use]
    pub fn into_option(self) -> Option<Product> {
        match self {
            Self::Found(product) => Some(product),
            Self::NotFound | Self::TransportError(_) => None,
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// What happened to the shared-tier part of a write.
///
/// The local mirror is updated regardless of the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Entries written to the shared store.
    Stored(usize),
    /// Another writer held the lease; the shared write was skipped.
    LockBusy,
    /// The shared store failed; the shared write was abandoned.
    Failed(StoreError),
}

impl WriteOutcome {
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub local_hits: u64,
    pub shared_hits: u64,
    pub misses: u64,
    pub transport_errors: u64,
    pub writes_stored: u64,
    pub writes_skipped: u64,
    pub writes_failed: u64,
    pub mirror_size: usize,
}

#[derive(Debug, Default)]
struct Counters {
    local_hits: AtomicU64,
    shared_hits: AtomicU64,
    misses: AtomicU64,
    transport_errors: AtomicU64,
    writes_stored: AtomicU64,
    writes_skipped: AtomicU64,
    writes_failed: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_write(&self, outcome: &WriteOutcome) {
        match outcome {
            WriteOutcome::Stored(_) => Self::bump(&self.writes_stored),
            WriteOutcome::LockBusy => Self::bump(&self.writes_skipped),
            WriteOutcome::Failed(_) => Self::bump(&self.writes_failed),
        }
    }
}

/// Product cache over a local mirror and a [`SharedStore`].
pub struct ProductCache {
    store: Arc<dyn SharedStore>,
    mirror: DashMap<ProductId, Product>,
    settings: CacheSettings,
    counters: Counters,
}

impl ProductCache {
    pub fn new(store: Arc<dyn SharedStore>, settings: CacheSettings) -> Self {
        Self {
            store,
            mirror: DashMap::new(),
            settings,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Write one product to both tiers.
    pub async fn write_one(&self, product: &Product) -> WriteOutcome {
        let id = product.product_id().clone();
        self.mirror.insert(id.clone(), product.clone());

        let outcome = match encode(product) {
            Ok(json) => {
                let key = product_key(&id);
                let ttl = self.settings.entry_ttl;
                let store = Arc::clone(&self.store);
                let write = with_lease(
                    Arc::clone(&self.store),
                    &lock_key(&id),
                    self.settings.lock_ttl,
                    || async move { store.set(&key, &json, ttl).await },
                )
                .await;
                match write {
                    Ok(Some(Ok(()))) => WriteOutcome::Stored(1),
                    Ok(None) => WriteOutcome::LockBusy,
                    Ok(Some(Err(e))) | Err(e) => WriteOutcome::Failed(e),
                }
            }
            Err(e) => WriteOutcome::Failed(e),
        };

        match &outcome {
            WriteOutcome::Stored(_) => debug!(product_id = %id, "Product cached"),
            WriteOutcome::LockBusy => {
                debug!(product_id = %id, "Write lock busy, shared write skipped");
            }
            WriteOutcome::Failed(e) => {
                warn!(product_id = %id, error = %e, "Shared write failed, kept locally");
            }
        }
        self.counters.record_write(&outcome);
        outcome
    }

    /// Write a batch of products under the bulk lease.
    ///
    /// Every product is mirrored locally even if the batch is skipped in the
    /// shared store. A failure on one entry does not stop the rest.
    pub async fn write_many(&self, products: &[Product]) -> WriteOutcome {
        if products.is_empty() {
            return WriteOutcome::Stored(0);
        }
        for product in products {
            self.mirror
                .insert(product.product_id().clone(), product.clone());
        }

        let store = Arc::clone(&self.store);
        let ttl = self.settings.entry_ttl;
        let write = with_lease(
            Arc::clone(&self.store),
            BULK_LOCK_KEY,
            self.settings.bulk_lock_ttl,
            || async move {
                let mut stored = 0usize;
                let mut first_error = None;
                for product in products {
                    let key = product_key(product.product_id());
                    let result = match encode(product) {
                        Ok(json) => store.set(&key, &json, ttl).await,
                        Err(e) => Err(e),
                    };
                    match result {
                        Ok(()) => stored += 1,
                        Err(e) => {
                            debug!(product_id = %product.product_id(), error = %e, "Bulk entry failed");
                            first_error.get_or_insert(e);
                        }
                    }
                }
                (stored, first_error)
            },
        )
        .await;

        let outcome = match write {
            Ok(Some((stored, None))) => WriteOutcome::Stored(stored),
            Ok(Some((stored, Some(e)))) => {
                warn!(
                    stored,
                    total = products.len(),
                    error = %e,
                    "Bulk write partially failed"
                );
                WriteOutcome::Failed(e)
            }
            Ok(None) => {
                info!(
                    count = products.len(),
                    "Bulk write lock busy, batch kept locally"
                );
                WriteOutcome::LockBusy
            }
            Err(e) => {
                warn!(error = %e, "Bulk write lock unavailable, batch kept locally");
                WriteOutcome::Failed(e)
            }
        };
        if let WriteOutcome::Stored(count) = outcome {
            debug!(count, "Bulk write stored");
        }
        self.counters.record_write(&outcome);
        outcome
    }

    /// Look up a product, distinguishing misses from store faults.
    pub async fn lookup(&self, id: &ProductId) -> Lookup {
        if let Some(product) = self.mirror.get(id) {
            Counters::bump(&self.counters.local_hits);
            return Lookup::Found(product.clone());
        }

        let key = product_key(id);
        let lookup = match self.store.get(&key).await {
            Ok(Some(json)) => match decode(id, &key, &json) {
                Ok(product) => {
                    self.mirror.insert(id.clone(), product.clone());
                    Counters::bump(&self.counters.shared_hits);
                    Lookup::Found(product)
                }
                Err(e) => Lookup::TransportError(e),
            },
            Ok(None) => Lookup::NotFound,
            Err(e) => Lookup::TransportError(e),
        };

        match &lookup {
            Lookup::NotFound => Counters::bump(&self.counters.misses),
            Lookup::TransportError(e) => {
                Counters::bump(&self.counters.transport_errors);
                warn!(product_id = %id, store = self.store.name(), error = %e, "Cache read failed, treating as miss");
            }
            Lookup::Found(_) => {}
        }
        lookup
    }

    /// Read a product; store faults are reported as a miss.
    pub async fn read_one(&self, id: &ProductId) -> Option<Product> {
        self.lookup(id).await.into_option()
    }

    /// Read a product, retrying with a fixed delay while it is missing or the
    /// store is failing.
    ///
    /// Makes `1 + max_retries` attempts in total.
    pub async fn read_one_with_retry(&self, id: &ProductId) -> Result<Product, CacheError> {
        let attempts = self.settings.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            match self.lookup(id).await {
                Lookup::Found(product) => return Ok(product),
                Lookup::NotFound => debug!(product_id = %id, attempt, "Product not cached yet"),
                Lookup::TransportError(_) => debug!(product_id = %id, attempt, "Read attempt failed"),
            }
            if attempt < attempts {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        warn!(product_id = %id, attempts, "Product unavailable after retries");
        Err(CacheError::RetriesExhausted {
            product_id: id.to_string(),
            attempts,
        })
    }

    /// Drop a product from both tiers. Best effort; failures are logged.
    pub async fn invalidate(&self, id: &ProductId) {
        self.mirror.remove(id);
        match self.store.delete(&product_key(id)).await {
            Ok(()) => debug!(product_id = %id, "Product invalidated"),
            Err(e) => warn!(product_id = %id, error = %e, "Failed to invalidate shared entry"),
        }
    }

    /// True if the product is held in the local mirror.
    #[must_use]
    pub fn is_mirrored(&self, id: &ProductId) -> bool {
        self.mirror.contains_key(id)
    }

    #[must_use]
    pub fn mirror_len(&self) -> usize {
        self.mirror.len()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            local_hits: c.local_hits.load(Ordering::Relaxed),
            shared_hits: c.shared_hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            transport_errors: c.transport_errors.load(Ordering::Relaxed),
            writes_stored: c.writes_stored.load(Ordering::Relaxed),
            writes_skipped: c.writes_skipped.load(Ordering::Relaxed),
            writes_failed: c.writes_failed.load(Ordering::Relaxed),
            mirror_size: self.mirror.len(),
        }
    }
}

fn encode(product: &Product) -> Result<String, StoreError> {
    serde_json::to_string(product).map_err(|e| StoreError::Corrupt {
        key: product_key(product.product_id()),
        reason: e.to_string(),
    })
}

/// Decode the entry at `key`, which must hold the product `id`.
fn decode(id: &ProductId, key: &str, json: &str) -> Result<Product, StoreError> {
    let product: Product = serde_json::from_str(json).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    if product.product_id() != id {
        return Err(StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("entry holds product {}", product.product_id()),
        });
    }
    Ok(product)
}
