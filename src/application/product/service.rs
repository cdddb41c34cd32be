//! Product retrieval and loading through the [`ProductCache`].
//!
//! Lookups never fail: an id that cannot be resolved yields the
//! missing-product placeholder.

use std::sync::Arc;

use futures_util::{stream, Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::cache::{ProductCache, WriteOutcome};
use crate::domain::{Product, ProductId};
use crate::error::Result;

/// Default number of in-flight lookups in [`ProductService::get_by_ids`].
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 16;

/// Result of the shared-tier write for a loaded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedWriteStatus {
    Stored,
    LockBusy,
    Failed,
}

/// Summary returned by [`ProductService::load_many`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Products received from the input.
    pub received: usize,
    /// Products written to the shared store.
    pub stored: usize,
    pub shared: SharedWriteStatus,
}

impl LoadSummary {
    fn from_outcome(received: usize, outcome: &WriteOutcome) -> Self {
        let (stored, shared) = match outcome {
            WriteOutcome::Stored(n) => (*n, SharedWriteStatus::Stored),
            WriteOutcome::LockBusy => (0, SharedWriteStatus::LockBusy),
            WriteOutcome::Failed(_) => (0, SharedWriteStatus::Failed),
        };
        Self {
            received,
            stored,
            shared,
        }
    }
}

/// Resolves products by id and loads product batches into the cache.
pub struct ProductService {
    cache: Arc<ProductCache>,
    concurrency: usize,
}

impl ProductService {
    pub fn new(cache: Arc<ProductCache>) -> Self {
        Self::with_concurrency(cache, DEFAULT_LOOKUP_CONCURRENCY)
    }

    /// Create a service whose batch lookups keep at most `concurrency` in flight.
    pub fn with_concurrency(cache: Arc<ProductCache>, concurrency: usize) -> Self {
        Self {
            cache,
            concurrency: concurrency.max(1),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ProductCache> {
        &self.cache
    }

    /// Resolve a product, re-checking the cache once before giving up.
    ///
    /// The second read covers an entry that lands between the first miss and
    /// the fallback.
    pub async fn find_by_id(&self, id: &ProductId) -> Option<Product> {
        if let Some(product) = self.cache.read_one(id).await {
            return Some(product);
        }
        debug!(product_id = %id, "Cache miss, re-checking");
        self.cache.read_one(id).await
    }

    /// Resolve a product or return the missing-product placeholder.
    pub async fn get_by_id(&self, id: &ProductId) -> Product {
        match self.find_by_id(id).await {
            Some(product) => product,
            None => {
                warn!(product_id = %id, "Product not found, using placeholder");
                Product::missing(id.clone())
            }
        }
    }

    /// Resolve every id, one output per input.
    ///
    /// Lookups run concurrently, so the output order is unspecified.
    /// Duplicate ids are looked up (and returned) once per occurrence.
    pub async fn get_by_ids<I>(&self, ids: I) -> Vec<Product>
    where
        I: IntoIterator<Item = ProductId>,
    {
        stream::iter(ids)
            .map(|id| async move { self.get_by_id(&id).await })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    /// Drain `products` and write them to the cache as one bulk write.
    ///
    /// A fault in the input is returned as the error once the products
    /// received before it have been written. Nothing is retried.
    pub async fn load_many<S>(&self, products: S) -> Result<LoadSummary>
    where
        S: Stream<Item = Result<Product>>,
    {
        let mut products = std::pin::pin!(products);
        let mut batch = Vec::new();
        let mut fault = None;

        while let Some(item) = products.next().await {
            match item {
                Ok(product) => batch.push(product),
                Err(e) => {
                    fault = Some(e);
                    break;
                }
            }
        }

        let outcome = self.cache.write_many(&batch).await;
        let summary = LoadSummary::from_outcome(batch.len(), &outcome);

        if let Some(e) = fault {
            warn!(received = batch.len(), error = %e, "Product load interrupted");
            return Err(e);
        }
        info!(
            received = summary.received,
            stored = summary.stored,
            shared = ?summary.shared,
            "Products loaded"
        );
        Ok(summary)
    }
}
