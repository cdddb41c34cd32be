//! Trade enrichment against a materialized product projection.
//!
//! The projection is an id → product snapshot replaced wholesale by each
//! [`TradeEnrichmentService::load_products`] call. Readers always see either
//! the previous snapshot or the new one, never a partial load.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::{Product, ProductId, Trade, MISSING_PRODUCT_NAME};
use crate::error::Result;

type Projection = HashMap<ProductId, Product>;

/// Lifecycle of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionState {
    /// No batch has been loaded yet.
    Empty,
    /// At least one batch has been loaded; `loads` counts them.
    Populated { loads: u64 },
}

struct Snapshot {
    products: Arc<Projection>,
    loads: u64,
}

/// Joins trades against the most recently loaded product batch.
pub struct TradeEnrichmentService {
    projection: RwLock<Snapshot>,
}

impl TradeEnrichmentService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            projection: RwLock::new(Snapshot {
                products: Arc::new(HashMap::new()),
                loads: 0,
            }),
        }
    }

    /// Replace the projection with the contents of `products`.
    ///
    /// The input is drained into a fresh map before the swap; if it faults,
    /// the error is returned and the current projection is left in place.
    pub async fn load_products<S>(&self, products: S) -> Result<HashMap<ProductId, Product>>
    where
        S: Stream<Item = Result<Product>>,
    {
        let mut products = std::pin::pin!(products);
        let mut fresh = HashMap::new();

        while let Some(item) = products.next().await {
            let product = match item {
                Ok(product) => product,
                Err(e) => {
                    warn!(loaded = fresh.len(), error = %e, "Projection load interrupted, keeping previous batch");
                    return Err(e);
                }
            };
            fresh.insert(product.product_id().clone(), product);
        }

        {
            let mut snapshot = self.projection.write();
            snapshot.products = Arc::new(fresh.clone());
            snapshot.loads += 1;
        }
        info!(products = fresh.len(), "Product projection replaced");

        Ok(fresh)
    }

    /// Attach the product name to one trade.
    ///
    /// Unknown products get the missing-product placeholder.
    pub fn enrich_one(&self, trade: &Trade) -> Trade {
        let products = self.snapshot();
        match products.get(trade.product_id()) {
            Some(product) => trade.with_product_name(product.product_name()),
            None => {
                warn!(product_id = %trade.product_id(), date = %trade.date(), "No product for trade, using placeholder");
                trade.with_product_name(MISSING_PRODUCT_NAME)
            }
        }
    }

    /// Enrich every trade of `trades` as it arrives, preserving order.
    ///
    /// Upstream faults are passed through unchanged. Each trade is joined
    /// against the projection current at the time it is pulled.
    pub fn enrich_all<S>(self: Arc<Self>, trades: S) -> impl Stream<Item = Result<Trade>>
    where
        S: Stream<Item = Result<Trade>>,
    {
        trades.map(move |item| {
            let trade = item?;
            Ok(self.enrich_one(&trade))
        })
    }

    /// Look up a product in the current projection.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.snapshot().get(id).cloned()
    }

    #[must_use]
    pub fn projection_len(&self) -> usize {
        self.projection.read().products.len()
    }

    #[must_use]
    pub fn projection_state(&self) -> ProjectionState {
        match self.projection.read().loads {
            0 => ProjectionState::Empty,
            loads => ProjectionState::Populated { loads },
        }
    }

    fn snapshot(&self) -> Arc<Projection> {
        Arc::clone(&self.projection.read().products)
    }
}

impl Default for TradeEnrichmentService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::NaiveDate;
    use futures_util::stream;
    use rust_decimal_macros::dec;

    fn product(id: &str, name: &str) -> Product {
        Product::try_new(id, name).unwrap()
    }

    fn trade(id: &str) -> Trade {
        Trade::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            ProductId::from(id),
            "USD",
            dec!(150.75),
        )
    }

    #[tokio::test]
    async fn projection_starts_empty() {
        let service = TradeEnrichmentService::new();
        assert_eq!(service.projection_state(), ProjectionState::Empty);
        assert_eq!(service.projection_len(), 0);
    }

    #[tokio::test]
    async fn load_replaces_rather_than_merges() {
        let service = TradeEnrichmentService::new();
        service
            .load_products(stream::iter(vec![Ok(product("1", "Bond A"))]))
            .await
            .unwrap();
        service
            .load_products(stream::iter(vec![Ok(product("2", "Bond B"))]))
            .await
            .unwrap();

        assert_eq!(service.projection_len(), 1);
        assert!(service.product(&ProductId::from("1")).is_none());
        assert_eq!(
            service.projection_state(),
            ProjectionState::Populated { loads: 2 }
        );
    }

    #[tokio::test]
    async fn interrupted_load_keeps_previous_projection() {
        let service = TradeEnrichmentService::new();
        service
            .load_products(stream::iter(vec![Ok(product("1", "Bond A"))]))
            .await
            .unwrap();

        let result = service
            .load_products(stream::iter(vec![
                Ok(product("2", "Bond B")),
                Err(Error::Io(std::io::Error::other("reset"))),
            ]))
            .await;

        assert!(result.is_err());
        assert_eq!(
            service.product(&ProductId::from("1")),
            Some(product("1", "Bond A"))
        );
        assert!(service.product(&ProductId::from("2")).is_none());
        assert_eq!(
            service.projection_state(),
            ProjectionState::Populated { loads: 1 }
        );
    }

    #[tokio::test]
    async fn enrich_one_falls_back_to_placeholder() {
        let service = TradeEnrichmentService::new();
        service
            .load_products(stream::iter(vec![Ok(product("1", "Bond A"))]))
            .await
            .unwrap();

        assert_eq!(service.enrich_one(&trade("1")).product_name(), Some("Bond A"));
        assert_eq!(
            service.enrich_one(&trade("4")).product_name(),
            Some(MISSING_PRODUCT_NAME)
        );
    }

    #[tokio::test]
    async fn enrich_all_preserves_order_and_passes_faults_through() {
        let service = Arc::new(TradeEnrichmentService::new());
        service
            .load_products(stream::iter(vec![
                Ok(product("1", "Bond A")),
                Ok(product("2", "Bond B")),
            ]))
            .await
            .unwrap();

        let input = stream::iter(vec![
            Ok(trade("2")),
            Ok(trade("1")),
            Err(Error::Io(std::io::Error::other("broken pipe"))),
        ]);
        let out: Vec<Result<Trade>> = Arc::clone(&service).enrich_all(input).collect().await;

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap().product_name(), Some("Bond B"));
        assert_eq!(out[1].as_ref().unwrap().product_name(), Some("Bond A"));
        assert!(out[2].is_err());
    }
}
