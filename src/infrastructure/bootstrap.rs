//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::inbound::http::AppState;
use crate::adapter::outbound::{MemoryStore, RedisStore};
use crate::application::cache::{CacheSettings, ProductCache};
use crate::application::enrichment::TradeEnrichmentService;
use crate::application::product::ProductService;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::store::StoreBackend;
use crate::port::SharedStore;

/// Build the shared store selected by configuration.
///
/// An unreachable Redis is not fatal: the cache degrades to its local mirror
/// and the adapter reconnects on the next command.
pub async fn build_store(config: &Config) -> Result<Arc<dyn SharedStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-process shared store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisStore::new(&config.store.redis_url)?;
            match store.connect().await {
                Ok(()) => info!(url = %config.store.redis_url, "Connected to redis"),
                Err(e) => warn!(
                    url = %config.store.redis_url,
                    error = %e,
                    "Redis unreachable at startup, serving from local mirror until it recovers"
                ),
            }
            Ok(Arc::new(store))
        }
    }
}

/// Wire the cache and services over `store`.
pub fn build_state(config: &Config, store: Arc<dyn SharedStore>) -> AppState {
    let settings = CacheSettings::from(&config.cache);
    let cache = Arc::new(ProductCache::new(store, settings));

    AppState {
        products: Arc::new(ProductService::with_concurrency(
            cache,
            config.cache.lookup_concurrency,
        )),
        enrichment: Arc::new(TradeEnrichmentService::new()),
    }
}

/// Build the full application state from configuration.
pub async fn bootstrap(config: &Config) -> Result<AppState> {
    let store = build_store(config).await?;
    info!(
        store = store.name(),
        timeout_hours = config.cache.timeout_hours,
        max_retries = config.cache.max_retries,
        "Product cache configured"
    );
    Ok(build_state(config, store))
}
