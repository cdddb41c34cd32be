#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use trade_enricher::application::cache::{CacheSettings, ProductCache};
use trade_enricher::port::SharedStore;

/// Cache settings with retry delays short enough for tests.
pub fn fast_settings() -> CacheSettings {
    CacheSettings {
        max_retries: 3,
        retry_delay: Duration::from_millis(5),
        ..CacheSettings::default()
    }
}

/// A cache over `store` with [`fast_settings`].
pub fn cache_over(store: Arc<dyn SharedStore>) -> Arc<ProductCache> {
    Arc::new(ProductCache::new(store, fast_settings()))
}
