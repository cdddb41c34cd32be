//! Scripted [`SharedStore`] for exercising cache failure paths.
//!
//! [`ScriptedStore`] delegates to a [`MemoryStore`] and layers on:
//!
//! - a queue of errors returned by the next `get` calls,
//! - an outage switch that fails every call,
//! - a delay applied to `set` so a write can hold its lease open,
//! - call counters for asserting how often the cache reached the store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::outbound::MemoryStore;
use crate::domain::Product;
use crate::error::StoreError;
use crate::port::outbound::store::{product_key, SharedStore};

#[derive(Debug, Default)]
struct StoreCalls {
    gets: AtomicU32,
    sets: AtomicU32,
    set_if_absents: AtomicU32,
    deletes: AtomicU32,
}

impl StoreCalls {
    fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// A store double with scripted failures over an in-memory store.
pub struct ScriptedStore {
    inner: MemoryStore,
    get_errors: Mutex<VecDeque<StoreError>>,
    down: AtomicBool,
    set_delay: Duration,
    calls: StoreCalls,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            get_errors: Mutex::new(VecDeque::new()),
            down: AtomicBool::new(false),
            set_delay: Duration::ZERO,
            calls: StoreCalls::default(),
        }
    }

    /// A store that fails every call until [`ScriptedStore::set_down`] is
    /// called with `false`.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_down(true);
        store
    }

    /// Fail the next `get` calls with these errors, in order.
    pub fn with_get_errors(self, errors: Vec<StoreError>) -> Self {
        *self.get_errors.lock() = errors.into();
        self
    }

    /// Fail the next `n` `get` calls with a transport error.
    pub fn with_transient_read_failures(self, n: usize) -> Self {
        let errors = (0..n)
            .map(|i| StoreError::Transport(format!("scripted read failure {i}")))
            .collect();
        self.with_get_errors(errors)
    }

    /// Delay every `set` by `delay`.
    pub fn with_set_delay(mut self, delay: Duration) -> Self {
        self.set_delay = delay;
        self
    }

    /// Toggle the outage switch.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Put `product` in the store directly, bypassing any cache.
    pub async fn seed(&self, product: &Product) {
        let json = serde_json::to_string(product).expect("product serializes");
        self.seed_raw(&product_key(product.product_id()), &json).await;
    }

    /// Put a raw value at `key` with a one-hour TTL.
    pub async fn seed_raw(&self, key: &str, value: &str) {
        self.inner
            .set(key, value, Duration::from_secs(3600))
            .await
            .expect("memory store accepts writes");
    }

    pub fn get_count(&self) -> u32 {
        self.calls.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> u32 {
        self.calls.sets.load(Ordering::SeqCst)
    }

    pub fn set_if_absent_count(&self) -> u32 {
        self.calls.set_if_absents.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> u32 {
        self.calls.deletes.load(Ordering::SeqCst)
    }

    fn check_up(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("scripted outage".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for ScriptedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedStore for ScriptedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        StoreCalls::bump(&self.calls.gets);
        self.check_up()?;
        let scripted = self.get_errors.lock().pop_front();
        if let Some(err) = scripted {
            return Err(err);
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        StoreCalls::bump(&self.calls.sets);
        if !self.set_delay.is_zero() {
            tokio::time::sleep(self.set_delay).await;
        }
        self.check_up()?;
        self.inner.set(key, value, ttl).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        StoreCalls::bump(&self.calls.set_if_absents);
        self.check_up()?;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        StoreCalls::bump(&self.calls.deletes);
        self.check_up()?;
        self.inner.delete(key).await
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
