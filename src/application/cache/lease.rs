//! TTL-bounded write leases held in the shared store.
//!
//! A lease is a `set_if_absent` marker carrying a random token. Holders
//! release it when their critical section ends; a holder that never gets
//! that far is covered by [`Drop`], which schedules the release on the
//! runtime, and ultimately by the marker's TTL.
//!
//! Leases are advisory: if a holder outlives its TTL another writer may
//! acquire the same key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::port::outbound::store::SharedStore;

/// A held lease. Release with [`LeaseGuard::release`].
#[must_use = "a lease is released as soon as the guard is dropped"]
pub struct LeaseGuard {
    store: Arc<dyn SharedStore>,
    key: String,
    token: String,
    released: bool,
}

impl LeaseGuard {
    /// Try to take the lease at `key` for `ttl`.
    ///
    /// Returns `Ok(None)` if another holder has it.
    pub async fn acquire(
        store: Arc<dyn SharedStore>,
        key: impl Into<String>,
        ttl: Duration,
    ) -> Result<Option<Self>, StoreError> {
        let key = key.into();
        let token = uuid::Uuid::new_v4().to_string();

        if !store.set_if_absent(&key, &token, ttl).await? {
            debug!(key = %key, "Lease held elsewhere");
            return Ok(None);
        }

        debug!(key = %key, ttl_ms = ttl.as_millis(), "Lease acquired");
        Ok(Some(Self {
            store,
            key,
            token,
            released: false,
        }))
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lease. Errors are logged; the TTL covers anything missed.
    pub async fn release(mut self) {
        self.released = true;
        release(self.store.as_ref(), &self.key, &self.token).await;
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = Arc::clone(&self.store);
        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    release(store.as_ref(), &key, &token).await;
                });
            }
            Err(_) => warn!(key = %key, "Lease dropped outside runtime, left to expire"),
        }
    }
}

/// Delete the marker unless it has expired and been taken by someone else.
async fn release(store: &dyn SharedStore, key: &str, token: &str) {
    match store.get(key).await {
        Ok(Some(current)) if current != token => {
            debug!(key = %key, "Lease expired and was re-acquired elsewhere");
            return;
        }
        Ok(_) => {}
        // Can't confirm ownership; delete anyway so a live lease isn't leaked.
        Err(e) => debug!(key = %key, error = %e, "Lease ownership check failed"),
    }

    match store.delete(key).await {
        Ok(()) => debug!(key = %key, "Lease released"),
        Err(e) => warn!(key = %key, error = %e, "Failed to release lease"),
    }
}

/// Run `critical` while holding the lease at `key`.
///
/// Returns `Ok(None)` without running `critical` when the lease is held
/// elsewhere. The lease is released on every exit path.
pub async fn with_lease<F, Fut, T>(
    store: Arc<dyn SharedStore>,
    key: &str,
    ttl: Duration,
    critical: F,
) -> Result<Option<T>, StoreError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let Some(guard) = LeaseGuard::acquire(store, key, ttl).await? else {
        return Ok(None);
    };
    let out = critical().await;
    guard.release().await;
    Ok(Some(out))
}
