//! Redis-backed shared store.
//!
//! Uses a single multiplexed async connection that is opened lazily and
//! dropped after a connection-level failure so the next call reconnects.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::port::outbound::store::SharedStore;

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Redis implementation of [`SharedStore`].
pub struct RedisStore {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisStore {
    /// Create a store for `redis_url` without connecting yet.
    pub fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    /// Open the connection eagerly so misconfiguration shows up at startup.
    pub async fn connect(&self) -> Result<(), StoreError> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        debug!("Opened redis connection");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Map a command failure, discarding the cached connection if it is broken.
    async fn fail(&self, err: redis::RedisError) -> StoreError {
        if err.is_io_error() || err.is_connection_dropped() {
            warn!(error = %err, "Redis connection lost, will reconnect");
            *self.connection.lock().await = None;
        }
        err.into()
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let reply: redis::RedisResult<Option<String>> =
            redis::cmd("GET").arg(key).query_async(&mut conn).await;
        match reply {
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail(err).await),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let reply: redis::RedisResult<()> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await;
        match reply {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err).await),
        }
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        // SET .. NX replies OK when the key was created and nil otherwise.
        let reply: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await;
        match reply {
            Ok(created) => Ok(created.is_some()),
            Err(err) => Err(self.fail(err).await),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let reply: redis::RedisResult<i64> = redis::cmd("DEL").arg(key).query_async(&mut conn).await;
        match reply {
            Ok(_) => Ok(()),
            Err(err) => Err(self.fail(err).await),
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
