//! Redis store for the remote queues.
//!
//! [`RedisStore`] implements [`RemoteStore`] on top of a bb8 connection pool:
//!
//! - FIFO/LIFO queues use one Redis list per queue (`LPUSH`/`RPUSH`, `RPOP`,
//!   `LRANGE`, `BRPOP`)
//! - priority queues use one sorted set per queue (`ZADD NX`, `ZPOPMAX`,
//!   `ZREVRANGE`) plus a `<name>:signal` list for `BLPOP` wake-ups
//!
//! # Usage
//!
//! ```rust,ignore
//! use queuebridge::backend::{Queue, RedisStore, RemoteQueue};
//! use std::sync::Arc;
//!
//! let store = RedisStore::builder()
//!     .redis_url("redis://localhost:6379")
//!     .build()
//!     .await?;
//!
//! let queue = RemoteQueue::fifo(Arc::new(store), "jobs", 1_000);
//! queue.add(vec!["hello".to_string().into()]).await?;
//! ```
//!
//! # Valkey Compatibility
//!
//! Since Valkey is Redis-compatible, this store works with Valkey servers
//! by simply pointing the URL to a Valkey instance.

mod commands;
mod pool;

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::{bb8::Pool, RedisConnectionManager};

pub use pool::RedisConfig;
pub use pool::{create_redis_pool, create_redis_pool_with_config};

use super::error::QueueError;
use super::remote::{ListEnd, RemoteStore};

/// Default server used when no URL is configured.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Redis-backed [`RemoteStore`].
///
/// Cloning is cheap and shares the pool. Dropping the last clone closes the
/// pooled connections; the keys stay on the server.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisStore {
    /// Wrap an existing pool.
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }

    /// Connect with the default pool configuration.
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        Self::builder().redis_url(redis_url).build().await
    }

    /// Create a builder for configuring the Redis store.
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::new()
    }

    /// Get the Redis connection pool.
    pub fn pool(&self) -> &Pool<RedisConnectionManager> {
        &self.pool
    }
}

/// Builder for creating a Redis store with custom configuration.
pub struct RedisStoreBuilder {
    redis_url: Option<String>,
    config: Option<RedisConfig>,
}

impl RedisStoreBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            redis_url: None,
            config: None,
        }
    }

    /// Set the Redis URL.
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Set the Redis pool configuration.
    pub fn config(mut self, config: RedisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pool, verify connectivity and return the store.
    pub async fn build(self) -> Result<RedisStore, QueueError> {
        let redis_url = self
            .redis_url
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
        let config = self.config.unwrap_or_default();

        let pool = create_redis_pool_with_config(&redis_url, config).await?;
        Ok(RedisStore::new(pool))
    }
}

impl Default for RedisStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// RemoteStore Implementation
// ============================================================================

#[async_trait]
impl RemoteStore for RedisStore {
    async fn list_len(&self, key: &str) -> Result<usize, QueueError> {
        commands::list_len(self, key).await
    }

    async fn list_push(
        &self,
        key: &str,
        end: ListEnd,
        values: Vec<Vec<u8>>,
    ) -> Result<usize, QueueError> {
        commands::list_push(self, key, end, values).await
    }

    async fn list_pop(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>, QueueError> {
        commands::list_pop(self, key, end).await
    }

    async fn list_peek(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>, QueueError> {
        commands::list_peek(self, key, end).await
    }

    async fn list_blocking_pop(
        &self,
        key: &str,
        end: ListEnd,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, QueueError> {
        commands::list_blocking_pop(self, key, end, timeout).await
    }

    async fn list_signal(&self, key: &str) -> Result<(), QueueError> {
        commands::list_signal(self, key).await
    }

    async fn zset_add_new(
        &self,
        key: &str,
        members: Vec<(i64, Vec<u8>)>,
    ) -> Result<usize, QueueError> {
        commands::zset_add_new(self, key, members).await
    }

    async fn zset_top(&self, key: &str) -> Result<Option<Vec<u8>>, QueueError> {
        commands::zset_top(self, key).await
    }

    async fn zset_pop_top(&self, key: &str) -> Result<Option<Vec<u8>>, QueueError> {
        commands::zset_pop_top(self, key).await
    }

    async fn zset_len(&self, key: &str) -> Result<usize, QueueError> {
        commands::zset_len(self, key).await
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), QueueError> {
        commands::delete(self, keys).await
    }

    async fn ping(&self) -> Result<(), QueueError> {
        commands::ping(self).await
    }
}
