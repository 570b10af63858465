//! Redis connection pool management.

use bb8_redis::bb8::Pool;
use bb8_redis::RedisConnectionManager;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::backend::error::QueueError;

/// Configuration for Redis connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum number of idle connections
    pub min_idle: u32,
    /// Connection timeout
    #[serde(with = "secs")]
    pub conn_timeout: Duration,
    /// Idle connection timeout
    #[serde(with = "secs")]
    pub idle_timeout: Duration,
    /// Maximum connection lifetime
    #[serde(with = "secs")]
    pub max_lifetime: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            max_size: 16,
            min_idle: 1,
            conn_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Durations written as whole seconds.
mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Build a pool with default configuration and verify it with a PING.
pub async fn create_redis_pool(
    redis_url: &str,
) -> Result<Pool<RedisConnectionManager>, QueueError> {
    create_redis_pool_with_config(redis_url, RedisConfig::default()).await
}

/// Build a pool with custom configuration and verify it with a PING.
pub async fn create_redis_pool_with_config(
    redis_url: &str,
    config: RedisConfig,
) -> Result<Pool<RedisConnectionManager>, QueueError> {
    tracing::info!(
        url = %redacted(redis_url),
        "Redis pool: max_size={}, min_idle={}, timeouts: conn={}s idle={}s life={}s",
        config.max_size,
        config.min_idle,
        config.conn_timeout.as_secs(),
        config.idle_timeout.as_secs(),
        config.max_lifetime.as_secs()
    );

    if config.max_size == 0 {
        return Err(QueueError::InvalidValue("max_size must be > 0".into()));
    }

    let manager = RedisConnectionManager::new(redis_url).map_err(|e| {
        QueueError::InvalidValue(format!(
            "invalid redis url: {} - {}",
            redacted(redis_url),
            e
        ))
    })?;

    let min_idle = config.min_idle.max(1).min(config.max_size);

    let pool = Pool::builder()
        .max_size(config.max_size)
        .min_idle(Some(min_idle))
        .connection_timeout(config.conn_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .build(manager)
        .await
        .map_err(|e| QueueError::Unavailable(format!("failed to build Redis pool: {}", e)))?;

    // Warm/verify the pool once with retry + exponential backoff
    retry_async(3, Duration::from_millis(400), || async {
        let mut conn = pool
            .get()
            .await
            .map_err(|e| QueueError::Unavailable(format!("get() from pool: {}", e)))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| QueueError::Unavailable(format!("Redis PING failed: {}", e)))?;
        Ok::<_, QueueError>(())
    })
    .await
    .map_err(|e| {
        QueueError::Unavailable(format!(
            "unable to verify Redis connectivity after retries: {}",
            e
        ))
    })?;

    Ok(pool)
}

/// Generic async retry with exponential backoff.
async fn retry_async<F, Fut, T>(
    max_retries: u32,
    base_delay: Duration,
    mut f: F,
) -> Result<T, QueueError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, QueueError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                let delay = base_delay.mul_f32(2f32.powi((attempt - 1) as i32));
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay = ?delay,
                    error = %e,
                    "Redis pool check failed, retrying"
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Redact credentials in logs
pub(crate) fn redacted(url: &str) -> String {
    if let Some(idx) = url.find('@') {
        let head = &url[..idx];
        if let Some(scheme_end) = head.find("://") {
            let scheme_end = scheme_end + 3;
            return format!("{}***:***{}", &url[..scheme_end], &url[idx..]);
        }
    }
    url.to_string()
}
