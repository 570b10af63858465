//! Redis commands behind the [`RemoteStore`](crate::backend::RemoteStore) primitives.

use std::time::Duration;

use bb8_redis::bb8::PooledConnection;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use tracing::trace;

use super::RedisStore;
use crate::backend::error::QueueError;
use crate::backend::remote::ListEnd;

// ============================================================================
// Internal helpers
// ============================================================================

async fn get_conn(
    store: &RedisStore,
) -> Result<PooledConnection<'_, RedisConnectionManager>, QueueError> {
    store
        .pool()
        .get()
        .await
        .map_err(|e| QueueError::Unavailable(format!("Failed to get Redis connection: {}", e)))
}

fn push_command(end: ListEnd) -> &'static str {
    match end {
        ListEnd::Head => "LPUSH",
        ListEnd::Tail => "RPUSH",
    }
}

fn pop_command(end: ListEnd) -> &'static str {
    match end {
        ListEnd::Head => "LPOP",
        ListEnd::Tail => "RPOP",
    }
}

fn blocking_pop_command(end: ListEnd) -> &'static str {
    match end {
        ListEnd::Head => "BLPOP",
        ListEnd::Tail => "BRPOP",
    }
}

fn end_index(end: ListEnd) -> isize {
    match end {
        ListEnd::Head => 0,
        ListEnd::Tail => -1,
    }
}

/// Seconds argument for `BLPOP`/`BRPOP`. The server works in milliseconds and
/// reads a zero as "block forever", so shorter waits are rounded up.
fn blocking_timeout_secs(timeout: Duration) -> f64 {
    timeout.as_secs_f64().max(0.001)
}

// ============================================================================
// List primitives
// ============================================================================

pub async fn list_len(store: &RedisStore, key: &str) -> Result<usize, QueueError> {
    let mut conn = get_conn(store).await?;
    let len: usize = conn.llen(key).await?;
    Ok(len)
}

pub async fn list_push(
    store: &RedisStore,
    key: &str,
    end: ListEnd,
    values: Vec<Vec<u8>>,
) -> Result<usize, QueueError> {
    let mut conn = get_conn(store).await?;
    let len: usize = redis::cmd(push_command(end))
        .arg(key)
        .arg(values)
        .query_async(&mut *conn)
        .await?;
    Ok(len)
}

pub async fn list_pop(
    store: &RedisStore,
    key: &str,
    end: ListEnd,
) -> Result<Option<Vec<u8>>, QueueError> {
    let mut conn = get_conn(store).await?;
    let value: Option<Vec<u8>> = redis::cmd(pop_command(end))
        .arg(key)
        .query_async(&mut *conn)
        .await?;
    Ok(value)
}

pub async fn list_peek(
    store: &RedisStore,
    key: &str,
    end: ListEnd,
) -> Result<Option<Vec<u8>>, QueueError> {
    let mut conn = get_conn(store).await?;
    let index = end_index(end);
    let values: Vec<Vec<u8>> = redis::cmd("LRANGE")
        .arg(key)
        .arg(index)
        .arg(index)
        .query_async(&mut *conn)
        .await?;
    Ok(values.into_iter().next())
}

pub async fn list_blocking_pop(
    store: &RedisStore,
    key: &str,
    end: ListEnd,
    timeout: Duration,
) -> Result<Option<Vec<u8>>, QueueError> {
    // Redis treats a zero timeout as "block forever".
    if timeout.is_zero() {
        return list_pop(store, key, end).await;
    }

    let mut conn = get_conn(store).await?;
    trace!(key, timeout = ?timeout, "blocking pop");
    let popped: Option<(String, Vec<u8>)> = redis::cmd(blocking_pop_command(end))
        .arg(key)
        .arg(blocking_timeout_secs(timeout))
        .query_async(&mut *conn)
        .await?;
    Ok(popped.map(|(_, value)| value))
}

pub async fn list_signal(store: &RedisStore, key: &str) -> Result<(), QueueError> {
    let mut conn = get_conn(store).await?;
    let _: () = redis::pipe()
        .atomic()
        .cmd("DEL")
        .arg(key)
        .ignore()
        .cmd("RPUSH")
        .arg(key)
        .arg(1)
        .ignore()
        .query_async(&mut *conn)
        .await?;
    Ok(())
}

// ============================================================================
// Sorted-set primitives
// ============================================================================

pub async fn zset_add_new(
    store: &RedisStore,
    key: &str,
    members: Vec<(i64, Vec<u8>)>,
) -> Result<usize, QueueError> {
    if members.is_empty() {
        return Ok(0);
    }

    let mut conn = get_conn(store).await?;
    let mut cmd = redis::cmd("ZADD");
    cmd.arg(key).arg("NX");
    for (score, member) in members {
        // Scores are doubles on the server side.
        cmd.arg(score as f64).arg(member);
    }
    let added: usize = cmd.query_async(&mut *conn).await?;
    Ok(added)
}

pub async fn zset_top(store: &RedisStore, key: &str) -> Result<Option<Vec<u8>>, QueueError> {
    let mut conn = get_conn(store).await?;
    let members: Vec<Vec<u8>> = redis::cmd("ZREVRANGE")
        .arg(key)
        .arg(0)
        .arg(0)
        .query_async(&mut *conn)
        .await?;
    Ok(members.into_iter().next())
}

pub async fn zset_pop_top(store: &RedisStore, key: &str) -> Result<Option<Vec<u8>>, QueueError> {
    let mut conn = get_conn(store).await?;
    let popped: Vec<(Vec<u8>, f64)> = redis::cmd("ZPOPMAX")
        .arg(key)
        .query_async(&mut *conn)
        .await?;
    Ok(popped.into_iter().next().map(|(member, _)| member))
}

pub async fn zset_len(store: &RedisStore, key: &str) -> Result<usize, QueueError> {
    let mut conn = get_conn(store).await?;
    let len: usize = conn.zcard(key).await?;
    Ok(len)
}

// ============================================================================
// Keyspace
// ============================================================================

pub async fn delete(store: &RedisStore, keys: &[&str]) -> Result<(), QueueError> {
    if keys.is_empty() {
        return Ok(());
    }

    let mut conn = get_conn(store).await?;
    let mut cmd = redis::cmd("DEL");
    for key in keys {
        cmd.arg(*key);
    }
    let _: usize = cmd.query_async(&mut *conn).await?;
    Ok(())
}

pub async fn ping(store: &RedisStore) -> Result<(), QueueError> {
    let mut conn = get_conn(store).await?;
    let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
    Ok(())
}
