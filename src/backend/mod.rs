//! Queue backends for queuebridge.
//!
//! This module provides the [`Queue`] contract and its implementations. Two
//! engines are available: process memory, and a remote store (Redis by
//! default) shared between processes.
//!
//! # Architecture
//!
//! - [`Queue`]: the operation contract every backend satisfies
//! - [`MemoryQueue`] / [`MemoryPriorityQueue`]: in-process engines
//! - [`RemoteQueue`] / [`RemotePriorityQueue`]: engines over a [`RemoteStore`]
//! - [`JsonQueue`]: stores structured values as JSON text over any text queue
//! - [`QueueError`]: backend-agnostic error type
//!
//! # Using the Memory Backend
//!
//! ```rust,ignore
//! use queuebridge::backend::{MemoryQueue, PollOptions, Queue};
//! use std::time::Duration;
//!
//! let queue = MemoryQueue::fifo("jobs", 100);
//! queue.add(vec!["a".to_string().into()]).await?;
//! let item = queue.poll(PollOptions::wait(Duration::from_secs(2))).await?;
//! ```
//!
//! # Using the Redis Backend
//!
//! ```rust,ignore
//! use queuebridge::backend::{RedisStore, RemotePriorityQueue, Queue};
//! use std::sync::Arc;
//!
//! let store = Arc::new(RedisStore::connect("redis://localhost:6379").await?);
//! let queue = RemotePriorityQueue::new(store, "jobs", 0);
//! queue.add(vec![(5, "urgent".to_string()).into()]).await?;
//! ```

mod error;
mod traits;

pub(crate) mod poll;

pub mod json;
pub mod memory;
pub mod remote;

#[cfg(feature = "redis")]
pub mod redis;

// Re-export error type
pub use error::QueueError;

// Re-export the contract
pub use traits::{entries, Discipline, Entry, PollOptions, Queue, DEFAULT_POLL_RETRIES};

// Re-export engines
pub use json::JsonQueue;
pub use memory::{MemoryPriorityQueue, MemoryQueue};
pub use remote::{random_queue_name, ListEnd, RemotePriorityQueue, RemoteQueue, RemoteStore};

#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisStore, RedisStoreBuilder};
