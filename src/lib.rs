//! # queuebridge
//!
//! FIFO, LIFO and priority queues behind one async contract, stored either in
//! process memory or in Redis.
//!
//! ## Features
//!
//! - **One contract**: every engine implements [`Queue`], so callers can swap
//!   storage without touching queue code
//! - **Disciplines**: first-in-first-out, last-in-first-out, and highest
//!   priority first
//! - **Bounded or unbounded**: an optional capacity rejects whole batches that
//!   would overflow it
//! - **Blocking poll**: wait for data with a per-attempt timeout and an attempt
//!   budget
//! - **Structured values**: [`JsonQueue`] stores serde values as JSON text
//! - **Shared remote queues**: handles with the same name in different
//!   processes share one Redis list or sorted set
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use queuebridge::config::QueueConfig;
//! use queuebridge::{entries, Discipline, PollOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), queuebridge::QueueError> {
//!     let queue = QueueConfig::redis("redis://127.0.0.1:6379")
//!         .name("emails")
//!         .discipline(Discipline::Priority)
//!         .build()
//!         .await?;
//!
//!     queue
//!         .add(entries([(10, "welcome".to_string()), (1, "digest".to_string())]))
//!         .await?;
//!
//!     let next = queue.poll(PollOptions::wait(Duration::from_secs(5))).await?;
//!     assert_eq!(next, "welcome");
//!     Ok(())
//! }
//! ```
//!
//! ## Cargo features
//!
//! - `redis` (default): the Redis store and the `redis` backend kind

pub mod backend;
pub mod codec;
pub mod config;

pub use backend::{
    entries, Discipline, Entry, JsonQueue, MemoryPriorityQueue, MemoryQueue, PollOptions, Queue,
    QueueError, RemotePriorityQueue, RemoteQueue, RemoteStore, DEFAULT_POLL_RETRIES,
};
pub use codec::TextEncoding;
pub use config::{BackendKind, QueueConfig};

#[cfg(feature = "redis")]
pub use backend::{RedisConfig, RedisStore};
