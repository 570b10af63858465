//! Queue backends over a remote key/value store.
//!
//! The queues in this module keep nothing locally except their name and
//! configuration; items live in a store shared with every other handle that
//! uses the same name, possibly in other processes.
//!
//! # Architecture
//!
//! - [`RemoteStore`]: the list and sorted-set primitives the queues need
//! - [`RemoteQueue`]: FIFO/LIFO over one list
//! - [`RemotePriorityQueue`]: priority order over one sorted set, with a
//!   companion list used only to wake up pollers
//!
//! Every call is one short request (or one atomic pipeline) against the store.
//! Compound check-then-act sequences, such as the capacity check in `add`, are
//! not atomic against other writers: concurrent producers can overshoot the
//! bound by up to one batch each.

mod list;
mod sorted;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::error::QueueError;

pub use list::RemoteQueue;
pub use sorted::RemotePriorityQueue;

/// End of a remote list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Head,
    Tail,
}

/// Primitives a remote store must provide to back the remote queues.
///
/// Each method maps to a single store command (or atomic pipeline). Values and
/// members are the already-encoded transport bytes.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Length of the list at `key` (0 when missing).
    async fn list_len(&self, key: &str) -> Result<usize, QueueError>;

    /// Push `values` in order at `end`; returns the new length.
    async fn list_push(
        &self,
        key: &str,
        end: ListEnd,
        values: Vec<Vec<u8>>,
    ) -> Result<usize, QueueError>;

    async fn list_pop(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>, QueueError>;

    /// Read the element at `end` without removing it.
    async fn list_peek(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>, QueueError>;

    /// Pop from `end`, blocking for up to `timeout` while the list is empty.
    async fn list_blocking_pop(
        &self,
        key: &str,
        end: ListEnd,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, QueueError>;

    /// Leave a single wake-up token in the list at `key`.
    async fn list_signal(&self, key: &str) -> Result<(), QueueError>;

    /// Add members that are not present yet; returns how many were added.
    async fn zset_add_new(
        &self,
        key: &str,
        members: Vec<(i64, Vec<u8>)>,
    ) -> Result<usize, QueueError>;

    /// Highest-scored member; equal scores resolve to the greatest member bytes.
    async fn zset_top(&self, key: &str) -> Result<Option<Vec<u8>>, QueueError>;

    /// Remove and return the member [`RemoteStore::zset_top`] would return.
    async fn zset_pop_top(&self, key: &str) -> Result<Option<Vec<u8>>, QueueError>;

    async fn zset_len(&self, key: &str) -> Result<usize, QueueError>;

    async fn delete(&self, keys: &[&str]) -> Result<(), QueueError>;

    async fn ping(&self) -> Result<(), QueueError>;
}

/// Name used when a remote queue is built without one: `queue_<uuid>`.
pub fn random_queue_name() -> String {
    format!("queue_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_queue_names_are_unique() {
        let a = random_queue_name();
        let b = random_queue_name();
        assert!(a.starts_with("queue_"));
        assert_eq!(a.len(), "queue_".len() + 32);
        assert_ne!(a, b);
    }
}
