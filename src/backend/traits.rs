//! Core contract for queuebridge queues.
//!
//! This module defines the abstraction every queue backend satisfies, whether
//! it keeps its items in process memory or in a remote store.
//!
//! # Architecture
//!
//! - [`Queue`]: the operation contract (add, get, poll, peek, size, clear, close)
//! - [`Entry`]: one item handed to [`Queue::add`], with an optional priority
//! - [`Discipline`]: the ordering rule fixed at construction
//! - [`PollOptions`]: timeout and attempt budget for [`Queue::poll`]
//!
//! # Example: Implementing a Custom Backend
//!
//! ```rust,ignore
//! use queuebridge::backend::{Queue, Entry, PollOptions, QueueError};
//! use async_trait::async_trait;
//!
//! pub struct MyQueue { /* ... */ }
//!
//! #[async_trait]
//! impl Queue<String> for MyQueue {
//!     // Implement queue operations...
//! }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::QueueError;

/// Attempt budget used by [`PollOptions::default`].
pub const DEFAULT_POLL_RETRIES: u32 = 10;

// ============================================================================
// Domain Types
// ============================================================================

/// Ordering rule of a queue. Chosen at construction and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    /// First in, first out
    #[default]
    Fifo,
    /// Last in, first out
    Lifo,
    /// Highest priority first
    Priority,
}

impl Discipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Fifo => "fifo",
            Discipline::Lifo => "lifo",
            Discipline::Priority => "priority",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" | "queue" => Ok(Discipline::Fifo),
            "lifo" | "stack" => Ok(Discipline::Lifo),
            "priority" => Ok(Discipline::Priority),
            other => Err(QueueError::InvalidValue(format!(
                "unknown discipline '{}'",
                other
            ))),
        }
    }
}

/// One item submitted to [`Queue::add`].
///
/// FIFO and LIFO queues ignore `priority`. An entry without a value is skipped
/// and does not count toward size or capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    /// Larger values are retrieved first (e.g. -100 = lowest, +100 = highest)
    pub priority: i64,
    pub value: Option<T>,
}

impl<T> Entry<T> {
    /// An entry with the default priority of 0.
    pub fn new(value: T) -> Self {
        Self {
            priority: 0,
            value: Some(value),
        }
    }

    pub fn with_priority(priority: i64, value: T) -> Self {
        Self {
            priority,
            value: Some(value),
        }
    }

    /// An absent item; `add` skips it.
    pub fn none() -> Self {
        Self {
            priority: 0,
            value: None,
        }
    }

    /// Maps the value while keeping the priority.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Entry<U> {
        Entry {
            priority: self.priority,
            value: self.value.map(f),
        }
    }
}

impl<T> From<T> for Entry<T> {
    fn from(value: T) -> Self {
        Entry::new(value)
    }
}

impl<T> From<(i64, T)> for Entry<T> {
    fn from((priority, value): (i64, T)) -> Self {
        Entry::with_priority(priority, value)
    }
}

impl<T> From<Option<T>> for Entry<T> {
    fn from(value: Option<T>) -> Self {
        Entry { priority: 0, value }
    }
}

/// Builds the `Vec<Entry<T>>` argument of [`Queue::add`] from anything that
/// converts into entries.
///
/// ```rust
/// use queuebridge::{entries, Entry};
///
/// let batch: Vec<Entry<&str>> = entries([(10, "a"), (-5, "b")]);
/// assert_eq!(batch[1].priority, -5);
/// ```
pub fn entries<T, E, I>(items: I) -> Vec<Entry<T>>
where
    E: Into<Entry<T>>,
    I: IntoIterator<Item = E>,
{
    items.into_iter().map(Into::into).collect()
}

/// Timeout and attempt budget for [`Queue::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// How long to wait for data after each empty attempt. Zero never waits.
    pub timeout: Duration,
    /// Maximum number of attempts; 0 retries forever.
    pub retries: u32,
}

impl PollOptions {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    /// Wait up to `timeout` per attempt with the default attempt budget.
    pub fn wait(timeout: Duration) -> Self {
        Self {
            timeout,
            retries: DEFAULT_POLL_RETRIES,
        }
    }

    /// Never wait: `poll` behaves like `get`.
    pub fn immediate() -> Self {
        Self {
            timeout: Duration::ZERO,
            retries: DEFAULT_POLL_RETRIES,
        }
    }

    /// Wait until an item shows up.
    pub fn forever(timeout: Duration) -> Self {
        Self {
            timeout,
            retries: 0,
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::immediate()
    }
}

/// Check that `incoming` more items fit next to `stored` ones.
pub(crate) fn ensure_capacity(
    capacity: usize,
    stored: usize,
    incoming: usize,
) -> Result<(), QueueError> {
    if capacity != 0 && stored.saturating_add(incoming) > capacity {
        return Err(QueueError::Full);
    }
    Ok(())
}

// ============================================================================
// Queue Trait
// ============================================================================

/// Operation contract shared by every queue backend.
///
/// # Implementation Notes
///
/// - `add` is all-or-nothing: when the non-empty entries would push the size
///   past a non-zero capacity the call fails with [`QueueError::Full`] and
///   nothing is stored
/// - `get` and `peek` never block and fail with [`QueueError::Empty`]
/// - `poll` follows the protocol in [`crate::backend::poll`]
/// - after `close`, operations fail with [`QueueError::Closed`]
#[async_trait]
pub trait Queue<T: Send + 'static>: Send + Sync {
    /// Identifier of the queue (the key in a remote store).
    fn name(&self) -> &str;

    fn discipline(&self) -> Discipline;

    /// True for LIFO queues.
    fn is_stack(&self) -> bool {
        self.discipline() == Discipline::Lifo
    }

    /// Configured bound; 0 means unbounded.
    fn capacity(&self) -> usize;

    /// Add one or more entries in call order.
    async fn add(&self, items: Vec<Entry<T>>) -> Result<(), QueueError>;

    /// Remove and return the next item without blocking.
    async fn get(&self) -> Result<T, QueueError>;

    /// Remove and return the next item, waiting for one per `options`.
    async fn poll(&self, options: PollOptions) -> Result<T, QueueError>;

    /// Return the next item without removing it.
    async fn peek(&self) -> Result<T, QueueError>;

    /// Current number of items.
    async fn size(&self) -> Result<usize, QueueError>;

    async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.size().await? == 0)
    }

    /// Remove every item. Idempotent.
    async fn clear(&self) -> Result<(), QueueError>;

    /// Release local resources. Remote state is left in place.
    async fn close(&self) -> Result<(), QueueError>;
}

#[async_trait]
impl<T, Q> Queue<T> for Box<Q>
where
    T: Send + 'static,
    Q: Queue<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn discipline(&self) -> Discipline {
        (**self).discipline()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    async fn add(&self, items: Vec<Entry<T>>) -> Result<(), QueueError> {
        (**self).add(items).await
    }

    async fn get(&self) -> Result<T, QueueError> {
        (**self).get().await
    }

    async fn poll(&self, options: PollOptions) -> Result<T, QueueError> {
        (**self).poll(options).await
    }

    async fn peek(&self) -> Result<T, QueueError> {
        (**self).peek().await
    }

    async fn size(&self) -> Result<usize, QueueError> {
        (**self).size().await
    }

    async fn clear(&self) -> Result<(), QueueError> {
        (**self).clear().await
    }

    async fn close(&self) -> Result<(), QueueError> {
        (**self).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_conversions() {
        let plain: Entry<&str> = "a".into();
        assert_eq!(plain.priority, 0);
        assert_eq!(plain.value, Some("a"));

        let prioritized: Entry<&str> = (42, "b").into();
        assert_eq!(prioritized.priority, 42);

        let absent: Entry<&str> = None.into();
        assert!(absent.value.is_none());

        let mapped = Entry::with_priority(7, 3).map(|v| v * 2);
        assert_eq!(mapped, Entry::with_priority(7, 6));
    }

    #[test]
    fn test_discipline_parsing() {
        assert_eq!("FIFO".parse::<Discipline>().unwrap(), Discipline::Fifo);
        assert_eq!("stack".parse::<Discipline>().unwrap(), Discipline::Lifo);
        assert_eq!(
            "priority".parse::<Discipline>().unwrap(),
            Discipline::Priority
        );
        assert!(matches!(
            "random".parse::<Discipline>(),
            Err(QueueError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_poll_option_defaults() {
        let options = PollOptions::default();
        assert_eq!(options.timeout, Duration::ZERO);
        assert_eq!(options.retries, DEFAULT_POLL_RETRIES);
        assert_eq!(PollOptions::forever(Duration::from_secs(1)).retries, 0);
    }
}
