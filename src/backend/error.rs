//! Backend-agnostic error types for queuebridge queues.
//!
//! Every backend maps its internal failures onto [`QueueError`], so callers can
//! tell "nothing to take" apart from "bad configuration" and "payload cannot be
//! represented" regardless of where the queue lives.

use thiserror::Error;

/// Errors that can occur during queue construction or queue operations.
///
/// # Examples
///
/// ```rust
/// use queuebridge::QueueError;
///
/// fn handle_error(err: QueueError) {
///     match err {
///         QueueError::Empty => {
///             // Nothing queued yet, back off and poll again
///         }
///         QueueError::Full => {
///             // Producer is ahead of consumers
///         }
///         QueueError::Unavailable(msg) => {
///             eprintln!("store unavailable: {}", msg);
///         }
///         _ => {
///             eprintln!("Error: {}", err);
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum QueueError {
    /// Adding the items would exceed the configured capacity. Nothing was stored.
    #[error("queue is full")]
    Full,

    /// No item was available (after any poll retries were exhausted).
    #[error("queue is empty")]
    Empty,

    /// A payload could not be converted to or from its transport form
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Unknown backend kind, or a backend not compiled into this build
    #[error("invalid queue backend: {0}")]
    InvalidBackend(String),

    /// Malformed construction parameters
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The remote store could not be reached or rejected a command
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The queue handle has been closed
    #[error("queue is closed")]
    Closed,
}

impl QueueError {
    /// Returns true for [`QueueError::Empty`].
    pub fn is_empty_error(&self) -> bool {
        matches!(self, QueueError::Empty)
    }

    /// Returns true if the same call may succeed later without changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::Empty | QueueError::Unavailable(_))
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Encoding(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        QueueError::Unavailable(err.to_string())
    }
}
