//! Locking, close state and wake-ups shared by the in-memory queues.

use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use crate::backend::error::QueueError;

struct State<C> {
    container: C,
    closed: bool,
}

/// A container guarded by an async mutex, plus the signal pollers wait on.
///
/// Waiting never holds the lock, so dropping a waiting poll cannot leave the
/// container half-mutated.
pub(super) struct Guarded<C> {
    state: Mutex<State<C>>,
    available: Notify,
}

impl<C> Guarded<C> {
    pub(super) fn new(container: C) -> Self {
        Self {
            state: Mutex::new(State {
                container,
                closed: false,
            }),
            available: Notify::new(),
        }
    }

    /// Run `f` under the lock, failing with [`QueueError::Closed`] once closed.
    pub(super) async fn with<R>(
        &self,
        f: impl FnOnce(&mut C) -> Result<R, QueueError>,
    ) -> Result<R, QueueError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(QueueError::Closed);
        }
        f(&mut state.container)
    }

    /// Wake up to `count` waiting pollers.
    pub(super) fn signal(&self, count: usize) {
        for _ in 0..count {
            self.available.notify_one();
        }
    }

    /// Wait until signalled or until `timeout` elapses. Never yields an item;
    /// the poll loop goes back to `get` afterwards.
    pub(super) async fn wait<T>(&self, timeout: Duration) -> Result<Option<T>, QueueError> {
        let _ = tokio::time::timeout(timeout, self.available.notified()).await;
        Ok(None)
    }

    /// Mark closed, drop the stored items and release every waiting poller.
    pub(super) async fn close(&self, reset: impl FnOnce(&mut C)) {
        let mut state = self.state.lock().await;
        if !state.closed {
            state.closed = true;
            reset(&mut state.container);
        }
        drop(state);
        self.available.notify_waiters();
        // A poller between its failed `get` and `notified()` is not a waiter yet.
        self.available.notify_one();
    }
}
