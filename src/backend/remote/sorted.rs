//! Priority queue over a remote sorted set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{random_queue_name, ListEnd, RemoteStore};
use crate::backend::error::QueueError;
use crate::backend::poll::poll_with;
use crate::backend::traits::{ensure_capacity, Discipline, Entry, PollOptions, Queue};
use crate::codec::TextEncoding;

/// Priority queue stored as a sorted set scored by priority.
///
/// The highest score is retrieved first. Equal scores resolve to the member
/// whose encoded bytes sort last, so callers must not expect FIFO order among
/// equal priorities. Items whose encoded form is already present are not added
/// again.
///
/// Pollers block on a separate list, `<name>:signal`, which `add` refreshes
/// with a single token. The token only wakes pollers; the item itself is always
/// taken from the sorted set.
pub struct RemotePriorityQueue<S: ?Sized> {
    store: Arc<S>,
    name: String,
    signal_key: String,
    capacity: usize,
    encoding: TextEncoding,
    closed: AtomicBool,
}

impl<S: RemoteStore + ?Sized> RemotePriorityQueue<S> {
    /// Create a handle on the sorted set named `name`; `capacity` 0 is unbounded.
    pub fn new(store: Arc<S>, name: impl Into<String>, capacity: usize) -> Self {
        let name = name.into();
        Self {
            store,
            signal_key: format!("{}:signal", name),
            name,
            capacity,
            encoding: TextEncoding::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a handle on a freshly named sorted set.
    pub fn unnamed(store: Arc<S>, capacity: usize) -> Self {
        Self::new(store, random_queue_name(), capacity)
    }

    /// Use `encoding` to turn items into stored bytes.
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Key of the list pollers block on.
    pub fn signal_key(&self) -> &str {
        &self.signal_key
    }

    fn ensure_open(&self) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    fn decode(&self, raw: Option<Vec<u8>>) -> Result<String, QueueError> {
        match raw {
            Some(bytes) => self.encoding.decode(&bytes),
            None => Err(QueueError::Empty),
        }
    }

    async fn wait_for_signal(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        self.ensure_open()?;
        let _token = self
            .store
            .list_blocking_pop(&self.signal_key, ListEnd::Head, timeout)
            .await?;
        Ok(None)
    }
}

#[async_trait]
impl<S: RemoteStore + ?Sized> Queue<String> for RemotePriorityQueue<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn discipline(&self) -> Discipline {
        Discipline::Priority
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn add(&self, items: Vec<Entry<String>>) -> Result<(), QueueError> {
        self.ensure_open()?;
        let members = items
            .into_iter()
            .filter_map(|entry| {
                let priority = entry.priority;
                entry
                    .value
                    .map(|item| self.encoding.encode(&item).map(|bytes| (priority, bytes)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if members.is_empty() {
            return Ok(());
        }

        let count = members.len();
        if self.capacity != 0 {
            let stored = self.store.zset_len(&self.name).await?;
            ensure_capacity(self.capacity, stored, count)?;
        }
        let added = self.store.zset_add_new(&self.name, members).await?;
        if added > 0 {
            self.store.list_signal(&self.signal_key).await?;
        }

        debug!(queue = %self.name, count, added, "prioritized items added");
        Ok(())
    }

    async fn get(&self) -> Result<String, QueueError> {
        self.ensure_open()?;
        let raw = self.store.zset_pop_top(&self.name).await?;
        self.decode(raw)
    }

    async fn poll(&self, options: PollOptions) -> Result<String, QueueError> {
        poll_with(options, || self.get(), |timeout| self.wait_for_signal(timeout)).await
    }

    async fn peek(&self) -> Result<String, QueueError> {
        self.ensure_open()?;
        let raw = self.store.zset_top(&self.name).await?;
        self.decode(raw)
    }

    async fn size(&self) -> Result<usize, QueueError> {
        self.ensure_open()?;
        self.store.zset_len(&self.name).await
    }

    async fn clear(&self) -> Result<(), QueueError> {
        self.ensure_open()?;
        self.store
            .delete(&[self.name.as_str(), self.signal_key.as_str()])
            .await?;
        debug!(queue = %self.name, "queue cleared");
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
