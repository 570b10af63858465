//! FIFO and LIFO queues over a remote list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{random_queue_name, ListEnd, RemoteStore};
use crate::backend::error::QueueError;
use crate::backend::poll::poll_with;
use crate::backend::traits::{ensure_capacity, Discipline, Entry, PollOptions, Queue};
use crate::codec::TextEncoding;

/// FIFO or LIFO queue stored as one list in a [`RemoteStore`].
///
/// Items are always popped from the tail. FIFO queues push at the head and
/// LIFO queues push at the tail, so a FIFO queue pops its oldest item and a
/// LIFO queue its newest.
pub struct RemoteQueue<S: ?Sized> {
    store: Arc<S>,
    name: String,
    capacity: usize,
    stack: bool,
    encoding: TextEncoding,
    closed: AtomicBool,
}

impl<S: RemoteStore + ?Sized> RemoteQueue<S> {
    /// Create a handle on the list named `name`; `capacity` 0 is unbounded.
    pub fn new(store: Arc<S>, name: impl Into<String>, capacity: usize, stack: bool) -> Self {
        Self {
            store,
            name: name.into(),
            capacity,
            stack,
            encoding: TextEncoding::default(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn fifo(store: Arc<S>, name: impl Into<String>, capacity: usize) -> Self {
        Self::new(store, name, capacity, false)
    }

    pub fn lifo(store: Arc<S>, name: impl Into<String>, capacity: usize) -> Self {
        Self::new(store, name, capacity, true)
    }

    /// Create a handle on a freshly named list.
    pub fn unnamed(store: Arc<S>, capacity: usize, stack: bool) -> Self {
        Self::new(store, random_queue_name(), capacity, stack)
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

    fn push_end(&self) -> ListEnd {
        if self.stack {
            ListEnd::Tail
        } else {
            ListEnd::Head
        }
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

    async fn wait_for_item(&self, timeout: std::time::Duration) -> Result<Option<String>, QueueError> {
        self.ensure_open()?;
        match self
            .store
            .list_blocking_pop(&self.name, ListEnd::Tail, timeout)
            .await?
        {
            Some(bytes) => Ok(Some(self.encoding.decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S: RemoteStore + ?Sized> Queue<String> for RemoteQueue<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn discipline(&self) -> Discipline {
        if self.stack {
            Discipline::Lifo
        } else {
            Discipline::Fifo
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn add(&self, items: Vec<Entry<String>>) -> Result<(), QueueError> {
        self.ensure_open()?;
        let values = items
            .into_iter()
            .filter_map(|entry| entry.value)
            .map(|item| self.encoding.encode(&item))
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Ok(());
        }

        let count = values.len();
        if self.capacity != 0 {
            let stored = self.store.list_len(&self.name).await?;
            ensure_capacity(self.capacity, stored, count)?;
        }
        let len = self
            .store
            .list_push(&self.name, self.push_end(), values)
            .await?;

        debug!(queue = %self.name, count, len, "items pushed");
        Ok(())
    }

    async fn get(&self) -> Result<String, QueueError> {
        self.ensure_open()?;
        let raw = self.store.list_pop(&self.name, ListEnd::Tail).await?;
        self.decode(raw)
    }

    async fn poll(&self, options: PollOptions) -> Result<String, QueueError> {
        poll_with(options, || self.get(), |timeout| self.wait_for_item(timeout)).await
    }

    async fn peek(&self) -> Result<String, QueueError> {
        self.ensure_open()?;
        let raw = self.store.list_peek(&self.name, ListEnd::Tail).await?;
        self.decode(raw)
    }

    async fn size(&self) -> Result<usize, QueueError> {
        self.ensure_open()?;
        self.store.list_len(&self.name).await
    }

    async fn clear(&self) -> Result<(), QueueError> {
        self.ensure_open()?;
        self.store.delete(&[self.name.as_str()]).await?;
        debug!(queue = %self.name, "queue cleared");
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
