//! In-process queue backends.
//!
//! Items live in local containers owned by the queue for its whole lifetime.
//! Every operation takes the queue's async mutex, so concurrent producers and
//! consumers on one instance never observe a torn size or ordering, and no two
//! `get` calls hand out the same item.
//!
//! - [`MemoryQueue`]: FIFO, or LIFO when built as a stack
//! - [`MemoryPriorityQueue`]: highest priority first, insertion order on ties

mod priority;
mod shared;

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::debug;

use super::error::QueueError;
use super::poll::poll_with;
use super::traits::{ensure_capacity, Discipline, Entry, PollOptions, Queue};
use shared::Guarded;

pub use priority::MemoryPriorityQueue;

/// Bounded FIFO or LIFO queue kept in process memory.
///
/// FIFO queues remove from the front and LIFO queues from the back; both
/// append at the back. `peek` reads the end that `get` would remove from.
pub struct MemoryQueue<T> {
    name: String,
    capacity: usize,
    stack: bool,
    items: Guarded<VecDeque<T>>,
}

impl<T> MemoryQueue<T> {
    /// Create a queue; `capacity` 0 is unbounded, `stack` selects LIFO order.
    pub fn new(name: impl Into<String>, capacity: usize, stack: bool) -> Self {
        Self {
            name: name.into(),
            capacity,
            stack,
            items: Guarded::new(VecDeque::new()),
        }
    }

    pub fn fifo(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, capacity, false)
    }

    pub fn lifo(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, capacity, true)
    }

    fn take(&self, items: &mut VecDeque<T>) -> Option<T> {
        if self.stack {
            items.pop_back()
        } else {
            items.pop_front()
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Queue<T> for MemoryQueue<T> {
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

    async fn add(&self, items: Vec<Entry<T>>) -> Result<(), QueueError> {
        let values: Vec<T> = items.into_iter().filter_map(|entry| entry.value).collect();
        let count = values.len();

        self.items
            .with(|stored| {
                ensure_capacity(self.capacity, stored.len(), count)?;
                stored.extend(values);
                Ok(())
            })
            .await?;

        debug!(queue = %self.name, count, "items added");
        self.items.signal(count);
        Ok(())
    }

    async fn get(&self) -> Result<T, QueueError> {
        self.items
            .with(|stored| self.take(stored).ok_or(QueueError::Empty))
            .await
    }

    async fn poll(&self, options: PollOptions) -> Result<T, QueueError> {
        poll_with(options, || self.get(), |timeout| self.items.wait(timeout)).await
    }

    async fn peek(&self) -> Result<T, QueueError> {
        self.items
            .with(|stored| {
                let next = if self.stack {
                    stored.back()
                } else {
                    stored.front()
                };
                next.cloned().ok_or(QueueError::Empty)
            })
            .await
    }

    async fn size(&self) -> Result<usize, QueueError> {
        self.items.with(|stored| Ok(stored.len())).await
    }

    async fn clear(&self) -> Result<(), QueueError> {
        self.items
            .with(|stored| {
                stored.clear();
                Ok(())
            })
            .await?;
        debug!(queue = %self.name, "queue cleared");
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.items.close(|stored| *stored = VecDeque::new()).await;
        Ok(())
    }
}
