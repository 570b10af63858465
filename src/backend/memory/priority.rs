//! In-process priority queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use async_trait::async_trait;
use tracing::debug;

use super::shared::Guarded;
use crate::backend::error::QueueError;
use crate::backend::poll::poll_with;
use crate::backend::traits::{ensure_capacity, Discipline, Entry, PollOptions, Queue};

/// Heap slot. Ordered by priority, then by earlier insertion; the value
/// itself never takes part in comparisons.
struct Slot<T> {
    priority: i64,
    seq: u64,
    value: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Heap<T> {
    slots: BinaryHeap<Slot<T>>,
    next_seq: u64,
}

/// Bounded priority queue kept in process memory.
///
/// `get`, `poll` and `peek` return the entry with the numerically highest
/// priority. Entries with equal priority come out in the order they were added.
pub struct MemoryPriorityQueue<T> {
    name: String,
    capacity: usize,
    heap: Guarded<Heap<T>>,
}

impl<T> MemoryPriorityQueue<T> {
    /// Create a priority queue; `capacity` 0 is unbounded.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            heap: Guarded::new(Heap {
                slots: BinaryHeap::new(),
                next_seq: 0,
            }),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Queue<T> for MemoryPriorityQueue<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn discipline(&self) -> Discipline {
        Discipline::Priority
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn add(&self, items: Vec<Entry<T>>) -> Result<(), QueueError> {
        let present: Vec<(i64, T)> = items
            .into_iter()
            .filter_map(|entry| entry.value.map(|value| (entry.priority, value)))
            .collect();
        let count = present.len();

        self.heap
            .with(|heap| {
                ensure_capacity(self.capacity, heap.slots.len(), count)?;
                for (priority, value) in present {
                    let seq = heap.next_seq;
                    heap.next_seq += 1;
                    heap.slots.push(Slot {
                        priority,
                        seq,
                        value,
                    });
                }
                Ok(())
            })
            .await?;

        debug!(queue = %self.name, count, "prioritized items added");
        self.heap.signal(count);
        Ok(())
    }

    async fn get(&self) -> Result<T, QueueError> {
        self.heap
            .with(|heap| {
                heap.slots
                    .pop()
                    .map(|slot| slot.value)
                    .ok_or(QueueError::Empty)
            })
            .await
    }

    async fn poll(&self, options: PollOptions) -> Result<T, QueueError> {
        poll_with(options, || self.get(), |timeout| self.heap.wait(timeout)).await
    }

    async fn peek(&self) -> Result<T, QueueError> {
        self.heap
            .with(|heap| {
                heap.slots
                    .peek()
                    .map(|slot| slot.value.clone())
                    .ok_or(QueueError::Empty)
            })
            .await
    }

    async fn size(&self) -> Result<usize, QueueError> {
        self.heap.with(|heap| Ok(heap.slots.len())).await
    }

    async fn clear(&self) -> Result<(), QueueError> {
        self.heap
            .with(|heap| {
                heap.slots.clear();
                Ok(())
            })
            .await?;
        debug!(queue = %self.name, "queue cleared");
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.heap
            .close(|heap| heap.slots = BinaryHeap::new())
            .await;
        Ok(())
    }
}
