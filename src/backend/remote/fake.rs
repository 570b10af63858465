//! In-process [`RemoteStore`] with the ordering rules of Redis, for tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use super::{ListEnd, RemoteStore};
use crate::backend::error::QueueError;

enum Value {
    List(VecDeque<Vec<u8>>),
    // (score, member) pairs; BTreeSet order matches ZRANGE order.
    SortedSet(BTreeSet<(i64, Vec<u8>)>),
}

#[derive(Default)]
pub(crate) struct FakeStore {
    keys: Mutex<HashMap<String, Value>>,
    pushed: Notify,
    unreachable: AtomicBool,
}

fn wrong_type(key: &str) -> QueueError {
    QueueError::Unavailable(format!(
        "WRONGTYPE Operation against a key holding the wrong kind of value: {}",
        key
    ))
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make `ping` fail as if the server had gone away.
    pub(crate) fn set_unreachable(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    async fn with_list<R>(
        &self,
        key: &str,
        create: bool,
        f: impl FnOnce(&mut VecDeque<Vec<u8>>) -> R,
    ) -> Result<Option<R>, QueueError> {
        let mut keys = self.keys.lock().await;
        if create && !keys.contains_key(key) {
            keys.insert(key.to_string(), Value::List(VecDeque::new()));
        }
        let result = match keys.get_mut(key) {
            None => return Ok(None),
            Some(Value::List(list)) => f(list),
            Some(_) => return Err(wrong_type(key)),
        };
        // Redis drops empty collections.
        if matches!(keys.get(key), Some(Value::List(list)) if list.is_empty()) {
            keys.remove(key);
        }
        Ok(Some(result))
    }

    async fn with_set<R>(
        &self,
        key: &str,
        create: bool,
        f: impl FnOnce(&mut BTreeSet<(i64, Vec<u8>)>) -> R,
    ) -> Result<Option<R>, QueueError> {
        let mut keys = self.keys.lock().await;
        if create && !keys.contains_key(key) {
            keys.insert(key.to_string(), Value::SortedSet(BTreeSet::new()));
        }
        let result = match keys.get_mut(key) {
            None => return Ok(None),
            Some(Value::SortedSet(set)) => f(set),
            Some(_) => return Err(wrong_type(key)),
        };
        if matches!(keys.get(key), Some(Value::SortedSet(set)) if set.is_empty()) {
            keys.remove(key);
        }
        Ok(Some(result))
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn list_len(&self, key: &str) -> Result<usize, QueueError> {
        Ok(self.with_list(key, false, |l| l.len()).await?.unwrap_or(0))
    }

    async fn list_push(
        &self,
        key: &str,
        end: ListEnd,
        values: Vec<Vec<u8>>,
    ) -> Result<usize, QueueError> {
        let len = self
            .with_list(key, true, |list| {
                for value in values {
                    match end {
                        ListEnd::Head => list.push_front(value),
                        ListEnd::Tail => list.push_back(value),
                    }
                }
                list.len()
            })
            .await?
            .unwrap_or(0);
        self.pushed.notify_waiters();
        Ok(len)
    }

    async fn list_pop(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>, QueueError> {
        Ok(self
            .with_list(key, false, |list| match end {
                ListEnd::Head => list.pop_front(),
                ListEnd::Tail => list.pop_back(),
            })
            .await?
            .flatten())
    }

    async fn list_peek(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>, QueueError> {
        Ok(self
            .with_list(key, false, |list| match end {
                ListEnd::Head => list.front().cloned(),
                ListEnd::Tail => list.back().cloned(),
            })
            .await?
            .flatten())
    }

    async fn list_blocking_pop(
        &self,
        key: &str,
        end: ListEnd,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            let pushed = self.pushed.notified();
            tokio::pin!(pushed);
            pushed.as_mut().enable();

            if let Some(value) = self.list_pop(key, end).await? {
                return Ok(Some(value));
            }
            if tokio::time::timeout_at(deadline, pushed).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn list_signal(&self, key: &str) -> Result<(), QueueError> {
        self.with_list(key, true, |list| {
            list.clear();
            list.push_back(b"1".to_vec());
        })
        .await?;
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn zset_add_new(
        &self,
        key: &str,
        members: Vec<(i64, Vec<u8>)>,
    ) -> Result<usize, QueueError> {
        Ok(self
            .with_set(key, true, |set| {
                let mut added = 0;
                for (score, member) in members {
                    if !set.iter().any(|(_, m)| *m == member) {
                        set.insert((score, member));
                        added += 1;
                    }
                }
                added
            })
            .await?
            .unwrap_or(0))
    }

    async fn zset_top(&self, key: &str) -> Result<Option<Vec<u8>>, QueueError> {
        Ok(self
            .with_set(key, false, |set| set.last().map(|(_, m)| m.clone()))
            .await?
            .flatten())
    }

    async fn zset_pop_top(&self, key: &str) -> Result<Option<Vec<u8>>, QueueError> {
        Ok(self
            .with_set(key, false, |set| set.pop_last().map(|(_, m)| m))
            .await?
            .flatten())
    }

    async fn zset_len(&self, key: &str) -> Result<usize, QueueError> {
        Ok(self.with_set(key, false, |s| s.len()).await?.unwrap_or(0))
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), QueueError> {
        let mut stored = self.keys.lock().await;
        for key in keys {
            stored.remove(*key);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), QueueError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}
