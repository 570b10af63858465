//! JSON adapter over any text queue.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::QueueError;
use super::traits::{Discipline, Entry, PollOptions, Queue};
use crate::codec::{decode_json, encode_json};

/// Wraps a `Queue<String>` so it stores structured values as JSON text.
///
/// `V` defaults to [`serde_json::Value`], which accepts maps and plain text
/// alike. Text is stored as a JSON string and comes back unchanged.
///
/// ```rust
/// use queuebridge::backend::{JsonQueue, MemoryQueue, Queue};
/// use serde_json::json;
///
/// # run();
/// # fn run() {
/// # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// # rt.block_on(async {
/// let queue: JsonQueue<MemoryQueue<String>> = JsonQueue::new(MemoryQueue::fifo("events", 0));
/// queue.add(vec![json!({"key": "value"}).into()]).await.unwrap();
/// assert_eq!(queue.get().await.unwrap(), json!({"key": "value"}));
/// # });
/// # }
/// ```
pub struct JsonQueue<Q, V = serde_json::Value> {
    inner: Q,
    _value: PhantomData<fn() -> V>,
}

impl<Q, V> JsonQueue<Q, V> {
    pub fn new(inner: Q) -> Self {
        Self {
            inner,
            _value: PhantomData,
        }
    }

    /// The wrapped text queue.
    pub fn inner(&self) -> &Q {
        &self.inner
    }

    pub fn into_inner(self) -> Q {
        self.inner
    }
}

#[async_trait]
impl<Q, V> Queue<V> for JsonQueue<Q, V>
where
    Q: Queue<String>,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn discipline(&self) -> Discipline {
        self.inner.discipline()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    async fn add(&self, items: Vec<Entry<V>>) -> Result<(), QueueError> {
        // Encode the whole batch first so a bad item stores nothing.
        let encoded = items
            .into_iter()
            .filter_map(|entry| {
                let priority = entry.priority;
                entry
                    .value
                    .map(|value| encode_json(&value).map(|text| Entry::with_priority(priority, text)))
            })
            .collect::<Result<Vec<_>, QueueError>>()?;
        self.inner.add(encoded).await
    }

    async fn get(&self) -> Result<V, QueueError> {
        decode_json(&self.inner.get().await?)
    }

    async fn poll(&self, options: PollOptions) -> Result<V, QueueError> {
        decode_json(&self.inner.poll(options).await?)
    }

    async fn peek(&self) -> Result<V, QueueError> {
        decode_json(&self.inner.peek().await?)
    }

    async fn size(&self) -> Result<usize, QueueError> {
        self.inner.size().await
    }

    async fn clear(&self) -> Result<(), QueueError> {
        self.inner.clear().await
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryPriorityQueue, MemoryQueue};
    use crate::backend::remote::fake::FakeStore;
    use crate::backend::remote::{RemotePriorityQueue, RemoteQueue};
    use serde::ser::Error as _;
    use serde::{Deserialize, Serializer};
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("sets cannot be encoded"))
        }
    }

    impl<'de> Deserialize<'de> for Unserializable {
        fn deserialize<D: serde::Deserializer<'de>>(_: D) -> Result<Self, D::Error> {
            Ok(Unserializable)
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Job {
        id: u32,
        kind: String,
    }

    fn remote_json_queue(store: &Arc<FakeStore>) -> JsonQueue<RemoteQueue<FakeStore>> {
        JsonQueue::new(RemoteQueue::fifo(store.clone(), "test_queue", 5))
    }

    #[tokio::test]
    async fn test_add_valid_json() {
        let store = Arc::new(FakeStore::new());
        let queue = remote_json_queue(&store);
        queue.add(vec![json!({"key": "value"}).into()]).await.unwrap();
        assert_eq!(queue.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_peek_poll_valid_json() {
        let store = Arc::new(FakeStore::new());
        let queue = remote_json_queue(&store);
        let item = json!({"key": "value"});

        queue.add(vec![item.clone().into()]).await.unwrap();
        assert_eq!(queue.peek().await.unwrap(), item);
        assert_eq!(queue.size().await.unwrap(), 1);
        assert_eq!(queue.get().await.unwrap(), item);

        queue.add(vec![item.clone().into()]).await.unwrap();
        assert_eq!(
            queue.poll(PollOptions::immediate()).await.unwrap(),
            item
        );
        assert_eq!(queue.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_none_item() {
        let store = Arc::new(FakeStore::new());
        let queue = remote_json_queue(&store);
        queue.add(vec![Entry::none()]).await.unwrap();
        assert_eq!(queue.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_str() {
        let store = Arc::new(FakeStore::new());
        let queue = remote_json_queue(&store);
        queue
            .add(vec![Value::from("hello world").into()])
            .await
            .unwrap();
        assert_eq!(queue.size().await.unwrap(), 1);
        assert_eq!(queue.get().await.unwrap(), Value::from("hello world"));
    }

    #[tokio::test]
    async fn test_add_invalid_json() {
        let queue: JsonQueue<MemoryQueue<String>, Unserializable> =
            JsonQueue::new(MemoryQueue::fifo("json", 0));
        queue.inner().add(vec!["\"kept\"".to_string().into()]).await.unwrap();

        let result = queue
            .add(vec![Entry::new(Unserializable), Entry::new(Unserializable)])
            .await;
        assert!(matches!(result, Err(QueueError::Encoding(_))));
        assert_eq!(queue.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_malformed_stored_data() {
        let store = Arc::new(FakeStore::new());
        let raw = RemoteQueue::fifo(store.clone(), "test_queue", 5);
        raw.add(vec!["{not json".to_string().into()]).await.unwrap();

        let queue = remote_json_queue(&store);
        assert!(matches!(queue.peek().await, Err(QueueError::Encoding(_))));
        assert!(matches!(queue.get().await, Err(QueueError::Encoding(_))));
    }

    #[tokio::test]
    async fn test_typed_values_over_memory_stack() {
        let queue: JsonQueue<MemoryQueue<String>, Job> = JsonQueue::new(MemoryQueue::lifo("jobs", 0));
        assert!(queue.is_stack());
        queue
            .add(vec![
                Job { id: 1, kind: "email".into() }.into(),
                Job { id: 2, kind: "sms".into() }.into(),
            ])
            .await
            .unwrap();
        assert_eq!(queue.get().await.unwrap().id, 2);
        assert_eq!(
            queue.get().await.unwrap(),
            Job { id: 1, kind: "email".into() }
        );
    }

    #[tokio::test]
    async fn test_priorities_travel_with_values() {
        let store = Arc::new(FakeStore::new());
        let queue: JsonQueue<_> =
            JsonQueue::new(RemotePriorityQueue::new(store, "test_priority_queue", 0));
        queue
            .add(vec![
                (1, json!({"task": "later"})).into(),
                Entry::none(),
                (10, json!({"task": "now"})).into(),
            ])
            .await
            .unwrap();
        assert_eq!(queue.size().await.unwrap(), 2);
        assert_eq!(queue.get().await.unwrap(), json!({"task": "now"}));
        assert_eq!(queue.get().await.unwrap(), json!({"task": "later"}));
    }

    #[tokio::test]
    async fn test_memory_priority_json() {
        let queue: JsonQueue<MemoryPriorityQueue<String>> =
            JsonQueue::new(MemoryPriorityQueue::new("prio", 2));
        queue
            .add(vec![(5, json!("five")).into(), (7, json!("seven")).into()])
            .await
            .unwrap();
        assert!(matches!(
            queue.add(vec![(9, json!("nine")).into()]).await,
            Err(QueueError::Full)
        ));
        assert_eq!(queue.peek().await.unwrap(), json!("seven"));
        assert_eq!(queue.capacity(), 2);
    }

    #[tokio::test]
    async fn test_close_delegates() {
        let queue: JsonQueue<MemoryQueue<String>> = JsonQueue::new(MemoryQueue::fifo("closing", 0));
        queue.close().await.unwrap();
        assert!(matches!(queue.get().await, Err(QueueError::Closed)));
    }
}
