//! Queue construction from configuration records.
//!
//! [`QueueConfig`] names a backend kind, a discipline and the settings the
//! chosen engine needs. [`QueueConfig::build`] validates the record and returns
//! a boxed [`Queue`] so callers never depend on a concrete engine type.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{
    random_queue_name, Discipline, MemoryPriorityQueue, MemoryQueue, Queue, QueueError,
    RemotePriorityQueue, RemoteQueue, RemoteStore,
};
use crate::codec::TextEncoding;

#[cfg(feature = "redis")]
use crate::backend::{RedisConfig, RedisStore};

/// Storage engine behind a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Redis,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Redis => "redis",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "redis" => Ok(BackendKind::Redis),
            other => Err(QueueError::InvalidBackend(other.to_string())),
        }
    }
}

/// Everything needed to construct a queue.
///
/// `backend` and `encoding` are kept as text so an unknown value is reported
/// by [`validate`](Self::validate) with the proper error kind.
///
/// ```rust
/// use queuebridge::config::QueueConfig;
///
/// let config: QueueConfig = serde_json::from_str(
///     r#"{"backend": "memory", "name": "jobs", "capacity": 100, "discipline": "lifo"}"#,
/// )
/// .unwrap();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// `memory` or `redis`
    pub backend: String,
    /// Queue name; a random `queue_<uuid>` name is generated when unset
    pub name: Option<String>,
    /// Maximum number of items; 0 is unbounded
    pub capacity: i64,
    pub discipline: Discipline,
    /// Redis URL
    pub location: Option<String>,
    /// Label of the text encoding used by remote queues
    pub encoding: String,
    /// Pool overrides for the redis backend
    #[cfg(feature = "redis")]
    pub pool: Option<RedisConfig>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory.as_str().to_string(),
            name: None,
            capacity: 0,
            discipline: Discipline::default(),
            location: None,
            encoding: TextEncoding::default().label().to_string(),
            #[cfg(feature = "redis")]
            pool: None,
        }
    }
}

/// A checked [`QueueConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSettings {
    pub backend: BackendKind,
    pub name: String,
    pub capacity: usize,
    pub discipline: Discipline,
    pub encoding: TextEncoding,
}

impl QueueConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend: backend.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn memory() -> Self {
        Self::new(BackendKind::Memory)
    }

    pub fn redis(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::new(BackendKind::Redis)
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    #[cfg(feature = "redis")]
    pub fn pool(mut self, pool: RedisConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Check the record without touching any store.
    pub fn validate(&self) -> Result<QueueSettings, QueueError> {
        let backend: BackendKind = self.backend.parse()?;
        let capacity = usize::try_from(self.capacity).map_err(|_| {
            QueueError::InvalidValue(format!(
                "capacity must be zero or positive, got {}",
                self.capacity
            ))
        })?;
        let encoding: TextEncoding = self.encoding.parse()?;
        let name = match &self.name {
            Some(name) if name.is_empty() => {
                return Err(QueueError::InvalidValue("queue name must not be empty".into()))
            }
            Some(name) => name.clone(),
            None => random_queue_name(),
        };

        Ok(QueueSettings {
            backend,
            name,
            capacity,
            discipline: self.discipline,
            encoding,
        })
    }

    /// Validate and construct the queue, connecting to the remote store when
    /// the backend needs one.
    pub async fn build(&self) -> Result<Box<dyn Queue<String>>, QueueError> {
        let settings = self.validate()?;
        match settings.backend {
            BackendKind::Memory => Ok(build_memory(settings)),
            BackendKind::Redis => self.build_redis(settings).await,
        }
    }

    /// Construct a remote queue over an existing store handle, after checking
    /// that the store answers. `backend` and `location` are not consulted.
    pub async fn build_with_store(
        &self,
        store: Arc<dyn RemoteStore>,
    ) -> Result<Box<dyn Queue<String>>, QueueError> {
        let settings = self.validate()?;
        store.ping().await?;
        Ok(build_remote(store, settings))
    }

    #[cfg(feature = "redis")]
    async fn build_redis(
        &self,
        settings: QueueSettings,
    ) -> Result<Box<dyn Queue<String>>, QueueError> {
        let mut builder = RedisStore::builder();
        if let Some(location) = &self.location {
            builder = builder.redis_url(location.clone());
        }
        if let Some(pool) = self.pool {
            builder = builder.config(pool);
        }
        let store: Arc<dyn RemoteStore> = Arc::new(builder.build().await?);
        Ok(build_remote(store, settings))
    }

    #[cfg(not(feature = "redis"))]
    async fn build_redis(
        &self,
        _settings: QueueSettings,
    ) -> Result<Box<dyn Queue<String>>, QueueError> {
        Err(QueueError::InvalidBackend(
            "redis (not compiled into this build)".to_string(),
        ))
    }
}

fn build_memory(settings: QueueSettings) -> Box<dyn Queue<String>> {
    info!(
        queue = %settings.name,
        discipline = %settings.discipline,
        capacity = settings.capacity,
        "Creating memory queue"
    );
    match settings.discipline {
        Discipline::Fifo => Box::new(MemoryQueue::fifo(settings.name, settings.capacity)),
        Discipline::Lifo => Box::new(MemoryQueue::lifo(settings.name, settings.capacity)),
        Discipline::Priority => {
            Box::new(MemoryPriorityQueue::new(settings.name, settings.capacity))
        }
    }
}

fn build_remote(store: Arc<dyn RemoteStore>, settings: QueueSettings) -> Box<dyn Queue<String>> {
    info!(
        queue = %settings.name,
        discipline = %settings.discipline,
        capacity = settings.capacity,
        encoding = %settings.encoding,
        "Creating remote queue"
    );
    match settings.discipline {
        Discipline::Fifo | Discipline::Lifo => Box::new(
            RemoteQueue::new(
                store,
                settings.name,
                settings.capacity,
                settings.discipline == Discipline::Lifo,
            )
            .with_encoding(settings.encoding),
        ),
        Discipline::Priority => Box::new(
            RemotePriorityQueue::new(store, settings.name, settings.capacity)
                .with_encoding(settings.encoding),
        ),
    }
}
