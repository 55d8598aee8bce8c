//! Persisted key-value storage for per-project state.
//!
//! Each component owns exactly one value per project: the loader's
//! `ProjectContext`, the cache's `CacheInfo` and the watcher's
//! `WatchState`. Values are read and written whole, last write wins.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sled::Db;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

/// Storage domain for the loader's project context.
pub const LOADER_DOMAIN: &str = "context/loader";
/// Storage domain for the derived cache.
pub const CACHE_DOMAIN: &str = "context/cache";
/// Storage domain for the watcher state.
pub const WATCHER_DOMAIN: &str = "context/watcher";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no value stored at '{0}'")]
    NotFound(StoreKey),
    #[error("database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A `[domain, project_id]` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub domain: &'static str,
    pub project_id: String,
}

impl StoreKey {
    pub fn new(domain: &'static str, project_id: impl Into<String>) -> Self {
        Self {
            domain,
            project_id: project_id.into(),
        }
    }

    pub fn loader(project_id: impl Into<String>) -> Self {
        Self::new(LOADER_DOMAIN, project_id)
    }

    pub fn cache(project_id: impl Into<String>) -> Self {
        Self::new(CACHE_DOMAIN, project_id)
    }

    pub fn watcher(project_id: impl Into<String>) -> Self {
        Self::new(WATCHER_DOMAIN, project_id)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.project_id)
    }
}

/// Generic persisted store.
///
/// `read` fails with [`StoreError::NotFound`] on a miss. Callers in this
/// workspace treat any read failure as "not found" and rebuild.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn read(&self, key: &StoreKey) -> Result<Value, StoreError>;
    async fn write(&self, key: &StoreKey, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError>;
}

/// Reads and deserializes a typed value.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &StoreKey,
) -> Result<T, StoreError> {
    let value = store.read(key).await?;
    Ok(serde_json::from_value(value)?)
}

/// Serializes and writes a typed value.
pub async fn write_json<T: Serialize + Sync>(
    store: &dyn KvStore,
    key: &StoreKey,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value)?;
    store.write(key, value).await
}

/// Store backed by an embedded sled database.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Opens or creates a store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

#[async_trait]
impl KvStore for SledStore {
    async fn read(&self, key: &StoreKey) -> Result<Value, StoreError> {
        let bytes = self
            .db
            .get(key.to_string().as_bytes())?
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write(&self, key: &StoreKey, value: Value) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&value)?;
        self.db.insert(key.to_string().as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.db.remove(key.to_string().as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

/// In-process store, used by tests and hosts that don't need durability.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<StoreKey, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn read(&self, key: &StoreKey) -> Result<Value, StoreError> {
        self.values
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn write(&self, key: &StoreKey, value: Value) -> Result<(), StoreError> {
        self.values.write().await.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
