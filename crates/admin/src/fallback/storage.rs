//! Persistent string key-value storage backing the fallback store.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::FallbackError;

/// String values stored under fixed keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` if it was never written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, FallbackError>> + Send;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), FallbackError>> + Send;
}

/// One file per key inside a profile directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, FallbackError> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(FallbackError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FallbackError> {
        let path = self.path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FallbackError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), FallbackError> {
        let path = self.path(key)?;
        let tmp = path.with_extension("json.tmp");
        let io = |source| FallbackError::Io {
            key: key.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io)?;
        tokio::fs::write(&tmp, value).await.map_err(io)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        Ok(())
    }
}

/// Process-local storage. Gone when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FallbackError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), FallbackError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// The storage medium a data layer was configured with.
#[derive(Debug, Clone)]
pub enum LocalStorage {
    File(FileStore),
    Memory(MemoryStore),
}

impl LocalStorage {
    /// File-backed storage under `dir`.
    #[must_use]
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::File(FileStore::new(dir))
    }

    /// Fresh in-memory storage.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }
}

impl KeyValueStore for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, FallbackError> {
        match self {
            Self::File(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), FallbackError> {
        match self {
            Self::File(store) => store.set(key, value).await,
            Self::Memory(store) => store.set(key, value).await,
        }
    }
}
