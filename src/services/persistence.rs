//! Durable per-workspace key space.
//!
//! Keys are absolute paths, and presence of a key means "marked". Nothing in
//! this store is authoritative: it is a write-behind projection of the
//! in-memory marked set and is only read once, at startup.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::io;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read workspace state {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse workspace state {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write workspace state {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize workspace state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn get(&self, key: &str) -> Result<bool, StoreError>;

    async fn set(&self, key: &str) -> Result<(), StoreError>;

    /// Remove `key`; deleting an absent key is a no-op
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All present keys, in insertion order
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Session-only store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<IndexMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `keys`
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: Mutex::new(keys.into_iter().map(|k| (k.into(), true)).collect()),
        }
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    async fn get(&self, key: &str) -> Result<bool, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).copied().unwrap_or(false))
    }

    async fn set(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), true);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.shift_remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.keys().cloned().collect())
    }
}

/// Workspace store persisted as a JSON object (`{"<path>": true, ...}`).
///
/// Every mutation rewrites the file through a temporary sibling and a rename,
/// so a crash leaves either the old or the new state on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: Utf8PathBuf,
    entries: tokio::sync::Mutex<IndexMap<String, bool>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open(path: impl AsRef<Utf8Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => IndexMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => IndexMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        tracing::debug!("Opened workspace state {} ({} entries)", path, entries.len());
        Ok(Self {
            path,
            entries: tokio::sync::Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    async fn save(&self, entries: &IndexMap<String, bool>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(write_err)
    }
}

#[async_trait]
impl PersistenceAdapter for JsonFileStore {
    async fn get(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.lock().await.get(key).copied().unwrap_or(false))
    }

    async fn set(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.insert(key.to_string(), true).is_some() {
            return Ok(());
        }
        self.save(&entries).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.shift_remove(key).is_none() {
            return Ok(());
        }
        self.save(&entries).await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state_path(temp_dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp_dir.path().join("state.json")).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_set_delete() {
        let store = MemoryStore::new();
        store.set("/proj/a.ts").await.unwrap();
        store.set("/proj/b.ts").await.unwrap();
        store.delete("/proj/a.ts").await.unwrap();
        store.delete("/proj/missing.ts").await.unwrap();

        assert!(!store.get("/proj/a.ts").await.unwrap());
        assert!(store.get("/proj/b.ts").await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec!["/proj/b.ts"]);
    }

    #[tokio::test]
    async fn test_json_store_persists_across_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = state_path(&temp_dir);

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.set("/proj/a.ts").await.unwrap();
            store.set("/proj/b.ts").await.unwrap();
            store.delete("/proj/a.ts").await.unwrap();
        }

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.keys().await.unwrap(), vec!["/proj/b.ts"]);
        assert!(reopened.get("/proj/b.ts").await.unwrap());
    }

    #[tokio::test]
    async fn test_json_store_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(state_path(&temp_dir)).await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_store_corrupt_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = state_path(&temp_dir);
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_json_store_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join(".markfiles/state.json")).unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        store.set("/proj/a.ts").await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: IndexMap<String, bool> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.get("/proj/a.ts"), Some(&true));
    }
}
