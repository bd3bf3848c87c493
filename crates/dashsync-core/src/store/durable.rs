//! Durable tier: asynchronous, larger storage of JSON documents addressed by
//! (collection, id).

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::StoreError;

/// Durable collection for the mirrored preferences document.
pub const PREFERENCES_COLLECTION: &str = "userPreferences";
/// Durable collection for the mirrored dashboard snapshot.
pub const DASHBOARD_COLLECTION: &str = "dashboardData";

#[async_trait]
pub trait DurableTier: Send + Sync {
    async fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// All documents in a collection, in id order.
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// Deleting a missing id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// In-memory durable tier, mainly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryDurableTier {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryDurableTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids present in a collection.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).map(|docs| docs.keys().cloned().collect()))
            .unwrap_or_default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("durable tier lock poisoned".to_string())
}

#[async_trait]
impl DurableTier for MemoryDurableTier {
    async fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

/// Durable tier on disk: one directory per collection, one JSON file per id.
#[derive(Debug, Clone)]
pub struct FileDurableTier {
    root: PathBuf,
}

impl FileDurableTier {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    /// Ids become file names. Every byte outside `[A-Za-z0-9_-]` is written
    /// as `%XX`, which keeps the mapping one-to-one and inside the directory.
    fn file_name(id: &str) -> String {
        let mut name = String::with_capacity(id.len() + 5);
        for byte in id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        name.push_str(".json");
        name
    }

    fn document_path(&self, collection: &str, id: &str) -> PathBuf {
        self.collection_dir(collection).join(Self::file_name(id))
    }
}

#[async_trait]
impl DurableTier for FileDurableTier {
    async fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(self.collection_dir(collection)).await?;
        let contents = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(self.document_path(collection, id), contents).await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        match tokio::fs::read(self.document_path(collection, id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let mut dir = match tokio::fs::read_dir(self.collection_dir(collection)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice(&bytes) {
                Ok(value) => documents.push(value),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping corrupt document"),
            }
        }
        Ok(documents)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.document_path(collection, id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
