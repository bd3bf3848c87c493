//! Fast tier: synchronous, small, string-valued key-value storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use super::StoreError;

/// Synchronous key-value storage with a byte budget.
pub trait FastTier: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Fails with `QuotaExceeded` if the write would exceed the budget;
    /// the previous value is kept in that case.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn keys(&self) -> Vec<String>;

    /// Bytes used, counting keys and values.
    fn used_bytes(&self) -> usize;

    fn budget_bytes(&self) -> usize;
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

fn map_size(map: &BTreeMap<String, String>) -> usize {
    map.iter().map(|(k, v)| entry_size(k, v)).sum()
}

/// Size of `map` after replacing `key` with `value`.
fn size_after_set(map: &BTreeMap<String, String>, key: &str, value: &str) -> usize {
    let current = map_size(map);
    let replaced = map.get(key).map(|old| entry_size(key, old)).unwrap_or(0);
    current - replaced + entry_size(key, value)
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("fast tier lock poisoned".to_string())
}

/// In-memory fast tier. Contents are lost with the process.
#[derive(Debug)]
pub struct MemoryFastTier {
    budget: usize,
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryFastTier {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.entries.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.entries.write().map_err(|_| poisoned())
    }
}

impl FastTier for MemoryFastTier {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.write()?;
        let needed = size_after_set(&entries, key, value);
        if needed > self.budget {
            return Err(StoreError::QuotaExceeded {
                needed,
                budget: self.budget,
            });
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.write()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn used_bytes(&self) -> usize {
        self.read().map(|entries| map_size(&entries)).unwrap_or(0)
    }

    fn budget_bytes(&self) -> usize {
        self.budget
    }
}

/// Fast tier persisted as a single JSON object file, rewritten on each change.
#[derive(Debug)]
pub struct FileFastTier {
    path: PathBuf,
    inner: MemoryFastTier,
}

impl FileFastTier {
    /// Open the file at `path`, creating parent directories as needed.
    /// A corrupt file is left in place and the tier starts empty.
    pub fn open(path: impl AsRef<Path>, budget: usize) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let inner = MemoryFastTier::new(budget);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(map) => *inner.write()? = map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Fast tier file is corrupt, starting empty")
                }
            }
        }

        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string(entries)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl FastTier for FileFastTier {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.inner.write()?;
        let needed = size_after_set(&entries, key, value);
        if needed > self.inner.budget {
            return Err(StoreError::QuotaExceeded {
                needed,
                budget: self.inner.budget,
            });
        }
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries) {
            // Keep memory and disk in step
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.inner.write()?;
        if let Some(old) = entries.remove(key) {
            if let Err(e) = self.flush(&entries) {
                entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn used_bytes(&self) -> usize {
        self.inner.used_bytes()
    }

    fn budget_bytes(&self) -> usize {
        self.inner.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_set_get_remove() {
        let tier = MemoryFastTier::new(1024);
        assert_eq!(tier.get("a").unwrap(), None);

        tier.set("a", "1").unwrap();
        tier.set("a", "22").unwrap();
        assert_eq!(tier.get("a").unwrap().as_deref(), Some("22"));
        assert_eq!(tier.used_bytes(), 3);

        tier.remove("a").unwrap();
        assert!(tier.keys().is_empty());
    }

    #[test]
    fn test_memory_budget_enforced() {
        let tier = MemoryFastTier::new(10);
        tier.set("k", "12345").unwrap();

        let err = tier.set("other", "123456").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { budget: 10, .. }));
        assert_eq!(tier.get("other").unwrap(), None);

        // Replacing a value only counts the difference
        tier.set("k", "123456789").unwrap();
        assert_eq!(tier.used_bytes(), 10);
    }

    #[test]
    fn test_file_tier_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fast.json");

        {
            let tier = FileFastTier::open(&path, 1024).unwrap();
            tier.set("userPreferences", "{}").unwrap();
            tier.set("gone", "x").unwrap();
            tier.remove("gone").unwrap();
        }

        let reopened = FileFastTier::open(&path, 1024).unwrap();
        assert_eq!(reopened.get("userPreferences").unwrap().as_deref(), Some("{}"));
        assert_eq!(reopened.keys(), vec!["userPreferences".to_string()]);
    }

    #[test]
    fn test_file_tier_survives_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fast.json");
        std::fs::write(&path, "not json").unwrap();

        let tier = FileFastTier::open(&path, 1024).unwrap();
        assert!(tier.keys().is_empty());
        // Corrupt file is not rewritten until the next write
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }
}
