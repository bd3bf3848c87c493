use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use crate::utils::age_display;

/// One normalized provider result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: Value) -> Self {
        Self {
            key: key.into(),
            payload,
            fetched_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.age_minutes())
    }

    /// Fresh iff strictly younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Utc::now() - self.fetched_at < ttl
    }
}

/// In-memory cache keyed by logical resource.
///
/// Stale entries stay until overwritten by the next successful fetch or
/// until `clear` is called.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Payload for `key` if a fresh entry exists.
    pub fn get_fresh(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(self.ttl) {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Store a result, replacing any previous entry for the key.
    pub fn insert(&self, key: &str, payload: Value) {
        self.entries
            .insert(key.to_string(), CacheEntry::new(key, payload));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<CacheKeyInfo> = self
            .entries
            .iter()
            .map(|item| {
                let entry = item.value();
                CacheKeyInfo {
                    key: entry.key.clone(),
                    age: entry.age_display(),
                    fresh: entry.is_fresh(self.ttl),
                }
            })
            .collect();
        keys.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            size: keys.len(),
            keys,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<CacheKeyInfo>,
}

#[derive(Debug, Clone)]
pub struct CacheKeyInfo {
    pub key: String,
    pub age: String,
    pub fresh: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_freshness() {
        let fresh = CacheEntry::new("k", json!(1));
        assert!(fresh.is_fresh(Duration::from_secs(300)));
        assert!(!fresh.is_fresh(Duration::ZERO));

        let mut old = CacheEntry::new("k", json!(1));
        old.fetched_at = Utc::now() - chrono::Duration::minutes(6);
        assert!(!old.is_fresh(Duration::from_secs(300)));
        assert_eq!(old.age_display(), "6m ago");
    }

    #[test]
    fn test_stale_entries_are_kept_until_overwritten() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.insert("weather:Madrid", json!({"t": 1}));
        assert!(cache.get_fresh("weather:Madrid").is_none());
        assert_eq!(cache.len(), 1);

        cache.insert("weather:Madrid", json!({"t": 2}));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.insert("b", json!(1));
        cache.insert("a", json!(2));
        assert_eq!(cache.get_fresh("a"), Some(json!(2)));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.keys[0].key, "a");
        assert!(stats.keys[0].fresh);

        cache.clear();
        assert!(cache.is_empty());
    }
}
