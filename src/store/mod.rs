//! Persistent cache store boundary.
//! Stores read and write exported translation caches as JSON values
//! addressed by opaque string keys. Absence is not an error; the caller
//! simply has nothing to import.

pub mod sqlite;

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

pub use sqlite::SqliteStore;

pub trait CacheStore: Send + Sync {
    /// Previously written value for `key`, if any.
    fn read(&self, key: &str) -> Option<Value>;

    /// Write `value` under `key`, replacing any prior value.
    /// Last write wins.
    fn write(&self, key: &str, value: &Value);
}

/// Bounded in-memory store. Suits tests and single-process deployments;
/// the least recently used route entries are evicted at capacity.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, Value>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("store capacity must be > 0"),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(256)
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Option<Value> {
        let value = self.entries.lock().get(key).cloned();
        trace!(key, hit = value.is_some(), "store_read");
        value
    }

    fn write(&self, key: &str, value: &Value) {
        self.entries.lock().put(key.to_string(), value.clone());
        trace!(key, "store_write");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_key_reads_as_none() {
        let store = MemoryStore::default();
        assert!(store.read("TranslatorAutoload.posts.index").is_none());
    }

    #[test]
    fn last_write_wins() {
        let store = MemoryStore::default();
        store.write("k", &json!({"a": "1"}));
        store.write("k", &json!({"a": "2"}));
        assert_eq!(store.read("k"), Some(json!({"a": "2"})));
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let store = MemoryStore::new(2);
        store.write("a", &json!({}));
        store.write("b", &json!({}));
        store.write("c", &json!({}));
        assert!(store.read("a").is_none());
        assert!(store.read("c").is_some());
        assert_eq!(store.len(), 2);
    }
}
