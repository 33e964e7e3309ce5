//! Key-value map substrate
//!
//! The table keeps all of its state in three flat maps supplied by the host:
//! row content, metadata and vote facts. Each individual `get`/`set`/`delete`
//! is atomic; nothing else is shared between collaborators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A string-keyed map whose individual operations are atomic.
pub trait SyncedMap<V> {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: V);

    /// Remove `key` (no-op when absent)
    fn delete(&mut self, key: &str);

    /// All keys currently present, in no guaranteed order
    fn keys(&self) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A map owned by a single table instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMap<V> {
    entries: BTreeMap<String, V>,
}

impl<V> MemoryMap<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }
}

impl<V: Clone> SyncedMap<V> for MemoryMap<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A cloneable handle to a map shared between collaborators.
///
/// Every clone reads and writes the same underlying entries, so two table
/// instances built over clones of the same three maps behave like two
/// independent writers on one document.
#[derive(Debug, Default)]
pub struct SharedMap<V> {
    inner: Arc<RwLock<BTreeMap<String, V>>>,
}

impl<V> Clone for SharedMap<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SharedMap<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    // The maps hold plain data, so a writer that panicked cannot leave
    // an entry half-written; recover the guard instead of propagating.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, V>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, V>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> SyncedMap<V> for SharedMap<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.read().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: V) {
        self.write().insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.write().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_map_basics() {
        let mut map: MemoryMap<i64> = MemoryMap::new();
        assert!(map.is_empty());

        map.set("b", 2);
        map.set("a", 1);
        map.set("a", 3);

        assert_eq!(map.get("a"), Some(3));
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys(), vec!["a".to_string(), "b".to_string()]);

        map.delete("a");
        map.delete("missing");
        assert!(!map.contains("a"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_shared_map_clones_see_each_other() {
        let mut writer: SharedMap<bool> = SharedMap::new();
        let mut other = writer.clone();

        writer.set("x", true);
        assert_eq!(other.get("x"), Some(true));

        other.delete("x");
        assert!(writer.is_empty());
    }

    #[test]
    fn test_shared_map_across_threads() {
        let map: SharedMap<u32> = SharedMap::new();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let mut handle = map.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        handle.set(&format!("{}-{}", t, i), i);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(map.len(), 100);
    }
}
