use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Internal HashMap type.
pub type InnerMap = HashMap<String, String>;

/// Shared KV store handle used across the app.
///
/// Writers take the write lock; readers (including the snapshot copy) take
/// the read lock, so a reader never observes a map mid-mutation.
#[derive(Debug, Clone, Default)]
pub struct KvStore {
    inner: Arc<RwLock<InnerMap>>,
}

impl KvStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `initial`.
    pub fn with_entries(initial: InnerMap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    // A panic while holding the lock cannot leave a HashMap half-written,
    // so a poisoned lock is recovered instead of propagated.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, InnerMap> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, InnerMap> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite `key`.
    pub fn set(&self, key: String, value: String) {
        self.write().insert(key, value);
    }

    /// `Some(value)` when present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    /// Copy the whole map, sorted by key, holding the lock only for the copy.
    pub fn to_sorted(&self) -> BTreeMap<String, String> {
        let map = self.read();
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Lay `entries` over the current contents.
    pub fn extend(&self, entries: InnerMap) {
        self.write().extend(entries);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn overwrite_keeps_latest_value() {
        let store = KvStore::new();
        store.set("k".into(), "v1".into());
        store.set("k".into(), "v2".into());

        assert_eq!(store.get("k").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn absent_key_is_none() {
        let store = KvStore::new();
        store.set("a".into(), "1".into());
        assert_eq!(store.get("never-set"), None);
    }

    #[test]
    fn empty_strings_are_accepted() {
        let store = KvStore::new();
        store.set(String::new(), String::new());
        assert_eq!(store.get("").as_deref(), Some(""));
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let store = KvStore::new();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("t{t}-{i}");
                        store.set(key.clone(), i.to_string());
                        assert_eq!(store.get(&key), Some(i.to_string()));
                        let _ = store.to_sorted();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 8 * 200);
    }

    #[test]
    fn to_sorted_is_ordered_by_key() {
        let store = KvStore::with_entries(HashMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]));

        let keys: Vec<_> = store.to_sorted().into_keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
