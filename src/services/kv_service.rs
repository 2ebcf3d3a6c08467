use crate::state::kv::KvStore;

/// Set a key to a value, overwriting any previous value.
pub fn set(store: &KvStore, key: String, value: String) {
    tracing::debug!(key = %key, "set");
    store.set(key, value);
}

/// Retrieve the value for a key.
pub fn get(store: &KvStore, key: &str) -> Option<String> {
    let value = store.get(key);
    tracing::debug!(key = %key, found = value.is_some(), "get");
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let store = KvStore::new();
        set(&store, "active-tabs".into(), "getir".into());
        assert_eq!(get(&store, "active-tabs").as_deref(), Some("getir"));
        assert_eq!(get(&store, "missing-key"), None);
    }
}
