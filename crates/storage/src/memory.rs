use std::{collections::BTreeMap, sync::Mutex};

use liftlog_domain::CacheError;

use crate::KeyValueStore;

/// Process-local store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, CacheError> {
        self.entries
            .lock()
            .map_err(|err| CacheError::Unavailable(err.to_string()))
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a"), Ok(None));

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();
        assert_eq!(store.get("a"), Ok(Some("3".to_string())));
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);

        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a"), Ok(None));
        assert_eq!(store.keys(), vec!["b".to_string()]);
    }
}
