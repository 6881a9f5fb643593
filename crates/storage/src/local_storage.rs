use gloo_storage::Storage as GlooStorage;
use liftlog_domain::CacheError;

use crate::KeyValueStore;

/// The browser's `localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        gloo_storage::LocalStorage::raw()
            .get_item(key)
            .map_err(|err| CacheError::Unavailable(format!("{err:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        gloo_storage::LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| CacheError::Unavailable(format!("{err:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        gloo_storage::LocalStorage::delete(key);
        Ok(())
    }
}
