#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

use liftlog_domain::CacheError;

pub mod cache;
pub mod file;
#[cfg(target_arch = "wasm32")]
#[allow(clippy::module_name_repetitions)]
pub mod local_storage;
pub mod log;
pub mod memory;
pub mod remote;


/// Flat string store underneath the session cache.
///
/// Implementations only move opaque values. Encoding and validation happen in [`cache::Cache`].
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        (**self).remove(key)
    }
}
