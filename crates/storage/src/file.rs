use std::{
    fs, io,
    path::{Path, PathBuf},
};

use liftlog_domain::CacheError;

use crate::KeyValueStore;

/// One file per key inside a directory, surviving process restarts.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Creates the directory if it does not exist yet.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(unavailable)?;
        Ok(Self { directory })
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, key: &str) -> Result<PathBuf, CacheError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CacheError::Unavailable(format!("invalid key {key:?}")));
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(unavailable(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path(key)?;
        let staged = path.with_extension("json.tmp");
        fs::write(&staged, value).map_err(unavailable)?;
        fs::rename(&staged, &path).map_err(unavailable)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path(key)?) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(unavailable(err)),
            _ => Ok(()),
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn unavailable(err: io::Error) -> CacheError {
    CacheError::Unavailable(err.to_string())
}
