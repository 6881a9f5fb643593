use crate::Name;

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug)]
pub enum CreateError {
    #[error("conflict")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug)]
pub enum UpdateError {
    #[error("conflict")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

impl From<ReadError> for UpdateError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => UpdateError::Other("not found".into()),
            ReadError::Storage(storage) => UpdateError::Storage(storage),
            ReadError::Other(other) => UpdateError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("no connection")]
    NoConnection,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

/// Failures of the local durable cache.
///
/// These never abort the engine: they are logged and reported through
/// [`crate::PersistenceCache::take_failures`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt cache entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// User-correctable problems that block a save until resolved.
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error("workout contains no sets with recorded values")]
    NoLoggableSets,
    #[error("incomplete exercises: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    IncompleteExercises(Vec<Name>),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("no finished workout to save")]
    NotFinished,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to save workout: {0}")]
    Remote(#[from] CreateError),
}

impl SaveError {
    /// Remote failures keep the finished session so the same save can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaveError::Remote(_))
    }
}
