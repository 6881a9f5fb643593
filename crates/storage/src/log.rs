use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use serde::{Deserialize, Serialize};

use crate::KeyValueStore;

pub static LOG: Mutex<Option<Arc<Mutex<dyn Repository>>>> = Mutex::new(None);

const KEY_LOG: &str = "log";
const MAX_ENTRIES: usize = 100;

pub trait Repository: Send + Sync + 'static {
    fn read_entries(&self) -> Result<VecDeque<Entry>, Error>;
    fn write_entry(&self, entry: Entry) -> Result<(), Error>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Unknown(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub time: String,
    #[serde(with = "LevelDef")]
    pub level: Level,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "Level")]
pub enum LevelDef {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Keeps the latest entries, newest first, under a single key of a [`KeyValueStore`].
pub struct StoreLog<S> {
    store: S,
}

impl<S> StoreLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore + Send + Sync + 'static> Repository for StoreLog<S> {
    fn read_entries(&self) -> Result<VecDeque<Entry>, Error> {
        match self.store.get(KEY_LOG) {
            Ok(Some(entries)) => {
                serde_json::from_str(&entries).map_err(|err| Error::Unknown(err.to_string()))
            }
            Ok(None) => Ok(VecDeque::new()),
            Err(err) => Err(Error::Unknown(err.to_string())),
        }
    }

    fn write_entry(&self, entry: Entry) -> Result<(), Error> {
        let mut entries = self.read_entries().unwrap_or_default();
        entries.push_front(entry);
        entries.truncate(MAX_ENTRIES);
        let entries =
            serde_json::to_string(&entries).map_err(|err| Error::Unknown(err.to_string()))?;
        self.store
            .set(KEY_LOG, &entries)
            .map_err(|err| Error::Unknown(err.to_string()))
    }
}

static LOGGER: Logger = Logger;

/// # Errors
///
/// Returns an error if the logger has already been initialized.
pub fn init(storage: Arc<Mutex<dyn Repository>>) -> Result<(), SetLoggerError> {
    if let Ok(mut log) = LOG.lock() {
        *log = Some(storage);
    }
    log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Trace))
}

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = Entry {
            time: Local::now().format("%b %d %H:%M:%S").to_string(),
            level: record.level(),
            message: record.args().to_string(),
        };
        eprintln!("{} {:<5} {}", entry.time, entry.level, entry.message);

        if let Ok(log) = LOG.lock() {
            if let Some(ref repository) = *log {
                if let Ok(repository) = repository.lock() {
                    let _ = repository.write_entry(entry);
                }
            }
        }
    }

    fn flush(&self) {}
}
