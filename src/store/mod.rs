//! Persistence of review progress.
//!
//! Loading and saving never abort a review session: the provided `load` and `save`
//! methods log failures and carry on with an empty map or the in-memory state.

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{Backend, Config};
use crate::models::ProgressMap;
use log::{error, info};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt progress data for item {item}: {reason}")]
    Corrupt { item: String, reason: String },

    #[error("Progress store lock was poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait ProgressStore: Send + Sync {
    /// Reads the whole progress mapping. Missing data is an empty map, not an error.
    fn read(&self) -> Result<ProgressMap>;

    /// Replaces the persisted mapping with `progress`.
    fn write(&self, progress: &ProgressMap) -> Result<()>;

    /// Where the data lives, for log lines.
    fn describe(&self) -> String;

    fn load(&self) -> ProgressMap {
        match self.read() {
            Ok(progress) => {
                info!("Loaded progress for {} items from {}", progress.len(), self.describe());
                progress
            }
            Err(e) => {
                error!("Error reading progress from {}: {}", self.describe(), e);
                ProgressMap::new()
            }
        }
    }

    fn save(&self, progress: &ProgressMap) {
        if let Err(e) = self.write(progress) {
            error!("Error writing progress to {}: {}", self.describe(), e);
        }
    }
}

/// Opens the store selected by the configuration.
pub fn open_store(config: &Config) -> Result<Box<dyn ProgressStore>> {
    let store: Box<dyn ProgressStore> = match config.backend {
        Backend::Json => Box::new(JsonFileStore::new(config.storage_root.clone())),
        Backend::Sqlite => Box::new(SqliteStore::open(&config.storage_root)?),
        Backend::Memory => Box::new(MemoryStore::default()),
    };
    info!("Using progress store {}", store.describe());
    Ok(store)
}
