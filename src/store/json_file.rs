//! Progress kept in a single pretty-printed JSON file, `userProgress.json`, under the storage root.

use super::{ProgressStore, Result, StoreError};
use crate::models::ProgressMap;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const PROGRESS_FILE_NAME: &str = "userProgress.json";
pub const CORRUPT_FILE_NAME: &str = "userProgress.json.corrupt";

pub struct JsonFileStore {
    root: PathBuf,
    // Serializes read/write within the process. Holds true while the file on disk
    // failed to parse and has not been moved aside yet.
    unreadable: Mutex<bool>,
}

impl JsonFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            unreadable: Mutex::new(false),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(PROGRESS_FILE_NAME)
    }

    pub fn corrupt_path(&self) -> PathBuf {
        self.root.join(CORRUPT_FILE_NAME)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ProgressStore for JsonFileStore {
    fn read(&self) -> Result<ProgressMap> {
        let mut unreadable = self.unreadable.lock().map_err(|_| StoreError::Poisoned)?;
        let path = self.path();
        if !path.exists() {
            debug!("No progress file at {}", path.display());
            return Ok(ProgressMap::new());
        }

        let content = fs::read_to_string(&path).map_err(io_error(&path))?;
        match serde_json::from_str::<ProgressMap>(&content) {
            Ok(progress) => {
                *unreadable = false;
                Ok(progress)
            }
            Err(e) => {
                *unreadable = true;
                Err(e.into())
            }
        }
    }

    fn write(&self, progress: &ProgressMap) -> Result<()> {
        let mut unreadable = self.unreadable.lock().map_err(|_| StoreError::Poisoned)?;
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;

        let path = self.path();
        if *unreadable && path.exists() {
            let corrupt_path = self.corrupt_path();
            fs::rename(&path, &corrupt_path).map_err(io_error(&corrupt_path))?;
            warn!(
                "Moved unreadable progress file {} to {}",
                path.display(),
                corrupt_path.display()
            );
        }
        *unreadable = false;

        let tmp_path = path.with_extension("json.tmp");
        let json_string = serde_json::to_string_pretty(progress)?;

        // Write to a sibling file first so a crash never leaves a half-written progress file
        fs::write(&tmp_path, json_string).map_err(io_error(&tmp_path))?;
        fs::rename(&tmp_path, &path).map_err(io_error(&path))?;
        debug!("Saved progress for {} items to {}", progress.len(), path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}
