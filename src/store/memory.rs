//! Process-local store. Nothing survives a restart.
use super::{ProgressStore, Result, StoreError};
use crate::models::ProgressMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    progress: Mutex<ProgressMap>,
}

impl MemoryStore {
    pub fn with_progress(progress: ProgressMap) -> Self {
        Self {
            progress: Mutex::new(progress),
        }
    }
}

impl ProgressStore for MemoryStore {
    fn read(&self) -> Result<ProgressMap> {
        let progress = self.progress.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(progress.clone())
    }

    fn write(&self, progress: &ProgressMap) -> Result<()> {
        let mut stored = self.progress.lock().map_err(|_| StoreError::Poisoned)?;
        *stored = progress.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
