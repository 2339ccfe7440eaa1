//! SQLite-backed progress store
//!
//! Keeps one row per item in `progress` (last review date and the scheduling snapshot)
//! and one row per completed review in `performance`, ordered by `position`.
//! Rows that do not parse are skipped with a warning so the rest of the history survives
//! the next save.

use super::{ProgressStore, Result, StoreError};
use crate::models::{ItemId, ProgressMap, ProgressRecord, ScheduleSnapshot, Score};
use chrono::NaiveDate;
use log::{debug, warn};
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DATABASE_FILE_NAME: &str = "progress.sqlite3";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    location: String,
}

type ProgressRow = (
    String,
    Option<String>,
    Option<u32>,
    Option<u32>,
    Option<f64>,
    Option<String>,
);

impl SqliteStore {
    /// Opens (or creates) `progress.sqlite3` under `root`.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|source| StoreError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path: PathBuf = root.join(DATABASE_FILE_NAME);
        let conn = Connection::open(&path)?;
        Self::from_connection(conn, path.display().to_string())
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, location: String) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }
}

/// Creates the progress tables if they do not exist yet
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS progress (
            item_id TEXT PRIMARY KEY,
            last_reviewed TEXT,
            interval_days INTEGER,
            repetitions INTEGER,
            easiness_factor REAL,
            next_review_date TEXT
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS performance (
            item_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            score INTEGER NOT NULL,
            PRIMARY KEY (item_id, position),
            FOREIGN KEY (item_id) REFERENCES progress(item_id) ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn parse_date(item: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| StoreError::Corrupt {
        item: item.to_string(),
        reason: format!("invalid date {:?}: {}", value, e),
    })
}

fn record_from_row(row: ProgressRow) -> Result<(ItemId, ProgressRecord)> {
    let (item_id, last_reviewed, interval, repetition, easiness_factor, next_review) = row;

    let last_reviewed = match last_reviewed {
        Some(value) => Some(parse_date(&item_id, &value)?),
        None => None,
    };

    let schedule = match (interval, repetition, easiness_factor, next_review) {
        (Some(interval), Some(repetition), Some(easiness_factor), Some(next_review)) => {
            Some(ScheduleSnapshot {
                interval,
                repetition,
                easiness_factor,
                next_review: parse_date(&item_id, &next_review)?,
            })
        }
        _ => None,
    };

    Ok((
        ItemId::new(item_id),
        ProgressRecord {
            last_reviewed,
            performance: Vec::new(),
            schedule,
        },
    ))
}

impl ProgressStore for SqliteStore {
    fn read(&self) -> Result<ProgressMap> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;

        let mut stmt = conn.prepare(
            "SELECT item_id, last_reviewed, interval_days, repetitions, easiness_factor, next_review_date
             FROM progress",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<ProgressRow>>>()?;

        let mut progress = ProgressMap::new();
        for row in rows {
            match record_from_row(row) {
                Ok((id, record)) => {
                    progress.insert(id, record);
                }
                Err(e) => warn!("Skipping progress row in {}: {}", self.location, e),
            }
        }

        let mut stmt =
            conn.prepare("SELECT item_id, score FROM performance ORDER BY item_id, position")?;
        let scores = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for (item_id, raw_score) in scores {
            let id = ItemId::new(item_id);
            match Score::try_from(raw_score) {
                // Scores of skipped rows are dropped with them
                Ok(score) => {
                    if let Some(record) = progress.get_mut(&id) {
                        record.performance.push(score);
                    }
                }
                Err(e) => warn!("Skipping score of item {} in {}: {}", id, self.location, e),
            }
        }

        Ok(progress)
    }

    fn write(&self, progress: &ProgressMap) -> Result<()> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn.transaction()?;

        // Whole-mapping replace, the last writer wins
        tx.execute("DELETE FROM performance", ())?;
        tx.execute("DELETE FROM progress", ())?;

        {
            let mut insert_progress = tx.prepare(
                "INSERT INTO progress
                 (item_id, last_reviewed, interval_days, repetitions, easiness_factor, next_review_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_score = tx.prepare(
                "INSERT INTO performance (item_id, position, score) VALUES (?1, ?2, ?3)",
            )?;

            for (id, record) in progress {
                let schedule = record.schedule.as_ref();
                insert_progress.execute(params![
                    id.as_str(),
                    record
                        .last_reviewed
                        .map(|d| d.format(DATE_FORMAT).to_string()),
                    schedule.map(|s| s.interval),
                    schedule.map(|s| s.repetition),
                    schedule.map(|s| s.easiness_factor),
                    schedule.map(|s| s.next_review.format(DATE_FORMAT).to_string()),
                ])?;

                for (position, score) in record.performance.iter().enumerate() {
                    insert_score.execute(params![id.as_str(), position as i64, score.value()])?;
                }
            }
        }

        tx.commit()?;
        debug!("Saved progress for {} items to {}", progress.len(), self.location);
        Ok(())
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn sample_progress() -> ProgressMap {
        let mut progress = ProgressMap::new();
        progress.insert(ItemId::from("1"), ProgressRecord::default());
        progress.insert(
            ItemId::from("2"),
            ProgressRecord {
                last_reviewed: Some(date("2024-06-01")),
                performance: vec![
                    Score::new(5).unwrap(),
                    Score::new(0).unwrap(),
                    Score::new(3).unwrap(),
                ],
                schedule: Some(ScheduleSnapshot {
                    interval: 6,
                    repetition: 2,
                    easiness_factor: 2.6,
                    next_review: date("2024-06-07"),
                }),
            },
        );
        progress
    }

    #[test]
    fn test_empty_database_reads_empty() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read_keeps_score_order() {
        let store = SqliteStore::in_memory().unwrap();
        let progress = sample_progress();

        store.write(&progress).unwrap();
        assert_eq!(store.read().unwrap(), progress);
    }

    #[test]
    fn test_write_replaces_previous_mapping() {
        let store = SqliteStore::in_memory().unwrap();
        store.write(&sample_progress()).unwrap();

        let mut smaller = ProgressMap::new();
        smaller.insert(ItemId::from("9"), ProgressRecord::default());
        store.write(&smaller).unwrap();

        assert_eq!(store.read().unwrap(), smaller);
    }

    #[test]
    fn test_progress_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = SqliteStore::open(dir.path()).unwrap();
            store.write(&sample_progress()).unwrap();
        }

        let reopened = SqliteStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read().unwrap(), sample_progress());
        assert!(reopened.describe().ends_with(DATABASE_FILE_NAME));
    }

    #[test]
    fn test_bad_rows_are_skipped_and_history_survives_save() {
        let store = SqliteStore::in_memory().unwrap();
        store.write(&sample_progress()).unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO progress (item_id, last_reviewed) VALUES (?1, ?2)",
                params!["x", "not a date"],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO performance (item_id, position, score) VALUES (?1, 3, 11)",
                params!["2"],
            )
            .unwrap();
        }

        let mut progress = store.read().unwrap();
        assert_eq!(progress, sample_progress());

        progress
            .get_mut(&ItemId::from("1"))
            .unwrap()
            .performance
            .push(Score::new(4).unwrap());
        store.save(&progress);

        let reloaded = store.read().unwrap();
        assert_eq!(reloaded[&ItemId::from("2")].review_count(), 3);
        assert_eq!(reloaded[&ItemId::from("1")].review_count(), 1);
    }
}
