//! JSON catalog import/export.
//! A catalog is an array of entries with `id`, `term`, `meaning` and optionally `image`,
//! `versions` and the scheduling state of a previous session.

use super::CatalogError;
use crate::models::{ItemId, ReviewableItem, ScheduleSnapshot};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const REQUIRED_FIELDS: [&str; 3] = ["id", "term", "meaning"];

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    id: ItemId,
    term: String,
    meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    versions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repetition: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    easiness_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_review: Option<NaiveDate>,
}

impl CatalogEntry {
    fn into_item(self, today: NaiveDate) -> ReviewableItem {
        let has_schedule = self.interval.is_some()
            || self.repetition.is_some()
            || self.easiness_factor.is_some()
            || self.next_review.is_some();

        let mut item = ReviewableItem::new(self.id, self.term, self.meaning, today);
        item.image = self.image;
        item.versions = self.versions;

        if has_schedule {
            // Absent fields go through the same normalisation as zero values
            item.restore_schedule(&ScheduleSnapshot {
                interval: self.interval.unwrap_or(0),
                repetition: self.repetition.unwrap_or(0),
                easiness_factor: self.easiness_factor.unwrap_or(0.0),
                next_review: self.next_review.unwrap_or(today),
            });
        }
        item
    }
}

impl From<&ReviewableItem> for CatalogEntry {
    fn from(item: &ReviewableItem) -> Self {
        Self {
            id: item.id.clone(),
            term: item.term.clone(),
            meaning: item.meaning.clone(),
            image: item.image.clone(),
            versions: item.versions.clone(),
            interval: Some(item.interval),
            repetition: Some(item.repetition),
            easiness_factor: Some(item.easiness_factor),
            next_review: Some(item.next_review),
        }
    }
}

fn entry_label(index: usize, entry: &Value) -> String {
    match entry.get("id") {
        Some(Value::String(id)) => format!("#{} (id {:?})", index, id),
        Some(Value::Number(id)) => format!("#{} (id {})", index, id),
        _ => format!("#{}", index),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Parses a catalog document. Any malformed entry fails the whole catalog.
pub fn parse_catalog(json: &str, today: NaiveDate) -> Result<Vec<ReviewableItem>, CatalogError> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = document else {
        return Err(CatalogError::NotAnArray);
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let label = entry_label(index, &entry);
        if !entry.is_object() {
            return Err(CatalogError::NotAnObject { entry: label });
        }
        if let Some(field) = REQUIRED_FIELDS
            .into_iter()
            .find(|field| is_blank(entry.get(*field)))
        {
            return Err(CatalogError::MissingField {
                entry: label,
                field,
            });
        }

        let parsed: CatalogEntry =
            serde_json::from_value(entry).map_err(|source| CatalogError::InvalidEntry {
                entry: label.clone(),
                source,
            })?;

        if !seen.insert(parsed.id.clone()) {
            return Err(CatalogError::DuplicateId {
                entry: label,
                id: parsed.id.to_string(),
            });
        }
        items.push(parsed.into_item(today));
    }

    Ok(items)
}

/// Reads and parses a catalog file. Entries without a `nextReview` are due `today`.
pub fn load_catalog(path: &Path, today: NaiveDate) -> Result<Vec<ReviewableItem>, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let items = parse_catalog(&contents, today)?;
    info!("Loaded {} items from catalog {}", items.len(), path.display());
    Ok(items)
}

/// Writes the items, including their current scheduling state, as a catalog file.
pub fn export_catalog(items: &[ReviewableItem], path: &Path) -> Result<(), CatalogError> {
    let entries: Vec<CatalogEntry> = items.iter().map(CatalogEntry::from).collect();
    let json_string = serde_json::to_string_pretty(&entries)?;
    fs::write(path, json_string).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Exported {} items to {}", items.len(), path.display());
    Ok(())
}
