//! ReviewableItem is one learnable fact: a term, its meaning and the SM-2 scheduling state.
use chrono::NaiveDate;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const DEFAULT_INTERVAL: u32 = 1;
pub const DEFAULT_REPETITION: u32 = 1;
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;
/// SM-2 floor, the easiness factor is never allowed below this value.
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Stable item identifier. Catalogs may use strings or integers, both are kept as text
/// so that ids survive as JSON object keys in the progress file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct ItemIdVisitor;

impl Visitor<'_> for ItemIdVisitor {
    type Value = ItemId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer item id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ItemId, E> {
        Ok(ItemId::new(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ItemId, E> {
        Ok(ItemId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ItemId, E> {
        Ok(ItemId(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ItemIdVisitor)
    }
}

/// Scheduling fields of an item, persisted alongside the progress history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSnapshot {
    pub interval: u32,
    pub repetition: u32,
    pub easiness_factor: f64,
    pub next_review: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewableItem {
    pub id: ItemId,
    pub term: String,
    pub meaning: String,
    /// Picture reference, any JSON shape. Passed through untouched.
    pub image: Option<serde_json::Value>,
    /// Alternate renderings (scripts, pronunciations). Passed through untouched.
    pub versions: Option<serde_json::Value>,
    pub interval: u32,
    pub repetition: u32,
    pub easiness_factor: f64,
    pub next_review: NaiveDate,
}

impl ReviewableItem {
    /// Creates a fresh item that is due on `today`.
    pub fn new(
        id: impl Into<ItemId>,
        term: impl Into<String>,
        meaning: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            meaning: meaning.into(),
            image: None,
            versions: None,
            interval: DEFAULT_INTERVAL,
            repetition: DEFAULT_REPETITION,
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            next_review: today,
        }
    }

    pub fn schedule(&self) -> ScheduleSnapshot {
        ScheduleSnapshot {
            interval: self.interval,
            repetition: self.repetition,
            easiness_factor: self.easiness_factor,
            next_review: self.next_review,
        }
    }

    /// Restores previously persisted scheduling state.
    ///
    /// Zero values are treated as unset and fall back to the defaults, and an easiness factor
    /// under the SM-2 floor is raised to it, so a rehydrated item always satisfies the invariants.
    pub fn restore_schedule(&mut self, snapshot: &ScheduleSnapshot) {
        self.interval = if snapshot.interval == 0 {
            DEFAULT_INTERVAL
        } else {
            snapshot.interval
        };
        self.repetition = if snapshot.repetition == 0 {
            DEFAULT_REPETITION
        } else {
            snapshot.repetition
        };
        let easiness = snapshot.easiness_factor;
        self.easiness_factor = if easiness.is_finite() && easiness != 0.0 {
            easiness.max(MIN_EASINESS_FACTOR)
        } else {
            DEFAULT_EASINESS_FACTOR
        };
        self.next_review = snapshot.next_review;
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }

    /// Days elapsed since the item became due. Negative when the item is not due yet.
    pub fn days_since_last_review(&self, today: NaiveDate) -> i64 {
        (today - self.next_review).num_days()
    }

    /// Text handed to the audio player: the named version when it is a string, else the term.
    pub fn answer_text(&self, version: Option<&str>) -> &str {
        version
            .and_then(|key| self.versions.as_ref()?.get(key)?.as_str())
            .unwrap_or(&self.term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_fresh_item_defaults() {
        let today = date("2024-03-10");
        let item = ReviewableItem::new("1", "neko", "cat", today);

        assert_eq!(item.interval, 1);
        assert_eq!(item.repetition, 1);
        assert_eq!(item.easiness_factor, 2.5);
        assert_eq!(item.next_review, today);
        assert!(item.is_due(today));
    }

    #[test]
    fn test_restore_schedule_normalizes_unset_values() {
        let mut item = ReviewableItem::new("1", "neko", "cat", date("2024-03-10"));
        item.restore_schedule(&ScheduleSnapshot {
            interval: 0,
            repetition: 0,
            easiness_factor: 0.9,
            next_review: date("2024-04-01"),
        });

        assert_eq!(item.interval, DEFAULT_INTERVAL);
        assert_eq!(item.repetition, DEFAULT_REPETITION);
        assert_eq!(item.easiness_factor, MIN_EASINESS_FACTOR);
        assert_eq!(item.next_review, date("2024-04-01"));
        assert!(!item.is_due(date("2024-03-31")));
    }

    #[test]
    fn test_item_id_accepts_strings_and_integers() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"["abc", 42]"#).unwrap();
        assert_eq!(ids[0], ItemId::from("abc"));
        assert_eq!(ids[1], ItemId::from(42i64));
        assert_eq!(serde_json::to_string(&ids[1]).unwrap(), r#""42""#);
    }

    #[test]
    fn test_answer_text_prefers_named_version() {
        let mut item = ReviewableItem::new(1i64, "ネコ", "cat", date("2024-03-10"));
        item.versions = Some(json!({ "katakana": "ネコ", "romaji": "neko" }));

        assert_eq!(item.answer_text(Some("romaji")), "neko");
        assert_eq!(item.answer_text(Some("hiragana")), "ネコ");
        assert_eq!(item.answer_text(None), "ネコ");
    }

    #[test]
    fn test_days_since_last_review() {
        let item = ReviewableItem::new("1", "neko", "cat", date("2024-03-10"));
        assert_eq!(item.days_since_last_review(date("2024-03-13")), 3);
        assert_eq!(item.days_since_last_review(date("2024-03-08")), -2);
    }
}
