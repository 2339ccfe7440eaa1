use super::{ItemId, ReviewableItem, ScheduleSnapshot, Score};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Progress of every item, keyed by item id.
pub type ProgressMap = BTreeMap<ItemId, ProgressRecord>;

/// Review history of one item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub last_reviewed: Option<NaiveDate>,
    /// One score per completed review, oldest first. Append only.
    #[serde(default)]
    pub performance: Vec<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSnapshot>,
}

impl ProgressRecord {
    /// Appends a completed review and remembers the item's new schedule.
    pub fn record(&mut self, score: Score, reviewed_on: NaiveDate, item: &ReviewableItem) {
        self.last_reviewed = Some(reviewed_on);
        self.performance.push(score);
        self.schedule = Some(item.schedule());
    }

    pub fn review_count(&self) -> usize {
        self.performance.len()
    }

    pub fn last_score(&self) -> Option<Score> {
        self.performance.last().copied()
    }
}
