//! Review session management.
//! Walks through the catalog, applies recall scores with the SM-2 scheduler and keeps the
//! progress store in sync after every review.

use super::{ItemId, ProgressMap, ProgressRecord, ReviewableItem, Score, sm2};
use crate::audio::AudioPlayer;
use crate::store::ProgressStore;
use chrono::{Duration, NaiveDate};
use log::{debug, info};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("The session has no items")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    /// Items reviewed at least once.
    pub reviewed: usize,
    pub due: usize,
    /// Scores of 3 and above across all reviews.
    pub passed: usize,
    pub failed: usize,
}

pub struct ReviewSession {
    items: Vec<ReviewableItem>,
    progress: ProgressMap,
    store: Box<dyn ProgressStore>,
    audio: Box<dyn AudioPlayer>,
    speak_version: Option<String>,
    current_index: usize,
    show_answer: bool,
    today: NaiveDate,
}

impl ReviewSession {
    /// Starts a session over the catalog items.
    ///
    /// Every item gets a progress record (empty when it was never reviewed), and items whose
    /// record carries a schedule snapshot resume from it.
    pub fn start(
        mut items: Vec<ReviewableItem>,
        store: Box<dyn ProgressStore>,
        audio: Box<dyn AudioPlayer>,
        today: NaiveDate,
    ) -> Self {
        let mut progress = store.load();

        for item in &mut items {
            let record = progress.entry(item.id.clone()).or_default();
            if let Some(snapshot) = &record.schedule {
                item.restore_schedule(snapshot);
            }
        }

        info!(
            "Review session started with {} items, {} due on {}",
            items.len(),
            items.iter().filter(|item| item.is_due(today)).count(),
            today
        );

        Self {
            items,
            progress,
            store,
            audio,
            speak_version: None,
            current_index: 0,
            show_answer: false,
            today,
        }
    }

    /// Picks which `versions` entry `play_answer` speaks.
    pub fn with_speak_version(mut self, version: Option<String>) -> Self {
        self.speak_version = version;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    /// Moves the session clock one day forward.
    pub fn advance_day(&mut self) {
        self.today = self
            .today
            .checked_add_signed(Duration::days(1))
            .unwrap_or(NaiveDate::MAX);
        debug!("Session date advanced to {}", self.today);
    }

    pub fn items(&self) -> &[ReviewableItem] {
        &self.items
    }

    pub fn item(&self, id: &ItemId) -> Option<&ReviewableItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn current_item(&self) -> Option<&ReviewableItem> {
        self.items.get(self.current_index)
    }

    pub fn reveal_answer(&mut self) {
        self.show_answer = true;
    }

    pub fn is_answer_shown(&self) -> bool {
        self.show_answer
    }

    /// Moves to the next item, wrapping around at the end of the catalog.
    pub fn next_item(&mut self) {
        if !self.items.is_empty() {
            self.current_index = (self.current_index + 1) % self.items.len();
        }
        self.show_answer = false;
    }

    /// Applies a score to the current item.
    pub fn apply_score(&mut self, score: Score) -> Result<&ReviewableItem, SessionError> {
        if self.items.is_empty() {
            return Err(SessionError::Empty);
        }
        self.review_at(self.current_index, score)
    }

    /// Applies a score to the item with the given id.
    pub fn apply_score_to(
        &mut self,
        id: &ItemId,
        score: Score,
    ) -> Result<&ReviewableItem, SessionError> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| SessionError::UnknownItem(id.clone()))?;
        self.review_at(index, score)
    }

    fn review_at(&mut self, index: usize, score: Score) -> Result<&ReviewableItem, SessionError> {
        let today = self.today;
        let item = &mut self.items[index];
        *item = sm2::record_review(item, score, today);

        self.progress
            .entry(item.id.clone())
            .or_default()
            .record(score, today, item);
        info!(
            "Reviewed {} with score {}, next review {}",
            item.id, score, item.next_review
        );

        self.store.save(&self.progress);
        self.show_answer = true;
        Ok(&self.items[index])
    }

    /// Speaks the answer of the current item.
    pub fn play_answer(&self) {
        if let Some(item) = self.current_item() {
            self.play_item(item);
        }
    }

    pub fn play_answer_of(&self, id: &ItemId) -> Result<(), SessionError> {
        let item = self
            .item(id)
            .ok_or_else(|| SessionError::UnknownItem(id.clone()))?;
        self.play_item(item);
        Ok(())
    }

    fn play_item(&self, item: &ReviewableItem) {
        self.audio
            .speak(item.answer_text(self.speak_version.as_deref()));
    }

    /// Items due on the session date, the longest overdue first.
    pub fn due_items(&self) -> Vec<&ReviewableItem> {
        let mut due: Vec<&ReviewableItem> = self
            .items
            .iter()
            .filter(|item| item.is_due(self.today))
            .collect();
        due.sort_by_key(|item| item.next_review);
        due
    }

    pub fn history(&self, id: &ItemId) -> Option<&ProgressRecord> {
        self.progress.get(id)
    }

    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    pub fn stats(&self) -> SessionStats {
        let records = self
            .items
            .iter()
            .filter_map(|item| self.progress.get(&item.id));

        let mut reviewed = 0;
        let mut passed = 0;
        let mut failed = 0;
        for record in records {
            if record.review_count() > 0 {
                reviewed += 1;
            }
            for score in &record.performance {
                if score.is_pass() {
                    passed += 1;
                } else {
                    failed += 1;
                }
            }
        }

        SessionStats {
            total: self.items.len(),
            reviewed,
            due: self.due_items().len(),
            passed,
            failed,
        }
    }
}
