pub mod audio;
pub mod catalog;
pub mod config;
pub mod models;
pub mod store;

pub use models::{
    InvalidScoreError, ItemId, ProgressMap, ProgressRecord, ReviewSession, ReviewableItem, Score,
    record_review,
};
