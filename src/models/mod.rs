pub mod progress_record;
pub mod review_session;
pub mod reviewable_item;
pub mod score;
pub mod sm2;

pub use progress_record::{ProgressMap, ProgressRecord};
pub use review_session::{ReviewSession, SessionError, SessionStats};
pub use reviewable_item::{ItemId, ReviewableItem, ScheduleSnapshot};
pub use score::{InvalidScoreError, Score};
pub use sm2::record_review;
