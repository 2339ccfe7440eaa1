//! SM-2 (SuperMemo 2) spaced repetition scheduling.
//!
//! A review updates an item in two steps, always in this order:
//! - The easiness factor (EF) is adjusted from the recall score and floored at 1.3
//! - The repetition count advances and the interval grows: 1 day → 6 days → previous interval × EF
//!
//! The interval step reads the EF written by the first step, so `record_review` is the
//! entry point callers should use.

use super::reviewable_item::MIN_EASINESS_FACTOR;
use super::{ReviewableItem, Score};
use chrono::{Duration, NaiveDate};
use log::debug;

/// Adjusts the easiness factor of `item` for the given recall score.
pub fn update_easiness_factor(score: Score, item: &mut ReviewableItem) {
    let miss = f64::from(5 - score.value());
    item.easiness_factor += 0.1 - miss * (0.08 + miss * 0.02);

    // E-Factor should not fall below 1.3
    if item.easiness_factor < MIN_EASINESS_FACTOR {
        item.easiness_factor = MIN_EASINESS_FACTOR;
    }
}

/// Advances the repetition count, grows the interval and moves `next_review` to
/// `today + interval`. Each call advances the state; calling it twice is not the same as once.
pub fn calculate_next_review_date(item: &mut ReviewableItem, today: NaiveDate) {
    // Not part of the schedule, only reported.
    let days_since_last_review = item.days_since_last_review(today);

    item.repetition += 1;
    item.interval = match item.repetition {
        1 => 1,
        2 => 6,
        // Reads the previous interval before overwriting it
        _ => (f64::from(item.interval) * item.easiness_factor).round() as u32,
    };

    item.next_review = today
        .checked_add_signed(Duration::days(i64::from(item.interval)))
        .unwrap_or(NaiveDate::MAX);

    debug!(
        "item {}: repetition {} interval {}d next review {} ({} day(s) since due)",
        item.id, item.repetition, item.interval, item.next_review, days_since_last_review
    );
}

/// Applies one review to a copy of `item` and returns the updated item.
pub fn record_review(item: &ReviewableItem, score: Score, today: NaiveDate) -> ReviewableItem {
    let mut updated = item.clone();
    update_easiness_factor(score, &mut updated);
    calculate_next_review_date(&mut updated, today);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn score(value: u8) -> Score {
        Score::new(value).unwrap()
    }

    fn item_with(repetition: u32, interval: u32, easiness_factor: f64) -> ReviewableItem {
        let mut item = ReviewableItem::new("1", "neko", "cat", date("2024-01-01"));
        item.repetition = repetition;
        item.interval = interval;
        item.easiness_factor = easiness_factor;
        item
    }

    #[test]
    fn test_ef_floor_holds_for_every_score() {
        for start in [1.3, 1.5, 2.5, 3.7] {
            for value in 0..=5 {
                let mut item = item_with(1, 1, start);
                update_easiness_factor(score(value), &mut item);
                assert!(item.easiness_factor >= MIN_EASINESS_FACTOR);
            }
        }
    }

    #[test]
    fn test_ef_delta_per_score() {
        let expected = [(5, 0.1), (4, 0.0), (3, -0.14), (2, -0.32), (1, -0.54), (0, -0.8)];
        for (value, delta) in expected {
            let mut item = item_with(1, 1, 3.0);
            update_easiness_factor(score(value), &mut item);
            assert!(
                (item.easiness_factor - (3.0 + delta)).abs() < EPSILON,
                "score {} gave {}",
                value,
                item.easiness_factor
            );
        }
    }

    #[test]
    fn test_perfect_score_never_lowers_ef() {
        let mut item = item_with(1, 1, 1.3);
        update_easiness_factor(score(5), &mut item);
        assert!(item.easiness_factor >= 1.3);
    }

    #[test]
    fn test_blackout_lowers_ef() {
        let mut item = item_with(1, 1, 2.5);
        update_easiness_factor(score(0), &mut item);
        assert!(item.easiness_factor < 2.5);
    }

    #[test]
    fn test_repeated_blackouts_settle_at_floor() {
        let mut item = item_with(1, 1, 2.5);
        for _ in 0..10 {
            update_easiness_factor(score(0), &mut item);
            assert!(item.easiness_factor >= MIN_EASINESS_FACTOR);
        }
        assert_eq!(item.easiness_factor, MIN_EASINESS_FACTOR);
    }

    #[test]
    fn test_interval_sequence() {
        let today = date("2024-05-01");
        let mut item = item_with(1, 1, 2.5);

        calculate_next_review_date(&mut item, today);
        assert_eq!(item.repetition, 2);
        assert_eq!(item.interval, 6);
        assert_eq!(item.next_review, date("2024-05-07"));

        calculate_next_review_date(&mut item, today);
        assert_eq!(item.repetition, 3);
        assert_eq!(item.interval, 15); // round(6 * 2.5)
        assert_eq!(item.next_review, date("2024-05-16"));
    }

    #[test]
    fn test_repetition_zero_gives_one_day() {
        let today = date("2024-05-01");
        let mut item = item_with(0, 4, 2.5);

        calculate_next_review_date(&mut item, today);
        assert_eq!(item.repetition, 1);
        assert_eq!(item.interval, 1);
        assert_eq!(item.next_review, date("2024-05-02"));
    }

    #[test]
    fn test_next_review_date_is_not_idempotent() {
        let today = date("2024-05-01");
        let mut once = item_with(2, 6, 2.5);
        calculate_next_review_date(&mut once, today);

        let mut twice = once.clone();
        calculate_next_review_date(&mut twice, today);

        assert_ne!(once, twice);
        assert_eq!(twice.repetition, once.repetition + 1);
        assert!(twice.interval > once.interval);
    }

    #[test]
    fn test_perfect_first_review() {
        let today = date("2024-02-10");
        let item = item_with(1, 1, 2.5);
        assert_eq!(item.next_review, date("2024-01-01"));

        let updated = record_review(&item, score(5), today);
        assert!((updated.easiness_factor - 2.6).abs() < EPSILON);
        assert_eq!(updated.repetition, 2);
        assert_eq!(updated.interval, 6);
        assert_eq!(updated.next_review, today + Duration::days(6));
    }

    #[test]
    fn test_hard_third_review() {
        let today = date("2024-02-10");
        let item = item_with(2, 6, 2.5);

        let updated = record_review(&item, score(2), today);
        assert!((updated.easiness_factor - 2.18).abs() < EPSILON);
        assert_eq!(updated.repetition, 3);
        assert_eq!(updated.interval, 13); // round(6 * 2.18)
        assert_eq!(updated.next_review, date("2024-02-23"));
    }

    #[test]
    fn test_record_review_uses_updated_ef() {
        let today = date("2024-02-10");
        let item = item_with(3, 10, 2.5);

        // 10 * 2.6 with the new factor, 10 * 2.5 would give 25
        let updated = record_review(&item, score(5), today);
        assert_eq!(updated.interval, 26);
        // the input is left untouched
        assert_eq!(item.interval, 10);
    }

    #[test]
    fn test_huge_interval_saturates_date() {
        let mut item = item_with(40, u32::MAX / 2, 2.5);
        calculate_next_review_date(&mut item, date("2024-01-01"));
        assert_eq!(item.interval, u32::MAX);
        assert_eq!(item.next_review, NaiveDate::MAX);
    }
}
