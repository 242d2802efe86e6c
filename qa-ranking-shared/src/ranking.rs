//! The trending score: engagement signals decayed by the age of the last activity.
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::types::{TrendingEntry, TrendingSignals};

// Storage backends that rank in the database bind these same weights.
pub const UPVOTE_WEIGHT: f64 = 4.0;
pub const FOLLOW_WEIGHT: f64 = 3.0;
pub const BOOKMARK_WEIGHT: f64 = 5.0;
pub const ANSWER_WEIGHT: f64 = 5.0;
pub const COMMENT_WEIGHT: f64 = 2.0;
pub const VIEW_WEIGHT: f64 = 0.5;
pub const SHARE_WEIGHT: f64 = 3.0;
pub const BOUNTY_WEIGHT: f64 = 0.1;
/// Bonus for questions still waiting for an accepted answer.
pub const UNANSWERED_BONUS: f64 = 10.0;
pub const AGE_OFFSET_HOURS: f64 = 2.0;
pub const GRAVITY: f64 = 1.5;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Computes the trending score of a question at `now`.
///
/// ```text
/// score = (4·(up − down) + 3·follows + 5·bookmarks + 5·answers + 2·comments
///          + 0.5·views + 3·shares + 0.1·bounty + (accepted ? 0 : 10))
///         / (age_hours + 2)^1.5
/// ```
///
/// `age_hours` is measured from `last_activity_at` and floored at zero, so a
/// timestamp ahead of `now` scores as brand new. The result is negative when
/// downvotes outweigh every other signal.
pub fn trending_score(signals: &TrendingSignals, now: DateTime<Utc>) -> f64 {
    let net_votes = (signals.upvote_count - signals.downvote_count) as f64;
    let numerator = UPVOTE_WEIGHT * net_votes
        + FOLLOW_WEIGHT * signals.follow_count as f64
        + BOOKMARK_WEIGHT * signals.bookmark_count as f64
        + ANSWER_WEIGHT * signals.answer_count as f64
        + COMMENT_WEIGHT * signals.comment_count as f64
        + VIEW_WEIGHT * signals.view_count as f64
        + SHARE_WEIGHT * signals.share_count as f64
        + BOUNTY_WEIGHT * signals.bounty_amount as f64
        + if signals.has_accepted_answer {
            0.0
        } else {
            UNANSWERED_BONUS
        };

    let age_millis = (now - signals.last_activity_at).num_milliseconds().max(0);
    let age_hours = age_millis as f64 / MILLIS_PER_HOUR;

    numerator / (age_hours + AGE_OFFSET_HOURS).powf(GRAVITY)
}

/// Rounds a score to four decimal places, ties to even.
pub fn display_score(score: f64) -> f64 {
    (score * 10_000.0).round_ties_even() / 10_000.0
}

/// Scores and orders questions: highest score first, ties by question id ascending.
pub fn rank_signals(signals: &[TrendingSignals], now: DateTime<Utc>) -> Vec<TrendingEntry> {
    let mut entries: Vec<TrendingEntry> = signals
        .iter()
        .map(|s| {
            let score = trending_score(s, now);
            TrendingEntry {
                question_id: s.question_id,
                score,
                display_score: display_score(score),
            }
        })
        .collect();

    entries.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.question_id.cmp(&b.question_id),
        other => other,
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::{Uuid, uuid};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
    }

    fn signals(question_id: Uuid, last_activity_at: DateTime<Utc>) -> TrendingSignals {
        TrendingSignals {
            question_id,
            upvote_count: 10,
            downvote_count: 2,
            follow_count: 3,
            bookmark_count: 1,
            answer_count: 4,
            comment_count: 5,
            view_count: 100,
            share_count: 0,
            bounty_amount: 0,
            has_accepted_answer: false,
            last_activity_at,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let s = signals(Uuid::new_v4(), now());
        let score = trending_score(&s, now());

        // Numerator is 136 and the denominator 2^1.5.
        assert!((score - 136.0 / 2f64.powf(1.5)).abs() < 1e-9);
        assert_eq!(display_score(score), 48.0833);
    }

    #[test]
    fn test_accepted_answer_removes_bonus() {
        let mut s = signals(Uuid::new_v4(), now());
        s.has_accepted_answer = true;
        let score = trending_score(&s, now());
        assert!((score - 126.0 / 2f64.powf(1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_score_decays_with_age() {
        let id = Uuid::new_v4();
        let mut previous = f64::INFINITY;
        for hours in [0, 1, 6, 24, 24 * 7] {
            let score = trending_score(&signals(id, now() - Duration::hours(hours)), now());
            assert!(score > 0.0);
            assert!(score < previous);
            previous = score;
        }
    }

    #[test]
    fn test_future_activity_counts_as_zero_age() {
        let id = Uuid::new_v4();
        let ahead = trending_score(&signals(id, now() + Duration::hours(3)), now());
        let fresh = trending_score(&signals(id, now()), now());
        assert_eq!(ahead, fresh);
    }

    #[test]
    fn test_downvote_heavy_question_scores_negative() {
        let mut s = signals(Uuid::new_v4(), now());
        s.upvote_count = 0;
        s.downvote_count = 200;
        assert!(trending_score(&s, now()) < 0.0);
    }

    #[test]
    fn test_display_score_keeps_four_decimals() {
        assert_eq!(display_score(1.00004), 1.0);
        assert_eq!(display_score(1.23456), 1.2346);
        assert_eq!(display_score(-2.5), -2.5);
    }

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let low_id = uuid!("00000000-0000-4000-8000-000000000001");
        let high_id = uuid!("00000000-0000-4000-8000-000000000002");
        let stale_id = uuid!("00000000-0000-4000-8000-000000000000");

        let ranked = rank_signals(
            &[
                signals(high_id, now()),
                signals(stale_id, now() - Duration::hours(10)),
                signals(low_id, now()),
            ],
            now(),
        );

        let order: Vec<Uuid> = ranked.iter().map(|e| e.question_id).collect();
        assert_eq!(order, vec![low_id, high_id, stale_id]);
    }
}
