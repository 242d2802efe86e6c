use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::QuestionId;

/// Engagement signals of an open question, as read for trending ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingSignals {
    pub question_id: QuestionId,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub follow_count: i64,
    pub bookmark_count: i64,
    pub answer_count: i64,
    pub comment_count: i64,
    pub view_count: i64,
    pub share_count: i64,
    pub bounty_amount: i64,
    pub has_accepted_answer: bool,
    pub last_activity_at: DateTime<Utc>,
}

/// A ranked question. `score` keeps full precision; `display_score` is rounded
/// to four decimal places for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub question_id: QuestionId,
    pub score: f64,
    pub display_score: f64,
}

/// One page of the trending feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingPage {
    pub entries: Vec<TrendingEntry>,
    pub offset: usize,
    pub limit: usize,
    pub total_count: usize,
}
