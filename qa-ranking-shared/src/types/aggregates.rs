use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AnswerId, QuestionId, TrendingSignals};

/// Denormalized aggregate fields of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAggregates {
    pub id: QuestionId,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub comment_count: i64,
    pub answer_count: i64,
    pub view_count: i64,
    pub follow_count: i64,
    pub bookmark_count: i64,
    pub share_count: i64,
    pub bounty_amount: i64,
    pub has_accepted_answer: bool,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl QuestionAggregates {
    /// A fresh, open question with every counter at zero.
    pub fn new(id: QuestionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            upvote_count: 0,
            downvote_count: 0,
            comment_count: 0,
            answer_count: 0,
            view_count: 0,
            follow_count: 0,
            bookmark_count: 0,
            share_count: 0,
            bounty_amount: 0,
            has_accepted_answer: false,
            is_closed: false,
            created_at,
            last_activity_at: created_at,
        }
    }

    pub fn trending_signals(&self) -> TrendingSignals {
        TrendingSignals {
            question_id: self.id,
            upvote_count: self.upvote_count,
            downvote_count: self.downvote_count,
            follow_count: self.follow_count,
            bookmark_count: self.bookmark_count,
            answer_count: self.answer_count,
            comment_count: self.comment_count,
            view_count: self.view_count,
            share_count: self.share_count,
            bounty_amount: self.bounty_amount,
            has_accepted_answer: self.has_accepted_answer,
            last_activity_at: self.last_activity_at,
        }
    }
}

/// Denormalized aggregate fields of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerAggregates {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub comment_count: i64,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AnswerAggregates {
    pub fn new(id: AnswerId, question_id: QuestionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            question_id,
            upvote_count: 0,
            downvote_count: 0,
            comment_count: 0,
            is_accepted: false,
            created_at,
            last_activity_at: created_at,
        }
    }
}
