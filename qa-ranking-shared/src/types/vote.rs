use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{SubjectRef, UserId};

/// The vote a user asks to hold on a subject.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VoteIntent {
    /// Indicates an upvote or positive endorsement.
    Upvote,
    /// Indicates a downvote or negative endorsement.
    Downvote,
    /// Indicates the removal or retraction of a previous vote.
    RemoveVote,
}

/// The vote a user currently holds on a subject, as recorded by the ledger.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VoteState {
    NoVote,
    Upvoted,
    Downvoted,
}

impl VoteState {
    /// Derives the current state from an optional ledger row.
    pub fn of(vote: Option<&Vote>) -> Self {
        match vote {
            None => VoteState::NoVote,
            Some(v) if v.is_upvote => VoteState::Upvoted,
            Some(_) => VoteState::Downvoted,
        }
    }
}

/// A ledger entry: the vote one user holds on one subject.
///
/// There is at most one row per `(subject, voter_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub subject: SubjectRef,
    pub voter_id: UserId,
    pub is_upvote: bool,
    pub created_at: DateTime<Utc>,
}

/// Request-level reasons for refusing a vote. Neither is transient.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum VoteRejection {
    #[error("voter already holds this vote")]
    DuplicateVote,
    #[error("voter has no vote to remove")]
    NoExistingVote,
}
