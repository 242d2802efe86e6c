use serde::{Deserialize, Serialize};

use crate::types::{SubjectRef, VoteState};

/// Signed change applied to a subject's vote counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotesDelta {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl VotesDelta {
    pub fn new(upvotes: i32, downvotes: i32) -> Self {
        Self { upvotes, downvotes }
    }
}

/// Represents the aggregated vote counts stored on a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotesCount {
    pub subject: SubjectRef,
    pub upvotes: i64,
    pub downvotes: i64,
}

impl VotesCount {
    /// Counts as presented to callers, floored at zero.
    pub fn clamped(self) -> Self {
        Self {
            upvotes: self.upvotes.max(0),
            downvotes: self.downvotes.max(0),
            ..self
        }
    }
}

/// Result of a committed vote: the voter's new state and the subject's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub state: VoteState,
    pub upvote_count: i64,
    pub downvote_count: i64,
}

/// A counter correction made by the reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRepair {
    pub subject: SubjectRef,
    pub stored: VotesCount,
    pub ledger: VotesCount,
}
