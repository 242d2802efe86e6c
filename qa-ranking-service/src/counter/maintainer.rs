//! Applies vote intents to the ledger and the denormalized counters.
use std::sync::Arc;

use qa_ranking_repository::VotesRepository;
use qa_ranking_shared::types::{
    SubjectRef, UserId, Vote, VoteIntent, VoteOutcome, VoteRejection, VoteState, VoteTransition,
};
use tracing::{error, info};

use crate::activity::Clock;
use crate::config::RankingConfig;
use crate::counter::plan_transition;
use crate::errors::VotingError;
use crate::retry::retry_transient;

/// Commits vote transitions as single units of work against a `VotesRepository`.
pub struct CounterMaintainer {
    repository: Arc<dyn VotesRepository>,
    clock: Arc<dyn Clock>,
    config: RankingConfig,
}

impl CounterMaintainer {
    pub fn new(
        repository: Arc<dyn VotesRepository>,
        clock: Arc<dyn Clock>,
        config: RankingConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    /// Applies `intent` for `voter_id` on `subject`.
    ///
    /// The transition is decided inside the repository's unit of work from the
    /// ledger row it reads there, so concurrent requests for the same pair never
    /// decide from stale state. Transient storage failures are retried with
    /// jittered exponential backoff up to `max_vote_attempts`.
    ///
    /// # Arguments
    ///
    /// * `subject` - The question or answer being voted on
    /// * `voter_id` - The authenticated voter
    /// * `intent` - Upvote, downvote or removal
    ///
    /// # Returns
    ///
    /// * `Ok(VoteOutcome)` - The voter's new state and the subject's counters
    /// * `Err(VotingError::DuplicateVote)` / `Err(VotingError::NoExistingVote)` - Rejected, nothing changed
    /// * `Err(VotingError::SubjectNotFound)` - The subject does not exist
    /// * `Err(VotingError::CounterUnderflow)` - Counters disagree with the ledger; nothing changed
    /// * `Err(VotingError::Transient)` - Contention outlasted every attempt
    pub async fn apply_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        intent: VoteIntent,
    ) -> Result<VoteOutcome, VotingError> {
        let planner = move |current: Option<&Vote>| -> Result<VoteTransition, VoteRejection> {
            plan_transition(VoteState::of(current), intent)
        };

        let result = retry_transient(&self.config, "apply_vote", || {
            self.repository
                .commit_vote(subject, voter_id, &planner, self.clock.now())
        })
        .await;

        match &result {
            Ok(outcome) => info!(
                %subject,
                %voter_id,
                ?intent,
                state = ?outcome.state,
                upvotes = outcome.upvote_count,
                downvotes = outcome.downvote_count,
                "Vote applied"
            ),
            Err(VotingError::CounterUnderflow { delta, .. }) => error!(
                %subject,
                %voter_id,
                ?intent,
                ?delta,
                "Vote would drive a counter negative; counters need reconciliation"
            ),
            Err(_) => {}
        }
        result
    }
}
