//! Ranking service implementation.
//!
//! This module provides the facade application code uses for voting, answer
//! acceptance, activity events, the trending feed and counter maintenance.

use std::sync::Arc;

use qa_ranking_repository::VotesRepository;
use qa_ranking_shared::types::{
    AnswerId, CounterRepair, QuestionId, SubjectRef, TrendingPage, UserId, VoteIntent,
    VoteOutcome,
};
use tracing::{info, warn};

use crate::acceptance::AcceptanceManager;
use crate::activity::{ActivityClock, Clock, SystemClock};
use crate::config::RankingConfig;
use crate::counter::CounterMaintainer;
use crate::errors::VotingError;
use crate::retry::retry_transient;
use crate::trending::TrendingFeed;

/// The main service for the vote aggregation and trending subsystem.
///
/// Every component shares one repository and one clock. The voter is always
/// passed explicitly; the service never resolves identity on its own.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use qa_ranking_repository::InMemoryVotesRepository;
/// use qa_ranking_service::RankingService;
/// use qa_ranking_shared::types::{SubjectRef, VoteIntent};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = RankingService::new(Arc::new(InMemoryVotesRepository::new()));
/// let outcome = service
///     .apply_vote(SubjectRef::Question(Uuid::new_v4()), Uuid::new_v4(), VoteIntent::Upvote)
///     .await?;
/// println!("{} upvotes", outcome.upvote_count);
/// # Ok(())
/// # }
/// ```
pub struct RankingService {
    repository: Arc<dyn VotesRepository>,
    counters: CounterMaintainer,
    acceptance: AcceptanceManager,
    activity: ActivityClock,
    trending: TrendingFeed,
    config: RankingConfig,
}

impl RankingService {
    /// Create a new RankingService with the system clock and default configuration.
    pub fn new(repository: Arc<dyn VotesRepository>) -> Self {
        Self::with_config(repository, RankingConfig::default(), Arc::new(SystemClock))
    }

    /// Create a new RankingService with a custom configuration and clock.
    ///
    /// # Arguments
    ///
    /// * `repository` - Storage backend (e.g., `PostgresVotesRepository`)
    /// * `config` - Retry and pagination settings
    /// * `clock` - Time source for activity stamps and trending ages
    pub fn with_config(
        repository: Arc<dyn VotesRepository>,
        config: RankingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            counters: CounterMaintainer::new(repository.clone(), clock.clone(), config.clone()),
            acceptance: AcceptanceManager::new(repository.clone(), clock.clone(), config.clone()),
            activity: ActivityClock::new(repository.clone(), clock.clone()),
            trending: TrendingFeed::new(repository.clone(), clock, config.clone()),
            repository,
            config,
        }
    }

    pub fn repository(&self) -> &Arc<dyn VotesRepository> {
        &self.repository
    }

    /// Applies a vote intent. See [`CounterMaintainer::apply_vote`].
    pub async fn apply_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        intent: VoteIntent,
    ) -> Result<VoteOutcome, VotingError> {
        self.counters.apply_vote(subject, voter_id, intent).await
    }

    /// Accepts an answer. See [`AcceptanceManager::accept_answer`].
    pub async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), VotingError> {
        self.acceptance.accept_answer(question_id, answer_id).await
    }

    pub async fn compute_trending_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<TrendingPage, VotingError> {
        self.trending.compute_page(offset, limit).await
    }

    pub async fn touch_activity(&self, subject: SubjectRef) -> Result<(), VotingError> {
        self.activity.touch(subject).await
    }

    pub async fn record_answer_created(&self, question_id: QuestionId) -> Result<(), VotingError> {
        self.activity.record_answer_created(question_id).await
    }

    pub async fn record_comment_created(&self, answer_id: AnswerId) -> Result<(), VotingError> {
        self.activity.record_comment_created(answer_id).await
    }

    pub async fn record_view(&self, question_id: QuestionId) -> Result<(), VotingError> {
        self.activity.record_view(question_id).await
    }

    /// Rewrites every vote counter that disagrees with the ledger.
    ///
    /// Transient storage failures are retried like votes; a retry only finds
    /// the subjects the failed attempt had not repaired yet.
    ///
    /// # Returns
    ///
    /// One `CounterRepair` per corrected subject; empty when everything matched.
    pub async fn reconcile_vote_counts(&self) -> Result<Vec<CounterRepair>, VotingError> {
        let repairs = retry_transient(&self.config, "reconcile_vote_counts", || {
            self.repository.reconcile_vote_counts()
        })
        .await?;
        for repair in &repairs {
            warn!(
                subject = %repair.subject,
                stored_upvotes = repair.stored.upvotes,
                stored_downvotes = repair.stored.downvotes,
                ledger_upvotes = repair.ledger.upvotes,
                ledger_downvotes = repair.ledger.downvotes,
                "Vote counters drifted from the ledger and were repaired"
            );
        }
        info!(repaired = repairs.len(), "Vote counter reconciliation finished");
        Ok(repairs)
    }
}
