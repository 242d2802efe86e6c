//! This module defines the `VotesRepository` trait, which provides an interface
//! for interacting with the underlying data store for the vote ledger, the
//! denormalized counters of questions and answers, and their activity timestamps.
use chrono::{DateTime, Utc};
use qa_ranking_shared::types::{
    AnswerAggregates, AnswerId, CounterRepair, QuestionAggregates, QuestionId, SubjectRef,
    TrendingPage, UserId, Vote, VoteOutcome, VoteRejection, VoteTransition, VotesCount,
};

use crate::errors::VotesRepositoryError;

/// Decides the transition for a pair given the ledger row read inside the unit of work.
pub type TransitionPlanner<'a> =
    &'a (dyn Fn(Option<&Vote>) -> Result<VoteTransition, VoteRejection> + Send + Sync);

/// A trait that defines the interface for interacting with the votes data repository.
///
/// Every mutating method is a single atomic unit: either everything it describes
/// is persisted, or nothing is.
#[async_trait::async_trait]
pub trait VotesRepository: Send + Sync {
    /// Reads the ledger row for a `(subject, voter)` pair without locking it.
    async fn get_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
    ) -> Result<Option<Vote>, VotesRepositoryError>;

    /// Reads the stored vote counters of a subject.
    ///
    /// # Returns
    ///
    /// * `Ok(VotesCount)` - Counters as stored (not clamped)
    /// * `Err(VotesRepositoryError::SubjectNotFound)` - The subject does not exist
    async fn get_votes_count(&self, subject: SubjectRef)
    -> Result<VotesCount, VotesRepositoryError>;

    /// Commits one vote transition for a `(subject, voter)` pair.
    ///
    /// Inside a single unit of work this method serializes against other writers
    /// of the same pair, reads the current ledger row, asks `planner` for the
    /// transition, applies the ledger mutation, applies the counter delta
    /// atomically at the storage layer and stamps the subject's activity (and the
    /// parent question's, for answers).
    ///
    /// # Arguments
    ///
    /// * `subject` - The question or answer being voted on
    /// * `voter_id` - The authenticated voter
    /// * `planner` - Pure decision function over the current ledger row
    /// * `now` - Activity and ledger timestamp
    ///
    /// # Returns
    ///
    /// * `Ok(VoteOutcome)` - New state and the subject's counters after commit
    /// * `Err(VotesRepositoryError::Rejected)` - The planner refused the intent; nothing changed
    /// * `Err(VotesRepositoryError::CounterUnderflow)` - The delta would make a counter negative
    /// * `Err(VotesRepositoryError)` - Storage failure; check `is_transient()`
    async fn commit_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        planner: TransitionPlanner<'_>,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, VotesRepositoryError>;

    /// Marks `answer_id` as the only accepted answer of `question_id`.
    ///
    /// Clears any previously accepted answer of the question, flags the question
    /// as having an accepted answer and stamps activity on both, atomically.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The answer is now the single accepted answer
    /// * `Err(VotesRepositoryError::SubjectNotFound)` - Missing question, or the answer does not belong to it
    async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError>;

    /// Sets `last_activity_at` to `max(last_activity_at, now)` on the subject,
    /// and on the parent question when the subject is an answer.
    async fn touch_activity(
        &self,
        subject: SubjectRef,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError>;

    /// Records a new comment on an answer: bumps the comment counters of the
    /// answer and its question and stamps activity on both.
    async fn increment_comment_count(
        &self,
        answer_id: AnswerId,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError>;

    /// Records a view of a question. Does not touch activity.
    async fn increment_view_count(&self, question_id: QuestionId)
    -> Result<(), VotesRepositoryError>;

    async fn get_question(
        &self,
        question_id: QuestionId,
    ) -> Result<QuestionAggregates, VotesRepositoryError>;

    async fn get_answer(&self, answer_id: AnswerId)
    -> Result<AnswerAggregates, VotesRepositoryError>;

    /// Ranks the questions that are not closed by their trending score at `now`
    /// and returns one page of the ranking.
    ///
    /// Entries are ordered by score descending, ties by question id ascending.
    ///
    /// # Arguments
    ///
    /// * `now` - Instant the age of each question's last activity is measured against
    /// * `offset` - Number of ranked questions to skip
    /// * `limit` - Maximum number of entries to return
    ///
    /// # Returns
    ///
    /// * `Ok(TrendingPage)` - The requested slice and the total number of open questions
    async fn trending_page(
        &self,
        now: DateTime<Utc>,
        offset: usize,
        limit: usize,
    ) -> Result<TrendingPage, VotesRepositoryError>;

    /// Recomputes every subject's vote counters from the ledger and rewrites the
    /// ones that drifted.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CounterRepair>)` - One entry per corrected subject (empty when consistent)
    async fn reconcile_vote_counts(&self) -> Result<Vec<CounterRepair>, VotesRepositoryError>;
}
