//! In-memory implementation of the votes repository.
//!
//! All state sits behind one async mutex, so every trait method is a single
//! critical section and therefore atomic. Used by the service tests and by
//! callers that embed the ranking logic without a database.
//!
//! The `test-util` feature exposes hooks for forcing drift and transient
//! conflicts.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qa_ranking_shared::types::{
    AnswerAggregates, AnswerId, CounterRepair, LedgerOp, QuestionAggregates, QuestionId,
    SubjectRef, TrendingPage, UserId, Vote, VoteOutcome, VotesCount,
};
use qa_ranking_shared::ranking::rank_signals;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{TransitionPlanner, VotesRepository, VotesRepositoryError};

#[derive(Default)]
struct MemoryState {
    questions: HashMap<QuestionId, QuestionAggregates>,
    answers: HashMap<AnswerId, AnswerAggregates>,
    votes: HashMap<(SubjectRef, UserId), Vote>,
}

impl MemoryState {
    fn votes_count(&self, subject: SubjectRef) -> Option<VotesCount> {
        let (upvotes, downvotes) = match subject {
            SubjectRef::Question(id) => self
                .questions
                .get(&id)
                .map(|q| (q.upvote_count, q.downvote_count))?,
            SubjectRef::Answer(id) => self
                .answers
                .get(&id)
                .map(|a| (a.upvote_count, a.downvote_count))?,
        };
        Some(VotesCount {
            subject,
            upvotes,
            downvotes,
        })
    }

    fn ledger_count(&self, subject: SubjectRef) -> VotesCount {
        let (upvotes, downvotes) = self
            .votes
            .values()
            .filter(|vote| vote.subject == subject)
            .fold((0, 0), |(up, down), vote| {
                if vote.is_upvote {
                    (up + 1, down)
                } else {
                    (up, down + 1)
                }
            });
        VotesCount {
            subject,
            upvotes,
            downvotes,
        }
    }

    fn set_votes_count(&mut self, count: VotesCount) {
        match count.subject {
            SubjectRef::Question(id) => {
                if let Some(q) = self.questions.get_mut(&id) {
                    q.upvote_count = count.upvotes;
                    q.downvote_count = count.downvotes;
                }
            }
            SubjectRef::Answer(id) => {
                if let Some(a) = self.answers.get_mut(&id) {
                    a.upvote_count = count.upvotes;
                    a.downvote_count = count.downvotes;
                }
            }
        }
    }

    /// Stamps activity on the subject and, for answers, on the parent question.
    fn touch(&mut self, subject: SubjectRef, now: DateTime<Utc>) -> Result<(), VotesRepositoryError> {
        let question_id = match subject {
            SubjectRef::Question(id) => id,
            SubjectRef::Answer(id) => {
                let answer = self
                    .answers
                    .get_mut(&id)
                    .ok_or(VotesRepositoryError::SubjectNotFound(subject))?;
                answer.last_activity_at = answer.last_activity_at.max(now);
                answer.question_id
            }
        };
        let question = self
            .questions
            .get_mut(&question_id)
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )))?;
        question.last_activity_at = question.last_activity_at.max(now);
        Ok(())
    }
}

/// Votes repository that keeps everything in process memory.
#[derive(Default)]
pub struct InMemoryVotesRepository {
    state: Mutex<MemoryState>,
    injected_conflicts: AtomicU32,
    commit_vote_calls: AtomicU32,
}

impl InMemoryVotesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a question.
    pub async fn insert_question(&self, question: QuestionAggregates) {
        self.state
            .lock()
            .await
            .questions
            .insert(question.id, question);
    }

    /// Inserts an answer and bumps its question's `answer_count`.
    pub async fn insert_answer(&self, answer: AnswerAggregates) -> Result<(), VotesRepositoryError> {
        let mut state = self.state.lock().await;
        let question = state.questions.get_mut(&answer.question_id).ok_or(
            VotesRepositoryError::SubjectNotFound(SubjectRef::Question(answer.question_id)),
        )?;
        question.answer_count += 1;
        state.answers.insert(answer.id, answer);
        Ok(())
    }

    pub async fn close_question(&self, question_id: QuestionId) -> Result<(), VotesRepositoryError> {
        let mut state = self.state.lock().await;
        let question = state.questions.get_mut(&question_id).ok_or(
            VotesRepositoryError::SubjectNotFound(SubjectRef::Question(question_id)),
        )?;
        question.is_closed = true;
        Ok(())
    }

    /// Overwrites stored counters without touching the ledger.
    ///
    /// Lets tests reproduce counters that drifted from the ledger.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn overwrite_vote_counts(&self, count: VotesCount) {
        self.state.lock().await.set_votes_count(count);
    }

    /// Makes the next `count` calls to `commit_vote` or `reconcile_vote_counts`
    /// fail with a transient conflict before any state is read or written.
    #[cfg(any(test, feature = "test-util"))]
    pub fn inject_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Number of times `commit_vote` has been called, failed calls included.
    #[cfg(any(test, feature = "test-util"))]
    pub fn commit_vote_calls(&self) -> u32 {
        self.commit_vote_calls.load(Ordering::SeqCst)
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl VotesRepository for InMemoryVotesRepository {
    async fn get_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
    ) -> Result<Option<Vote>, VotesRepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .votes
            .get(&(subject, voter_id))
            .cloned())
    }

    async fn get_votes_count(
        &self,
        subject: SubjectRef,
    ) -> Result<VotesCount, VotesRepositoryError> {
        self.state
            .lock()
            .await
            .votes_count(subject)
            .ok_or(VotesRepositoryError::SubjectNotFound(subject))
    }

    async fn commit_vote(
        &self,
        subject: SubjectRef,
        voter_id: UserId,
        planner: TransitionPlanner<'_>,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, VotesRepositoryError> {
        self.commit_vote_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_injected_conflict() {
            debug!(%subject, %voter_id, "Injected conflict");
            return Err(VotesRepositoryError::Conflict(format!(
                "injected conflict on {subject}"
            )));
        }

        let mut state = self.state.lock().await;
        let stored = state
            .votes_count(subject)
            .ok_or(VotesRepositoryError::SubjectNotFound(subject))?;
        let key = (subject, voter_id);
        let current = state.votes.get(&key);

        let transition = planner(current)?;

        let ledger_matches = match transition.ledger_op {
            LedgerOp::Insert { .. } => current.is_none(),
            LedgerOp::Flip { .. } | LedgerOp::Delete => current.is_some(),
        };
        if !ledger_matches {
            return Err(VotesRepositoryError::Conflict(format!(
                "ledger row for {subject} and voter {voter_id} does not match {:?}",
                transition.ledger_op
            )));
        }

        let next = VotesCount {
            subject,
            upvotes: stored.upvotes + i64::from(transition.delta.upvotes),
            downvotes: stored.downvotes + i64::from(transition.delta.downvotes),
        };
        if next.upvotes < 0 || next.downvotes < 0 {
            return Err(VotesRepositoryError::CounterUnderflow {
                subject,
                delta: transition.delta,
            });
        }

        match transition.ledger_op {
            LedgerOp::Insert { is_upvote } | LedgerOp::Flip { is_upvote } => {
                state.votes.insert(
                    key,
                    Vote {
                        subject,
                        voter_id,
                        is_upvote,
                        created_at: now,
                    },
                );
            }
            LedgerOp::Delete => {
                state.votes.remove(&key);
            }
        }
        state.set_votes_count(next);
        state.touch(subject, now)?;

        Ok(VoteOutcome {
            state: transition.next_state,
            upvote_count: next.upvotes,
            downvote_count: next.downvotes,
        })
    }

    async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError> {
        let mut state = self.state.lock().await;
        if !state.questions.contains_key(&question_id) {
            return Err(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )));
        }
        match state.answers.get(&answer_id) {
            Some(answer) if answer.question_id == question_id => {}
            _ => {
                return Err(VotesRepositoryError::SubjectNotFound(SubjectRef::Answer(
                    answer_id,
                )));
            }
        }

        for answer in state.answers.values_mut() {
            if answer.question_id == question_id {
                answer.is_accepted = answer.id == answer_id;
            }
        }
        if let Some(question) = state.questions.get_mut(&question_id) {
            question.has_accepted_answer = true;
        }
        state.touch(SubjectRef::Answer(answer_id), now)
    }

    async fn touch_activity(
        &self,
        subject: SubjectRef,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError> {
        self.state.lock().await.touch(subject, now)
    }

    async fn increment_comment_count(
        &self,
        answer_id: AnswerId,
        now: DateTime<Utc>,
    ) -> Result<(), VotesRepositoryError> {
        let mut state = self.state.lock().await;
        let subject = SubjectRef::Answer(answer_id);
        let question_id = state
            .answers
            .get(&answer_id)
            .map(|a| a.question_id)
            .ok_or(VotesRepositoryError::SubjectNotFound(subject))?;
        if !state.questions.contains_key(&question_id) {
            return Err(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )));
        }

        if let Some(answer) = state.answers.get_mut(&answer_id) {
            answer.comment_count += 1;
        }
        if let Some(question) = state.questions.get_mut(&question_id) {
            question.comment_count += 1;
        }
        state.touch(subject, now)
    }

    async fn increment_view_count(
        &self,
        question_id: QuestionId,
    ) -> Result<(), VotesRepositoryError> {
        let mut state = self.state.lock().await;
        let question = state.questions.get_mut(&question_id).ok_or(
            VotesRepositoryError::SubjectNotFound(SubjectRef::Question(question_id)),
        )?;
        question.view_count += 1;
        Ok(())
    }

    async fn get_question(
        &self,
        question_id: QuestionId,
    ) -> Result<QuestionAggregates, VotesRepositoryError> {
        self.state
            .lock()
            .await
            .questions
            .get(&question_id)
            .cloned()
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Question(
                question_id,
            )))
    }

    async fn get_answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<AnswerAggregates, VotesRepositoryError> {
        self.state
            .lock()
            .await
            .answers
            .get(&answer_id)
            .cloned()
            .ok_or(VotesRepositoryError::SubjectNotFound(SubjectRef::Answer(
                answer_id,
            )))
    }

    async fn trending_page(
        &self,
        now: DateTime<Utc>,
        offset: usize,
        limit: usize,
    ) -> Result<TrendingPage, VotesRepositoryError> {
        let candidates: Vec<_> = self
            .state
            .lock()
            .await
            .questions
            .values()
            .filter(|q| !q.is_closed)
            .map(QuestionAggregates::trending_signals)
            .collect();

        let ranked = rank_signals(&candidates, now);
        let total_count = ranked.len();
        Ok(TrendingPage {
            entries: ranked.into_iter().skip(offset).take(limit).collect(),
            offset,
            limit,
            total_count,
        })
    }

    async fn reconcile_vote_counts(&self) -> Result<Vec<CounterRepair>, VotesRepositoryError> {
        if self.take_injected_conflict() {
            debug!("Injected conflict");
            return Err(VotesRepositoryError::Conflict(
                "injected conflict on reconciliation".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        let subjects: Vec<SubjectRef> = state
            .questions
            .keys()
            .map(|id| SubjectRef::Question(*id))
            .chain(state.answers.keys().map(|id| SubjectRef::Answer(*id)))
            .collect();

        let mut repairs = Vec::new();
        for subject in subjects {
            let Some(stored) = state.votes_count(subject) else {
                continue;
            };
            let ledger = state.ledger_count(subject);
            if stored != ledger {
                state.set_votes_count(ledger);
                repairs.push(CounterRepair {
                    subject,
                    stored,
                    ledger,
                });
            }
        }
        repairs.sort_by_key(|repair| repair.subject);
        Ok(repairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use qa_ranking_shared::types::{VoteRejection, VoteState, VoteTransition, VotesDelta};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn insert_upvote(current: Option<&Vote>) -> Result<VoteTransition, VoteRejection> {
        match current {
            None => Ok(VoteTransition {
                ledger_op: LedgerOp::Insert { is_upvote: true },
                delta: VotesDelta::new(1, 0),
                next_state: VoteState::Upvoted,
            }),
            Some(_) => Err(VoteRejection::DuplicateVote),
        }
    }

    fn delete_upvote(current: Option<&Vote>) -> Result<VoteTransition, VoteRejection> {
        match current {
            Some(_) => Ok(VoteTransition {
                ledger_op: LedgerOp::Delete,
                delta: VotesDelta::new(-1, 0),
                next_state: VoteState::NoVote,
            }),
            None => Err(VoteRejection::NoExistingVote),
        }
    }

    async fn seeded() -> (InMemoryVotesRepository, QuestionId, AnswerId) {
        let repo = InMemoryVotesRepository::new();
        let question_id = Uuid::new_v4();
        let answer_id = Uuid::new_v4();
        repo.insert_question(QuestionAggregates::new(question_id, t0()))
            .await;
        repo.insert_answer(AnswerAggregates::new(answer_id, question_id, t0()))
            .await
            .unwrap();
        (repo, question_id, answer_id)
    }

    #[tokio::test]
    async fn test_commit_vote_updates_ledger_counters_and_activity() {
        let (repo, question_id, answer_id) = seeded().await;
        let voter = Uuid::new_v4();
        let later = t0() + Duration::hours(2);
        let subject = SubjectRef::Answer(answer_id);

        let outcome = repo
            .commit_vote(subject, voter, &insert_upvote, later)
            .await
            .unwrap();

        assert_eq!(outcome.state, VoteState::Upvoted);
        assert_eq!(outcome.upvote_count, 1);
        assert!(repo.get_vote(subject, voter).await.unwrap().is_some());
        assert_eq!(repo.get_answer(answer_id).await.unwrap().last_activity_at, later);
        assert_eq!(repo.get_question(question_id).await.unwrap().last_activity_at, later);
    }

    #[tokio::test]
    async fn test_rejected_plan_leaves_state_untouched() {
        let (repo, question_id, _) = seeded().await;
        let subject = SubjectRef::Question(question_id);

        let err = repo
            .commit_vote(subject, Uuid::new_v4(), &delete_upvote, t0() + Duration::hours(1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VotesRepositoryError::Rejected(VoteRejection::NoExistingVote)
        ));
        let question = repo.get_question(question_id).await.unwrap();
        assert_eq!(question.last_activity_at, t0());
        assert_eq!(question.upvote_count, 0);
    }

    #[tokio::test]
    async fn test_underflow_is_refused_before_mutation() {
        let (repo, question_id, _) = seeded().await;
        let subject = SubjectRef::Question(question_id);
        let voter = Uuid::new_v4();
        repo.commit_vote(subject, voter, &insert_upvote, t0())
            .await
            .unwrap();
        repo.overwrite_vote_counts(VotesCount {
            subject,
            upvotes: 0,
            downvotes: 0,
        })
        .await;

        let err = repo
            .commit_vote(subject, voter, &delete_upvote, t0())
            .await
            .unwrap_err();

        assert!(matches!(err, VotesRepositoryError::CounterUnderflow { .. }));
        assert!(repo.get_vote(subject, voter).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_injected_conflicts_are_consumed() {
        let (repo, question_id, _) = seeded().await;
        let subject = SubjectRef::Question(question_id);
        repo.inject_conflicts(1);

        let first = repo
            .commit_vote(subject, Uuid::new_v4(), &insert_upvote, t0())
            .await;
        let second = repo
            .commit_vote(subject, Uuid::new_v4(), &insert_upvote, t0())
            .await;

        assert!(first.unwrap_err().is_transient());
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_touch_never_moves_activity_backwards() {
        let (repo, question_id, _) = seeded().await;
        let subject = SubjectRef::Question(question_id);
        let later = t0() + Duration::hours(5);

        repo.touch_activity(subject, later).await.unwrap();
        repo.touch_activity(subject, t0() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(repo.get_question(question_id).await.unwrap().last_activity_at, later);
    }

    #[tokio::test]
    async fn test_accept_answer_rejects_foreign_answer() {
        let (repo, _, answer_id) = seeded().await;
        let other_question = Uuid::new_v4();
        repo.insert_question(QuestionAggregates::new(other_question, t0()))
            .await;

        let err = repo
            .accept_answer(other_question, answer_id, t0())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VotesRepositoryError::SubjectNotFound(SubjectRef::Answer(id)) if id == answer_id
        ));
    }

    #[tokio::test]
    async fn test_reconcile_rewrites_drifted_counters() {
        let (repo, question_id, _) = seeded().await;
        let subject = SubjectRef::Question(question_id);
        repo.commit_vote(subject, Uuid::new_v4(), &insert_upvote, t0())
            .await
            .unwrap();
        repo.overwrite_vote_counts(VotesCount {
            subject,
            upvotes: 7,
            downvotes: 2,
        })
        .await;

        let repairs = repo.reconcile_vote_counts().await.unwrap();

        assert_eq!(repairs.len(), 1);
        assert_eq!(repairs[0].stored.upvotes, 7);
        assert_eq!(repairs[0].ledger.upvotes, 1);
        let count = repo.get_votes_count(subject).await.unwrap();
        assert_eq!((count.upvotes, count.downvotes), (1, 0));
        assert!(repo.reconcile_vote_counts().await.unwrap().is_empty());
    }
}
