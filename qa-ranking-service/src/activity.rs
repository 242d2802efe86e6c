//! Activity tracking: the injectable time source and the operations that
//! stamp `last_activity_at` on questions and answers.
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use qa_ranking_repository::VotesRepository;
use qa_ranking_shared::types::{AnswerId, QuestionId, SubjectRef};
use tracing::debug;

use crate::errors::VotingError;

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stamps activity for events that happen outside the vote and acceptance paths.
///
/// Reads never count as activity: `record_view` only bumps the view counter.
pub struct ActivityClock {
    repository: Arc<dyn VotesRepository>,
    clock: Arc<dyn Clock>,
}

impl ActivityClock {
    pub fn new(repository: Arc<dyn VotesRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Sets `last_activity_at` to `max(last_activity_at, now)` on the subject.
    /// Touching an answer also touches its question.
    pub async fn touch(&self, subject: SubjectRef) -> Result<(), VotingError> {
        let now = self.clock.now();
        self.repository.touch_activity(subject, now).await?;
        debug!(%subject, %now, "Activity touched");
        Ok(())
    }

    /// A new answer was posted to `question_id`.
    pub async fn record_answer_created(&self, question_id: QuestionId) -> Result<(), VotingError> {
        self.touch(SubjectRef::Question(question_id)).await
    }

    /// A new comment was posted on `answer_id`.
    ///
    /// Increments the comment counters of the answer and its question and
    /// stamps both in one unit of work.
    pub async fn record_comment_created(&self, answer_id: AnswerId) -> Result<(), VotingError> {
        let now = self.clock.now();
        self.repository
            .increment_comment_count(answer_id, now)
            .await?;
        debug!(%answer_id, %now, "Comment recorded");
        Ok(())
    }

    pub async fn record_view(&self, question_id: QuestionId) -> Result<(), VotingError> {
        self.repository.increment_view_count(question_id).await?;
        Ok(())
    }
}
