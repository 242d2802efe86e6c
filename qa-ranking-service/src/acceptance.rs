//! Keeps at most one accepted answer per question.
use std::sync::Arc;

use qa_ranking_repository::VotesRepository;
use qa_ranking_shared::types::{AnswerId, QuestionId};
use tracing::info;

use crate::activity::Clock;
use crate::config::RankingConfig;
use crate::errors::VotingError;
use crate::retry::retry_transient;

pub struct AcceptanceManager {
    repository: Arc<dyn VotesRepository>,
    clock: Arc<dyn Clock>,
    config: RankingConfig,
}

impl AcceptanceManager {
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

    /// Makes `answer_id` the accepted answer of `question_id`.
    ///
    /// Any previously accepted answer of the question is un-accepted in the same
    /// unit of work. Concurrent acceptances on one question serialize; the last
    /// to commit wins. Accepting the already accepted answer succeeds and only
    /// refreshes activity.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The answer is the single accepted answer
    /// * `Err(VotingError::SubjectNotFound)` - The question is missing or the answer is not one of its answers
    pub async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), VotingError> {
        retry_transient(&self.config, "accept_answer", || {
            self.repository
                .accept_answer(question_id, answer_id, self.clock.now())
        })
        .await?;

        info!(%question_id, %answer_id, "Answer accepted");
        Ok(())
    }
}
