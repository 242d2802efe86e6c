//! The paginated trending feed.
use std::sync::Arc;

use qa_ranking_repository::VotesRepository;
use qa_ranking_shared::types::TrendingPage;
use tracing::debug;

use crate::activity::Clock;
use crate::config::RankingConfig;
use crate::errors::VotingError;

/// Ranks open questions at read time.
///
/// Scores are never stored: each page is computed by the repository from the
/// current counters and activity timestamps with the clock's `now`.
pub struct TrendingFeed {
    repository: Arc<dyn VotesRepository>,
    clock: Arc<dyn Clock>,
    config: RankingConfig,
}

impl TrendingFeed {
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

    /// Computes one page of the trending feed.
    ///
    /// # Arguments
    ///
    /// * `offset` - Number of ranked questions to skip
    /// * `limit` - Page size; zero uses the default, larger than the maximum is clamped
    ///
    /// # Returns
    ///
    /// The requested slice of the ranking and the total number of open questions.
    pub async fn compute_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<TrendingPage, VotingError> {
        let limit = self.config.effective_limit(limit);
        let page = self
            .repository
            .trending_page(self.clock.now(), offset, limit)
            .await?;

        debug!(
            offset,
            limit,
            returned = page.entries.len(),
            total_count = page.total_count,
            "Trending page computed"
        );
        Ok(page)
    }
}
