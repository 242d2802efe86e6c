//! Configuration types for the RankingService.
use std::time::Duration;

/// Configuration for the RankingService.
///
/// Controls how persistently contended vote writes are retried and how the
/// trending feed is paginated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingConfig {
    /// Total attempts for one vote or acceptance, including the first. Minimum 1.
    pub max_vote_attempts: u32,
    /// Base of the exponential backoff between attempts.
    pub retry_base_delay: Duration,
    /// Upper bound of a single backoff delay.
    pub retry_max_delay: Duration,
    /// Page size used when a caller asks for a zero limit.
    pub default_page_size: usize,
    /// Largest page the trending feed returns.
    pub max_page_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_vote_attempts: 3,
            retry_base_delay: Duration::from_millis(10),
            retry_max_delay: Duration::from_millis(500),
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl RankingConfig {
    /// Returns the config with a different attempt bound.
    ///
    /// # Arguments
    ///
    /// * `max_vote_attempts` - Total attempts, clamped to at least 1
    pub fn with_max_vote_attempts(mut self, max_vote_attempts: u32) -> Self {
        self.max_vote_attempts = max_vote_attempts.max(1);
        self
    }

    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max.max(base);
        self
    }

    /// Returns the config with different page sizes.
    ///
    /// `max_page_size` is raised to `default_page_size` when smaller.
    pub fn with_page_sizes(mut self, default_page_size: usize, max_page_size: usize) -> Self {
        self.default_page_size = default_page_size.max(1);
        self.max_page_size = max_page_size.max(self.default_page_size);
        self
    }

    /// Resolves a requested page limit: zero means default, anything above the
    /// maximum is clamped.
    pub fn effective_limit(&self, requested: usize) -> usize {
        let limit = if requested == 0 {
            self.default_page_size
        } else {
            requested
        };
        limit.min(self.max_page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        let config = RankingConfig::default();
        assert_eq!(config.effective_limit(0), 20);
        assert_eq!(config.effective_limit(7), 7);
        assert_eq!(config.effective_limit(5000), 100);
    }

    #[test]
    fn test_builders_keep_bounds_consistent() {
        let config = RankingConfig::default()
            .with_max_vote_attempts(0)
            .with_page_sizes(50, 10);
        assert_eq!(config.max_vote_attempts, 1);
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.max_page_size, 50);
    }
}
