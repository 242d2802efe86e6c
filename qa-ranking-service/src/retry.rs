use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};

use qa_ranking_repository::VotesRepositoryError;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::warn;

use crate::config::RankingConfig;
use crate::errors::VotingError;

/// Runs `action` until it succeeds, fails with a non-transient error, or the
/// configured attempts are used up.
///
/// Exhaustion is reported as `VotingError::Transient` with the number of attempts made.
pub(crate) async fn retry_transient<T, A, Fut>(
    config: &RankingConfig,
    operation: &'static str,
    mut action: A,
) -> Result<T, VotingError>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VotesRepositoryError>>,
{
    let attempts = AtomicU32::new(0);
    let base_ms = u64::try_from(config.retry_base_delay.as_millis())
        .unwrap_or(u64::MAX)
        .max(1);
    let retries = config.max_vote_attempts.saturating_sub(1) as usize;
    let strategy = ExponentialBackoff::from_millis(base_ms)
        .factor(2)
        .max_delay(config.retry_max_delay)
        .map(jitter)
        .take(retries);

    let result = RetryIf::spawn(
        strategy,
        || {
            attempts.fetch_add(1, Ordering::Relaxed);
            action()
        },
        |err: &VotesRepositoryError| {
            let transient = err.is_transient();
            if transient {
                warn!(
                    operation,
                    attempt = attempts.load(Ordering::Relaxed),
                    error = %err,
                    "Transient storage failure"
                );
            }
            transient
        },
    )
    .await;

    result.map_err(|err| {
        if err.is_transient() {
            VotingError::Transient {
                attempts: attempts.load(Ordering::Relaxed),
            }
        } else {
            err.into()
        }
    })
}
