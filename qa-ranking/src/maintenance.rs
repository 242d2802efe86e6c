//! The maintenance run performed by the binary at startup, once migrations are
//! applied: repair counter drift, then log a trending snapshot.
use qa_ranking_service::RankingService;
use qa_ranking_shared::types::{CounterRepair, TrendingPage};
use tracing::info;

use crate::errors::AppError;

/// What a maintenance run did.
#[derive(Debug)]
pub struct MaintenanceReport {
    pub repairs: Vec<CounterRepair>,
    pub snapshot: TrendingPage,
}

/// Runs the startup maintenance against `service`.
///
/// # Arguments
///
/// * `service` - The ranking service to maintain
/// * `reconcile` - Whether to rewrite counters that drifted from the ledger
pub async fn run(service: &RankingService, reconcile: bool) -> Result<MaintenanceReport, AppError> {
    let repairs = if reconcile {
        service.reconcile_vote_counts().await?
    } else {
        Vec::new()
    };

    let snapshot = service.compute_trending_page(0, 0).await?;
    for (rank, entry) in snapshot.entries.iter().enumerate() {
        info!(
            rank = rank + 1,
            question_id = %entry.question_id,
            score = entry.display_score,
            "Trending"
        );
    }
    info!(
        shown = snapshot.entries.len(),
        open_questions = snapshot.total_count,
        "Trending snapshot"
    );

    Ok(MaintenanceReport { repairs, snapshot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use qa_ranking_repository::{InMemoryVotesRepository, VotesRepository};
    use qa_ranking_shared::types::{QuestionAggregates, SubjectRef, VoteIntent, VotesCount};
    use std::sync::Arc;
    use uuid::Uuid;

    async fn seeded_service() -> (Arc<InMemoryVotesRepository>, RankingService, Uuid) {
        let repository = Arc::new(InMemoryVotesRepository::new());
        let question_id = Uuid::new_v4();
        repository
            .insert_question(QuestionAggregates::new(question_id, Utc::now()))
            .await;
        let service = RankingService::new(repository.clone());
        (repository, service, question_id)
    }

    #[tokio::test]
    async fn test_run_repairs_drift_and_snapshots() {
        let (repository, service, question_id) = seeded_service().await;
        let subject = SubjectRef::Question(question_id);
        service
            .apply_vote(subject, Uuid::new_v4(), VoteIntent::Upvote)
            .await
            .unwrap();
        repository
            .overwrite_vote_counts(VotesCount {
                subject,
                upvotes: 9,
                downvotes: 0,
            })
            .await;

        let report = run(&service, true).await.unwrap();

        assert_eq!(report.repairs.len(), 1);
        assert_eq!(report.snapshot.total_count, 1);
        assert_eq!(report.snapshot.entries[0].question_id, question_id);
    }

    #[tokio::test]
    async fn test_run_without_reconcile_leaves_counters() {
        let (repository, service, question_id) = seeded_service().await;
        let subject = SubjectRef::Question(question_id);
        repository
            .overwrite_vote_counts(VotesCount {
                subject,
                upvotes: 2,
                downvotes: 0,
            })
            .await;

        let report = run(&service, false).await.unwrap();

        assert!(report.repairs.is_empty());
        let count = service.repository().get_votes_count(subject).await.unwrap();
        assert_eq!(count.upvotes, 2);
    }
}
