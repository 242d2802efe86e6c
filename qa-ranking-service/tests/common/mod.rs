#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, TimeZone, Utc};
use qa_ranking_repository::InMemoryVotesRepository;
use qa_ranking_service::{ManualClock, RankingConfig, RankingService};
use qa_ranking_shared::types::{AnswerAggregates, AnswerId, QuestionAggregates, QuestionId};
use uuid::Uuid;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
}

pub struct Harness {
    pub repository: Arc<InMemoryVotesRepository>,
    pub clock: Arc<ManualClock>,
    pub service: RankingService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(
            RankingConfig::default()
                .with_retry_delays(StdDuration::from_millis(1), StdDuration::from_millis(5)),
        )
    }

    pub fn with_config(config: RankingConfig) -> Self {
        let repository = Arc::new(InMemoryVotesRepository::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let service = RankingService::with_config(repository.clone(), config, clock.clone());
        Self {
            repository,
            clock,
            service,
        }
    }

    pub async fn question(&self) -> QuestionId {
        let id = Uuid::new_v4();
        self.repository
            .insert_question(QuestionAggregates::new(id, t0()))
            .await;
        id
    }

    pub async fn answer(&self, question_id: QuestionId) -> AnswerId {
        let id = Uuid::new_v4();
        self.repository
            .insert_answer(AnswerAggregates::new(id, question_id, t0()))
            .await
            .unwrap();
        id
    }
}
