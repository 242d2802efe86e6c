//! # QA Ranking Service
//! Vote aggregation, answer acceptance, activity tracking and trending ranking
//! on top of a [`VotesRepository`](qa_ranking_repository::VotesRepository).
//!
//! Applications use [`RankingService`]; the components it wires together are
//! public for callers that need only one of them.
pub mod acceptance;
pub mod activity;
pub mod config;
pub mod counter;
pub mod errors;
mod retry;
pub mod service;
pub mod trending;

pub use acceptance::AcceptanceManager;
pub use activity::{ActivityClock, Clock, ManualClock, SystemClock};
pub use config::RankingConfig;
pub use counter::{CounterMaintainer, plan_transition};
pub use errors::VotingError;
pub use service::RankingService;
pub use trending::{TrendingFeed, rank_signals, trending_score};
