//! Trending ranking: the scoring function and the paginated feed built on it.
mod feed;

pub use feed::TrendingFeed;
pub use qa_ranking_shared::ranking::{display_score, rank_signals, trending_score};
