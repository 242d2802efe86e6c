//! Error types for the QA Ranking application.
//! Consolidates errors from configuration, the database, the repository and the service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] qa_ranking_repository::VotesRepositoryError),
    #[error("Service error: {0}")]
    Service(#[from] qa_ranking_service::VotingError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
