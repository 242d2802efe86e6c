//! Error types for the votes repository.
//! Defines specific errors that can occur during ledger and aggregate operations.
use qa_ranking_shared::types::{SubjectRef, VoteRejection, VotesDelta};
use thiserror::Error;

/// SQLSTATE codes that signal contention rather than a broken request:
/// serialization failure, deadlock, lock not available, and a unique
/// violation from two first votes racing on the same pair.
const TRANSIENT_SQLSTATES: [&str; 4] = ["40001", "40P01", "55P03", "23505"];

/// Represents errors that can occur within the votes repository.
#[derive(Debug, Error)]
pub enum VotesRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Subject not found: {0}")]
    SubjectNotFound(SubjectRef),

    #[error("Vote rejected: {0}")]
    Rejected(VoteRejection),

    #[error("Counter underflow on {subject}: delta {delta:?} would go below zero")]
    CounterUnderflow { subject: SubjectRef, delta: VotesDelta },

    #[error("Write conflict: {0}")]
    Conflict(String),
}

impl VotesRepositoryError {
    /// Returns true when retrying the same unit of work may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Conflict(_) => true,
            Self::DatabaseError(sqlx::Error::PoolTimedOut) => true,
            Self::DatabaseError(sqlx::Error::Database(db)) => db
                .code()
                .as_deref()
                .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code)),
            _ => false,
        }
    }
}

impl From<VoteRejection> for VotesRepositoryError {
    fn from(rejection: VoteRejection) -> Self {
        Self::Rejected(rejection)
    }
}
