//! Error types for the qa-ranking repository.
//! Consolidates and re-exports error types related to vote ledger operations.
mod votes;

pub use votes::VotesRepositoryError;
