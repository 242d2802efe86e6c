//! PostgreSQL implementation of the votes repository.
mod votes_repository;

pub use votes_repository::PostgresVotesRepository;
