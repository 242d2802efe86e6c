//! # QA Ranking Shared
//! This crate defines shared data structures and types used across the qa-ranking workspace.
//! It includes common definitions for subjects, ledger votes, vote transitions, aggregate
//! counters and trending signals, plus the trending score every storage backend ranks by.
pub mod ranking;
pub mod types;
