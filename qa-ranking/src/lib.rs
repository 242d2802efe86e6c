//! QA Ranking Library
//!
//! This library provides the wiring around the ranking service: environment
//! configuration, dependency construction and the maintenance run executed by
//! the binary.

pub mod config;
pub mod errors;
pub mod maintenance;

pub use config::{Dependencies, Settings};
pub use errors::AppError;
