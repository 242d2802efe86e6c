//! Configuration module for QA Ranking.
//! Reads settings from the environment and wires up the service's dependencies.
mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::Settings;
