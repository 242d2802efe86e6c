use std::sync::Arc;

use qa_ranking_repository::{PostgresVotesRepository, VotesRepository};
use qa_ranking_service::{RankingService, SystemClock};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::Settings;
use crate::errors::AppError;

/// `Dependencies` holds the components the binary runs against.
pub struct Dependencies {
    pub settings: Settings,
    pub repository: Arc<PostgresVotesRepository>,
    pub service: RankingService,
}

impl Dependencies {
    /// Reads the environment and wires up the dependencies.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Connected and ready
    /// * `Err(AppError)` - If configuration is missing or the database is unreachable
    pub async fn new() -> Result<Self, AppError> {
        Self::from_settings(Settings::from_env()?).await
    }

    /// Connects the pool described by `settings` and builds the service on it.
    pub async fn from_settings(settings: Settings) -> Result<Self, AppError> {
        info!(
            max_connections = settings.database_max_connections,
            max_vote_attempts = settings.ranking.max_vote_attempts,
            reconcile_on_start = settings.reconcile_on_start,
            "Initializing dependencies"
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .connect(&settings.database_url)
            .await?;

        let repository = Arc::new(PostgresVotesRepository::new(pool).await?);
        let service = RankingService::with_config(
            repository.clone() as Arc<dyn VotesRepository>,
            settings.ranking.clone(),
            Arc::new(SystemClock),
        );

        Ok(Self {
            settings,
            repository,
            service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_ranking_service::RankingConfig;

    #[tokio::test]
    async fn test_invalid_database_url() {
        let settings = Settings {
            database_url: "invalid-database-url".to_string(),
            database_max_connections: 1,
            reconcile_on_start: false,
            ranking: RankingConfig::default(),
        };

        let result = Dependencies::from_settings(settings).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
