//! QA Ranking Main Entry Point
//!
//! Connects to PostgreSQL, applies migrations, repairs vote counter drift and
//! logs the current trending snapshot.

use dotenv::dotenv;
use qa_ranking::{AppError, Dependencies, maintenance};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("qa_ranking=info,qa_ranking_service=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "qa-ranking",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "qa-ranking",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    init_tracing();

    info!("Starting QA ranking maintenance");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    deps.repository.migrate().await?;
    info!("Migrations applied");

    match maintenance::run(&deps.service, deps.settings.reconcile_on_start).await {
        Ok(report) => {
            info!(
                repaired = report.repairs.len(),
                "QA ranking maintenance completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "QA ranking maintenance failed");
            Err(e)
        }
    }
}
