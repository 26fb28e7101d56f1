//! Gem Certificate Digitization Platform - Worker
//!
//! Batch worker that fetches pending gems, extracts certificate attributes
//! through the vision service, scores them with the shared grading engine,
//! and persists the digitization and score rows.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod services;

pub use config::Config;

use external::CertificateVisionClient;
use services::inventory::InventoryService;
use services::persistence::PersistenceService;
use services::scoring::ScoringService;
use shared::EngineTables;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemdig_worker=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Gem Digitization Worker");
    tracing::info!("Environment: {}", config.environment);

    // Load the engine tables; any schema problem aborts startup
    let requirements_json = std::fs::read_to_string(&config.engine.shape_requirements_path)?;
    let characteristics_json = std::fs::read_to_string(&config.engine.characteristics_path)?;
    let tables = Arc::new(EngineTables::from_json(
        &requirements_json,
        &characteristics_json,
    )?);
    tracing::info!("Engine tables loaded");

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    let vision = CertificateVisionClient::new(
        config.vision.endpoint.clone(),
        config.vision.api_key.clone(),
        config.vision.model.clone(),
        config.vision.max_retries,
    );
    let inventory = InventoryService::new(db_pool.clone(), &config.worker.cursor_path);
    let persistence = PersistenceService::new(db_pool);
    let scoring = ScoringService::new(tables, vision, inventory, persistence);

    // Walk the inventory until no pending gems remain
    loop {
        let summary = scoring.process_batch(config.worker.batch_size).await?;
        if summary.fetched == 0 {
            break;
        }
    }

    tracing::info!("Digitization run complete");
    Ok(())
}
