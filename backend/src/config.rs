//! Configuration management for the digitization worker
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with GEMDIG_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Vision extraction service configuration
    pub vision: VisionConfig,

    /// Scoring engine table locations
    pub engine: EngineConfig,

    /// Batch worker configuration
    pub worker: WorkerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VisionConfig {
    /// Vision extraction API endpoint
    pub endpoint: String,

    /// Vision extraction API key
    pub api_key: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Retry attempts per certificate before giving up
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Path to the shape-requirements JSON document
    pub shape_requirements_path: String,

    /// Path to the characteristic-tables JSON document
    pub characteristics_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Gems fetched per batch
    pub batch_size: i64,

    /// File storing the last processed inventory row id
    pub cursor_path: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("GEMDIG_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("vision.model", "gpt-4o")?
            .set_default("vision.max_retries", 4)?
            .set_default(
                "engine.shape_requirements_path",
                "config/shape_requirements.json",
            )?
            .set_default("engine.characteristics_path", "config/characteristics.json")?
            .set_default("worker.batch_size", 50)?
            .set_default("worker.cursor_path", "last_processed_id.txt")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (GEMDIG_ prefix)
            .add_source(
                Environment::with_prefix("GEMDIG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
