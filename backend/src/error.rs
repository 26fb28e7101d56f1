//! Error handling for the digitization worker

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Per-gem pipeline errors
    #[error("Vision extraction error: {0}")]
    VisionExtraction(String),

    #[error(transparent)]
    Engine(#[from] shared::EngineError),

    // Startup errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Engine table error: {0}")]
    Tables(#[from] shared::TableError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

/// Result type alias for worker services
pub type AppResult<T> = Result<T, AppError>;
