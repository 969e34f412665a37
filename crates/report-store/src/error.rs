//! Error types for the storage layer.
//!
//! These surface from the individual tiers. The tiered [`crate::ReportStore`]
//! logs them and falls through to the next tier instead of returning them.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Local snapshot I/O error.
    #[error("local store error: {0}")]
    LocalIo(#[from] std::io::Error),

    /// A blocking local snapshot task panicked or was cancelled.
    #[error("local store task failed: {0}")]
    LocalTask(#[from] tokio::task::JoinError),

    /// The primary store cannot be reached.
    #[error("primary store unavailable: {0}")]
    Unavailable(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
