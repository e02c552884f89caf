use thiserror::Error;

/// Storage-specific error types for the gatekey audit trail.
///
/// These errors never cross into the operation orchestrator's result: the
/// orchestrator catches them, reports them, and returns its own outcome
/// unchanged. They do surface to hosts that query the audit log directly.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
