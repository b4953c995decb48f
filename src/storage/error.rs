//! Storage error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row that violates the note content invariant.
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
