//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Participant roster failed to encode or decode as JSON
    #[error("participant encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A stored row holds a value the code does not understand
    #[error("corrupt {entity} row {id}: {detail}")]
    Corrupt {
        entity: &'static str,
        id: String,
        detail: String,
    },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
