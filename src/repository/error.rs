// ==========================================
// mHealth Barangay San Cristobal - Repository Error Types
// ==========================================
// Tooling: thiserror derive macros
// ==========================================

use thiserror::Error;

/// Record-store error taxonomy.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("record not found: {table} id={id}")]
    NotFound { table: String, id: i64 },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("database connection failed: {0}")]
    ConnectionError(String),

    #[error("database query failed: {0}")]
    QueryError(String),

    #[error("unique constraint violation: {0}")]
    UniqueConstraintViolation(String),

    #[error("database lock failed: {0}")]
    LockError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            _ => RepositoryError::QueryError(err.to_string()),
        }
    }
}

/// Result alias for the repository layer.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
