//! Unified error types for hoardcache.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the media cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a field the schema revision cannot store).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No cache entry matched the lookup.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Insert collided with a uniqueness index of the current schema revision.
    #[error("CONSTRAINT_VIOLATION: {0}")]
    ConstraintViolation(String),

    /// More than one row matched a lookup that expects at most one.
    #[error("AMBIGUOUS_ENTRY: {matches} rows for post {post_id} (is_photo={is_photo})")]
    AmbiguousEntry { post_id: i64, is_photo: bool, matches: usize },

    /// A stored row could not be decoded.
    #[error("CACHE_ERROR: corrupt row: {0}")]
    CorruptRow(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Metrics could not be encoded.
    #[error("METRICS_ERROR: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Whether the error means the entry is already cached.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e.into(),
            other => Error::Database(other),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, msg) if failure.code == rusqlite::ErrorCode::ConstraintViolation => {
                Error::ConstraintViolation(msg.unwrap_or_else(|| failure.to_string()))
            }
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                Error::CorruptRow(format!("column {column}: {source}"))
            }
            other => Error::Database(tokio_rusqlite::Error::Error(other)),
        }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::NotFound(_) => -32001,
            Error::ConstraintViolation(_) => -32003,
            Error::AmbiguousEntry { .. } => -32004,
            Error::CorruptRow(_) | Error::Database(_) | Error::MigrationFailed(_) | Error::Metrics(_) => -32002,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
