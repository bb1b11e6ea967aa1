//! Error types for SQL execution and index management.
//!
//! Provides a unified error type covering the SQLite connection, statements
//! rejected by the engine, and invalid definitions or search requests.

use fts_schema_core::{ConfigError, SearchError};
use thiserror::Error;

/// Errors that can occur while executing generated SQL.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Connection or transaction failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// A statement was rejected by SQLite.
    #[error("SQL error: {message} (in `{sql}`)")]
    SqlError {
        /// Engine error message.
        message: String,
        /// Statement that failed.
        sql: String,
    },

    /// Table definition failed validation.
    #[error("invalid definition: {0}")]
    ConfigError(#[from] ConfigError),

    /// Search request was rejected.
    #[error(transparent)]
    SearchError(#[from] SearchError),

    /// No table with the given name exists.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Table exists but is not an FTS5 virtual table.
    #[error("table '{0}' is not an FTS5 index")]
    NotAnFtsTable(String),

    /// A result row did not have the expected shape.
    #[error("conversion error: {0}")]
    ConversionError(String),
}

impl SqliteError {
    pub(crate) fn sql(err: rusqlite::Error, sql: &str) -> Self {
        SqliteError::SqlError {
            message: err.to_string(),
            sql: sql.to_string(),
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
