//! Error types for the persistence layer.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by the SQLite store and its connection pool.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database directory could not be created.
    #[error("failed to create database directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The database file could not be opened.
    #[error("failed to open database '{path}': {source}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// A connection pragma could not be applied.
    #[error("failed to configure database connection: {message}")]
    Configure {
        /// Description of the rejected setting.
        message: String,
    },
    /// Creating tables failed.
    #[error("failed to apply database schema: {source}")]
    Schema {
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement failed.
    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),
    /// A pooled connection was poisoned by a panicking thread.
    #[error("database connection pool is poisoned")]
    Poisoned,
    /// A value read from or written to the database is out of range.
    #[error("invalid value for {column}: {value}")]
    InvalidValue {
        /// Column holding the value.
        column: &'static str,
        /// Offending value rendered as text.
        value: String,
    },
}

impl StoreError {
    pub(crate) fn invalid_value(column: &'static str, value: impl ToString) -> Self {
        Self::InvalidValue {
            column,
            value: value.to_string(),
        }
    }
}
