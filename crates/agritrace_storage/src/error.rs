//! Error types for ledger operations.

use crate::backend::Version;
use std::io;
use thiserror::Error;

/// Result type for ledger operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store could not serve the request.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// A key read by the committing invocation changed after it was read.
    #[error("commit conflict on key {key:?}: read at {observed:?}, now at {current:?}")]
    Conflict {
        /// The key whose version moved.
        key: String,
        /// Version observed by the reader (`None` = absent).
        observed: Option<Version>,
        /// Version currently committed (`None` = absent).
        current: Option<Version>,
    },

    /// The commit log is corrupted.
    #[error("ledger corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the ledger file.
    #[error("ledger locked: another process has exclusive access")]
    Locked,
}

impl StorageError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Returns true if this error is an optimistic-concurrency rejection.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
