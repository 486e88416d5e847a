//! Error types for cache operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the tree cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// The cache directory could not be created.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored tree could not be encoded or decoded.
    #[error("cached tree is not valid JSON: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// A stored timestamp is outside the representable range.
    #[error("invalid cache timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Convenience alias for results with [`CacheError`].
pub type Result<T> = std::result::Result<T, CacheError>;
