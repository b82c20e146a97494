//! Error types for cache operations.

use std::path::PathBuf;

use candlekeep_types::ValidationError;
use thiserror::Error;

use crate::FetchError;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced by the cache.
///
/// Corrupt or expired persisted entries never appear here: they are absorbed
/// by the tier that found them and reported as misses.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A series violated an invariant under strict validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The data source failed; passed through unchanged.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A filesystem operation on the persistent tier failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An entry could not be serialized.
    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    /// The configuration is unusable.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
