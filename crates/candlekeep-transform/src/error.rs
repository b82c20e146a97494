//! Error types for series transformations.

use candlekeep_types::{Timeframe, ValidationError};
use thiserror::Error;

/// Result type alias for transformation operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors reported by the transformation engine.
///
/// Empty results (an empty slice, no common timestamps, no full window) are
/// valid outputs and never reported here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The target timeframe is not a strictly larger exact multiple of the source.
    #[error("cannot resample from {from} to {to}: target must be a larger multiple")]
    InvalidResample {
        /// Source timeframe.
        from: Timeframe,
        /// Requested target timeframe.
        to: Timeframe,
    },

    /// The operation needs at least one candle.
    #[error("operation requires a non-empty series")]
    EmptySeries,

    /// Series passed together do not share a timeframe.
    #[error("all series must share a timeframe: expected {expected}, found {found}")]
    TimeframeMismatch {
        /// Timeframe of the first series.
        expected: Timeframe,
        /// Timeframe of the offending series.
        found: Timeframe,
    },

    /// A produced candle violated an invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
