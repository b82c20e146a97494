//! Error types for the candle data model.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::Timeframe;

/// A candle or series violated a data-model invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A price or the volume is NaN or infinite.
    #[error("candle at {timestamp} has a non-finite {field}")]
    NonFinite {
        /// Candle timestamp.
        timestamp: DateTime<Utc>,
        /// Name of the offending field.
        field: &'static str,
    },

    /// A price is below zero.
    #[error("candle at {timestamp} has a negative {field}: {value}")]
    NegativePrice {
        /// Candle timestamp.
        timestamp: DateTime<Utc>,
        /// Name of the offending field.
        field: &'static str,
        /// The negative value.
        value: f64,
    },

    /// Volume is below zero.
    #[error("candle at {timestamp} has negative volume {volume}")]
    NegativeVolume {
        /// Candle timestamp.
        timestamp: DateTime<Utc>,
        /// The negative volume.
        volume: f64,
    },

    /// High is below open, close or low.
    #[error("candle at {timestamp}: high {high} is below max(open, close, low) = {floor}")]
    HighTooLow {
        /// Candle timestamp.
        timestamp: DateTime<Utc>,
        /// The high price.
        high: f64,
        /// The largest of open, close and low.
        floor: f64,
    },

    /// Low is above open, close or high.
    #[error("candle at {timestamp}: low {low} is above min(open, close, high) = {ceiling}")]
    LowTooHigh {
        /// Candle timestamp.
        timestamp: DateTime<Utc>,
        /// The low price.
        low: f64,
        /// The smallest of open, close and high.
        ceiling: f64,
    },

    /// Timestamp does not lie on the timeframe grid.
    #[error("candle at {timestamp} is not aligned to the {timeframe} grid")]
    Misaligned {
        /// Candle timestamp.
        timestamp: DateTime<Utc>,
        /// The candle's timeframe.
        timeframe: Timeframe,
    },

    /// A candle or series has a different timeframe than expected.
    #[error("timeframe mismatch: expected {expected}, found {found}")]
    TimeframeMismatch {
        /// Expected timeframe.
        expected: Timeframe,
        /// Timeframe actually found.
        found: Timeframe,
    },

    /// A series belongs to a different symbol than expected.
    #[error("symbol mismatch: expected {expected}, found {found}")]
    SymbolMismatch {
        /// Expected symbol.
        expected: String,
        /// Symbol actually found.
        found: String,
    },

    /// Two candles share a timestamp.
    #[error("duplicate candle timestamp {0}")]
    DuplicateTimestamp(DateTime<Utc>),

    /// A series has no candles where at least one is required.
    #[error("series for {symbol} has no candles")]
    EmptySeries {
        /// Series symbol.
        symbol: String,
    },

    /// A price lies outside the accepted range.
    #[error("price {price} out of range [{min}, {max}] at {timestamp}")]
    PriceOutOfRange {
        /// Candle timestamp.
        timestamp: DateTime<Utc>,
        /// The offending price.
        price: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// Error for invalid time ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Start is after end.
    #[error("Invalid time range: {start} > {end}")]
    InvalidRange {
        /// The start instant.
        start: DateTime<Utc>,
        /// The end instant.
        end: DateTime<Utc>,
    },
}
