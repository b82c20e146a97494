//! OHLCV candle representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Timeframe, ValidationError};

/// A single OHLCV bar for one timeframe bucket.
///
/// Fields are public so candles can be assembled freely; [`Candle::validate`]
/// checks the invariants and runs before a candle enters any
/// [`CandleSeries`](crate::CandleSeries).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start time (UTC), aligned to the timeframe grid.
    pub timestamp: DateTime<Utc>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the bucket.
    pub high: f64,
    /// Lowest price during the bucket.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
    /// Bar duration.
    pub timeframe: Timeframe,
}

impl Candle {
    /// Creates a new candle without checking invariants.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timeframe: Timeframe,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            timeframe,
        }
    }

    /// Creates a new candle and validates it.
    ///
    /// # Errors
    ///
    /// Returns the first invariant the candle violates.
    pub fn try_new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timeframe: Timeframe,
    ) -> Result<Self, ValidationError> {
        let candle = Self::new(timestamp, open, high, low, close, volume, timeframe);
        candle.validate()?;
        Ok(candle)
    }

    /// Synthesizes a flat, zero-volume candle carrying `price` forward.
    #[must_use]
    pub const fn flat(timestamp: DateTime<Utc>, price: f64, timeframe: Timeframe) -> Self {
        Self::new(timestamp, price, price, price, price, 0.0, timeframe)
    }

    /// Checks every candle invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: non-finite fields, negative prices
    /// or volume, inconsistent high/low, or an off-grid timestamp.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let timestamp = self.timestamp;
        for (field, value) in self.fields() {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { timestamp, field });
            }
        }
        for (field, value) in self.prices() {
            if value < 0.0 {
                return Err(ValidationError::NegativePrice {
                    timestamp,
                    field,
                    value,
                });
            }
        }
        if self.volume < 0.0 {
            return Err(ValidationError::NegativeVolume {
                timestamp,
                volume: self.volume,
            });
        }

        let floor = self.open.max(self.close).max(self.low);
        if self.high < floor {
            return Err(ValidationError::HighTooLow {
                timestamp,
                high: self.high,
                floor,
            });
        }
        let ceiling = self.open.min(self.close).min(self.high);
        if self.low > ceiling {
            return Err(ValidationError::LowTooHigh {
                timestamp,
                low: self.low,
                ceiling,
            });
        }

        if !self.timeframe.is_aligned(timestamp) {
            return Err(ValidationError::Misaligned {
                timestamp,
                timeframe: self.timeframe,
            });
        }
        Ok(())
    }

    /// Returns true if the candle passes [`Candle::validate`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns the four prices with their field names.
    #[must_use]
    pub const fn prices(&self) -> [(&'static str, f64); 4] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
    }

    const fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
    }

    /// Returns the price range (high - low).
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns the body size (|close - open|).
    #[must_use]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Returns the distance from the top of the body to the high.
    #[must_use]
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Returns the distance from the bottom of the body to the low.
    #[must_use]
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Returns true if this is a bullish (green) bar.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Returns true if this is a bearish (red) bar.
    #[must_use]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns the typical price ((high + low + close) / 3).
    #[must_use]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns the true range against the previous close.
    ///
    /// Without a previous close this is simply high - low.
    #[must_use]
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let range = self.range();
        prev_close.map_or(range, |prev| {
            range
                .max((self.high - prev).abs())
                .max((self.low - prev).abs())
        })
    }
}
