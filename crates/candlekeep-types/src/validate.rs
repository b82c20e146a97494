//! Strict and lenient validation of candle data.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Candle, CandleSeries, Timeframe, ValidationError};

/// Default lower bound for [`Validator::validate_price_range`].
pub const DEFAULT_MIN_PRICE: f64 = 0.0001;

/// Default upper bound for [`Validator::validate_price_range`].
pub const DEFAULT_MAX_PRICE: f64 = 1_000_000.0;

/// A break in a series between two consecutive candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Timestamp of the candle before the gap.
    pub start: DateTime<Utc>,
    /// Timestamp of the candle after the gap.
    pub end: DateTime<Utc>,
    /// Number of grid slots missing between the two candles.
    pub missing: usize,
}

impl Gap {
    fn between(start: DateTime<Utc>, end: DateTime<Utc>, timeframe: Timeframe) -> Self {
        let slots = (end - start).num_seconds() / timeframe.seconds();
        Self {
            start,
            end,
            missing: slots.saturating_sub(1).max(0) as usize,
        }
    }

    /// Returns the time between the two bounding candles.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Validates candles and series against the data-model invariants.
///
/// In strict mode every violation is returned as an error. In lenient mode
/// violations are logged as warnings and reported as `Ok(false)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Validator {
    strict: bool,
}

impl Validator {
    /// Creates a validator in the given mode.
    #[must_use]
    pub const fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Creates a validator that raises on every violation.
    #[must_use]
    pub const fn strict() -> Self {
        Self::new(true)
    }

    /// Creates a validator that logs violations and keeps going.
    #[must_use]
    pub const fn lenient() -> Self {
        Self::new(false)
    }

    /// Returns true if violations are raised as errors.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Raises the violation in strict mode, logs it and returns `Ok(false)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged in strict mode.
    pub fn reject(&self, error: ValidationError) -> Result<bool, ValidationError> {
        if self.strict {
            return Err(error);
        }
        tracing::warn!(%error, "validation failed");
        Ok(false)
    }

    /// Validates a single candle.
    ///
    /// Zero prices are unusual but legal; they are logged and accepted.
    ///
    /// # Errors
    ///
    /// Returns the violation in strict mode.
    pub fn validate_candle(&self, candle: &Candle) -> Result<bool, ValidationError> {
        if let Err(error) = candle.validate() {
            return self.reject(error);
        }
        if candle.prices().iter().any(|(_, price)| *price == 0.0) {
            tracing::warn!(timestamp = %candle.timestamp, "candle has zero price values");
        }
        Ok(true)
    }

    /// Validates a whole series.
    ///
    /// Candle-level invariants already hold for any [`CandleSeries`]; this
    /// checks that the series is non-empty and logs irregular spacing.
    ///
    /// # Errors
    ///
    /// Returns the violation in strict mode.
    pub fn validate_series(&self, series: &CandleSeries) -> Result<bool, ValidationError> {
        if series.is_empty() {
            return self.reject(ValidationError::EmptySeries {
                symbol: series.symbol().to_string(),
            });
        }

        let irregular = irregular_spacing(series);
        if !irregular.is_empty() {
            tracing::debug!(
                symbol = series.symbol(),
                timeframe = %series.timeframe(),
                count = irregular.len(),
                first = %irregular[0].start,
                "series has irregular candle spacing"
            );
        }
        Ok(true)
    }

    /// Validates that a series was produced for the requested symbol and timeframe.
    ///
    /// # Errors
    ///
    /// Returns the violation in strict mode.
    pub fn validate_request(
        &self,
        series: &CandleSeries,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<bool, ValidationError> {
        if series.symbol() != symbol {
            return self.reject(ValidationError::SymbolMismatch {
                expected: symbol.to_string(),
                found: series.symbol().to_string(),
            });
        }
        if series.timeframe() != timeframe {
            return self.reject(ValidationError::TimeframeMismatch {
                expected: timeframe,
                found: series.timeframe(),
            });
        }
        self.validate_series(series)
    }

    /// Checks that all four prices lie within `[min_price, max_price]`.
    ///
    /// # Errors
    ///
    /// Returns the violation in strict mode.
    pub fn validate_price_range(
        &self,
        candle: &Candle,
        min_price: f64,
        max_price: f64,
    ) -> Result<bool, ValidationError> {
        for (_, price) in candle.prices() {
            if price < min_price || price > max_price {
                return self.reject(ValidationError::PriceOutOfRange {
                    timestamp: candle.timestamp,
                    price,
                    min: min_price,
                    max: max_price,
                });
            }
        }
        Ok(true)
    }

    /// Builds a series from raw candles.
    ///
    /// Strict mode fails on the first invalid or duplicate candle. Lenient
    /// mode logs and skips them; the first candle seen at a timestamp wins.
    ///
    /// # Errors
    ///
    /// Returns the first violation in strict mode.
    pub fn sanitize(
        &self,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Result<CandleSeries, ValidationError> {
        let mut series = CandleSeries::new(symbol, timeframe);
        let mut skipped = 0usize;

        for candle in candles {
            if candle.timeframe != timeframe {
                self.reject(ValidationError::TimeframeMismatch {
                    expected: timeframe,
                    found: candle.timeframe,
                })?;
                skipped += 1;
                continue;
            }
            if !self.validate_candle(&candle)? {
                skipped += 1;
                continue;
            }
            if series.position(candle.timestamp).is_some() {
                self.reject(ValidationError::DuplicateTimestamp(candle.timestamp))?;
                skipped += 1;
                continue;
            }
            series.insert(candle)?;
        }

        if skipped > 0 {
            tracing::warn!(
                symbol = series.symbol(),
                skipped,
                kept = series.len(),
                "skipped invalid candles"
            );
        }
        Ok(series)
    }
}

/// Finds every pair of consecutive candles further apart than
/// `max_gap_multiple` timeframes.
///
/// A delta exactly equal to the threshold is not a gap.
#[must_use]
pub fn detect_gaps(series: &CandleSeries, max_gap_multiple: u32) -> Vec<Gap> {
    let timeframe = series.timeframe();
    let threshold = TimeDelta::try_seconds(
        timeframe
            .seconds()
            .saturating_mul(i64::from(max_gap_multiple)),
    )
    .unwrap_or(TimeDelta::MAX);

    let gaps: Vec<Gap> = series
        .candles()
        .windows(2)
        .filter(|w| w[1].timestamp - w[0].timestamp > threshold)
        .map(|w| Gap::between(w[0].timestamp, w[1].timestamp, timeframe))
        .collect();

    if !gaps.is_empty() {
        tracing::info!(
            symbol = series.symbol(),
            timeframe = %timeframe,
            count = gaps.len(),
            "found data gaps"
        );
    }
    gaps
}

/// Finds every pair of consecutive candles not exactly one timeframe apart.
#[must_use]
pub fn irregular_spacing(series: &CandleSeries) -> Vec<Gap> {
    let timeframe = series.timeframe();
    let expected = timeframe.duration();
    series
        .candles()
        .windows(2)
        .filter(|w| w[1].timestamp - w[0].timestamp != expected)
        .map(|w| Gap::between(w[0].timestamp, w[1].timestamp, timeframe))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour_candle(hour: u32) -> Candle {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        Candle::new(timestamp, 1.10, 1.12, 1.09, 1.11, 500.0, Timeframe::H1)
    }

    fn bad_candle(hour: u32) -> Candle {
        let mut candle = hour_candle(hour);
        candle.high = 1.0;
        candle
    }

    #[test]
    fn test_strict_candle_raises() {
        let validator = Validator::strict();
        assert!(validator.validate_candle(&hour_candle(0)).unwrap());
        assert!(matches!(
            validator.validate_candle(&bad_candle(0)),
            Err(ValidationError::HighTooLow { .. })
        ));
    }

    #[test]
    fn test_lenient_candle_returns_false() {
        let validator = Validator::lenient();
        assert!(!validator.validate_candle(&bad_candle(0)).unwrap());
    }

    #[test]
    fn test_empty_series() {
        let series = CandleSeries::new("EURUSD", Timeframe::H1);
        assert!(Validator::strict().validate_series(&series).is_err());
        assert!(!Validator::lenient().validate_series(&series).unwrap());
    }

    #[test]
    fn test_validate_request_mismatch() {
        let series =
            CandleSeries::from_candles("EURUSD", Timeframe::H1, vec![hour_candle(0)]).unwrap();
        let validator = Validator::strict();

        assert!(validator.validate_request(&series, "EURUSD", Timeframe::H1).unwrap());
        assert!(matches!(
            validator.validate_request(&series, "GBPUSD", Timeframe::H1),
            Err(ValidationError::SymbolMismatch { .. })
        ));
        assert!(matches!(
            validator.validate_request(&series, "EURUSD", Timeframe::H4),
            Err(ValidationError::TimeframeMismatch { .. })
        ));
    }

    #[test]
    fn test_price_range() {
        let validator = Validator::strict();
        let candle = hour_candle(0);
        assert!(
            validator
                .validate_price_range(&candle, DEFAULT_MIN_PRICE, DEFAULT_MAX_PRICE)
                .unwrap()
        );
        assert!(validator.validate_price_range(&candle, 1.10, 2.0).is_err());
        assert!(
            !Validator::lenient()
                .validate_price_range(&candle, 1.10, 2.0)
                .unwrap()
        );
    }

    #[test]
    fn test_sanitize_strict_fails() {
        let result = Validator::strict().sanitize(
            "EURUSD",
            Timeframe::H1,
            vec![hour_candle(0), bad_candle(1)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitize_lenient_skips() {
        let series = Validator::lenient()
            .sanitize(
                "EURUSD",
                Timeframe::H1,
                vec![hour_candle(2), bad_candle(1), hour_candle(0), hour_candle(2)],
            )
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].timestamp, hour_candle(0).timestamp);
        assert_eq!(series[1].timestamp, hour_candle(2).timestamp);
    }

    #[test]
    fn test_detect_gaps_threshold() {
        let series = CandleSeries::from_candles(
            "EURUSD",
            Timeframe::H1,
            vec![hour_candle(0), hour_candle(1), hour_candle(6), hour_candle(8)],
        )
        .unwrap();

        let gaps = detect_gaps(&series, 2);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start, hour_candle(1).timestamp);
        assert_eq!(gaps[0].end, hour_candle(6).timestamp);
        assert_eq!(gaps[0].missing, 4);
        assert_eq!(gaps[0].duration(), TimeDelta::hours(5));
    }

    #[test]
    fn test_detect_gaps_exact_threshold_is_not_gap() {
        let series = CandleSeries::from_candles(
            "EURUSD",
            Timeframe::H1,
            vec![hour_candle(0), hour_candle(2)],
        )
        .unwrap();
        assert!(detect_gaps(&series, 2).is_empty());
        assert_eq!(detect_gaps(&series, 1).len(), 1);
    }

    #[test]
    fn test_detect_gaps_huge_multiple_on_contiguous_series() {
        let series = CandleSeries::from_candles(
            "EURUSD",
            Timeframe::H1,
            vec![hour_candle(0), hour_candle(1), hour_candle(2)],
        )
        .unwrap();
        assert!(detect_gaps(&series, u32::MAX).is_empty());
        assert!(detect_gaps(&series, 1 << 31).is_empty());

        let sparse = CandleSeries::from_candles(
            "EURUSD",
            Timeframe::D1,
            vec![
                Candle::new(hour_candle(0).timestamp, 1.1, 1.2, 1.0, 1.1, 1.0, Timeframe::D1),
                Candle::new(
                    hour_candle(0).timestamp + TimeDelta::days(400),
                    1.1,
                    1.2,
                    1.0,
                    1.1,
                    1.0,
                    Timeframe::D1,
                ),
            ],
        )
        .unwrap();
        assert!(detect_gaps(&sparse, u32::MAX).is_empty());
    }

    #[test]
    fn test_irregular_spacing() {
        let series = CandleSeries::from_candles(
            "EURUSD",
            Timeframe::H1,
            vec![hour_candle(0), hour_candle(1), hour_candle(3)],
        )
        .unwrap();
        let irregular = irregular_spacing(&series);
        assert_eq!(irregular.len(), 1);
        assert_eq!(irregular[0].missing, 1);
    }
}
