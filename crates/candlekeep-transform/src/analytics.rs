//! Returns, volatility and descriptive statistics.

use candlekeep_types::CandleSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, TransformError};

/// A value aligned to a candle timestamp.
///
/// `value` is `None` where the metric is undefined, such as the warm-up
/// period of a rolling computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Timestamp of the candle the value belongs to.
    pub timestamp: DateTime<Utc>,
    /// The metric, if defined at this point.
    pub value: Option<f64>,
}

impl Observation {
    const fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

/// Rolling volatility estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityMethod {
    /// Sample standard deviation of one-period returns.
    #[default]
    StdDev,
    /// Average true range.
    Atr,
}

/// Computes simple close-to-close returns over `period` candles.
///
/// The result has one observation per candle. The first `period` entries are
/// `None`, as is any entry whose base close is zero.
#[must_use]
pub fn returns(series: &CandleSeries, period: usize) -> Vec<Observation> {
    let candles = series.candles();
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let value = i
                .checked_sub(period)
                .filter(|_| period > 0)
                .and_then(|j| pct_change(candles[j].close, c.close));
            Observation::new(c.timestamp, value)
        })
        .collect()
}

fn pct_change(base: f64, value: f64) -> Option<f64> {
    (base != 0.0).then(|| value / base - 1.0)
}

/// Computes rolling volatility over `window` candles.
///
/// [`VolatilityMethod::StdDev`] is defined from index `window` on, once
/// `window` one-period returns exist, and needs `window >= 2`.
/// [`VolatilityMethod::Atr`] is defined from index `window - 1`; the first
/// candle's true range is its high-low range. A `window` of zero yields only
/// `None` values.
#[must_use]
pub fn volatility(series: &CandleSeries, window: usize, method: VolatilityMethod) -> Vec<Observation> {
    let candles = series.candles();
    let values = match method {
        VolatilityMethod::StdDev => {
            let one_period: Vec<Option<f64>> = returns(series, 1).iter().map(|o| o.value).collect();
            (0..candles.len())
                .map(|i| {
                    if window < 2 || i < window {
                        return None;
                    }
                    let sample: Option<Vec<f64>> = one_period[i + 1 - window..=i].iter().copied().collect();
                    sample.map(|s| sample_std_dev(&s))
                })
                .collect::<Vec<_>>()
        }
        VolatilityMethod::Atr => {
            let ranges: Vec<f64> = candles
                .iter()
                .enumerate()
                .map(|(i, c)| c.true_range(i.checked_sub(1).map(|p| candles[p].close)))
                .collect();
            (0..candles.len())
                .map(|i| {
                    if window == 0 || i + 1 < window {
                        return None;
                    }
                    Some(mean(&ranges[i + 1 - window..=i]))
                })
                .collect::<Vec<_>>()
        }
    };

    tracing::debug!(
        symbol = series.symbol(),
        window,
        ?method,
        defined = values.iter().filter(|v| v.is_some()).count(),
        "computed volatility"
    );
    candles
        .iter()
        .zip(values)
        .map(|(c, v)| Observation::new(c.timestamp, v))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Descriptive statistics of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of candles.
    pub count: usize,
    /// Timestamp of the first candle.
    pub start: DateTime<Utc>,
    /// Timestamp of the last candle.
    pub end: DateTime<Utc>,
    /// Open of the first candle.
    pub first_open: f64,
    /// Close of the last candle.
    pub last_close: f64,
    /// Lowest close.
    pub min_close: f64,
    /// Highest close.
    pub max_close: f64,
    /// Mean close.
    pub mean_close: f64,
    /// Highest high.
    pub high_max: f64,
    /// Lowest low.
    pub low_min: f64,
    /// Sum of volumes.
    pub total_volume: f64,
    /// Mean volume per candle.
    pub mean_volume: f64,
    /// Last close minus first close.
    pub change: f64,
    /// `change` as a percentage of the first close, if that is non-zero.
    pub change_pct: Option<f64>,
}

/// Summarizes a series.
///
/// # Errors
///
/// Returns [`TransformError::EmptySeries`] for an empty series.
pub fn summary_statistics(series: &CandleSeries) -> Result<SummaryStatistics> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(TransformError::EmptySeries);
    };

    let count = series.len();
    let mut min_close = f64::INFINITY;
    let mut max_close = f64::NEG_INFINITY;
    let mut high_max = f64::NEG_INFINITY;
    let mut low_min = f64::INFINITY;
    let mut close_sum = 0.0;
    let mut total_volume = 0.0;
    for c in series {
        min_close = min_close.min(c.close);
        max_close = max_close.max(c.close);
        high_max = high_max.max(c.high);
        low_min = low_min.min(c.low);
        close_sum += c.close;
        total_volume += c.volume;
    }

    let change = last.close - first.close;
    Ok(SummaryStatistics {
        count,
        start: first.timestamp,
        end: last.timestamp,
        first_open: first.open,
        last_close: last.close,
        min_close,
        max_close,
        mean_close: close_sum / count as f64,
        high_max,
        low_min,
        total_volume,
        mean_volume: total_volume / count as f64,
        change,
        change_pct: (first.close != 0.0).then(|| change / first.close * 100.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use candlekeep_types::{Candle, Timeframe};
    use chrono::{TimeDelta, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap()
    }

    fn closes(values: &[f64]) -> CandleSeries {
        let candles = values
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new(
                    base() + TimeDelta::hours(i as i64),
                    close,
                    close + 1.0,
                    (close - 1.0).max(0.0),
                    close,
                    100.0 * (i + 1) as f64,
                    Timeframe::H1,
                )
            })
            .collect();
        CandleSeries::from_candles("ACME", Timeframe::H1, candles).unwrap()
    }

    #[test]
    fn test_returns_warm_up_and_values() {
        let series = closes(&[100.0, 110.0, 99.0, 108.9]);
        let out = returns(&series, 1);

        assert_eq!(out.len(), 4);
        assert_eq!(out[0].value, None);
        assert_relative_eq!(out[1].value.unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(out[2].value.unwrap(), -0.10, epsilon = 1e-12);
        assert_relative_eq!(out[3].value.unwrap(), 0.10, epsilon = 1e-12);

        let two = returns(&series, 2);
        assert!(two[..2].iter().all(|o| o.value.is_none()));
        assert_relative_eq!(two[2].value.unwrap(), -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_returns_zero_base_is_undefined() {
        let series = closes(&[0.0, 5.0, 6.0]);
        let out = returns(&series, 1);
        assert_eq!(out[1].value, None);
        assert_relative_eq!(out[2].value.unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_std_dev_volatility() {
        let series = closes(&[100.0, 110.0, 99.0, 108.9, 108.9]);
        let out = volatility(&series, 2, VolatilityMethod::StdDev);

        assert!(out[..2].iter().all(|o| o.value.is_none()));
        // Returns at 1 and 2 are +0.1 and -0.1.
        assert_relative_eq!(out[2].value.unwrap(), 0.1 * 2.0_f64.sqrt(), epsilon = 1e-9);
        // Returns at 3 and 4 are +0.1 and 0.0.
        assert_relative_eq!(out[4].value.unwrap(), 0.05 * 2.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_atr_volatility() {
        let series = closes(&[10.0, 12.0, 11.0]);
        let out = volatility(&series, 2, VolatilityMethod::Atr);

        // True ranges: 2.0, max(2, |13-10|, |11-10|) = 3.0, max(2, |12-12|, |10-12|) = 2.0.
        assert_eq!(out[0].value, None);
        assert_relative_eq!(out[1].value.unwrap(), 2.5);
        assert_relative_eq!(out[2].value.unwrap(), 2.5);

        let single = volatility(&series, 1, VolatilityMethod::Atr);
        assert_relative_eq!(single[0].value.unwrap(), 2.0);
    }

    #[test]
    fn test_degenerate_windows() {
        let series = closes(&[10.0, 11.0, 12.0]);
        for method in [VolatilityMethod::StdDev, VolatilityMethod::Atr] {
            let out = volatility(&series, 0, method);
            assert_eq!(out.len(), 3);
            assert!(out.iter().all(|o| o.value.is_none()));
        }
        let out = volatility(&series, 1, VolatilityMethod::StdDev);
        assert!(out.iter().all(|o| o.value.is_none()));
    }

    #[test]
    fn test_summary_statistics() {
        let series = closes(&[100.0, 120.0, 90.0, 110.0]);
        let stats = summary_statistics(&series).unwrap();

        assert_eq!(stats.count, 4);
        assert_eq!(stats.start, base());
        assert_eq!(stats.end, base() + TimeDelta::hours(3));
        assert_relative_eq!(stats.first_open, 100.0);
        assert_relative_eq!(stats.last_close, 110.0);
        assert_relative_eq!(stats.min_close, 90.0);
        assert_relative_eq!(stats.max_close, 120.0);
        assert_relative_eq!(stats.mean_close, 105.0);
        assert_relative_eq!(stats.high_max, 121.0);
        assert_relative_eq!(stats.low_min, 89.0);
        assert_relative_eq!(stats.total_volume, 1_000.0);
        assert_relative_eq!(stats.mean_volume, 250.0);
        assert_relative_eq!(stats.change, 10.0);
        assert_relative_eq!(stats.change_pct.unwrap(), 10.0);
    }

    #[test]
    fn test_summary_of_empty_series() {
        let series = CandleSeries::new("ACME", Timeframe::H1);
        assert_eq!(summary_statistics(&series), Err(TransformError::EmptySeries));
    }

    #[test]
    fn test_summary_zero_first_close() {
        let stats = summary_statistics(&closes(&[0.0, 4.0])).unwrap();
        assert_eq!(stats.change_pct, None);
        assert_relative_eq!(stats.change, 4.0);
    }
}
