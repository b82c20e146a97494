//! Candle-to-candle timeframe aggregation.

use candlekeep_types::{Candle, CandleSeries, Timeframe};
use chrono::{DateTime, Utc};

use crate::{Result, TransformError};

/// Resamples a series into a coarser timeframe.
///
/// Candles are grouped into buckets aligned to the epoch grid of `target`.
/// Each bucket takes the first open, the last close, the highest high, the
/// lowest low and the summed volume. Buckets without source candles are
/// omitted. Resampling to the series' own timeframe returns it unchanged.
///
/// # Errors
///
/// Returns [`TransformError::EmptySeries`] for an empty input and
/// [`TransformError::InvalidResample`] when `target` is smaller than, or not
/// an exact multiple of, the source timeframe.
pub fn resample(series: &CandleSeries, target: Timeframe) -> Result<CandleSeries> {
    if series.is_empty() {
        return Err(TransformError::EmptySeries);
    }
    let source = series.timeframe();
    if target == source {
        return Ok(series.clone());
    }
    if !source.can_resample_to(target) {
        return Err(TransformError::InvalidResample {
            from: source,
            to: target,
        });
    }

    let mut aggregator = CandleAggregator::new(target);
    let mut out = CandleSeries::new(series.symbol(), target);
    for candle in series {
        if let Some(bar) = aggregator.process(candle) {
            out.insert(bar)?;
        }
    }
    if let Some(bar) = aggregator.finish() {
        out.insert(bar)?;
    }

    tracing::debug!(
        symbol = series.symbol(),
        from = %source,
        to = %target,
        input = series.len(),
        output = out.len(),
        "resampled series"
    );
    Ok(out)
}

/// Streaming candle aggregator.
///
/// Folds finer candles, fed in ascending order, into bars of the target
/// timeframe.
#[derive(Debug)]
pub struct CandleAggregator {
    timeframe: Timeframe,
    current_bar: Option<BarBuilder>,
}

impl CandleAggregator {
    /// Creates a new aggregator for the given target timeframe.
    #[must_use]
    pub const fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            current_bar: None,
        }
    }

    /// Returns the timeframe being aggregated to.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Processes a candle, potentially emitting a completed bar.
    ///
    /// Returns `Some(bar)` when this candle starts a new bucket, `None`
    /// otherwise.
    pub fn process(&mut self, candle: &Candle) -> Option<Candle> {
        let bar_start = self.timeframe.bucket_start(candle.timestamp);

        match self.current_bar.take() {
            Some(mut builder) if builder.timestamp == bar_start => {
                builder.update(candle);
                self.current_bar = Some(builder);
                None
            }
            Some(builder) => {
                let completed = builder.finish(self.timeframe);
                self.current_bar = Some(BarBuilder::new(bar_start, candle));
                Some(completed)
            }
            None => {
                self.current_bar = Some(BarBuilder::new(bar_start, candle));
                None
            }
        }
    }

    /// Finishes aggregation, returning any remaining partial bar.
    #[must_use]
    pub fn finish(self) -> Option<Candle> {
        let timeframe = self.timeframe;
        self.current_bar.map(|b| b.finish(timeframe))
    }
}

/// Accumulator for one output bucket.
#[derive(Debug)]
struct BarBuilder {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl BarBuilder {
    const fn new(timestamp: DateTime<Utc>, candle: &Candle) -> Self {
        Self {
            timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }

    fn update(&mut self, candle: &Candle) {
        self.high = self.high.max(candle.high);
        self.low = self.low.min(candle.low);
        self.close = candle.close;
        self.volume += candle.volume;
    }

    const fn finish(self, timeframe: Timeframe) -> Candle {
        Candle::new(
            self.timestamp,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            timeframe,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn minute_candle(minute: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle::new(
            base() + TimeDelta::minutes(minute),
            open,
            high,
            low,
            close,
            volume,
            Timeframe::M1,
        )
    }

    fn hourly(hours: i64) -> CandleSeries {
        let candles = (0..hours)
            .map(|h| {
                let price = 1.0 + h as f64 * 0.01;
                Candle::new(
                    base() + TimeDelta::hours(h),
                    price,
                    price + 0.005,
                    price - 0.005,
                    price + 0.002,
                    10.0,
                    Timeframe::H1,
                )
            })
            .collect();
        CandleSeries::from_candles("EURUSD", Timeframe::H1, candles).unwrap()
    }

    #[test]
    fn test_three_minutes_into_one_bucket() {
        let series = CandleSeries::from_candles(
            "EURUSD",
            Timeframe::M1,
            vec![
                minute_candle(0, 1.10, 1.105, 1.095, 1.10, 100.0),
                minute_candle(1, 1.10, 1.115, 1.100, 1.11, 150.0),
                minute_candle(2, 1.11, 1.112, 1.085, 1.09, 50.0),
            ],
        )
        .unwrap();

        let out = resample(&series, Timeframe::M5).unwrap();
        assert_eq!(out.len(), 1);
        let bar = out[0];
        assert_eq!(bar.timestamp, base());
        assert_eq!(bar.timeframe, Timeframe::M5);
        assert_relative_eq!(bar.open, 1.10);
        assert_relative_eq!(bar.close, 1.09);
        assert_relative_eq!(bar.high, 1.115);
        assert_relative_eq!(bar.low, 1.085);
        assert_relative_eq!(bar.volume, 300.0);
    }

    #[test]
    fn test_buckets_align_to_grid() {
        let candles = (3..13)
            .map(|m| minute_candle(m, 1.0, 1.0, 1.0, 1.0, 1.0))
            .collect();
        let series = CandleSeries::from_candles("EURUSD", Timeframe::M1, candles).unwrap();

        let out = resample(&series, Timeframe::M5).unwrap();
        let starts: Vec<_> = out.timestamps().collect();
        assert_eq!(
            starts,
            vec![
                base(),
                base() + TimeDelta::minutes(5),
                base() + TimeDelta::minutes(10)
            ]
        );
        assert_relative_eq!(out[0].volume, 2.0);
        assert_relative_eq!(out[1].volume, 5.0);
        assert_relative_eq!(out[2].volume, 3.0);
    }

    #[test]
    fn test_empty_buckets_are_omitted() {
        let series = CandleSeries::from_candles(
            "EURUSD",
            Timeframe::M1,
            vec![
                minute_candle(0, 1.0, 1.0, 1.0, 1.0, 1.0),
                minute_candle(20, 1.0, 1.0, 1.0, 1.0, 1.0),
            ],
        )
        .unwrap();

        let out = resample(&series, Timeframe::M5).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_same_timeframe_is_identity() {
        let series = hourly(6);
        let out = resample(&series, Timeframe::H1).unwrap();
        assert_eq!(out, series);
        assert_eq!(resample(&out, Timeframe::H1).unwrap(), series);
    }

    #[test]
    fn test_downsampling_rejected() {
        let result = resample(&hourly(3), Timeframe::M5);
        assert_eq!(
            result,
            Err(TransformError::InvalidResample {
                from: Timeframe::H1,
                to: Timeframe::M5
            })
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        let series = CandleSeries::new("EURUSD", Timeframe::M1);
        assert_eq!(
            resample(&series, Timeframe::H1),
            Err(TransformError::EmptySeries)
        );
    }

    #[test]
    fn test_hourly_to_four_hour() {
        let out = resample(&hourly(8), Timeframe::H4).unwrap();
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].volume, 40.0);
        assert_relative_eq!(out[1].open, 1.04, epsilon = 1e-12);
        assert_relative_eq!(out[1].close, 1.072, epsilon = 1e-12);
    }

    #[test]
    fn test_streaming_aggregator_finish() {
        let mut agg = CandleAggregator::new(Timeframe::M5);
        assert!(agg.process(&minute_candle(0, 1.0, 1.0, 1.0, 1.0, 1.0)).is_none());
        assert!(agg.process(&minute_candle(4, 1.0, 1.0, 1.0, 1.0, 1.0)).is_none());
        let completed = agg.process(&minute_candle(5, 1.0, 1.0, 1.0, 1.0, 1.0));
        assert!(completed.is_some());

        let bar = agg.finish().unwrap();
        assert_eq!(bar.timestamp, base() + TimeDelta::minutes(5));
    }
}
