//! Multi-series timestamp alignment.

use std::collections::BTreeSet;

use candlekeep_types::{Candle, CandleSeries};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, TransformError};

/// How timestamps of several series are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMethod {
    /// Keep only timestamps present in every series.
    #[default]
    Inner,
    /// Keep every timestamp present in any series, forward filling the rest.
    Outer,
}

/// Restricts each series to the timestamps common to all of them.
///
/// See [`align_with`].
///
/// # Errors
///
/// Returns [`TransformError::TimeframeMismatch`] if the series do not share
/// a timeframe.
pub fn align(series: &[CandleSeries]) -> Result<Vec<CandleSeries>> {
    align_with(series, AlignMethod::Inner)
}

/// Aligns several series onto a shared set of timestamps.
///
/// Output `i` corresponds to input `i`. With [`AlignMethod::Inner`] the
/// shared set is the intersection, which may be empty. With
/// [`AlignMethod::Outer`] it is the union: slots a series lacks are filled
/// with flat zero-volume candles at its previous close, and slots before its
/// first candle are dropped.
///
/// # Errors
///
/// Returns [`TransformError::TimeframeMismatch`] if the series do not share
/// a timeframe.
pub fn align_with(series: &[CandleSeries], method: AlignMethod) -> Result<Vec<CandleSeries>> {
    let Some(first) = series.first() else {
        return Ok(Vec::new());
    };
    let timeframe = first.timeframe();
    if let Some(other) = series.iter().find(|s| s.timeframe() != timeframe) {
        return Err(TransformError::TimeframeMismatch {
            expected: timeframe,
            found: other.timeframe(),
        });
    }

    let out = match method {
        AlignMethod::Inner => {
            let common = intersection(series);
            series
                .iter()
                .map(|s| restrict(s, &common))
                .collect::<Result<Vec<_>>>()?
        }
        AlignMethod::Outer => {
            let all: BTreeSet<_> = series.iter().flat_map(|s| s.timestamps()).collect();
            series
                .iter()
                .map(|s| fill_to(s, &all))
                .collect::<Result<Vec<_>>>()?
        }
    };

    tracing::debug!(
        series = series.len(),
        ?method,
        aligned = out.first().map_or(0, CandleSeries::len),
        "aligned series"
    );
    Ok(out)
}

fn intersection(series: &[CandleSeries]) -> BTreeSet<DateTime<Utc>> {
    let mut iter = series.iter();
    let mut common: BTreeSet<_> = iter
        .next()
        .map(|s| s.timestamps().collect())
        .unwrap_or_default();
    for s in iter {
        let present: BTreeSet<_> = s.timestamps().collect();
        common.retain(|ts| present.contains(ts));
    }
    common
}

fn restrict(series: &CandleSeries, keep: &BTreeSet<DateTime<Utc>>) -> Result<CandleSeries> {
    let mut out = series.empty_like();
    for candle in series.iter().filter(|c| keep.contains(&c.timestamp)) {
        out.insert(*candle)?;
    }
    Ok(out)
}

fn fill_to(series: &CandleSeries, slots: &BTreeSet<DateTime<Utc>>) -> Result<CandleSeries> {
    let timeframe = series.timeframe();
    let candles = series.candles();
    let mut out = series.empty_like();
    let mut next = 0usize;
    let mut prev: Option<Candle> = None;

    for &timestamp in slots {
        let candle = match candles.get(next) {
            Some(c) if c.timestamp == timestamp => {
                next += 1;
                *c
            }
            _ => match prev {
                Some(p) => Candle::flat(timestamp, p.close, timeframe),
                None => continue,
            },
        };
        out.insert(candle)?;
        prev = Some(candle);
    }
    Ok(out)
}
