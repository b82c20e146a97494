//! Ordered, timestamp-unique candle collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Candle, TimeRange, Timeframe, ValidationError};

/// An ordered sequence of candles for one symbol and timeframe.
///
/// Every candle in the series is valid, shares the series timeframe, and
/// candles are strictly ascending by timestamp. All mutating operations
/// re-establish these invariants before returning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesData", into = "SeriesData")]
pub struct CandleSeries {
    symbol: String,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

/// Unchecked wire form of a series; converted through [`CandleSeries::from_candles`].
#[derive(Serialize, Deserialize)]
struct SeriesData {
    symbol: String,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl TryFrom<SeriesData> for CandleSeries {
    type Error = ValidationError;

    fn try_from(data: SeriesData) -> Result<Self, Self::Error> {
        Self::from_candles(data.symbol, data.timeframe, data.candles)
    }
}

impl From<CandleSeries> for SeriesData {
    fn from(series: CandleSeries) -> Self {
        Self {
            symbol: series.symbol,
            timeframe: series.timeframe,
            candles: series.candles,
        }
    }
}

impl CandleSeries {
    /// Creates an empty series.
    #[must_use]
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candles: Vec::new(),
        }
    }

    /// Builds a series from candles in any order.
    ///
    /// # Errors
    ///
    /// Returns an error if a candle is invalid, has a different timeframe,
    /// or shares its timestamp with another candle.
    pub fn from_candles(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        mut candles: Vec<Candle>,
    ) -> Result<Self, ValidationError> {
        for candle in &candles {
            check_candle(timeframe, candle)?;
        }
        candles.sort_by_key(|c| c.timestamp);
        if let Some(pair) = candles.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(ValidationError::DuplicateTimestamp(pair[1].timestamp));
        }
        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            candles,
        })
    }

    /// Returns an empty series with this series' symbol and timeframe.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self::new(self.symbol.clone(), self.timeframe)
    }

    /// Inserts a candle at its sorted position.
    ///
    /// A candle already present at the same timestamp is replaced and
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the candle is invalid or has a different timeframe.
    pub fn insert(&mut self, candle: Candle) -> Result<Option<Candle>, ValidationError> {
        check_candle(self.timeframe, &candle)?;
        // Appending in order is the common case.
        if self.candles.last().is_none_or(|last| last.timestamp < candle.timestamp) {
            self.candles.push(candle);
            return Ok(None);
        }
        match self
            .candles
            .binary_search_by_key(&candle.timestamp, |c| c.timestamp)
        {
            Ok(idx) => Ok(Some(std::mem::replace(&mut self.candles[idx], candle))),
            Err(idx) => {
                self.candles.insert(idx, candle);
                Ok(None)
            }
        }
    }

    /// Inserts every candle from `candles`.
    ///
    /// # Errors
    ///
    /// Stops at the first invalid candle; candles before it stay inserted.
    pub fn extend<I>(&mut self, candles: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = Candle>,
    {
        for candle in candles {
            self.insert(candle)?;
        }
        Ok(())
    }

    /// Merges `other` into this series; `other` wins on equal timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbols or timeframes differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), ValidationError> {
        if other.symbol != self.symbol {
            return Err(ValidationError::SymbolMismatch {
                expected: self.symbol.clone(),
                found: other.symbol.clone(),
            });
        }
        if other.timeframe != self.timeframe {
            return Err(ValidationError::TimeframeMismatch {
                expected: self.timeframe,
                found: other.timeframe,
            });
        }

        let mut merged = Vec::with_capacity(self.candles.len() + other.candles.len());
        let (mut i, mut j) = (0, 0);
        while i < self.candles.len() && j < other.candles.len() {
            let (ours, theirs) = (&self.candles[i], &other.candles[j]);
            if ours.timestamp < theirs.timestamp {
                merged.push(*ours);
                i += 1;
            } else if theirs.timestamp < ours.timestamp {
                merged.push(*theirs);
                j += 1;
            } else {
                merged.push(*theirs);
                i += 1;
                j += 1;
            }
        }
        merged.extend_from_slice(&self.candles[i..]);
        merged.extend_from_slice(&other.candles[j..]);
        self.candles = merged;
        Ok(())
    }

    /// Returns the instrument symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the series timeframe.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Returns the number of candles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.candles.len()
    }

    /// Returns true if the series has no candles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Returns the candles in ascending timestamp order.
    #[must_use]
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Returns an iterator over the candles.
    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    /// Returns the candle at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Returns the earliest candle.
    #[must_use]
    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    /// Returns the latest candle.
    #[must_use]
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Returns the latest `n` candles (all of them if fewer exist).
    #[must_use]
    pub fn latest(&self, n: usize) -> &[Candle] {
        &self.candles[self.candles.len().saturating_sub(n)..]
    }

    /// Returns a copy of the candles at `indices`, clamped to the series.
    ///
    /// A contiguous run of a valid series is already ordered and unique, so
    /// no candle is re-checked.
    #[must_use]
    pub fn subseries(&self, indices: std::ops::Range<usize>) -> Self {
        let end = indices.end.min(self.candles.len());
        let start = indices.start.min(end);
        Self {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            candles: self.candles[start..end].to_vec(),
        }
    }

    /// Returns an iterator over the candle timestamps.
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.candles.iter().map(|c| c.timestamp)
    }

    /// Returns the timestamp of the earliest candle.
    #[must_use]
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.first().map(|c| c.timestamp)
    }

    /// Returns the timestamp of the latest candle.
    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.last().map(|c| c.timestamp)
    }

    /// Returns the covered time range, or `None` for an empty series.
    #[must_use]
    pub fn time_range(&self) -> Option<TimeRange> {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => Some(TimeRange { start, end }),
            _ => None,
        }
    }

    /// Returns the index of the candle at `timestamp`.
    #[must_use]
    pub fn position(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.candles
            .binary_search_by_key(&timestamp, |c| c.timestamp)
            .ok()
    }

    /// Consumes the series and returns its candles.
    #[must_use]
    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;

    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

fn check_candle(timeframe: Timeframe, candle: &Candle) -> Result<(), ValidationError> {
    if candle.timeframe != timeframe {
        return Err(ValidationError::TimeframeMismatch {
            expected: timeframe,
            found: candle.timeframe,
        });
    }
    candle.validate()
}
