//! Time slicing and rolling windows.

use std::ops::Range;

use candlekeep_types::{Candle, CandleSeries};
use chrono::{DateTime, Utc};

/// Returns the candles with `start <= timestamp <= end`.
///
/// Bounds are located by binary search. An empty range, or `start > end`,
/// yields an empty series.
#[must_use]
pub fn slice(series: &CandleSeries, start: DateTime<Utc>, end: DateTime<Utc>) -> CandleSeries {
    let out = series.subseries(slice_bounds(series.candles(), start, end));
    tracing::debug!(
        symbol = series.symbol(),
        input = series.len(),
        output = out.len(),
        %start,
        %end,
        "sliced series"
    );
    out
}

fn slice_bounds(candles: &[Candle], start: DateTime<Utc>, end: DateTime<Utc>) -> Range<usize> {
    if start > end {
        return 0..0;
    }
    let lo = candles.partition_point(|c| c.timestamp < start);
    let hi = candles.partition_point(|c| c.timestamp <= end);
    lo..hi.max(lo)
}

/// Returns the rolling windows of `size` candles, advancing `step` candles each time.
///
/// A trailing window shorter than `size` is not produced. A `size` or `step`
/// of zero produces no windows.
#[must_use]
pub fn rolling_windows(series: &CandleSeries, size: usize, step: usize) -> RollingWindows<'_> {
    RollingWindows {
        candles: series.candles(),
        size,
        step,
    }
}

/// A lazy, restartable sequence of fixed-size windows over a series.
///
/// Nothing is copied: each window borrows from the series. Calling
/// [`RollingWindows::iter`] again starts over from the first window.
#[derive(Debug, Clone, Copy)]
pub struct RollingWindows<'a> {
    candles: &'a [Candle],
    size: usize,
    step: usize,
}

impl<'a> RollingWindows<'a> {
    /// Returns the window size in candles.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the offset between successive windows in candles.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Returns the number of windows the sequence yields.
    #[must_use]
    pub const fn count(&self) -> usize {
        if self.size == 0 || self.step == 0 || self.candles.len() < self.size {
            return 0;
        }
        (self.candles.len() - self.size) / self.step + 1
    }

    /// Returns true if the sequence yields no windows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns an iterator from the first window.
    #[must_use]
    pub const fn iter(&self) -> WindowIter<'a> {
        WindowIter {
            windows: *self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for RollingWindows<'a> {
    type Item = &'a [Candle];
    type IntoIter = WindowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &RollingWindows<'a> {
    type Item = &'a [Candle];
    type IntoIter = WindowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the windows of a [`RollingWindows`].
#[derive(Debug, Clone)]
pub struct WindowIter<'a> {
    windows: RollingWindows<'a>,
    next: usize,
}

impl<'a> Iterator for WindowIter<'a> {
    type Item = &'a [Candle];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.windows.count() {
            return None;
        }
        let start = self.next * self.windows.step;
        self.next += 1;
        Some(&self.windows.candles[start..start + self.windows.size])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.windows.count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowIter<'_> {}
