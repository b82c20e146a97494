//! Time ranges and timeframe grid iteration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RangeError, Timeframe};

/// An inclusive range of instants used to scope a series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start instant (inclusive).
    pub start: DateTime<Utc>,
    /// End instant (inclusive).
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a new time range, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns true if the range contains the given instant.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Returns an iterator over every grid instant of `timeframe` in the range.
    #[must_use]
    pub fn grid(&self, timeframe: Timeframe) -> GridIterator {
        GridIterator::new(self.start, self.end, timeframe)
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Iterator over the grid instants of a timeframe between two bounds.
///
/// The first instant is the first grid point at or after `start`; the last
/// is the last grid point at or before `end`.
#[derive(Debug, Clone)]
pub struct GridIterator {
    current: DateTime<Utc>,
    end: DateTime<Utc>,
    timeframe: Timeframe,
}

impl GridIterator {
    /// Creates a new grid iterator.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, timeframe: Timeframe) -> Self {
        let floor = timeframe.bucket_start(start);
        let current = if floor < start {
            floor + timeframe.duration()
        } else {
            floor
        };
        Self {
            current,
            end,
            timeframe,
        }
    }
}

impl Iterator for GridIterator {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current > self.end {
            return None;
        }

        let result = self.current;
        self.current += self.timeframe.duration();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.current > self.end {
            return (0, Some(0));
        }
        let steps = ((self.end - self.current).num_seconds() / self.timeframe.seconds()) as usize + 1;
        (steps, Some(steps))
    }
}

impl ExactSizeIterator for GridIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_time_range_new() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let range = TimeRange::new(start, end).unwrap();

        assert_eq!(range.start, start);
        assert_eq!(range.end, end);
        assert!(range.contains(start));
        assert!(range.contains(end));
    }

    #[test]
    fn test_time_range_invalid() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            TimeRange::new(start, end),
            Err(RangeError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_grid_iterator() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
        let range = TimeRange::new(start, end).unwrap();
        let hours: Vec<_> = range.grid(Timeframe::H1).collect();

        assert_eq!(hours.len(), 24);
        assert_eq!(hours[0].hour(), 0);
        assert_eq!(hours[23].hour(), 23);
    }

    #[test]
    fn test_grid_iterator_rounds_start_up() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 3, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 20, 0).unwrap();
        let grid = GridIterator::new(start, end, Timeframe::M5);

        assert_eq!(grid.len(), 4);
        let minutes: Vec<_> = grid.map(|t| t.minute()).collect();
        assert_eq!(minutes, vec![5, 10, 15, 20]);
    }
}
