//! Candle timeframe definitions.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Bar duration of a candle.
///
/// Variants are declared in ascending duration order, so the derived
/// `Ord` orders timeframes by duration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Timeframe {
    /// 1-minute bars.
    #[default]
    #[serde(rename = "1m")]
    M1,
    /// 5-minute bars.
    #[serde(rename = "5m")]
    M5,
    /// 15-minute bars.
    #[serde(rename = "15m")]
    M15,
    /// 1-hour bars.
    #[serde(rename = "1h")]
    H1,
    /// 4-hour bars.
    #[serde(rename = "4h")]
    H4,
    /// Daily bars.
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Returns the bar duration in minutes.
    #[must_use]
    pub const fn minutes(&self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M5 => 5,
            Self::M15 => 15,
            Self::H1 => 60,
            Self::H4 => 240,
            Self::D1 => 1440,
        }
    }

    /// Returns the bar duration in seconds.
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.minutes() as i64 * 60
    }

    /// Returns the bar duration.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.minutes() as i64)
    }

    /// Returns the timeframe as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    /// Returns all timeframes in ascending duration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::M1, Self::M5, Self::M15, Self::H1, Self::H4, Self::D1]
    }

    /// Returns true if bars of this timeframe can be aggregated into `target`.
    ///
    /// The target duration must be strictly larger and an exact multiple.
    #[must_use]
    pub const fn can_resample_to(&self, target: Self) -> bool {
        let from = self.minutes();
        let to = target.minutes();
        to > from && to % from == 0
    }

    /// Returns the start of the epoch-aligned bucket containing `timestamp`.
    #[must_use]
    pub fn bucket_start(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let seconds = self.seconds();
        let floored = timestamp.timestamp().div_euclid(seconds) * seconds;
        DateTime::from_timestamp(floored, 0).unwrap_or(timestamp)
    }

    /// Returns true if `timestamp` lies exactly on this timeframe's grid.
    #[must_use]
    pub fn is_aligned(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp.nanosecond() == 0 && timestamp.timestamp().rem_euclid(self.seconds()) == 0
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "m1" | "minute" | "minute1" => Ok(Self::M1),
            "5m" | "m5" | "minute5" => Ok(Self::M5),
            "15m" | "m15" | "minute15" => Ok(Self::M15),
            "1h" | "h1" | "hour" | "hour1" => Ok(Self::H1),
            "4h" | "h4" | "hour4" => Ok(Self::H4),
            "1d" | "d1" | "day" | "day1" | "daily" => Ok(Self::D1),
            _ => Err(TimeframeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid timeframe string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeParseError(String);

impl std::fmt::Display for TimeframeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid timeframe '{}', expected one of: 1m, 5m, 15m, 1h, 4h, 1d",
            self.0
        )
    }
}

impl std::error::Error for TimeframeParseError {}
