//! Cache slot identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::{TimeRange, Timeframe};

/// Identity of a cached series: symbol, timeframe and optional range.
///
/// Two requests with equal keys address the same cache slot in every tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    symbol: String,
    timeframe: Timeframe,
    range: Option<TimeRange>,
}

impl CacheKey {
    /// Creates a key for the given symbol, timeframe and range.
    #[must_use]
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, range: Option<TimeRange>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            range,
        }
    }

    /// Returns the symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the timeframe.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Returns the range descriptor, if any.
    #[must_use]
    pub const fn range(&self) -> Option<TimeRange> {
        self.range
    }

    /// Returns a stable, filesystem-safe encoding of the key.
    ///
    /// Format: `<symbol>_<timeframe>[_<start>-<end>]` with range bounds as
    /// epoch seconds, followed by `.<nanos>` when a bound has a sub-second
    /// part. Symbol bytes outside `[A-Za-z0-9-]` are written as `%XX`, so
    /// distinct keys never share a name.
    #[must_use]
    pub fn storage_name(&self) -> String {
        let mut name = String::with_capacity(self.symbol.len() + 32);
        for byte in self.symbol.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                let _ = write!(name, "%{byte:02X}");
            }
        }
        let _ = write!(name, "_{}", self.timeframe);
        if let Some(range) = self.range {
            name.push('_');
            push_instant(&mut name, range.start);
            name.push('-');
            push_instant(&mut name, range.end);
        }
        name
    }
}

fn push_instant(name: &mut String, instant: DateTime<Utc>) {
    let _ = write!(name, "{}", instant.timestamp());
    let nanos = instant.timestamp_subsec_nanos();
    if nanos != 0 {
        let _ = write!(name, ".{nanos:09}");
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.range {
            Some(range) => write!(f, "{} {} [{}]", self.symbol, self.timeframe, range),
            None => write!(f, "{} {}", self.symbol, self.timeframe),
        }
    }
}
