//! Cache configuration.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use candlekeep_types::{Timeframe, Validator};
use chrono::TimeDelta;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{CacheError, Result};

/// Per-timeframe time-to-live, in minutes.
///
/// Timeframes missing from the table fall back to `default_minutes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlTable {
    /// TTL in minutes for each configured timeframe.
    pub minutes: BTreeMap<Timeframe, u64>,
    /// TTL in minutes for timeframes not in `minutes`.
    pub default_minutes: u64,
}

impl TtlTable {
    /// Returns the TTL for `timeframe`.
    #[must_use]
    pub fn ttl_for(&self, timeframe: Timeframe) -> TimeDelta {
        let minutes = self
            .minutes
            .get(&timeframe)
            .copied()
            .unwrap_or(self.default_minutes);
        i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Sets the TTL for `timeframe`.
    #[must_use]
    pub fn with(mut self, timeframe: Timeframe, minutes: u64) -> Self {
        self.minutes.insert(timeframe, minutes);
        self
    }
}

impl Default for TtlTable {
    fn default() -> Self {
        Self {
            minutes: BTreeMap::from([
                (Timeframe::M1, 5),
                (Timeframe::M5, 10),
                (Timeframe::M15, 30),
                (Timeframe::H1, 120),
                (Timeframe::H4, 480),
                (Timeframe::D1, 1440),
            ]),
            default_minutes: 60,
        }
    }
}

/// Settings for a [`CandleCache`](crate::CandleCache).
///
/// Deserializing a partial document fills the rest from [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory of the persistent tier.
    pub cache_dir: PathBuf,
    /// Maximum number of series held in memory.
    pub max_memory_entries: usize,
    /// Expiry per timeframe.
    pub ttl: TtlTable,
    /// Whether fetched data that violates an invariant is an error.
    pub strict_validation: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: Self::default_cache_dir(),
            max_memory_entries: 100,
            ttl: TtlTable::default(),
            strict_validation: false,
        }
    }
}

impl CacheConfig {
    /// Returns the platform default cache directory.
    ///
    /// - Linux: `~/.local/share/candlekeep/cache`
    /// - macOS: `~/Library/Application Support/candlekeep/cache`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\candlekeep\cache`
    ///
    /// Falls back to `~/.candlekeep/cache` if the platform location cannot
    /// be determined.
    #[must_use]
    pub fn default_cache_dir() -> PathBuf {
        ProjectDirs::from("", "", "candlekeep")
            .map_or_else(home_fallback, |dirs| dirs.data_dir().to_path_buf())
            .join("cache")
    }

    /// Sets the persistent tier directory.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sets the memory tier capacity.
    #[must_use]
    pub const fn with_max_memory_entries(mut self, entries: usize) -> Self {
        self.max_memory_entries = entries;
        self
    }

    /// Replaces the TTL table.
    #[must_use]
    pub fn with_ttl(mut self, ttl: TtlTable) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the validation mode.
    #[must_use]
    pub const fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    /// Returns the validator matching `strict_validation`.
    #[must_use]
    pub const fn validator(&self) -> Validator {
        Validator::new(self.strict_validation)
    }

    /// Returns the memory tier capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if `max_memory_entries` is zero.
    pub fn memory_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.max_memory_entries).ok_or_else(|| {
            CacheError::InvalidConfig("max_memory_entries must be at least 1".to_string())
        })
    }
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".candlekeep")
}
