//! Caching and transformation of OHLCV candle series.
//!
//! This is a facade crate that re-exports functionality from the candlekeep
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use candlekeep_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = CandleCache::new(CacheConfig::default(), MyBroker::connect()?)?;
//!
//!     let hourly = cache.get("EURUSD", Timeframe::H1, None, false).await?;
//!     let four_hour = resample(&hourly, Timeframe::H4)?;
//!     println!("{:?}", summary_statistics(&four_hour)?);
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/candlekeep/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use candlekeep_types::*;

// Re-export the cache
#[cfg(feature = "cache")]
pub use candlekeep_cache::{
    CacheConfig, CacheEntry, CacheError, CacheStats, CandleCache, Clock, DataSource,
    DecodeError, FetchError, ManualClock, MemoryStats, MemoryTier, PersistentTier, SystemClock,
    TtlTable,
};

// Re-export the time-series engine
#[cfg(feature = "transform")]
pub use candlekeep_transform::{
    AlignMethod, CandleAggregator, Observation, RollingWindows, SummaryStatistics,
    TransformError, VolatilityMethod, WindowIter, align, align_with, forward_fill, resample,
    returns, rolling_windows, slice, summary_statistics, volatility,
};

/// Prelude module for convenient imports.
///
/// ```
/// use candlekeep_lib::prelude::*;
/// ```
pub mod prelude {
    pub use candlekeep_types::{
        CacheKey, Candle, CandleSeries, TimeRange, Timeframe, ValidationError, Validator,
        detect_gaps,
    };

    #[cfg(feature = "cache")]
    pub use candlekeep_cache::{CacheConfig, CacheError, CandleCache, DataSource, FetchError};

    #[cfg(feature = "transform")]
    pub use candlekeep_transform::{
        AlignMethod, TransformError, VolatilityMethod, align, forward_fill, resample, returns,
        rolling_windows, slice, summary_statistics, volatility,
    };
}
