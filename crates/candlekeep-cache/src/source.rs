//! The upstream data source the cache fetches from on a miss.

use std::collections::BTreeSet;

use async_trait::async_trait;
use candlekeep_types::{Candle, CandleSeries, Timeframe};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures reported by a [`DataSource`].
///
/// The cache never inspects or retries these; they reach the caller
/// unchanged inside [`CacheError::Fetch`](crate::CacheError::Fetch).
#[derive(Error, Debug)]
pub enum FetchError {
    /// The source has no data for the symbol.
    #[error("symbol not available: {0}")]
    SymbolUnavailable(String),

    /// The source could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The source refused the request due to rate limiting.
    #[error("rate limited by data source")]
    RateLimited,

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// Any other source-specific failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A provider of historical and latest candles.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches candles for `symbol` at `timeframe`, optionally bounded by
    /// `start`/`end` and capped at `limit` candles.
    async fn fetch_historical(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> Result<CandleSeries, FetchError>;

    /// Fetches the most recent candle.
    async fn fetch_latest(&self, symbol: &str, timeframe: Timeframe) -> Result<Candle, FetchError>;

    /// Lists the symbols the source can serve.
    async fn list_symbols(&self) -> Result<BTreeSet<String>, FetchError>;
}
