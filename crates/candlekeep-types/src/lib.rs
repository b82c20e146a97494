//! Core types for the candlekeep candle cache.
//!
//! This crate provides the data model shared by every candlekeep crate:
//!
//! - [`Timeframe`] - Ordered bar durations from one minute to one day
//! - [`Candle`] - A single OHLCV bar
//! - [`CandleSeries`] - Sorted, timestamp-unique candles of one timeframe
//! - [`TimeRange`] - Inclusive instant range used to scope requests
//! - [`CacheKey`] - Identity of a cached series
//! - [`Validator`] - Strict or lenient invariant checking and gap detection

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/candlekeep/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod candle;
mod error;
mod key;
mod range;
mod series;
mod timeframe;
mod validate;

pub use candle::Candle;
pub use error::{RangeError, ValidationError};
pub use key::CacheKey;
pub use range::{GridIterator, TimeRange};
pub use series::CandleSeries;
pub use timeframe::{Timeframe, TimeframeParseError};
pub use validate::{
    DEFAULT_MAX_PRICE, DEFAULT_MIN_PRICE, Gap, Validator, detect_gaps, irregular_spacing,
};
