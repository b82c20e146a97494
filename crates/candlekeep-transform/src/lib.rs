//! Time-series engine for candlekeep candle series.
//!
//! Every operation is a pure function over [`CandleSeries`] values:
//!
//! - [`resample`] - Aggregate into a coarser timeframe
//! - [`forward_fill`] - Carry the previous close across short gaps
//! - [`slice`] and [`rolling_windows`] - Time ranges and fixed-size windows
//! - [`align`] - Restrict several series to shared timestamps
//! - [`returns`], [`volatility`], [`summary_statistics`] - Analytics
//!
//! [`CandleSeries`]: candlekeep_types::CandleSeries

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/candlekeep/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod align;
mod analytics;
mod error;
mod fill;
mod resample;
mod window;

pub use align::{AlignMethod, align, align_with};
pub use analytics::{
    Observation, SummaryStatistics, VolatilityMethod, returns, summary_statistics, volatility,
};
pub use error::{Result, TransformError};
pub use fill::forward_fill;
pub use resample::{CandleAggregator, resample};
pub use window::{RollingWindows, WindowIter, rolling_windows, slice};
