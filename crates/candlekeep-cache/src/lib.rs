//! Two-tier candle cache for candlekeep.
//!
//! This crate keeps validated candle series close at hand:
//!
//! - [`MemoryTier`] - Bounded LRU store with lazy TTL expiry
//! - [`PersistentTier`] - One crash-atomic JSON file per entry
//! - [`CacheEntry`] - Versioned snapshot envelope shared by both tiers
//! - [`CacheConfig`] - Capacity, directory, per-timeframe TTLs and validation mode
//! - [`DataSource`] - The upstream provider consulted on a miss
//! - [`CandleCache`] - Memory, then disk, then source, with one fetch per key

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/candlekeep/candlekeep/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod clock;
mod config;
mod entry;
mod error;
mod memory;
mod orchestrator;
mod persistent;
mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, TtlTable};
pub use entry::{CacheEntry, DecodeError, ENTRY_FORMAT, ENTRY_VERSION};
pub use error::{CacheError, Result};
pub use memory::{MemoryStats, MemoryTier};
pub use orchestrator::{CacheStats, CandleCache};
pub use persistent::PersistentTier;
pub use source::{DataSource, FetchError};
