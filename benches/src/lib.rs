//! Benchmark fixtures for candlekeep.

use candlekeep_types::{CacheKey, Candle, CandleSeries, Timeframe};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// Fixed origin shared by all generated series, aligned to every timeframe.
pub fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Generates `count` contiguous candles of a deterministic random walk.
pub fn random_walk(symbol: &str, timeframe: Timeframe, count: usize) -> CandleSeries {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut price = 100.0;
    let candles = (0..count)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let step = (state % 2001) as f64 / 1000.0 - 1.0;
            let open = price;
            price = (price + step * 0.1).max(1.0);
            let close = price;
            let high = open.max(close) + 0.05;
            let low = open.min(close) - 0.05;
            Candle::new(
                origin() + TimeDelta::seconds(timeframe.seconds() * i as i64),
                open,
                high,
                low,
                close,
                100.0 + (state % 500) as f64,
                timeframe,
            )
        })
        .collect();
    CandleSeries::from_candles(symbol, timeframe, candles).unwrap_or_else(|_| CandleSeries::new(symbol, timeframe))
}

/// Returns `count` distinct keys for the given timeframe.
pub fn keys(timeframe: Timeframe, count: usize) -> Vec<CacheKey> {
    (0..count)
        .map(|i| CacheKey::new(format!("SYM{i:04}"), timeframe, None))
        .collect()
}
