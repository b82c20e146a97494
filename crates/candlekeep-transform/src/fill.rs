//! Forward filling of missing candles.

use candlekeep_types::{Candle, CandleSeries, GridIterator};

use crate::Result;

/// Fills short gaps by carrying the previous close forward.
///
/// For each pair of consecutive candles with `k` missing grid slots between
/// them, `k` flat zero-volume candles at the previous close are inserted if
/// `k <= max_gap`. Longer gaps are left untouched.
///
/// # Errors
///
/// Only fails if a synthesized candle violates an invariant, which cannot
/// happen for a valid input series.
pub fn forward_fill(series: &CandleSeries, max_gap: usize) -> Result<CandleSeries> {
    let timeframe = series.timeframe();
    let step = timeframe.duration();
    let mut candles = Vec::with_capacity(series.len());
    let mut filled = 0usize;

    for pair in series.candles().windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        candles.push(prev);

        let slots = ((next.timestamp - prev.timestamp).num_seconds() / timeframe.seconds()) as usize;
        let missing = slots.saturating_sub(1);
        if missing == 0 || missing > max_gap {
            continue;
        }
        let grid = GridIterator::new(prev.timestamp + step, next.timestamp - step, timeframe);
        for timestamp in grid {
            candles.push(Candle::flat(timestamp, prev.close, timeframe));
            filled += 1;
        }
    }
    if let Some(last) = series.last() {
        candles.push(*last);
    }

    if filled > 0 {
        tracing::debug!(symbol = series.symbol(), filled, "forward filled missing candles");
    }
    Ok(CandleSeries::from_candles(series.symbol(), timeframe, candles)?)
}
