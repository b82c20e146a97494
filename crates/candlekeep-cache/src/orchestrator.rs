//! The two-tier cache in front of a data source.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use candlekeep_types::{CacheKey, Candle, CandleSeries, TimeRange, Timeframe, Validator};
use chrono::TimeDelta;
use parking_lot::Mutex;
use serde::Serialize;

use crate::{
    CacheConfig, Clock, DataSource, MemoryStats, MemoryTier, PersistentTier, Result, SystemClock,
};

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Snapshot of cache occupancy and activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Memory tier counters.
    pub memory: MemoryStats,
    /// Entry files in the persistent tier.
    pub persistent_entries: usize,
    /// Directory of the persistent tier.
    pub cache_dir: PathBuf,
}

/// Candle cache combining a memory tier, a persistent tier and a data source.
///
/// Reads resolve memory first, then disk (promoting hits into memory), then
/// the source. Fetched series are validated and written through both tiers.
/// Concurrent misses on one key collapse into a single fetch.
#[derive(Debug)]
pub struct CandleCache<S> {
    config: CacheConfig,
    validator: Validator,
    memory: MemoryTier,
    persistent: PersistentTier,
    source: S,
    clock: Arc<dyn Clock>,
    gates: Mutex<HashMap<CacheKey, Gate>>,
}

impl<S: DataSource> CandleCache<S> {
    /// Creates a cache from `config` in front of `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache
    /// directory cannot be created.
    pub fn new(config: CacheConfig, source: S) -> Result<Self> {
        Self::with_clock(config, source, Arc::new(SystemClock))
    }

    /// Creates a cache whose tiers read time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache
    /// directory cannot be created.
    pub fn with_clock(config: CacheConfig, source: S, clock: Arc<dyn Clock>) -> Result<Self> {
        let capacity = config.memory_capacity()?;
        let persistent = PersistentTier::with_clock(&config.cache_dir, Arc::clone(&clock))?;
        let memory = MemoryTier::with_clock(capacity, Arc::clone(&clock));

        tracing::info!(
            cache_dir = %config.cache_dir.display(),
            capacity = capacity.get(),
            strict = config.strict_validation,
            "candle cache ready"
        );
        Ok(Self {
            validator: config.validator(),
            config,
            memory,
            persistent,
            source,
            clock,
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the series for `symbol` at `timeframe`, scoped to `range`.
    ///
    /// With `force_refresh` both tiers are skipped and the source is always
    /// queried; the result is still written through.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Fetch`](crate::CacheError::Fetch) if the source
    /// fails, and [`CacheError::Validation`](crate::CacheError::Validation)
    /// if the fetched series is invalid under strict validation.
    pub async fn get(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        range: Option<TimeRange>,
        force_refresh: bool,
    ) -> Result<Arc<CandleSeries>> {
        let key = CacheKey::new(symbol, timeframe, range);
        if !force_refresh {
            if let Some(series) = self.lookup(&key) {
                return Ok(series);
            }
        }

        let slot = self.gate(&key);
        let _permit = slot.gate.lock().await;
        match self.lookup_after_wait(&key, force_refresh) {
            Some(series) => Ok(series),
            None => self.fetch(&key).await,
        }
    }

    /// Stores `series` under its symbol and timeframe with no range.
    ///
    /// # Errors
    ///
    /// Returns an error if the series is invalid under strict validation or
    /// the persistent write fails.
    pub fn set(&self, series: CandleSeries) -> Result<()> {
        self.set_range(series, None)
    }

    /// Stores `series` under its symbol, timeframe and `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the series is invalid under strict validation or
    /// the persistent write fails.
    pub fn set_range(&self, series: CandleSeries, range: Option<TimeRange>) -> Result<()> {
        let key = CacheKey::new(series.symbol(), series.timeframe(), range);
        if !self.validator.validate_series(&series)? {
            tracing::warn!(%key, "not caching invalid series");
            return Ok(());
        }
        let ttl = self.config.ttl.ttl_for(key.timeframe());
        let series = Arc::new(series);
        self.persistent.put(&key, Arc::clone(&series), ttl)?;
        self.memory.put(key, series, ttl);
        Ok(())
    }

    /// Removes the entry for the given slot from both tiers.
    ///
    /// Returns whether either tier held one.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistent entry cannot be removed.
    pub fn invalidate(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        range: Option<TimeRange>,
    ) -> Result<bool> {
        let key = CacheKey::new(symbol, timeframe, range);
        let in_memory = self.memory.invalidate(&key);
        let on_disk = self.persistent.invalidate(&key)?;
        tracing::debug!(%key, in_memory, on_disk, "invalidated");
        Ok(in_memory || on_disk)
    }

    /// Empties both tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if persistent entries cannot be removed.
    pub fn clear(&self) -> Result<()> {
        self.memory.clear();
        let removed = self.persistent.clear()?;
        tracing::info!(removed, "cleared candle cache");
        Ok(())
    }

    /// Returns occupancy and activity counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory: self.memory.stats(),
            persistent_entries: self.persistent.len(),
            cache_dir: self.persistent.path().to_path_buf(),
        }
    }

    /// Fetches the most recent candle straight from the source.
    ///
    /// # Errors
    ///
    /// Returns the source failure unchanged.
    pub async fn fetch_latest(&self, symbol: &str, timeframe: Timeframe) -> Result<Candle> {
        Ok(self.source.fetch_latest(symbol, timeframe).await?)
    }

    /// Lists the symbols the source can serve.
    ///
    /// # Errors
    ///
    /// Returns the source failure unchanged.
    pub async fn list_symbols(&self) -> Result<BTreeSet<String>> {
        Ok(self.source.list_symbols().await?)
    }

    /// Returns the configuration the cache was built with.
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the underlying data source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<CandleSeries>> {
        if let Some(series) = self.memory.get(key) {
            return Some(series);
        }
        let entry = self.persistent.get(key)?;
        let ttl = entry.remaining_ttl(self.clock.now());
        tracing::debug!(%key, remaining = %ttl, "promoting persistent hit");
        self.memory.put(key.clone(), Arc::clone(&entry.series), ttl);
        Some(entry.series)
    }

    /// The previous gate holder may have filled the slot while we waited.
    fn lookup_after_wait(&self, key: &CacheKey, force_refresh: bool) -> Option<Arc<CandleSeries>> {
        if force_refresh {
            None
        } else {
            self.memory.get(key)
        }
    }

    async fn fetch(&self, key: &CacheKey) -> Result<Arc<CandleSeries>> {
        let (start, end) = key.range().map_or((None, None), |r| (Some(r.start), Some(r.end)));
        tracing::debug!(%key, "fetching from source");
        let series = self
            .source
            .fetch_historical(key.symbol(), key.timeframe(), start, end, None)
            .await?;

        let series = Arc::new(series);
        if !self
            .validator
            .validate_request(&series, key.symbol(), key.timeframe())?
        {
            tracing::warn!(%key, "returning invalid series without caching");
            return Ok(series);
        }

        self.write_through(key, &series, self.config.ttl.ttl_for(key.timeframe()));
        Ok(series)
    }

    fn write_through(&self, key: &CacheKey, series: &Arc<CandleSeries>, ttl: TimeDelta) {
        if let Err(error) = self.persistent.put(key, Arc::clone(series), ttl) {
            tracing::warn!(%key, %error, "persistent write failed; caching in memory only");
        }
        self.memory.put(key.clone(), Arc::clone(series), ttl);
    }

    fn gate(&self, key: &CacheKey) -> GateSlot<'_> {
        let gate = Arc::clone(self.gates.lock().entry(key.clone()).or_default());
        GateSlot {
            gates: &self.gates,
            key: key.clone(),
            gate,
        }
    }
}

/// A caller's share of a per-key gate.
///
/// Dropping it, including when the owning `get` future is cancelled, prunes
/// the map entry once no other caller shares the gate.
struct GateSlot<'a> {
    gates: &'a Mutex<HashMap<CacheKey, Gate>>,
    key: CacheKey,
    gate: Gate,
}

impl Drop for GateSlot<'_> {
    fn drop(&mut self) {
        // Release our share before counting the remaining ones.
        drop(std::mem::take(&mut self.gate));
        let mut gates = self.gates.lock();
        if gates.get(&self.key).is_some_and(|g| Arc::strong_count(g) == 1) {
            gates.remove(&self.key);
        }
    }
}
