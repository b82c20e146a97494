//! Durable on-disk tier.
//!
//! Each key maps to one `<storage_name>.entry.json` file in the cache
//! directory. Writes go to a uniquely named temporary file that is synced
//! and then renamed over the target, so readers only ever observe a complete
//! old entry or a complete new one.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use candlekeep_types::{CacheKey, CandleSeries};
use chrono::TimeDelta;

use crate::{CacheEntry, CacheError, Clock, Result, SystemClock};

const ENTRY_SUFFIX: &str = ".entry.json";
const TEMP_SUFFIX: &str = ".tmp";

/// File-backed store of series snapshots that survives restarts.
#[derive(Debug, Clone)]
pub struct PersistentTier {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl PersistentTier {
    /// Opens a tier rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    /// Opens a tier reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir, clock })
    }

    /// Returns the directory holding the entries.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Returns the file an entry for `key` is stored in.
    #[must_use]
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}{ENTRY_SUFFIX}", key.storage_name()))
    }

    /// Loads the entry for `key`.
    ///
    /// Never fails: foreign, newer, corrupt or expired entries are removed
    /// and reported as absent. A file that cannot be read is reported as
    /// absent and left in place.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(error) => {
                tracing::warn!(%key, path = %path.display(), %error, "failed to read cache entry");
                return None;
            }
        };

        let entry = match CacheEntry::decode(&bytes, key) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(%key, path = %path.display(), %error, "discarding undecodable cache entry");
                discard_unchanged(&path, &bytes);
                return None;
            }
        };

        if entry.is_expired(self.clock.now()) {
            tracing::debug!(%key, expires_at = %entry.expires_at, "persistent entry expired");
            discard_unchanged(&path, &bytes);
            return None;
        }
        tracing::debug!(%key, "persistent hit");
        Some(entry)
    }

    /// Writes `series` under `key` for `ttl`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded or written. The
    /// previous entry, if any, is left intact in that case.
    pub fn put(&self, key: &CacheKey, series: Arc<CandleSeries>, ttl: TimeDelta) -> Result<()> {
        let entry = CacheEntry::new(key.clone(), series, self.clock.now(), ttl);
        let bytes = entry.encode()?;

        let target = self.entry_path(key);
        let temp = self.dir.join(format!(
            ".{}.{}{TEMP_SUFFIX}",
            key.storage_name(),
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = write_synced(&temp, &bytes).and_then(|()| fs::rename(&temp, &target)) {
            let _ = fs::remove_file(&temp);
            return Err(CacheError::io(target, e));
        }
        tracing::debug!(%key, bytes = bytes.len(), "wrote persistent entry");
        Ok(())
    }

    /// Removes the entry for `key`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Removes every entry and any leftover temporary file.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a file cannot be
    /// removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.files()? {
            let is_entry = is_entry_file(&path);
            if is_entry || has_suffix(&path, TEMP_SUFFIX) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += usize::from(is_entry),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(CacheError::io(path, e)),
                }
            }
        }
        Ok(removed)
    }

    /// Returns the number of entry files, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files()
            .map(|files| files.iter().filter(|p| is_entry_file(p)).count())
            .unwrap_or(0)
    }

    /// Returns true if the tier holds no entry files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.dir, e))?;
            files.push(entry.path());
        }
        Ok(files)
    }
}

/// Removes `path` unless a writer replaced it after `seen` was read.
///
/// Readers do not hold the per-key gate, so a fresh entry may have been
/// renamed into place in the meantime.
fn discard_unchanged(path: &Path, seen: &[u8]) {
    match fs::read(path) {
        Ok(current) if current == seen => {}
        Ok(_) => {
            tracing::debug!(path = %path.display(), "entry replaced while reading; keeping it");
            return;
        }
        Err(_) => return,
    }
    if let Err(error) = fs::remove_file(path) {
        if error.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), %error, "failed to remove cache entry");
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(suffix))
}

fn is_entry_file(path: &Path) -> bool {
    has_suffix(path, ENTRY_SUFFIX)
}
