//! Cache entries and their persisted envelope.
//!
//! Persisted entries are self-describing JSON documents:
//!
//! ```json
//! {"format":"candlekeep-entry","version":1,"key":{..},
//!  "created_at":"..","expires_at":"..","series":{..}}
//! ```
//!
//! The header is decoded before the payload so a foreign file or a newer
//! version is detected instead of being mis-read.

use std::sync::Arc;

use candlekeep_types::{CacheKey, CandleSeries};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format tag written into every persisted entry.
pub const ENTRY_FORMAT: &str = "candlekeep-entry";

/// Current envelope version.
pub const ENTRY_VERSION: u32 = 1;

/// Reasons a persisted entry cannot be decoded.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The document is not a candlekeep entry.
    #[error("unknown entry format '{0}'")]
    UnknownFormat(String),

    /// The entry was written by an unsupported version.
    #[error("unsupported entry version {0}")]
    UnsupportedVersion(u32),

    /// The entry belongs to a different key than the file it was read from.
    #[error("entry key mismatch: expected {expected}, found {found}")]
    KeyMismatch {
        /// Key the file was looked up by.
        expected: CacheKey,
        /// Key stored inside the entry.
        found: CacheKey,
    },

    /// The document is not valid JSON, or the payload fails validation.
    #[error("malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A cached series snapshot with its timing metadata.
///
/// Entries are only ever replaced as a whole.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Slot this entry occupies.
    pub key: CacheKey,
    /// The cached snapshot.
    pub series: Arc<CandleSeries>,
    /// When the entry was created.
    pub inserted_at: DateTime<Utc>,
    /// When the entry was last read.
    pub last_accessed: DateTime<Utc>,
    /// When the entry stops being served.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry inserted at `now` that lives for `ttl`.
    #[must_use]
    pub fn new(key: CacheKey, series: Arc<CandleSeries>, now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            key,
            series,
            inserted_at: now,
            last_accessed: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Returns true once `now` is past the expiry instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Returns the time left before expiry, zero if already expired.
    #[must_use]
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.expires_at - now).max(TimeDelta::zero())
    }

    /// Serializes the entry into its persisted envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&Envelope {
            format: ENTRY_FORMAT,
            version: ENTRY_VERSION,
            key: &self.key,
            created_at: self.inserted_at,
            expires_at: self.expires_at,
            series: self.series.as_ref(),
        })
    }

    /// Decodes a persisted envelope that is expected to hold `key`.
    ///
    /// The series payload is re-validated while decoding.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] for foreign, newer, misplaced or malformed
    /// documents.
    pub fn decode(bytes: &[u8], key: &CacheKey) -> Result<Self, DecodeError> {
        let header: Header = serde_json::from_slice(bytes)?;
        if header.format != ENTRY_FORMAT {
            return Err(DecodeError::UnknownFormat(header.format));
        }
        if header.version != ENTRY_VERSION {
            return Err(DecodeError::UnsupportedVersion(header.version));
        }

        let stored: StoredEntry = serde_json::from_slice(bytes)?;
        if stored.key != *key {
            return Err(DecodeError::KeyMismatch {
                expected: key.clone(),
                found: stored.key,
            });
        }
        Ok(Self {
            key: stored.key,
            series: Arc::new(stored.series),
            inserted_at: stored.created_at,
            last_accessed: stored.created_at,
            expires_at: stored.expires_at,
        })
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'static str,
    version: u32,
    key: &'a CacheKey,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    series: &'a CandleSeries,
}

#[derive(Deserialize)]
struct Header {
    format: String,
    version: u32,
}

#[derive(Deserialize)]
struct StoredEntry {
    key: CacheKey,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    series: CandleSeries,
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlekeep_types::{Candle, Timeframe};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn entry() -> CacheEntry {
        let candle = Candle::new(now(), 1.0, 1.2, 0.9, 1.1, 42.0, Timeframe::M15);
        let series = CandleSeries::from_candles("GBPUSD", Timeframe::M15, vec![candle]).unwrap();
        let key = CacheKey::new("GBPUSD", Timeframe::M15, None);
        CacheEntry::new(key, Arc::new(series), now(), TimeDelta::minutes(30))
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = entry();
        assert!(!entry.is_expired(now() + TimeDelta::minutes(29)));
        assert!(!entry.is_expired(entry.expires_at));
        assert!(entry.is_expired(entry.expires_at + TimeDelta::seconds(1)));
    }

    #[test]
    fn test_remaining_ttl() {
        let entry = entry();
        assert_eq!(entry.remaining_ttl(now()), TimeDelta::minutes(30));
        assert_eq!(
            entry.remaining_ttl(now() + TimeDelta::minutes(10)),
            TimeDelta::minutes(20)
        );
        assert_eq!(
            entry.remaining_ttl(now() + TimeDelta::hours(1)),
            TimeDelta::zero()
        );
    }

    #[test]
    fn test_envelope_header_fields() {
        let bytes = entry().encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["format"], ENTRY_FORMAT);
        assert_eq!(value["version"], ENTRY_VERSION);

        let decoded = CacheEntry::decode(&bytes, &entry().key).unwrap();
        assert_eq!(decoded.series, entry().series);
        assert_eq!(decoded.expires_at, entry().expires_at);
    }

    #[test]
    fn test_decode_rejects_other_versions_and_formats() {
        let key = entry().key;
        let mut value: serde_json::Value = serde_json::from_slice(&entry().encode().unwrap()).unwrap();

        value["version"] = serde_json::json!(2);
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            CacheEntry::decode(&bytes, &key),
            Err(DecodeError::UnsupportedVersion(2))
        ));

        value["version"] = serde_json::json!(1);
        value["format"] = serde_json::json!("bar-archive");
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            CacheEntry::decode(&bytes, &key),
            Err(DecodeError::UnknownFormat(f)) if f == "bar-archive"
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_key_and_garbage() {
        let bytes = entry().encode().unwrap();
        let other = CacheKey::new("GBPUSD", Timeframe::H1, None);
        assert!(matches!(
            CacheEntry::decode(&bytes, &other),
            Err(DecodeError::KeyMismatch { .. })
        ));
        assert!(matches!(
            CacheEntry::decode(b"\x00\x01not json", &other),
            Err(DecodeError::Malformed(_))
        ));
    }
}
