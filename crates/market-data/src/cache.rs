//! Short-TTL in-memory cache with per-entry expiry.
//!
//! Generic key/value cache used for quote responses. Expiry is
//! re-validated against the injected clock on every read; expired
//! entries are treated as absent but stay in storage until they are
//! overwritten (lazy eviction, no background sweep and no size
//! bound).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tickerdeck_rate_limit::Clock;

/// A cached value with its expiry instant.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Key/value cache with per-entry TTL, last-write-wins.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache reading time from the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Lock the entries mutex, recovering from poison if necessary.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("TTL cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Look up a key, treating a read at or past expiry as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entries = self.lock_entries();
        let entry = entries.get(key)?;
        if now >= entry.expires_at {
            debug!("Cache entry for '{}' expired", key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or replace a key. Value and expiry are replaced under a
    /// single lock acquisition; concurrent readers see either the old
    /// pair or the new one, never a mix.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(chrono::Duration::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.lock_entries();
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
    }

    /// Number of stored entries, expired ones included (eviction is
    /// lazy).
    pub fn entry_count(&self) -> usize {
        self.lock_entries().len()
    }
}
