use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::weather::types::{
    NormalizedAirQuality, NormalizedForecast, NormalizedLocation, NormalizedWeather,
};

/// Source of "now" for expiry decisions. Swappable so tests can move time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// An entry is gone the moment its expiry instant is reached.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
    pub ttl_seconds: u64,
}

/// In-memory key/value store with a fixed per-entry time-to-live.
///
/// Expired entries are evicted lazily by `get`, or in bulk by
/// `cleanup_expired`. Nothing runs in the background; whoever owns the cache
/// decides when to sweep.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    clock: Clock,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, system_clock())
    }

    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let now = (self.clock)();

        let expired = match entries.get(key) {
            None => {
                tracing::debug!("Cache miss: {} (key not found)", key);
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            entries.remove(key);
            tracing::debug!("Cache miss: {} (expired)", key);
            return None;
        }

        entries.get(key).map(|entry| {
            tracing::debug!(
                "Cache hit: {} (age {}s)",
                key,
                (now - entry.created_at).num_seconds()
            );
            entry.value.clone()
        })
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.entries.lock();
        let now = (self.clock)();
        let expires_at = expiry_after(now, self.ttl);

        tracing::debug!("Cached: {} (expires in {}s)", key, self.ttl.as_secs());
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                expires_at,
            },
        );
    }

    pub fn delete(&self, key: &str) -> bool {
        let removed = self.entries.lock().remove(key).is_some();
        if removed {
            tracing::debug!("Deleted from cache: {}", key);
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        tracing::debug!("Cache cleared");
    }

    /// Drops every entry that has expired as of this call and returns how many
    /// were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = (self.clock)();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        if removed > 0 {
            tracing::debug!("Cleaned up {} expired cache entries", removed);
        }
        removed
    }

    /// Physically stored entries, including expired ones not yet evicted.
    pub fn size(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let now = (self.clock)();
        let total_entries = entries.len();
        let expired_entries = entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();

        CacheStats {
            total_entries,
            active_entries: total_entries - expired_entries,
            expired_entries,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|span| now.checked_add_signed(span))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time-to-live for each query kind.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub current: Duration,
    pub forecast: Duration,
    pub search: Duration,
    pub air_quality: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            current: Duration::from_secs(10 * 60),
            forecast: Duration::from_secs(10 * 60),
            search: Duration::from_secs(5 * 60),
            air_quality: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheServiceStats {
    pub current: CacheStats,
    pub forecast: CacheStats,
    pub search: CacheStats,
    pub air_quality: CacheStats,
}

/// One TTL cache per query kind, shared by every request.
pub struct CacheService {
    pub current: TtlCache<NormalizedWeather>,
    pub forecast: TtlCache<NormalizedForecast>,
    pub search: TtlCache<Vec<NormalizedLocation>>,
    pub air_quality: TtlCache<NormalizedAirQuality>,
}

impl CacheService {
    pub fn new(ttls: CacheTtls) -> Self {
        Self::with_clock(ttls, system_clock())
    }

    pub fn with_clock(ttls: CacheTtls, clock: Clock) -> Self {
        Self {
            current: TtlCache::with_clock(ttls.current, clock.clone()),
            forecast: TtlCache::with_clock(ttls.forecast, clock.clone()),
            search: TtlCache::with_clock(ttls.search, clock.clone()),
            air_quality: TtlCache::with_clock(ttls.air_quality, clock),
        }
    }

    pub fn cleanup_expired(&self) -> usize {
        self.current.cleanup_expired()
            + self.forecast.cleanup_expired()
            + self.search.cleanup_expired()
            + self.air_quality.cleanup_expired()
    }

    pub fn clear(&self) {
        self.current.clear();
        self.forecast.clear();
        self.search.clear();
        self.air_quality.clear();
    }

    pub fn stats(&self) -> CacheServiceStats {
        CacheServiceStats {
            current: self.current.stats(),
            forecast: self.forecast.stats(),
            search: self.search.stats(),
            air_quality: self.air_quality.stats(),
        }
    }
}
