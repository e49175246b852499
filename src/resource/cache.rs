//! Time-bounded cache of resource content.

use super::{CachedContent, ResourceContent};
use crate::catalog::domain::CacheHealth;
use crate::catalog::ports::EvictionListener;
use crate::config::CacheConfig;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Content cache keyed by resource URI.
///
/// Expired entries are never served and are evicted when read. When full,
/// inserting evicts the entry closest to expiry. Hit and miss counters are
/// monotonic and read under the same lock as the entries.
#[derive(Debug)]
pub struct ContentCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CachedContent>,
    hits: u64,
    misses: u64,
}

impl ContentCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the default time-to-live.
    #[must_use]
    pub fn default_ttl(&self) -> TimeDelta {
        self.config.ttl()
    }

    // Cached content is disposable; a poisoned lock still guards usable data.
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns fresh content for `uri`, counting a hit or a miss.
    #[must_use]
    pub fn get(&self, uri: &str, now: DateTime<Utc>) -> Option<ResourceContent> {
        let mut state = self.state();
        let fresh = match state.entries.get(uri) {
            Some(cached) if !cached.is_expired(now) => Some(cached.content.clone()),
            Some(_) => {
                state.entries.remove(uri);
                debug!(uri, "evicted expired content");
                None
            }
            None => None,
        };

        if fresh.is_some() {
            state.hits = state.hits.saturating_add(1);
            debug!(uri, "content cache hit");
        } else {
            state.misses = state.misses.saturating_add(1);
            debug!(uri, "content cache miss");
        }
        fresh
    }

    /// Stores content under `uri` for `ttl` if `is_current` still holds.
    ///
    /// `is_current` runs under the cache lock, so an invalidation that
    /// completes before it cannot be overwritten by this insert. Returns
    /// whether the content was stored.
    pub fn insert_if(
        &self,
        uri: &str,
        content: ResourceContent,
        now: DateTime<Utc>,
        ttl: TimeDelta,
        is_current: impl FnOnce() -> bool,
    ) -> bool {
        if self.config.max_entries == 0 {
            return false;
        }

        let mut state = self.state();
        if !is_current() {
            debug!(uri, "discarding content read from a replaced instance");
            return false;
        }

        if !state.entries.contains_key(uri) && state.entries.len() >= self.config.max_entries {
            state.entries.retain(|_, cached| !cached.is_expired(now));
        }
        if !state.entries.contains_key(uri) && state.entries.len() >= self.config.max_entries {
            let closest = state
                .entries
                .iter()
                .min_by_key(|(_, cached)| cached.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = closest {
                state.entries.remove(&key);
                debug!(uri = %key, "evicted content closest to expiry");
            }
        }

        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        state.entries.insert(
            uri.to_owned(),
            CachedContent {
                content,
                cached_at: now,
                expires_at,
            },
        );
        true
    }

    /// Drops content for `uri`; returns whether anything was cached.
    pub fn invalidate(&self, uri: &str) -> bool {
        self.state().entries.remove(uri).is_some()
    }

    /// Drops every cached entry. Counters are kept.
    pub fn clear(&self) {
        self.state().entries.clear();
    }

    /// Returns the number of cached entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Returns whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    /// Returns size, counters, hit rate and the degraded flag.
    #[must_use]
    pub fn health(&self) -> CacheHealth {
        let state = self.state();
        let lookups = state.hits.saturating_add(state.misses);
        let rate = hit_rate(state.hits, lookups);
        let degraded = self
            .config
            .degraded_hit_rate
            .is_some_and(|floor| lookups >= self.config.degraded_min_lookups && rate < floor);

        CacheHealth {
            size: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            hit_rate: rate,
            degraded,
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "hit rate is a reporting figure; precision loss above 2^52 lookups is acceptable"
)]
fn hit_rate(hits: u64, lookups: u64) -> f64 {
    if lookups == 0 {
        return 0.0;
    }
    hits as f64 / lookups as f64
}

impl EvictionListener for ContentCache {
    fn evicted(&self, key: &str) {
        if self.invalidate(key) {
            debug!(uri = key, "invalidated cached content");
        }
    }

    fn cleared(&self) {
        self.clear();
        debug!("cleared content cache");
    }
}
