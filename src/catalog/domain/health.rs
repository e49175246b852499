//! Read-only health snapshots aggregated over a registry catalog.

use super::{CircuitState, ProviderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Overall health of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Registry is running and every entry is usable.
    Healthy,
    /// Registry is running but an entry is in `error` or the cache is degraded.
    Degraded,
    /// Registry is not running.
    Stopped,
}

impl HealthStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Content cache figures reported by resource registries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHealth {
    /// Number of cached entries, including ones not yet evicted after expiry.
    pub size: usize,
    /// Monotonic hit counter.
    pub hits: u64,
    /// Monotonic miss counter.
    pub misses: u64,
    /// `hits / (hits + misses)`, or `0.0` before the first lookup.
    pub hit_rate: f64,
    /// Whether the hit rate fell below the configured floor.
    pub degraded: bool,
}

/// Serializable registry health snapshot.
///
/// Field names are stable; external health surfaces render this record
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryHealth {
    /// Provider flavor (`tool` or `resource`).
    pub kind: String,
    /// Overall status.
    pub status: HealthStatus,
    /// Whether the registry is running.
    pub running: bool,
    /// Number of catalog entries.
    pub total: usize,
    /// Entry counts per lifecycle status.
    pub status_counts: BTreeMap<ProviderStatus, usize>,
    /// Lifecycle status per key.
    pub providers: BTreeMap<String, ProviderStatus>,
    /// Circuit breaker state per key.
    pub breakers: BTreeMap<String, CircuitState>,
    /// Most recent failure reason per key, for keys that have one.
    pub errors: BTreeMap<String, String>,
    /// Content cache figures, for resource registries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheHealth>,
    /// Snapshot timestamp.
    pub checked_at: DateTime<Utc>,
}

impl RegistryHealth {
    /// Derives the overall status from the running flag, entry statuses and
    /// cache figures.
    ///
    /// Breaker states are reported per key but do not affect the status.
    #[must_use]
    pub fn derive_status(
        running: bool,
        providers: &BTreeMap<String, ProviderStatus>,
        cache: Option<&CacheHealth>,
    ) -> HealthStatus {
        if !running {
            return HealthStatus::Stopped;
        }

        let has_errors = providers
            .values()
            .any(|status| *status == ProviderStatus::Error);
        let cache_degraded = cache.is_some_and(|figures| figures.degraded);

        if has_errors || cache_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    /// Attaches cache figures and re-derives the overall status.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheHealth) -> Self {
        self.status = Self::derive_status(self.running, &self.providers, Some(&cache));
        self.cache = Some(cache);
        self
    }

    /// Returns the number of entries in `status`.
    #[must_use]
    pub fn count(&self, status: ProviderStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or_default()
    }
}
