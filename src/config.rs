//! Registry configuration.
//!
//! [`RegistryConfig`] is a plain serde value. Loading it from files or the
//! environment is the host's job; every field has a default so partial
//! documents deserialize cleanly.
//!
//! # Examples
//!
//! ```
//! use armature::config::RegistryConfig;
//!
//! let config: RegistryConfig =
//!     serde_json::from_str(r#"{"construction_timeout_secs": 5}"#).expect("valid config");
//! assert_eq!(config.construction_timeout_secs, 5);
//! assert_eq!(config.resource_breaker.max_failures, 5);
//! ```

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Default bound on a single factory `create` call.
pub const DEFAULT_CONSTRUCTION_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration shared by the tool and resource registries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Upper bound on a single `create` call, in seconds.
    pub construction_timeout_secs: u64,
    /// Breaker tuning for tool factories.
    pub tool_breaker: RatioBreakerConfig,
    /// Breaker tuning for resource factories.
    pub resource_breaker: ThresholdBreakerConfig,
    /// Resource content cache tuning.
    pub cache: CacheConfig,
    /// Opaque per-provider settings handed to factories, keyed by catalog key.
    pub provider_settings: BTreeMap<String, Value>,
    /// Feature flags visible to every factory.
    pub feature_flags: BTreeSet<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            construction_timeout_secs: DEFAULT_CONSTRUCTION_TIMEOUT_SECS,
            tool_breaker: RatioBreakerConfig::default(),
            resource_breaker: ThresholdBreakerConfig::default(),
            cache: CacheConfig::default(),
            provider_settings: BTreeMap::new(),
            feature_flags: BTreeSet::new(),
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration with tighter timeouts and quicker trips.
    ///
    /// Useful where a slow provider should be isolated early.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            construction_timeout_secs: 10,
            tool_breaker: RatioBreakerConfig {
                min_requests: 2,
                failure_ratio: 0.5,
                ..RatioBreakerConfig::default()
            },
            resource_breaker: ThresholdBreakerConfig {
                max_failures: 3,
                ..ThresholdBreakerConfig::default()
            },
            cache: CacheConfig {
                ttl_secs: 60,
                ..CacheConfig::default()
            },
            ..Self::default()
        }
    }

    /// Creates a configuration that tolerates slow or flaky providers.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            construction_timeout_secs: 120,
            tool_breaker: RatioBreakerConfig {
                min_requests: 10,
                failure_ratio: 0.8,
                half_open_max_probes: 3,
                ..RatioBreakerConfig::default()
            },
            resource_breaker: ThresholdBreakerConfig {
                max_failures: 10,
                retry_timeout_secs: 30,
            },
            ..Self::default()
        }
    }

    /// Returns the construction timeout as a [`Duration`].
    #[must_use]
    pub const fn construction_timeout(&self) -> Duration {
        Duration::from_secs(self.construction_timeout_secs)
    }

    /// Attaches settings for one provider.
    #[must_use]
    pub fn with_provider_settings(mut self, key: impl Into<String>, settings: Value) -> Self {
        self.provider_settings.insert(key.into(), settings);
        self
    }

    /// Enables a feature flag.
    #[must_use]
    pub fn with_feature_flag(mut self, flag: impl Into<String>) -> Self {
        self.feature_flags.insert(flag.into());
        self
    }
}

/// Tuning for the ratio breaker guarding tool factories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioBreakerConfig {
    /// Minimum completed attempts in the interval before the ratio is judged.
    pub min_requests: u32,
    /// Failure ratio at or above which the breaker trips.
    pub failure_ratio: f64,
    /// Length of the rolling counting interval, in seconds.
    pub interval_secs: u64,
    /// How long the breaker stays open before probing, in seconds.
    pub open_timeout_secs: u64,
    /// Probes admitted while half-open; this many successes close the breaker.
    pub half_open_max_probes: u32,
}

impl Default for RatioBreakerConfig {
    fn default() -> Self {
        Self {
            min_requests: 3,
            failure_ratio: 0.6,
            interval_secs: 60,
            open_timeout_secs: 30,
            half_open_max_probes: 1,
        }
    }
}

impl RatioBreakerConfig {
    /// Returns the rolling interval.
    #[must_use]
    pub fn interval(&self) -> TimeDelta {
        seconds(self.interval_secs)
    }

    /// Returns the open-state timeout.
    #[must_use]
    pub fn open_timeout(&self) -> TimeDelta {
        seconds(self.open_timeout_secs)
    }
}

/// Tuning for the threshold breaker guarding resource factories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdBreakerConfig {
    /// Failure count at which the breaker trips.
    pub max_failures: u32,
    /// How long the breaker stays open before a trial, in seconds.
    pub retry_timeout_secs: u64,
}

impl Default for ThresholdBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            retry_timeout_secs: 60,
        }
    }
}

impl ThresholdBreakerConfig {
    /// Returns the open-state timeout.
    #[must_use]
    pub fn retry_timeout(&self) -> TimeDelta {
        seconds(self.retry_timeout_secs)
    }
}

/// Tuning for the resource content cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Default time-to-live for cached content, in seconds.
    pub ttl_secs: u64,
    /// Maximum number of cached entries.
    pub max_entries: usize,
    /// Hit rate below which the cache reports itself degraded; `None` disables.
    pub degraded_hit_rate: Option<f64>,
    /// Lookups required before the hit rate is judged.
    pub degraded_min_lookups: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 1024,
            degraded_hit_rate: None,
            degraded_min_lookups: 100,
        }
    }
}

impl CacheConfig {
    /// Returns the default time-to-live.
    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        seconds(self.ttl_secs)
    }
}

/// Converts configured seconds to a [`TimeDelta`], saturating on overflow.
#[must_use]
pub fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}
