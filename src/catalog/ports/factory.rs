//! Factory contract implemented by capability providers.

use crate::catalog::domain::ProviderDescriptor;
use crate::config::RegistryConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result type for provider-side operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Builds provider instances on demand.
///
/// Factories are stored by the registry as trait objects keyed by their
/// descriptor key; `create` is only ever called outside the catalog lock.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Type of instance this factory builds.
    type Instance: ?Sized + Send + Sync;

    /// Returns the metadata checked at registration.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Builds a new instance.
    ///
    /// Implementations should observe `context` cancellation for long-running
    /// setup; the registry also abandons the future when it fires.
    async fn create(
        &self,
        context: &CreateContext,
        config: &ProviderConfig,
    ) -> ProviderResult<Arc<Self::Instance>>;

    /// Checks that `config` is usable by this factory.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidConfig`] when the settings are rejected.
    fn validate(&self, _config: &ProviderConfig) -> ProviderResult<()> {
        Ok(())
    }
}

/// Caller-supplied bounds for a construction.
#[derive(Debug, Clone, Default)]
pub struct CreateContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CreateContext {
    /// Creates an unbounded context with a fresh cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `token` for cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns whether the caller cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns the time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// Settings handed to a factory for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    key: String,
    settings: Value,
    feature_flags: BTreeSet<String>,
}

impl ProviderConfig {
    /// Creates a configuration for `key` with explicit settings.
    #[must_use]
    pub fn new(key: impl Into<String>, settings: Value) -> Self {
        Self {
            key: key.into(),
            settings,
            feature_flags: BTreeSet::new(),
        }
    }

    /// Extracts the settings for `key` from the registry configuration.
    ///
    /// Keys without settings receive `null`.
    #[must_use]
    pub fn from_registry(key: &str, config: &RegistryConfig) -> Self {
        Self {
            key: key.to_owned(),
            settings: config
                .provider_settings
                .get(key)
                .cloned()
                .unwrap_or(Value::Null),
            feature_flags: config.feature_flags.clone(),
        }
    }

    /// Returns the provider key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the opaque settings value.
    #[must_use]
    pub const fn settings(&self) -> &Value {
        &self.settings
    }

    /// Returns whether `flag` is enabled.
    #[must_use]
    pub fn feature_enabled(&self, flag: &str) -> bool {
        self.feature_flags.contains(flag)
    }
}

/// Errors raised by factories and provider instances.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Provider settings were rejected.
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// A dependency the provider needs is unavailable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Call arguments were rejected.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Generic runtime failure.
    #[error("provider runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Wraps a runtime error from a provider.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
