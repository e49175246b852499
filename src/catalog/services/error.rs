//! Registry error taxonomy.

use crate::catalog::breaker::BreakerError;
use crate::catalog::domain::ProviderStatus;
use crate::catalog::ports::ProviderError;
use crate::catalog::validation::ValidationErrors;
use std::fmt;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors returned by tool and resource registries.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No entry exists for the key.
    #[error("{kind} '{key}' not found")]
    NotFound {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
    },

    /// An entry already exists for the key.
    #[error("{kind} '{key}' is already registered")]
    AlreadyExists {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
    },

    /// The key or name failed identifier checks.
    #[error("invalid {kind} identifier '{key}': {violations}")]
    InvalidIdentifier {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
        /// Every identifier violation, in check order.
        violations: ValidationErrors,
    },

    /// Descriptor metadata or a built instance failed validation.
    #[error("{kind} '{key}' failed validation: {violations}")]
    ValidationFailed {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
        /// Every violation, in check order.
        violations: ValidationErrors,
    },

    /// The factory failed or timed out.
    #[error("failed to create {kind} '{key}': {source}")]
    CreationFailed {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
        /// Underlying breaker outcome.
        #[source]
        source: BreakerError,
    },

    /// The breaker rejected construction without invoking the factory.
    #[error("circuit breaker for {kind} '{key}' is open")]
    BreakerOpen {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
    },

    /// The caller cancelled construction.
    #[error("construction of {kind} '{key}' was cancelled")]
    Cancelled {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
    },

    /// The entry was invalidated while its instance was being built.
    #[error("{kind} '{key}' changed while its instance was being built")]
    Superseded {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
    },

    /// The requested lifecycle transition is not allowed.
    #[error("invalid {kind} '{key}' transition from {from} to {to}")]
    InvalidTransition {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
        /// Current status.
        from: ProviderStatus,
        /// Requested status.
        to: ProviderStatus,
    },

    /// The registry is stopped.
    #[error("{kind} registry is not running")]
    RegistryNotRunning {
        /// Provider flavor.
        kind: &'static str,
    },

    /// The registry is already running.
    #[error("{kind} registry is already running")]
    AlreadyRunning {
        /// Provider flavor.
        kind: &'static str,
    },

    /// Restart was requested from a status that cannot reach `registered`.
    #[error("cannot restart {kind} '{key}' from status {status}")]
    RestartNotAllowed {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
        /// Current status.
        status: ProviderStatus,
    },

    /// A built instance failed at runtime.
    #[error("{kind} '{key}' failed: {source}")]
    Provider {
        /// Provider flavor.
        kind: &'static str,
        /// Catalog key.
        key: String,
        /// Provider-side error.
        #[source]
        source: ProviderError,
    },

    /// One or more entries failed during a bulk operation.
    #[error("{} {kind} provider(s) failed: {}", failures.len(), format_failures(failures))]
    Aggregate {
        /// Provider flavor.
        kind: &'static str,
        /// Per-key failures, ordered by key.
        failures: Vec<ProviderFailure>,
    },

    /// The catalog lock was poisoned by a panicking writer.
    #[error("{kind} registry state lock poisoned")]
    LockPoisoned {
        /// Provider flavor.
        kind: &'static str,
    },
}

impl RegistryError {
    /// Returns the catalog key the error concerns, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NotFound { key, .. }
            | Self::AlreadyExists { key, .. }
            | Self::InvalidIdentifier { key, .. }
            | Self::ValidationFailed { key, .. }
            | Self::CreationFailed { key, .. }
            | Self::BreakerOpen { key, .. }
            | Self::Cancelled { key, .. }
            | Self::Superseded { key, .. }
            | Self::InvalidTransition { key, .. }
            | Self::RestartNotAllowed { key, .. }
            | Self::Provider { key, .. } => Some(key),
            Self::RegistryNotRunning { .. }
            | Self::AlreadyRunning { .. }
            | Self::Aggregate { .. }
            | Self::LockPoisoned { .. } => None,
        }
    }

    /// Returns the per-key failures of an aggregate error.
    #[must_use]
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::Aggregate { failures, .. } => failures,
            _ => &[],
        }
    }

    pub(crate) fn from_breaker(kind: &'static str, provider_key: &str, error: BreakerError) -> Self {
        let key = provider_key.to_owned();
        match error {
            BreakerError::Open => Self::BreakerOpen { kind, key },
            BreakerError::Cancelled => Self::Cancelled { kind, key },
            source @ (BreakerError::Rejected(_) | BreakerError::TimedOut(_)) => {
                Self::CreationFailed { kind, key, source }
            }
        }
    }
}

/// One failed key inside [`RegistryError::Aggregate`].
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    /// Catalog key.
    pub key: String,
    /// Failure for that key.
    pub error: Box<RegistryError>,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.key, self.error)
    }
}

fn format_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
