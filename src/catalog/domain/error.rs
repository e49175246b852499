//! Error types for catalog domain parsing and lifecycle guards.

use super::ProviderStatus;
use thiserror::Error;

/// A lifecycle transition rejected by the transition table.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid provider status transition: {from} -> {to}")]
pub struct InvalidStatusTransition {
    /// Current status.
    pub from: ProviderStatus,
    /// Requested target status.
    pub to: ProviderStatus,
}

/// Error returned while parsing a provider status string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown provider status: {0}")]
pub struct ParseProviderStatusError(pub String);

/// Error returned while parsing a circuit state string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown circuit state: {0}")]
pub struct ParseCircuitStateError(pub String);
