//! Externally visible circuit breaker state.

use super::ParseCircuitStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a per-factory circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Creation attempts pass through.
    Closed,
    /// Creation attempts are rejected without invoking the factory.
    Open,
    /// A bounded number of probe attempts pass through.
    HalfOpen,
}

impl CircuitState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CircuitState {
    type Error = ParseCircuitStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            "half-open" | "half_open" => Ok(Self::HalfOpen),
            _ => Err(ParseCircuitStateError(value.to_owned())),
        }
    }
}
