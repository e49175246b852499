//! Provider lifecycle status and its transition table.

use super::ParseProviderStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a catalog entry.
///
/// Distinguishes "never built" (`registered`) from "built" (`loaded`) from
/// "built and verified" (`active`) from "known broken" (`error`), with
/// `disabled` for entries an operator or a registry stop has switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Reported for keys that are not in the catalog.
    Unknown,
    /// Factory is registered but no instance has been built.
    Registered,
    /// Instance has been built and cached.
    Loaded,
    /// Instance has been built and passed validation.
    Active,
    /// Construction or validation failed.
    Error,
    /// Entry is switched off and holds no instance.
    Disabled,
}

impl ProviderStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::Registered,
        Self::Loaded,
        Self::Active,
        Self::Error,
        Self::Disabled,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Registered => "registered",
            Self::Loaded => "loaded",
            Self::Active => "active",
            Self::Error => "error",
            Self::Disabled => "disabled",
        }
    }

    /// Returns whether an entry in this status may hold a live instance.
    #[must_use]
    pub const fn holds_instance(self) -> bool {
        matches!(self, Self::Loaded | Self::Active)
    }

    /// Returns whether entering this status must drop the live instance.
    #[must_use]
    pub const fn drops_instance(self) -> bool {
        matches!(self, Self::Error | Self::Disabled)
    }

    /// Returns whether entering this status requires a running registry.
    #[must_use]
    pub const fn requires_running(self) -> bool {
        matches!(self, Self::Loaded | Self::Active)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// A transition to the current status is always allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        if self as u8 == target as u8 {
            return true;
        }

        matches!(
            (self, target),
            (Self::Registered, Self::Loaded | Self::Error | Self::Disabled)
                | (Self::Loaded, Self::Active | Self::Error | Self::Disabled)
                | (Self::Active, Self::Error | Self::Disabled | Self::Loaded)
                | (Self::Error, Self::Registered | Self::Disabled)
                | (Self::Disabled, Self::Registered | Self::Error)
        )
    }

    /// Returns the current status followed by every legal target.
    #[must_use]
    pub fn allowed_transitions(self) -> Vec<Self> {
        let mut allowed = vec![self];
        allowed.extend(
            Self::ALL
                .into_iter()
                .filter(|target| *target != self && self.can_transition_to(*target)),
        );
        allowed
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderStatus {
    type Error = ParseProviderStatusError;

    fn try_from(value: &str) -> Result<Self, ParseProviderStatusError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "registered" => Ok(Self::Registered),
            "loaded" => Ok(Self::Loaded),
            "active" => Ok(Self::Active),
            "error" => Ok(ProviderStatus::Error),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ParseProviderStatusError(value.to_owned())),
        }
    }
}

/// Returns whether `from -> to` is a legal lifecycle transition.
#[must_use]
pub const fn is_valid_transition(from: ProviderStatus, to: ProviderStatus) -> bool {
    from.can_transition_to(to)
}
