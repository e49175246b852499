//! Structural and semantic checks on factory metadata.
//!
//! Every check appends to a [`ValidationErrors`] collector instead of
//! returning early, so callers see all violations for a descriptor at once.
//! The per-flavor entry points live in [`rules`]; schema payload checks live
//! in [`schema`].

pub mod rules;
pub mod schema;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a tool name.
pub const TOOL_NAME_MAX_LENGTH: usize = 64;
/// Maximum length of a resource name.
pub const RESOURCE_NAME_MAX_LENGTH: usize = 255;
/// Maximum length of a resource URI.
pub const RESOURCE_URI_MAX_LENGTH: usize = 2048;
/// Maximum length of a tool description.
pub const TOOL_DESCRIPTION_MAX_LENGTH: usize = 500;
/// Maximum length of a resource description.
pub const RESOURCE_DESCRIPTION_MAX_LENGTH: usize = 1000;
/// Maximum number of capabilities a tool may declare.
pub const TOOL_MAX_CAPABILITIES: usize = 20;
/// Maximum length of a single capability or tag entry.
pub const LIST_ENTRY_MAX_LENGTH: usize = 100;

/// Identifiers no provider may claim, compared case-insensitively.
pub const RESERVED_IDENTIFIERS: [&str; 5] = ["system", "internal", "admin", "root", "api"];

/// URI schemes accepted for resources.
pub const ALLOWED_URI_SCHEMES: [&str; 6] = ["file", "config", "api", "custom", "http", "https"];

/// MIME main types accepted for resources.
pub const ALLOWED_MIME_TYPES: [&str; 9] = [
    "text",
    "application",
    "image",
    "audio",
    "video",
    "multipart",
    "message",
    "font",
    "model",
];

/// Longest value preview kept in a violation record.
const VALUE_PREVIEW_LENGTH: usize = 80;

/// One failed check: which field, what value, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    field: String,
    value: String,
    message: String,
}

impl Violation {
    /// Creates a violation record, truncating long values.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        value: impl AsRef<str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: preview(value.as_ref()),
            message: message.into(),
        }
    }

    /// Returns the offending field path.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns a preview of the offending value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {} (got '{}')", self.field, self.message, self.value)
    }
}

/// Ordered collection of violations produced by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", format_violations(.violations))]
#[serde(transparent)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Creates an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Appends a violation.
    pub fn push(
        &mut self,
        field: impl Into<String>,
        value: impl AsRef<str>,
        message: impl Into<String>,
    ) {
        self.violations.push(Violation::new(field, value, message));
    }

    /// Appends every violation from `other`, preserving order.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
    }

    /// Returns `true` when no check failed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the number of violations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns the violations in check order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns whether any violation concerns `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }

    /// Converts the collector into a result.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn preview(value: &str) -> String {
    if value.chars().count() <= VALUE_PREVIEW_LENGTH {
        return value.to_owned();
    }
    let mut truncated: String = value.chars().take(VALUE_PREVIEW_LENGTH).collect();
    truncated.push('…');
    truncated
}
