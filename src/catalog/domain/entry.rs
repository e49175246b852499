//! Catalog entry: the metadata snapshot tracked per registered factory.

use super::{InstanceId, InvalidStatusTransition, ProviderDescriptor, ProviderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-factory metadata snapshot used for listing and health reporting.
///
/// Entries never reference the live instance, so they can be copied out of
/// the registry and rendered by external surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    key: String,
    kind: String,
    name: String,
    description: String,
    version: String,
    capabilities: Vec<String>,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    status: ProviderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_id: Option<InstanceId>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Creates a `registered` entry from a factory descriptor.
    #[must_use]
    pub fn new(kind: &str, descriptor: &ProviderDescriptor, timestamp: DateTime<Utc>) -> Self {
        Self {
            key: descriptor.key().to_owned(),
            kind: kind.to_owned(),
            name: descriptor.name().to_owned(),
            description: descriptor.description().to_owned(),
            version: descriptor.version().to_owned(),
            capabilities: descriptor.capabilities().to_vec(),
            tags: descriptor.tags().to_vec(),
            mime_type: descriptor.mime_type().map(ToOwned::to_owned),
            status: ProviderStatus::Registered,
            last_error: None,
            instance_id: None,
            registered_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the catalog key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the provider flavor (`tool` or `resource`).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the provider description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the provider version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Returns the descriptive tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the MIME type for resource entries.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ProviderStatus {
        self.status
    }

    /// Returns the most recent failure reason, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the identifier of the installed instance, if any.
    #[must_use]
    pub const fn instance_id(&self) -> Option<InstanceId> {
        self.instance_id
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the entry to `target` if the transition table allows it.
    ///
    /// Entering `error` or `disabled` forgets the instance identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidStatusTransition`] when the transition is not allowed.
    pub fn transition_to(
        &mut self,
        target: ProviderStatus,
        timestamp: DateTime<Utc>,
    ) -> Result<(), InvalidStatusTransition> {
        if !self.status.can_transition_to(target) {
            return Err(InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }

        if self.status != target {
            self.status = target;
            if !target.holds_instance() {
                self.instance_id = None;
            }
            self.touch(timestamp);
        }
        Ok(())
    }

    /// Records a freshly installed instance and clears the failure reason.
    pub fn record_instance(&mut self, instance_id: InstanceId, timestamp: DateTime<Utc>) {
        self.instance_id = Some(instance_id);
        self.last_error = None;
        self.touch(timestamp);
    }

    /// Records a failure reason without changing status.
    pub fn record_failure(&mut self, reason: impl Into<String>, timestamp: DateTime<Utc>) {
        self.last_error = Some(reason.into());
        self.touch(timestamp);
    }

    const fn touch(&mut self, timestamp: DateTime<Utc>) {
        self.updated_at = timestamp;
    }
}
