//! Immutable metadata a factory declares about the provider it builds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Factory metadata checked before catalog admission.
///
/// The `key` is the catalog identifier: the tool name for tool factories and
/// the resource URI for resource factories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    key: String,
    name: String,
    description: String,
    version: String,
    capabilities: Vec<String>,
    tags: Vec<String>,
    mime_type: Option<String>,
    schema: Option<Value>,
}

impl ProviderDescriptor {
    /// Default version reported when a factory does not declare one.
    pub const DEFAULT_VERSION: &'static str = "0.1.0";

    /// Creates a tool descriptor keyed by the tool name.
    #[must_use]
    pub fn tool(name: impl Into<String>, description: impl Into<String>) -> Self {
        let tool_name = name.into();
        Self {
            key: tool_name.clone(),
            name: tool_name,
            description: description.into(),
            version: Self::DEFAULT_VERSION.to_owned(),
            capabilities: Vec::new(),
            tags: Vec::new(),
            mime_type: None,
            schema: None,
        }
    }

    /// Creates a resource descriptor keyed by the resource URI.
    #[must_use]
    pub fn resource(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            key: uri.into(),
            name: name.into(),
            description: description.into(),
            version: Self::DEFAULT_VERSION.to_owned(),
            capabilities: Vec::new(),
            tags: Vec::new(),
            mime_type: Some(mime_type.into()),
            schema: None,
        }
    }

    /// Sets the provider version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the declared capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Sets the descriptive tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Sets the input or content schema payload.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Returns the catalog key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
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

    /// Returns the MIME type, declared by resource descriptors only.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns the schema payload, if any.
    #[must_use]
    pub const fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }
}
