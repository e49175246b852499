//! Tool metadata exposed by built tool instances.

use crate::catalog::domain::ProviderDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition a tool instance reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name; must equal the registered key.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema describing accepted arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDefinition {
    /// Creates a definition without an input schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Derives the definition a factory's descriptor promises.
    #[must_use]
    pub fn from_descriptor(descriptor: &ProviderDescriptor) -> Self {
        Self {
            name: descriptor.name().to_owned(),
            description: descriptor.description().to_owned(),
            input_schema: descriptor.schema().cloned(),
        }
    }
}
