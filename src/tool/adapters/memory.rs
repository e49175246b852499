//! In-memory tool factory for tests and local wiring.

use crate::catalog::adapters::memory::FaultInjector;
use crate::catalog::domain::ProviderDescriptor;
use crate::catalog::ports::{
    CreateContext, ProviderConfig, ProviderError, ProviderFactory, ProviderResult,
};
use crate::tool::{Tool, ToolDefinition};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// Factory building echo tools that return their arguments.
///
/// The factory models construction without any external dependency. Its
/// [`FaultInjector`] can fail or delay constructions, reject configuration,
/// and mark built instances unhealthy.
#[derive(Debug, Clone)]
pub struct StaticToolFactory {
    descriptor: ProviderDescriptor,
    reported_name: Option<String>,
    faults: FaultInjector,
}

impl StaticToolFactory {
    /// Creates a factory for an echo tool called `name`.
    #[must_use]
    pub fn echo(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ProviderDescriptor::tool(name, description))
    }

    /// Creates a factory for the given descriptor.
    #[must_use]
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            reported_name: None,
            faults: FaultInjector::new(),
        }
    }

    /// Makes built instances report `name` instead of the descriptor name.
    #[must_use]
    pub fn with_reported_name(mut self, name: impl Into<String>) -> Self {
        self.reported_name = Some(name.into());
        self
    }

    /// Returns the shared fault switchboard.
    #[must_use]
    pub const fn faults(&self) -> &FaultInjector {
        &self.faults
    }
}

#[async_trait]
impl ProviderFactory for StaticToolFactory {
    type Instance = dyn Tool;

    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn create(
        &self,
        _context: &CreateContext,
        config: &ProviderConfig,
    ) -> ProviderResult<Arc<dyn Tool>> {
        self.faults.before_create().await?;

        let mut definition = ToolDefinition::from_descriptor(&self.descriptor);
        if let Some(name) = &self.reported_name {
            definition.name.clone_from(name);
        }
        let prefix = config
            .settings()
            .get("prefix")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        Ok(Arc::new(EchoTool {
            definition,
            prefix,
            faults: self.faults.clone(),
        }))
    }

    fn validate(&self, config: &ProviderConfig) -> ProviderResult<()> {
        self.faults.check_config()?;
        let settings = config.settings();
        if settings.is_null() || settings.is_object() {
            Ok(())
        } else {
            Err(ProviderError::InvalidConfig(format!(
                "settings for '{}' must be an object",
                config.key()
            )))
        }
    }
}

/// Tool instance returning its arguments.
#[derive(Debug)]
struct EchoTool {
    definition: ToolDefinition,
    prefix: Option<String>,
    faults: FaultInjector,
}

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, arguments: Value) -> ProviderResult<Value> {
        if !arguments.is_object() {
            return Err(ProviderError::InvalidArguments(
                "arguments must be a JSON object".to_owned(),
            ));
        }
        Ok(json!({
            "tool": self.definition.name,
            "prefix": self.prefix,
            "echo": arguments,
        }))
    }

    async fn health_check(&self) -> ProviderResult<()> {
        self.faults.check_health()
    }
}
