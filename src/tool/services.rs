//! Tool specialisation of the generic provider registry.

use super::Tool;
use crate::catalog::breaker::{BreakerPolicy, RatioPolicy};
use crate::catalog::domain::ProviderDescriptor;
use crate::catalog::ports::{ProviderKind, ProviderResult};
use crate::catalog::services::{ProviderRegistry, RegistryError, RegistryResult};
use crate::catalog::validation::{ValidationErrors, rules, schema};
use crate::config::RegistryConfig;
use futures::future::BoxFuture;
use mockable::{Clock, DefaultClock};
use serde_json::Value;
use tracing::{debug, instrument};

/// Marker selecting tool behaviour in [`ProviderRegistry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolKind;

impl ProviderKind for ToolKind {
    type Instance = dyn Tool;

    const KIND: &'static str = "tool";

    fn validate_identity(
        key: &str,
        descriptor: &ProviderDescriptor,
    ) -> Result<(), ValidationErrors> {
        rules::validate_tool_identity(key, descriptor)
    }

    fn validate_descriptor(descriptor: &ProviderDescriptor) -> Result<(), ValidationErrors> {
        rules::validate_tool_descriptor(descriptor)
    }

    fn validate_instance(
        descriptor: &ProviderDescriptor,
        instance: &Self::Instance,
    ) -> Result<(), ValidationErrors> {
        let definition = instance.definition();
        let mut errors = ValidationErrors::new();
        if definition.name != descriptor.name() {
            errors.push(
                "definition.name",
                &definition.name,
                format!("must match the registered tool name '{}'", descriptor.name()),
            );
        }
        if let Some(input_schema) = &definition.input_schema {
            schema::check_schema(&mut errors, "definition.input_schema", input_schema);
        }
        errors.into_result()
    }

    fn probe(instance: &Self::Instance) -> BoxFuture<'_, ProviderResult<()>> {
        instance.health_check()
    }

    fn breaker_policy(config: &RegistryConfig) -> Box<dyn BreakerPolicy> {
        Box::new(RatioPolicy::new(config.tool_breaker.clone()))
    }
}

/// Registry of tool factories.
pub type ToolRegistry<C = DefaultClock> = ProviderRegistry<ToolKind, C>;

impl<C> ProviderRegistry<ToolKind, C>
where
    C: Clock + Send + Sync,
{
    /// Runs the tool registered as `name`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`get`](Self::get), or
    /// [`RegistryError::Provider`] when the tool itself fails.
    #[instrument(skip(self, arguments), fields(kind = ToolKind::KIND))]
    pub async fn invoke(&self, name: &str, arguments: Value) -> RegistryResult<Value> {
        let tool = self.get(name).await?;
        debug!(name, "invoking tool");
        tool.execute(arguments)
            .await
            .map_err(|source| RegistryError::Provider {
                kind: ToolKind::KIND,
                key: name.to_owned(),
                source,
            })
    }
}
