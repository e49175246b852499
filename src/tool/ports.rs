//! Contract implemented by built tool instances.

use super::ToolDefinition;
use crate::catalog::ports::{ProviderFactory, ProviderResult};
use async_trait::async_trait;
use serde_json::Value;

/// A built, invocable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's self-reported definition.
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool with JSON arguments.
    async fn execute(&self, arguments: Value) -> ProviderResult<Value>;

    /// Reports whether the tool can currently serve calls.
    async fn health_check(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// Factory building [`Tool`] instances.
pub type ToolFactory = dyn ProviderFactory<Instance = dyn Tool>;
