//! Contract implemented by built resource instances.

use super::ResourceContent;
use crate::catalog::ports::{ProviderFactory, ProviderResult};
use async_trait::async_trait;
use std::time::Duration;

/// A built, readable resource.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Returns the URI the resource serves.
    fn uri(&self) -> &str;

    /// Returns the MIME type of the content.
    fn mime_type(&self) -> &str;

    /// Returns how long read content may be cached.
    ///
    /// `None` uses the registry's configured time-to-live.
    fn cache_ttl(&self) -> Option<Duration> {
        None
    }

    /// Reads the current content.
    async fn read(&self) -> ProviderResult<ResourceContent>;

    /// Reports whether the resource can currently serve reads.
    async fn health_check(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// Factory building [`Resource`] instances.
pub type ResourceFactory = dyn ProviderFactory<Instance = dyn Resource>;
