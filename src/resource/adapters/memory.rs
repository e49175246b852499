//! In-memory resource factory for tests and local wiring.

use crate::catalog::adapters::memory::FaultInjector;
use crate::catalog::domain::ProviderDescriptor;
use crate::catalog::ports::{
    CreateContext, ProviderConfig, ProviderError, ProviderFactory, ProviderResult,
};
use crate::resource::{Resource, ResourceBody, ResourceContent};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Factory building resources that serve a replaceable in-memory body.
///
/// Clones share the body, the read counter and the [`FaultInjector`], so a
/// test can change what instances serve after registration.
#[derive(Debug, Clone)]
pub struct StaticResourceFactory {
    descriptor: ProviderDescriptor,
    reported_uri: Option<String>,
    content_uri: Option<String>,
    cache_ttl: Option<Duration>,
    body: Arc<RwLock<StaticBody>>,
    faults: FaultInjector,
}

#[derive(Debug)]
struct StaticBody {
    body: ResourceBody,
    reads: u64,
}

impl StaticResourceFactory {
    /// Creates a factory serving `text` at `uri`.
    #[must_use]
    pub fn text(
        uri: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let resource_name = name.into();
        let description = format!("In-memory resource {resource_name}");
        Self::new(
            ProviderDescriptor::resource(uri, resource_name, description, mime_type),
            ResourceBody::Text(text.into()),
        )
    }

    /// Creates a factory for the given descriptor and body.
    #[must_use]
    pub fn new(descriptor: ProviderDescriptor, body: ResourceBody) -> Self {
        Self {
            descriptor,
            reported_uri: None,
            content_uri: None,
            cache_ttl: None,
            body: Arc::new(RwLock::new(StaticBody { body, reads: 0 })),
            faults: FaultInjector::new(),
        }
    }

    /// Makes built instances report `uri` instead of the descriptor URI.
    #[must_use]
    pub fn with_reported_uri(mut self, uri: impl Into<String>) -> Self {
        self.reported_uri = Some(uri.into());
        self
    }

    /// Makes built instances label read content with `uri`.
    #[must_use]
    pub fn with_content_uri(mut self, uri: impl Into<String>) -> Self {
        self.content_uri = Some(uri.into());
        self
    }

    /// Makes built instances request a specific cache lifetime.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Returns the shared fault switchboard.
    #[must_use]
    pub const fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Replaces the body served by every instance.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_body(&self, body: ResourceBody) -> ProviderResult<()> {
        let mut shared = self
            .body
            .write()
            .map_err(|err| ProviderError::runtime(std::io::Error::other(err.to_string())))?;
        shared.body = body;
        Ok(())
    }

    /// Returns how many reads instances have served.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn read_count(&self) -> ProviderResult<u64> {
        let shared = self
            .body
            .read()
            .map_err(|err| ProviderError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(shared.reads)
    }
}

#[async_trait]
impl ProviderFactory for StaticResourceFactory {
    type Instance = dyn Resource;

    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn create(
        &self,
        _context: &CreateContext,
        _config: &ProviderConfig,
    ) -> ProviderResult<Arc<dyn Resource>> {
        self.faults.before_create().await?;

        let uri = self
            .reported_uri
            .clone()
            .unwrap_or_else(|| self.descriptor.key().to_owned());
        Ok(Arc::new(StaticResource {
            content_uri: self.content_uri.clone().unwrap_or_else(|| uri.clone()),
            uri,
            mime_type: self.descriptor.mime_type().unwrap_or_default().to_owned(),
            cache_ttl: self.cache_ttl,
            body: Arc::clone(&self.body),
            faults: self.faults.clone(),
        }))
    }

    fn validate(&self, _config: &ProviderConfig) -> ProviderResult<()> {
        self.faults.check_config()
    }
}

/// Resource instance serving the factory's shared body.
#[derive(Debug)]
struct StaticResource {
    uri: String,
    content_uri: String,
    mime_type: String,
    cache_ttl: Option<Duration>,
    body: Arc<RwLock<StaticBody>>,
    faults: FaultInjector,
}

#[async_trait]
impl Resource for StaticResource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }

    async fn read(&self) -> ProviderResult<ResourceContent> {
        self.faults.check_health()?;
        let mut shared = self
            .body
            .write()
            .map_err(|err| ProviderError::runtime(std::io::Error::other(err.to_string())))?;
        shared.reads = shared.reads.saturating_add(1);
        Ok(ResourceContent {
            uri: self.content_uri.clone(),
            mime_type: self.mime_type.clone(),
            body: shared.body.clone(),
        })
    }

    async fn health_check(&self) -> ProviderResult<()> {
        self.faults.check_health()
    }
}
