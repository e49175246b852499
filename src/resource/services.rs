//! Resource specialisation of the generic provider registry.

use super::{ContentCache, Resource, ResourceContent};
use crate::catalog::breaker::{BreakerPolicy, ThresholdPolicy};
use crate::catalog::domain::{ProviderDescriptor, RegistryHealth};
use crate::catalog::ports::{EvictionListener, ProviderKind, ProviderResult};
use crate::catalog::services::{ProviderRegistry, RegistryError, RegistryResult};
use crate::catalog::validation::{ValidationErrors, rules};
use crate::config::RegistryConfig;
use chrono::TimeDelta;
use futures::future::BoxFuture;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Marker selecting resource behaviour in [`ProviderRegistry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceKind;

impl ProviderKind for ResourceKind {
    type Instance = dyn Resource;

    const KIND: &'static str = "resource";

    fn validate_identity(
        key: &str,
        descriptor: &ProviderDescriptor,
    ) -> Result<(), ValidationErrors> {
        rules::validate_resource_identity(key, descriptor)
    }

    fn validate_descriptor(descriptor: &ProviderDescriptor) -> Result<(), ValidationErrors> {
        rules::validate_resource_descriptor(descriptor)
    }

    fn validate_instance(
        descriptor: &ProviderDescriptor,
        instance: &Self::Instance,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if instance.uri() != descriptor.key() {
            errors.push(
                "instance.uri",
                instance.uri(),
                format!("must match the registered URI '{}'", descriptor.key()),
            );
        }
        if let Some(expected) = descriptor.mime_type()
            && !instance.mime_type().eq_ignore_ascii_case(expected)
        {
            errors.push(
                "instance.mime_type",
                instance.mime_type(),
                format!("must match the declared MIME type '{expected}'"),
            );
        }
        errors.into_result()
    }

    fn probe(instance: &Self::Instance) -> BoxFuture<'_, ProviderResult<()>> {
        instance.health_check()
    }

    fn breaker_policy(config: &RegistryConfig) -> Box<dyn BreakerPolicy> {
        Box::new(ThresholdPolicy::new(config.resource_breaker.clone()))
    }
}

/// Registry of resource factories with a content cache.
///
/// Lifecycle operations go through [`registry`](Self::registry); the cache is
/// attached as its eviction listener, so every invalidation of an entry
/// also drops its cached content.
pub struct ResourceRegistry<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    inner: ProviderRegistry<ResourceKind, C>,
    cache: Arc<ContentCache>,
}

impl<C> std::fmt::Debug for ResourceRegistry<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ResourceRegistry")
            .field("inner", &self.inner)
            .field("cache", &self.cache)
            .finish()
    }
}

impl ResourceRegistry<DefaultClock> {
    /// Creates a stopped registry using the system clock.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::new(config, Arc::new(DefaultClock))
    }
}

impl<C> ResourceRegistry<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a stopped registry.
    #[must_use]
    pub fn new(config: RegistryConfig, clock: Arc<C>) -> Self {
        let cache = Arc::new(ContentCache::new(config.cache.clone()));
        let listener: Arc<dyn EvictionListener> = cache.clone();
        let inner = ProviderRegistry::new(config, clock).with_eviction_listener(listener);
        Self { inner, cache }
    }

    /// Returns the underlying generic registry.
    #[must_use]
    pub const fn registry(&self) -> &ProviderRegistry<ResourceKind, C> {
        &self.inner
    }

    /// Returns the content cache.
    #[must_use]
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Reads `uri`, serving fresh cached content when available.
    ///
    /// On a miss the resource instance is fetched (built on first use), read,
    /// and the content cached under `uri` for the resource's TTL or the
    /// configured one.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ProviderRegistry::get`],
    /// [`RegistryError::Provider`] when the read fails, or
    /// [`RegistryError::ValidationFailed`] when the content is labelled with
    /// another URI.
    #[instrument(skip(self), fields(kind = ResourceKind::KIND))]
    pub async fn read(&self, uri: &str) -> RegistryResult<ResourceContent> {
        if let Some(content) = self.cache.get(uri, self.inner.clock().utc()) {
            return Ok(content);
        }

        let resource = self.inner.get(uri).await?;
        let content = resource
            .read()
            .await
            .map_err(|source| RegistryError::Provider {
                kind: ResourceKind::KIND,
                key: uri.to_owned(),
                source,
            })?;
        if content.uri != uri {
            warn!(uri, reported = %content.uri, "rejecting content labelled with another URI");
            let mut violations = ValidationErrors::new();
            violations.push(
                "content.uri",
                &content.uri,
                format!("must match the requested URI '{uri}'"),
            );
            return Err(RegistryError::ValidationFailed {
                kind: ResourceKind::KIND,
                key: uri.to_owned(),
                violations,
            });
        }

        let ttl = resource
            .cache_ttl()
            .map_or_else(
                || self.cache.default_ttl(),
                |custom| TimeDelta::from_std(custom).unwrap_or(TimeDelta::MAX),
            );
        let stored = self.cache.insert_if(
            uri,
            content.clone(),
            self.inner.clock().utc(),
            ttl,
            || {
                matches!(
                    self.inner.instance(uri),
                    Ok(Some(current)) if Arc::ptr_eq(&current, &resource)
                )
            },
        );
        debug!(uri, stored, "resource read");
        Ok(content)
    }

    /// Drops cached content for `uri` and reads it again.
    ///
    /// # Errors
    ///
    /// See [`read`](Self::read).
    #[instrument(skip(self), fields(kind = ResourceKind::KIND))]
    pub async fn refresh(&self, uri: &str) -> RegistryResult<ResourceContent> {
        self.cache.invalidate(uri);
        self.read(uri).await
    }

    /// Aggregates catalog health together with cache figures.
    ///
    /// # Errors
    ///
    /// See [`ProviderRegistry::health`].
    pub fn health(&self) -> RegistryResult<RegistryHealth> {
        Ok(self.inner.health()?.with_cache(self.cache.health()))
    }
}
