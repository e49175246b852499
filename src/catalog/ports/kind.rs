//! Seams that specialise the generic registry per provider flavor.

use super::ProviderResult;
use crate::catalog::breaker::BreakerPolicy;
use crate::catalog::domain::ProviderDescriptor;
use crate::catalog::validation::ValidationErrors;
use crate::config::RegistryConfig;
use futures::future::BoxFuture;

/// Flavor-specific behaviour plugged into the generic registry.
///
/// Implementations are zero-sized markers; every method is an associated
/// function so the registry never stores flavor state.
pub trait ProviderKind: Send + Sync + 'static {
    /// Instance type built by this flavor's factories.
    type Instance: ?Sized + Send + Sync + 'static;

    /// Flavor label used in entries, errors and logs.
    const KIND: &'static str;

    /// Validates the registration key against the factory descriptor.
    ///
    /// # Errors
    ///
    /// Returns every identifier violation found.
    fn validate_identity(
        key: &str,
        descriptor: &ProviderDescriptor,
    ) -> Result<(), ValidationErrors>;

    /// Validates the non-identifying descriptor metadata.
    ///
    /// # Errors
    ///
    /// Returns every metadata violation found.
    fn validate_descriptor(descriptor: &ProviderDescriptor) -> Result<(), ValidationErrors>;

    /// Checks a freshly built instance against its factory descriptor.
    ///
    /// # Errors
    ///
    /// Returns every mismatch found.
    fn validate_instance(
        descriptor: &ProviderDescriptor,
        instance: &Self::Instance,
    ) -> Result<(), ValidationErrors>;

    /// Runs the instance's own health check.
    fn probe(instance: &Self::Instance) -> BoxFuture<'_, ProviderResult<()>>;

    /// Builds the breaker strategy for one factory.
    fn breaker_policy(config: &RegistryConfig) -> Box<dyn BreakerPolicy>;
}

/// Observer told when cached per-key state must be discarded.
///
/// The registry calls listeners after releasing the catalog lock.
pub trait EvictionListener: Send + Sync {
    /// Discards state held for `key`.
    fn evicted(&self, key: &str);

    /// Discards state held for every key.
    fn cleared(&self);
}
