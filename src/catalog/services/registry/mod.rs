//! Generic provider registry shared by the tool and resource flavors.
//!
//! One [`RwLock`] guards the catalog. Construction never runs under it:
//! callers check state under the lock, release it, build the instance, then
//! reacquire the exclusive lock only to install the result. Every
//! invalidation (unregister, error, disable, restart, stop) stamps the slot
//! with a fresh epoch, so a build started before the invalidation cannot
//! repopulate the entry.

mod bulk;
mod lifecycle;

use super::error::{RegistryError, RegistryResult};
use crate::catalog::breaker::{BreakerStats, CircuitBreaker};
use crate::catalog::domain::{CatalogEntry, ProviderStatus, RegistryHealth};
use crate::catalog::ports::{EvictionListener, ProviderFactory, ProviderKind};
use crate::config::RegistryConfig;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, instrument};

/// Shared handle to a factory of flavor `K`.
pub type FactoryHandle<K> = Arc<dyn ProviderFactory<Instance = <K as ProviderKind>::Instance>>;

/// Catalog of provider factories, their breakers and live instances.
pub struct ProviderRegistry<K, C = DefaultClock>
where
    K: ProviderKind,
    C: Clock + Send + Sync,
{
    state: RwLock<RegistryState<K>>,
    config: RegistryConfig,
    clock: Arc<C>,
    listener: Option<Arc<dyn EvictionListener>>,
}

struct RegistryState<K: ProviderKind> {
    running: bool,
    last_epoch: u64,
    slots: BTreeMap<String, Slot<K>>,
}

impl<K: ProviderKind> RegistryState<K> {
    const fn bump_epoch(&mut self) -> u64 {
        self.last_epoch = self.last_epoch.wrapping_add(1);
        self.last_epoch
    }
}

struct Slot<K: ProviderKind> {
    factory: FactoryHandle<K>,
    breaker: Arc<CircuitBreaker>,
    entry: CatalogEntry,
    instance: Option<Arc<K::Instance>>,
    epoch: u64,
    suspended: bool,
}

impl<K: ProviderKind> Slot<K> {
    /// Drops the live instance and invalidates in-flight builds.
    fn invalidate(&mut self, epoch: u64) {
        self.instance = None;
        self.epoch = epoch;
    }
}

/// Build inputs captured under the lock.
struct Pending<K: ProviderKind> {
    key: String,
    factory: FactoryHandle<K>,
    breaker: Arc<CircuitBreaker>,
    epoch: u64,
}

impl<K: ProviderKind> Pending<K> {
    fn capture(key: &str, slot: &Slot<K>) -> Self {
        Self {
            key: key.to_owned(),
            factory: Arc::clone(&slot.factory),
            breaker: Arc::clone(&slot.breaker),
            epoch: slot.epoch,
        }
    }
}

impl<K, C> fmt::Debug for ProviderRegistry<K, C>
where
    K: ProviderKind,
    C: Clock + Send + Sync,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ProviderRegistry")
            .field("kind", &K::KIND)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<K> ProviderRegistry<K, DefaultClock>
where
    K: ProviderKind,
{
    /// Creates a stopped registry using the system clock.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::new(config, Arc::new(DefaultClock))
    }
}

impl<K, C> ProviderRegistry<K, C>
where
    K: ProviderKind,
    C: Clock + Send + Sync,
{
    /// Creates a stopped registry.
    ///
    /// Entries can be registered while stopped; call
    /// [`start`](Self::start) before building instances.
    #[must_use]
    pub fn new(config: RegistryConfig, clock: Arc<C>) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                running: false,
                last_epoch: 0,
                slots: BTreeMap::new(),
            }),
            config,
            clock,
            listener: None,
        }
    }

    /// Attaches a listener told when per-key cached state must be dropped.
    #[must_use]
    pub fn with_eviction_listener(mut self, listener: Arc<dyn EvictionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Returns the registry configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the clock used for timestamps and breaker timing.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn read_state(&self) -> RegistryResult<RwLockReadGuard<'_, RegistryState<K>>> {
        self.state
            .read()
            .map_err(|_| RegistryError::LockPoisoned { kind: K::KIND })
    }

    fn write_state(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState<K>>> {
        self.state
            .write()
            .map_err(|_| RegistryError::LockPoisoned { kind: K::KIND })
    }

    fn not_found(key: &str) -> RegistryError {
        RegistryError::NotFound {
            kind: K::KIND,
            key: key.to_owned(),
        }
    }

    fn notify_evicted(&self, key: &str) {
        if let Some(listener) = &self.listener {
            listener.evicted(key);
        }
    }

    fn notify_cleared(&self) {
        if let Some(listener) = &self.listener {
            listener.cleared();
        }
    }

    /// Registers a factory under `key`.
    ///
    /// The key must equal the descriptor's key. Registration is never
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidIdentifier`] or
    /// [`RegistryError::ValidationFailed`] when checks fail, and
    /// [`RegistryError::AlreadyExists`] when the key is taken.
    #[instrument(skip(self, factory), fields(kind = K::KIND))]
    pub fn register(&self, key: &str, factory: FactoryHandle<K>) -> RegistryResult<CatalogEntry> {
        let descriptor = factory.descriptor();
        K::validate_identity(key, descriptor).map_err(|violations| {
            RegistryError::InvalidIdentifier {
                kind: K::KIND,
                key: key.to_owned(),
                violations,
            }
        })?;
        K::validate_descriptor(descriptor).map_err(|violations| {
            RegistryError::ValidationFailed {
                kind: K::KIND,
                key: key.to_owned(),
                violations,
            }
        })?;

        let mut state = self.write_state()?;
        if state.slots.contains_key(key) {
            return Err(RegistryError::AlreadyExists {
                kind: K::KIND,
                key: key.to_owned(),
            });
        }

        let entry = CatalogEntry::new(K::KIND, descriptor, self.clock.utc());
        let breaker = Arc::new(CircuitBreaker::new(
            key,
            K::breaker_policy(&self.config),
            self.config.construction_timeout(),
        ));
        let epoch = state.bump_epoch();
        state.slots.insert(
            key.to_owned(),
            Slot {
                factory,
                breaker,
                entry: entry.clone(),
                instance: None,
                epoch,
                suspended: false,
            },
        );
        info!(key, "provider registered");
        Ok(entry)
    }

    /// Removes a factory together with its breaker, instance and cached state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no entry exists.
    #[instrument(skip(self), fields(kind = K::KIND))]
    pub fn unregister(&self, key: &str) -> RegistryResult<CatalogEntry> {
        let removed = {
            let mut state = self.write_state()?;
            state.slots.remove(key).ok_or_else(|| Self::not_found(key))?
        };
        self.notify_evicted(key);
        info!(key, "provider unregistered");
        Ok(removed.entry)
    }

    /// Returns the factory registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no entry exists.
    pub fn get_factory(&self, key: &str) -> RegistryResult<FactoryHandle<K>> {
        let state = self.read_state()?;
        state
            .slots
            .get(key)
            .map(|slot| Arc::clone(&slot.factory))
            .ok_or_else(|| Self::not_found(key))
    }

    /// Returns a snapshot of every catalog entry, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the catalog lock is poisoned.
    pub fn list(&self) -> RegistryResult<Vec<CatalogEntry>> {
        let state = self.read_state()?;
        Ok(state.slots.values().map(|slot| slot.entry.clone()).collect())
    }

    /// Returns a snapshot of one catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no entry exists.
    pub fn entry(&self, key: &str) -> RegistryResult<CatalogEntry> {
        let state = self.read_state()?;
        state
            .slots
            .get(key)
            .map(|slot| slot.entry.clone())
            .ok_or_else(|| Self::not_found(key))
    }

    /// Returns the live instance for `key` without building one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the catalog lock is poisoned.
    pub fn instance(&self, key: &str) -> RegistryResult<Option<Arc<K::Instance>>> {
        let state = self.read_state()?;
        Ok(state
            .slots
            .get(key)
            .and_then(|slot| slot.instance.as_ref().map(Arc::clone)))
    }

    /// Returns the lifecycle status of `key`, or `unknown` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the catalog lock is poisoned.
    pub fn status(&self, key: &str) -> RegistryResult<ProviderStatus> {
        let state = self.read_state()?;
        Ok(state
            .slots
            .get(key)
            .map_or(ProviderStatus::Unknown, |slot| slot.entry.status()))
    }

    /// Returns whether the registry is running.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the catalog lock is poisoned.
    pub fn is_running(&self) -> RegistryResult<bool> {
        Ok(self.read_state()?.running)
    }

    /// Returns breaker figures for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no entry exists.
    pub fn breaker_stats(&self, key: &str) -> RegistryResult<BreakerStats> {
        let breaker = self.breaker(key)?;
        Ok(breaker.stats(self.clock.utc()))
    }

    /// Forces the breaker for `key` closed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no entry exists.
    #[instrument(skip(self), fields(kind = K::KIND))]
    pub fn reset_breaker(&self, key: &str) -> RegistryResult<()> {
        self.breaker(key)?.reset();
        info!(key, "circuit breaker reset");
        Ok(())
    }

    fn breaker(&self, key: &str) -> RegistryResult<Arc<CircuitBreaker>> {
        let state = self.read_state()?;
        state
            .slots
            .get(key)
            .map(|slot| Arc::clone(&slot.breaker))
            .ok_or_else(|| Self::not_found(key))
    }

    /// Aggregates catalog health.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the catalog lock is poisoned.
    pub fn health(&self) -> RegistryResult<RegistryHealth> {
        let state = self.read_state()?;
        let now = self.clock.utc();

        let mut status_counts = BTreeMap::new();
        let mut providers = BTreeMap::new();
        let mut breakers = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for (key, slot) in &state.slots {
            let status = slot.entry.status();
            *status_counts.entry(status).or_insert(0) += 1;
            providers.insert(key.clone(), status);
            breakers.insert(key.clone(), slot.breaker.status(now));
            if let Some(reason) = slot.entry.last_error() {
                errors.insert(key.clone(), reason.to_owned());
            }
        }

        Ok(RegistryHealth {
            kind: K::KIND.to_owned(),
            status: RegistryHealth::derive_status(state.running, &providers, None),
            running: state.running,
            total: state.slots.len(),
            status_counts,
            providers,
            breakers,
            errors,
            cache: None,
            checked_at: now,
        })
    }
}
