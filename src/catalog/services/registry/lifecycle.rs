//! Lazy construction, status transitions, restart and the running toggle.

use super::{Pending, ProviderRegistry, Slot};
use crate::catalog::domain::{InstanceId, ProviderStatus};
use crate::catalog::ports::{CreateContext, ProviderConfig, ProviderError, ProviderKind};
use crate::catalog::services::error::{RegistryError, RegistryResult};
use crate::catalog::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What an installation failure does to the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OnFailure {
    /// Record the reason and keep the status.
    Record,
    /// Record the reason and move the entry to `error`.
    MarkError,
}

impl<K, C> ProviderRegistry<K, C>
where
    K: ProviderKind,
    C: Clock + Send + Sync,
{
    /// Returns the live instance for `key`, building it on first use.
    ///
    /// Equivalent to [`get_with`](Self::get_with) with an unbounded context.
    ///
    /// # Errors
    ///
    /// See [`get_with`](Self::get_with).
    pub async fn get(&self, key: &str) -> RegistryResult<Arc<K::Instance>> {
        self.get_with(key, &CreateContext::default()).await
    }

    /// Returns the live instance for `key`, building it on first use.
    ///
    /// A cached instance is returned as is. Otherwise the factory is invoked
    /// outside the catalog lock under the breaker and construction timeout,
    /// the result is checked against the descriptor, installed, and the entry
    /// moves to `loaded`. Concurrent first calls may both build; the last
    /// install wins. A failed build records the reason and leaves the status
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RegistryNotRunning`] while stopped,
    /// [`RegistryError::NotFound`] for unknown keys,
    /// [`RegistryError::InvalidTransition`] for `error` or `disabled`
    /// entries, and construction or validation failures.
    #[instrument(skip(self, context), fields(kind = K::KIND))]
    pub async fn get_with(
        &self,
        key: &str,
        context: &CreateContext,
    ) -> RegistryResult<Arc<K::Instance>> {
        let pending = {
            let state = self.read_state()?;
            if !state.running {
                return Err(RegistryError::RegistryNotRunning { kind: K::KIND });
            }
            let slot = state.slots.get(key).ok_or_else(|| Self::not_found(key))?;
            if let Some(instance) = &slot.instance {
                return Ok(Arc::clone(instance));
            }
            let status = slot.entry.status();
            if status.drops_instance() {
                return Err(RegistryError::InvalidTransition {
                    kind: K::KIND,
                    key: key.to_owned(),
                    from: status,
                    to: ProviderStatus::Loaded,
                });
            }
            Pending::capture(key, slot)
        };

        let outcome = self.build(&pending, context).await;
        self.install(&pending, outcome, OnFailure::Record)
    }

    /// Moves `key` to `target`.
    ///
    /// Entering `error` or `disabled` drops the live instance and any cached
    /// state. Entering `loaded` without an instance builds one first; a failed
    /// build leaves the entry in `error`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidTransition`] for transitions outside
    /// the table, [`RegistryError::RegistryNotRunning`] when advancing into
    /// `loaded` or `active` while stopped, and build failures.
    #[instrument(skip(self, context), fields(kind = K::KIND))]
    pub async fn transition_status(
        &self,
        key: &str,
        target: ProviderStatus,
        context: &CreateContext,
    ) -> RegistryResult<()> {
        let pending = {
            let mut state = self.write_state()?;
            let running = state.running;
            let epoch = state.bump_epoch();
            let slot = state
                .slots
                .get_mut(key)
                .ok_or_else(|| Self::not_found(key))?;
            let from = slot.entry.status();
            if !from.can_transition_to(target) {
                return Err(RegistryError::InvalidTransition {
                    kind: K::KIND,
                    key: key.to_owned(),
                    from,
                    to: target,
                });
            }
            if target.requires_running() && !running {
                return Err(RegistryError::RegistryNotRunning { kind: K::KIND });
            }
            if from == target {
                return Ok(());
            }

            if target == ProviderStatus::Loaded && slot.instance.is_none() {
                Some(Pending::capture(key, slot))
            } else {
                self.apply_transition(key, slot, target, epoch)?;
                None
            }
        };

        match pending {
            Some(build) => {
                let outcome = self.build(&build, context).await;
                self.install(&build, outcome, OnFailure::MarkError)
                    .map(|_| ())
            }
            None => {
                if target.drops_instance() {
                    self.notify_evicted(key);
                }
                Ok(())
            }
        }
    }

    fn apply_transition(
        &self,
        key: &str,
        slot: &mut Slot<K>,
        target: ProviderStatus,
        epoch: u64,
    ) -> RegistryResult<()> {
        let from = slot.entry.status();
        slot.entry
            .transition_to(target, self.clock.utc())
            .map_err(|err| RegistryError::InvalidTransition {
                kind: K::KIND,
                key: key.to_owned(),
                from: err.from,
                to: err.to,
            })?;
        if target.drops_instance() {
            slot.invalidate(epoch);
        }
        slot.suspended = false;
        info!(key, %from, to = %target, "provider status changed");
        Ok(())
    }

    /// Rebuilds an `error` or `disabled` entry.
    ///
    /// Drops the old instance, moves to `registered`, resets the breaker,
    /// then builds and validates a fresh instance. The entry lands in
    /// `loaded` on success and `error` on failure.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RegistryNotRunning`] while stopped,
    /// [`RegistryError::NotFound`] for unknown keys,
    /// [`RegistryError::RestartNotAllowed`] from any other status, and build
    /// failures.
    #[instrument(skip(self, context), fields(kind = K::KIND))]
    pub async fn restart(
        &self,
        key: &str,
        context: &CreateContext,
    ) -> RegistryResult<Arc<K::Instance>> {
        let pending = {
            let mut state = self.write_state()?;
            if !state.running {
                return Err(RegistryError::RegistryNotRunning { kind: K::KIND });
            }
            let epoch = state.bump_epoch();
            let slot = state
                .slots
                .get_mut(key)
                .ok_or_else(|| Self::not_found(key))?;
            let status = slot.entry.status();
            if !status.drops_instance() {
                return Err(RegistryError::RestartNotAllowed {
                    kind: K::KIND,
                    key: key.to_owned(),
                    status,
                });
            }
            slot.invalidate(epoch);
            self.apply_transition(key, slot, ProviderStatus::Registered, epoch)?;
            slot.breaker.reset();
            Pending::capture(key, slot)
        };
        self.notify_evicted(key);
        info!(key, "provider restarting");

        let outcome = self.build(&pending, context).await;
        self.install(&pending, outcome, OnFailure::MarkError)
    }

    /// Starts the registry.
    ///
    /// Entries disabled by the previous [`stop`](Self::stop) return to
    /// `registered`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRunning`] when already running.
    #[instrument(skip(self), fields(kind = K::KIND))]
    pub fn start(&self) -> RegistryResult<()> {
        let mut state = self.write_state()?;
        if state.running {
            return Err(RegistryError::AlreadyRunning { kind: K::KIND });
        }
        state.running = true;

        let now = self.clock.utc();
        let mut resumed = 0_usize;
        for (key, slot) in state.slots.iter_mut().filter(|(_, slot)| slot.suspended) {
            slot.suspended = false;
            match slot.entry.transition_to(ProviderStatus::Registered, now) {
                Ok(()) => resumed += 1,
                Err(err) => warn!(key = %key, %err, "suspended provider could not resume"),
            }
        }
        info!(resumed, "registry started");
        Ok(())
    }

    /// Stops the registry.
    ///
    /// Drops every live instance and cached state, and disables every
    /// `registered`, `loaded` or `active` entry; those entries resume on the
    /// next [`start`](Self::start). Entries in `error` stay there. Stopping a
    /// stopped registry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the catalog lock is poisoned.
    #[instrument(skip(self), fields(kind = K::KIND))]
    pub fn stop(&self) -> RegistryResult<()> {
        {
            let mut state = self.write_state()?;
            if !state.running {
                return Ok(());
            }
            state.running = false;

            let now = self.clock.utc();
            let epoch = state.bump_epoch();
            for (key, slot) in &mut state.slots {
                slot.invalidate(epoch);
                let status = slot.entry.status();
                if matches!(
                    status,
                    ProviderStatus::Error | ProviderStatus::Disabled | ProviderStatus::Unknown
                ) {
                    continue;
                }
                match slot.entry.transition_to(ProviderStatus::Disabled, now) {
                    Ok(()) => slot.suspended = true,
                    Err(err) => warn!(key = %key, %err, "provider could not be suspended"),
                }
            }
        }
        self.notify_cleared();
        info!("registry stopped");
        Ok(())
    }

    /// Builds and checks an instance without touching the catalog.
    pub(super) async fn build(
        &self,
        pending: &Pending<K>,
        context: &CreateContext,
    ) -> RegistryResult<Arc<K::Instance>> {
        let key = pending.key.as_str();
        let config = ProviderConfig::from_registry(key, &self.config);
        pending
            .factory
            .validate(&config)
            .map_err(|err| Self::config_rejected(key, &err))?;

        debug!(key, "building provider instance");
        let instance = pending
            .breaker
            .call(
                &*self.clock,
                context,
                pending.factory.create(context, &config),
            )
            .await
            .map_err(|err| RegistryError::from_breaker(K::KIND, key, err))?;

        K::validate_instance(pending.factory.descriptor(), &instance).map_err(|violations| {
            RegistryError::ValidationFailed {
                kind: K::KIND,
                key: key.to_owned(),
                violations,
            }
        })?;
        Ok(instance)
    }

    pub(super) fn config_rejected(key: &str, error: &ProviderError) -> RegistryError {
        let mut violations = ValidationErrors::new();
        violations.push("config", key, error.to_string());
        RegistryError::ValidationFailed {
            kind: K::KIND,
            key: key.to_owned(),
            violations,
        }
    }

    /// Installs a build outcome if the entry was not invalidated meanwhile.
    pub(super) fn install(
        &self,
        pending: &Pending<K>,
        outcome: RegistryResult<Arc<K::Instance>>,
        on_failure: OnFailure,
    ) -> RegistryResult<Arc<K::Instance>> {
        let key = pending.key.as_str();
        let (result, evict) = {
            let mut state = self.write_state()?;
            let epoch = state.bump_epoch();
            let now = self.clock.utc();
            let Some(slot) = state
                .slots
                .get_mut(key)
                .filter(|slot| slot.epoch == pending.epoch)
            else {
                debug!(key, "discarding build for invalidated entry");
                return Err(RegistryError::Superseded {
                    kind: K::KIND,
                    key: key.to_owned(),
                });
            };

            match outcome {
                Ok(instance) => {
                    Self::install_instance(key, slot, &instance, now)?;
                    (Ok(instance), false)
                }
                Err(error) => {
                    let evict = Self::record_failure(key, slot, &error, on_failure, epoch, now);
                    (Err(error), evict)
                }
            }
        };

        if evict {
            self.notify_evicted(key);
        }
        result
    }

    fn install_instance(
        key: &str,
        slot: &mut Slot<K>,
        instance: &Arc<K::Instance>,
        now: DateTime<Utc>,
    ) -> RegistryResult<()> {
        let from = slot.entry.status();
        if !from.holds_instance() {
            slot.entry
                .transition_to(ProviderStatus::Loaded, now)
                .map_err(|err| RegistryError::InvalidTransition {
                    kind: K::KIND,
                    key: key.to_owned(),
                    from: err.from,
                    to: err.to,
                })?;
        }
        slot.instance = Some(Arc::clone(instance));
        let instance_id = InstanceId::new();
        slot.entry.record_instance(instance_id, now);
        info!(key, %instance_id, "provider instance installed");
        Ok(())
    }

    /// Records a failed outcome; returns whether cached state must be dropped.
    fn record_failure(
        key: &str,
        slot: &mut Slot<K>,
        error: &RegistryError,
        on_failure: OnFailure,
        epoch: u64,
        now: DateTime<Utc>,
    ) -> bool {
        if matches!(error, RegistryError::Cancelled { .. }) {
            debug!(key, "construction cancelled");
            return false;
        }

        warn!(key, %error, "provider construction failed");
        slot.entry.record_failure(error.to_string(), now);
        if on_failure == OnFailure::Record {
            return false;
        }

        match slot.entry.transition_to(ProviderStatus::Error, now) {
            Ok(()) => {
                slot.invalidate(epoch);
                true
            }
            Err(err) => {
                warn!(key, %err, "provider could not be marked as failed");
                false
            }
        }
    }
}
