//! Bulk load and validation across the whole catalog.

use super::lifecycle::OnFailure;
use super::{FactoryHandle, Pending, ProviderRegistry};
use crate::catalog::domain::ProviderStatus;
use crate::catalog::ports::{CreateContext, ProviderConfig, ProviderError, ProviderKind};
use crate::catalog::services::error::{ProviderFailure, RegistryError, RegistryResult};
use futures::future::join_all;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Inputs for re-validating one built instance.
struct Check<K: ProviderKind> {
    key: String,
    factory: FactoryHandle<K>,
    instance: Arc<K::Instance>,
    epoch: u64,
}

impl<K, C> ProviderRegistry<K, C>
where
    K: ProviderKind,
    C: Clock + Send + Sync,
{
    /// Builds every `registered` entry concurrently.
    ///
    /// Successes move to `loaded`; failures move to `error` with the reason
    /// recorded. One failure never stops the remaining builds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RegistryNotRunning`] while stopped and
    /// [`RegistryError::Aggregate`] naming every key that failed.
    #[instrument(skip(self, context), fields(kind = K::KIND))]
    pub async fn load_all(&self, context: &CreateContext) -> RegistryResult<Vec<String>> {
        let pending: Vec<Pending<K>> = {
            let state = self.read_state()?;
            if !state.running {
                return Err(RegistryError::RegistryNotRunning { kind: K::KIND });
            }
            state
                .slots
                .iter()
                .filter(|(_, slot)| {
                    slot.entry.status() == ProviderStatus::Registered && slot.instance.is_none()
                })
                .map(|(key, slot)| Pending::capture(key, slot))
                .collect()
        };

        let outcomes = join_all(pending.iter().map(|build| async move {
            let outcome = self.build(build, context).await;
            (build, outcome)
        }))
        .await;

        let mut loaded = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (build, outcome) in outcomes {
            match self.install(build, outcome, OnFailure::MarkError) {
                Ok(_) => loaded.push(build.key.clone()),
                Err(RegistryError::Superseded { .. }) => {
                    debug!(key = %build.key, "skipping entry changed during load");
                }
                Err(error) => failures.push(ProviderFailure {
                    key: build.key.clone(),
                    error: Box::new(error),
                }),
            }
        }

        info!(loaded = loaded.len(), failed = failures.len(), "bulk load finished");
        Self::aggregate(loaded, failures)
    }

    /// Re-validates every built instance concurrently.
    ///
    /// Each instance is checked against its descriptor, its factory's config
    /// check, and its own health check. Successes move to `active`; failures
    /// move to `error`, dropping the instance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RegistryNotRunning`] while stopped and
    /// [`RegistryError::Aggregate`] naming every key that failed.
    #[instrument(skip(self, context), fields(kind = K::KIND))]
    pub async fn validate_all(&self, context: &CreateContext) -> RegistryResult<Vec<String>> {
        let checks: Vec<Check<K>> = {
            let state = self.read_state()?;
            if !state.running {
                return Err(RegistryError::RegistryNotRunning { kind: K::KIND });
            }
            state
                .slots
                .iter()
                .filter_map(|(key, slot)| {
                    slot.instance.as_ref().map(|instance| Check {
                        key: key.clone(),
                        factory: Arc::clone(&slot.factory),
                        instance: Arc::clone(instance),
                        epoch: slot.epoch,
                    })
                })
                .collect()
        };

        let outcomes = join_all(checks.iter().map(|check| async move {
            let outcome = self.check_instance(check, context).await;
            (check, outcome)
        }))
        .await;

        let mut activated = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (check, outcome) in outcomes {
            match self.record_check(check, outcome) {
                Ok(true) => activated.push(check.key.clone()),
                Ok(false) => debug!(key = %check.key, "skipping entry changed during validation"),
                Err(error) => failures.push(ProviderFailure {
                    key: check.key.clone(),
                    error: Box::new(error),
                }),
            }
        }

        info!(
            activated = activated.len(),
            failed = failures.len(),
            "bulk validation finished"
        );
        Self::aggregate(activated, failures)
    }

    async fn check_instance(&self, check: &Check<K>, context: &CreateContext) -> RegistryResult<()> {
        let key = check.key.as_str();
        let config = ProviderConfig::from_registry(key, &self.config);
        check
            .factory
            .validate(&config)
            .map_err(|err| Self::config_rejected(key, &err))?;
        K::validate_instance(check.factory.descriptor(), &check.instance).map_err(|violations| {
            RegistryError::ValidationFailed {
                kind: K::KIND,
                key: key.to_owned(),
                violations,
            }
        })?;

        let budget = self.config.construction_timeout();
        let probe = tokio::select! {
            biased;
            () = context.cancellation().cancelled() => {
                return Err(RegistryError::Cancelled { kind: K::KIND, key: key.to_owned() });
            }
            result = tokio::time::timeout(budget, K::probe(&check.instance)) => result,
        };
        probe
            .unwrap_or_else(|_| {
                Err(ProviderError::Unavailable(format!(
                    "health check timed out after {budget:?}"
                )))
            })
            .map_err(|source| RegistryError::Provider {
                kind: K::KIND,
                key: key.to_owned(),
                source,
            })
    }

    /// Records a validation outcome; `Ok(false)` means the entry changed meanwhile.
    fn record_check(&self, check: &Check<K>, outcome: RegistryResult<()>) -> RegistryResult<bool> {
        let key = check.key.as_str();
        let evicted = {
            let mut state = self.write_state()?;
            let epoch = state.bump_epoch();
            let now = self.clock.utc();
            let Some(slot) = state
                .slots
                .get_mut(key)
                .filter(|slot| slot.epoch == check.epoch)
            else {
                return Ok(false);
            };

            match &outcome {
                Ok(()) => {
                    slot.entry
                        .transition_to(ProviderStatus::Active, now)
                        .map_err(|err| RegistryError::InvalidTransition {
                            kind: K::KIND,
                            key: key.to_owned(),
                            from: err.from,
                            to: err.to,
                        })?;
                    false
                }
                Err(RegistryError::Cancelled { .. }) => false,
                Err(error) => {
                    warn!(key, %error, "provider validation failed");
                    slot.entry.record_failure(error.to_string(), now);
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
        };

        if evicted {
            self.notify_evicted(key);
        }
        outcome.map(|()| true)
    }

    fn aggregate(
        succeeded: Vec<String>,
        failures: Vec<ProviderFailure>,
    ) -> RegistryResult<Vec<String>> {
        if failures.is_empty() {
            Ok(succeeded)
        } else {
            Err(RegistryError::Aggregate {
                kind: K::KIND,
                failures,
            })
        }
    }
}
