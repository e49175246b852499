//! Fault injection for in-memory provider factories.

use crate::catalog::ports::{ProviderError, ProviderResult};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Shared switchboard controlling how an in-memory factory and its
/// instances misbehave.
///
/// Clones share state, so a test can keep one handle while the registry
/// owns the factory.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    state: Arc<RwLock<FaultState>>,
}

#[derive(Debug, Default)]
struct FaultState {
    pending_failures: u32,
    delay: Option<Duration>,
    creates: u64,
    unhealthy: Option<String>,
    config_error: Option<String>,
}

impl FaultInjector {
    /// Creates an injector that never interferes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ProviderResult<RwLockReadGuard<'_, FaultState>> {
        self.state
            .read()
            .map_err(|err| ProviderError::runtime(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> ProviderResult<RwLockWriteGuard<'_, FaultState>> {
        self.state
            .write()
            .map_err(|err| ProviderError::runtime(std::io::Error::other(err.to_string())))
    }

    /// Makes the next `count` constructions fail.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_next(&self, count: u32) -> ProviderResult<()> {
        self.write()?.pending_failures = count;
        Ok(())
    }

    /// Delays every construction by `delay`, or removes the delay.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_delay(&self, delay: Option<Duration>) -> ProviderResult<()> {
        self.write()?.delay = delay;
        Ok(())
    }

    /// Makes instance health checks fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_unhealthy(&self, message: impl Into<String>) -> ProviderResult<()> {
        self.write()?.unhealthy = Some(message.into());
        Ok(())
    }

    /// Makes instance health checks pass again.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn set_healthy(&self) -> ProviderResult<()> {
        self.write()?.unhealthy = None;
        Ok(())
    }

    /// Makes configuration checks fail with `reason`.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn reject_config(&self, reason: impl Into<String>) -> ProviderResult<()> {
        self.write()?.config_error = Some(reason.into());
        Ok(())
    }

    /// Returns how many constructions were attempted.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn create_count(&self) -> ProviderResult<u64> {
        Ok(self.read()?.creates)
    }

    /// Counts one construction, applies the delay and any pending failure.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] while injected failures remain.
    pub async fn before_create(&self) -> ProviderResult<()> {
        let (delay, should_fail) = {
            let mut state = self.write()?;
            state.creates = state.creates.saturating_add(1);
            let should_fail = state.pending_failures > 0;
            state.pending_failures = state.pending_failures.saturating_sub(1);
            (state.delay, should_fail)
        };

        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }
        if should_fail {
            return Err(ProviderError::Unavailable(
                "injected construction failure".to_owned(),
            ));
        }
        Ok(())
    }

    /// Applies an injected configuration rejection.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidConfig`] when a rejection is set.
    pub fn check_config(&self) -> ProviderResult<()> {
        match &self.read()?.config_error {
            Some(reason) => Err(ProviderError::InvalidConfig(reason.clone())),
            None => Ok(()),
        }
    }

    /// Applies an injected health failure.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] when marked unhealthy.
    pub fn check_health(&self) -> ProviderResult<()> {
        match &self.read()?.unhealthy {
            Some(message) => Err(ProviderError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}
