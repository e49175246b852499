//! Guarded execution of factory `create` calls.

use super::{Admission, BreakerPolicy, BreakerStats};
use crate::catalog::domain::CircuitState;
use crate::catalog::ports::{CreateContext, ProviderError, ProviderResult};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Failure of a breaker-guarded construction.
#[derive(Debug, Clone, Error)]
pub enum BreakerError {
    /// The breaker rejected the attempt; the factory was never invoked.
    #[error("circuit breaker is open")]
    Open,
    /// The factory returned an error.
    #[error("factory failed: {0}")]
    Rejected(#[source] ProviderError),
    /// The factory did not finish within the construction budget.
    #[error("construction timed out after {0:?}")]
    TimedOut(Duration),
    /// The caller cancelled the construction.
    #[error("construction was cancelled")]
    Cancelled,
}

/// Circuit breaker owning one policy and a construction timeout.
#[derive(Debug)]
pub struct CircuitBreaker {
    key: String,
    policy: Mutex<Box<dyn BreakerPolicy>>,
    construction_timeout: Duration,
}

impl CircuitBreaker {
    /// Creates a breaker for the provider registered under `key`.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        policy: Box<dyn BreakerPolicy>,
        construction_timeout: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            policy: Mutex::new(policy),
            construction_timeout,
        }
    }

    /// Returns the configured construction timeout.
    #[must_use]
    pub const fn construction_timeout(&self) -> Duration {
        self.construction_timeout
    }

    // Policy state is plain counters and stays consistent across a poisoned lock.
    fn policy(&self) -> MutexGuard<'_, Box<dyn BreakerPolicy>> {
        self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `operation` if the breaker admits it.
    ///
    /// The operation is bounded by the construction timeout, shortened to the
    /// context deadline when that is sooner, and abandoned when the context is
    /// cancelled. Timeouts count as failures; cancellation releases the
    /// admission without recording an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`BreakerError::Open`] without polling `operation` when the
    /// breaker rejects the attempt, otherwise the factory error, timeout, or
    /// cancellation.
    pub async fn call<C, T, F>(
        &self,
        clock: &C,
        context: &CreateContext,
        operation: F,
    ) -> Result<T, BreakerError>
    where
        C: Clock + Send + Sync + ?Sized,
        F: Future<Output = ProviderResult<T>> + Send,
    {
        if context.is_cancelled() {
            return Err(BreakerError::Cancelled);
        }
        if self.policy().try_acquire(clock.utc()) == Admission::Rejected {
            return Err(BreakerError::Open);
        }

        let attempt = Attempt {
            breaker: self,
            clock,
            settled: false,
        };
        let budget = context
            .remaining()
            .map_or(self.construction_timeout, |remaining| {
                remaining.min(self.construction_timeout)
            });

        let outcome = tokio::select! {
            biased;
            () = context.cancellation().cancelled() => return Err(BreakerError::Cancelled),
            result = tokio::time::timeout(budget, operation) => result,
        };

        match outcome {
            Ok(Ok(value)) => {
                attempt.settle(true);
                Ok(value)
            }
            Ok(Err(source)) => {
                attempt.settle(false);
                Err(BreakerError::Rejected(source))
            }
            Err(_) => {
                attempt.settle(false);
                Err(BreakerError::TimedOut(budget))
            }
        }
    }

    /// Returns the breaker state at `now`.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> CircuitState {
        self.policy().state(now)
    }

    /// Returns a figures snapshot at `now`.
    #[must_use]
    pub fn stats(&self, now: DateTime<Utc>) -> BreakerStats {
        self.policy().stats(now)
    }

    /// Forces the breaker closed.
    pub fn reset(&self) {
        self.policy().reset();
    }
}

/// Releases an admission if the guarded future is dropped before settling.
struct Attempt<'a, C: Clock + Send + Sync + ?Sized> {
    breaker: &'a CircuitBreaker,
    clock: &'a C,
    settled: bool,
}

impl<C: Clock + Send + Sync + ?Sized> Attempt<'_, C> {
    fn settle(mut self, success: bool) {
        self.settled = true;
        let now = self.clock.utc();
        let mut policy = self.breaker.policy();
        policy.record_outcome(success, now);
        if !success && policy.state(now) == CircuitState::Open {
            warn!(key = %self.breaker.key, "circuit breaker open");
        }
    }
}

impl<C: Clock + Send + Sync + ?Sized> Drop for Attempt<'_, C> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.policy().release(self.clock.utc());
        }
    }
}
