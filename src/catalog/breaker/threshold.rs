//! Failure-count breaker used for resource factories.

use super::{Admission, BreakerPolicy, BreakerStats};
use crate::catalog::domain::CircuitState;
use crate::config::ThresholdBreakerConfig;
use chrono::{DateTime, Utc};

/// Trips when a decaying failure count reaches `max_failures`.
///
/// Failures increment the count and successes decrement it, so sporadic
/// failures among successful attempts never trip the breaker. After
/// `retry_timeout` exactly one trial is admitted.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    config: ThresholdBreakerConfig,
    state: CircuitState,
    requests: u32,
    failures: u32,
    trial_in_flight: bool,
    opened_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
}

impl ThresholdPolicy {
    /// Creates a closed policy.
    #[must_use]
    pub const fn new(config: ThresholdBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            requests: 0,
            failures: 0,
            trial_in_flight: false,
            opened_at: None,
            last_failure_at: None,
        }
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        if self.state != CircuitState::Open {
            return;
        }
        let retry_at = self
            .opened_at
            .and_then(|opened| opened.checked_add_signed(self.config.retry_timeout()));
        if retry_at.is_none_or(|deadline| now >= deadline) {
            self.state = CircuitState::HalfOpen;
            self.trial_in_flight = false;
        }
    }

    fn trip(&mut self, now: DateTime<Utc>) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.trial_in_flight = false;
    }
}

impl BreakerPolicy for ThresholdPolicy {
    fn try_acquire(&mut self, now: DateTime<Utc>) -> Admission {
        self.advance(now);
        match self.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::HalfOpen if !self.trial_in_flight => {
                self.trial_in_flight = true;
                Admission::Allowed
            }
            CircuitState::HalfOpen | CircuitState::Open => Admission::Rejected,
        }
    }

    fn record_outcome(&mut self, success: bool, now: DateTime<Utc>) {
        self.requests = self.requests.saturating_add(1);
        if !success {
            self.last_failure_at = Some(now);
        }

        match (self.state, success) {
            (CircuitState::Closed, true) => {
                self.failures = self.failures.saturating_sub(1);
            }
            (CircuitState::Closed, false) => {
                self.failures = self.failures.saturating_add(1);
                if self.failures >= self.config.max_failures.max(1) {
                    self.trip(now);
                }
            }
            (CircuitState::HalfOpen, true) => self.reset(),
            (CircuitState::HalfOpen, false) => self.trip(now),
            (CircuitState::Open, _) => {}
        }
    }

    fn release(&mut self, _now: DateTime<Utc>) {
        if self.state == CircuitState::HalfOpen {
            self.trial_in_flight = false;
        }
    }

    fn state(&mut self, now: DateTime<Utc>) -> CircuitState {
        self.advance(now);
        self.state
    }

    fn stats(&mut self, now: DateTime<Utc>) -> BreakerStats {
        self.advance(now);
        BreakerStats {
            state: self.state,
            requests: self.requests,
            failures: self.failures,
            probes_in_flight: u32::from(self.trial_in_flight),
            last_failure_at: self.last_failure_at,
            opened_at: self.opened_at,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
