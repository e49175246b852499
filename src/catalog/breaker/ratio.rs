//! Failure-ratio breaker used for tool factories.

use super::{Admission, BreakerPolicy, BreakerStats};
use crate::catalog::domain::CircuitState;
use crate::config::RatioBreakerConfig;
use chrono::{DateTime, Utc};

/// Trips when the failure ratio inside a rolling interval crosses a limit.
///
/// While closed, completed attempts and failures are counted per interval;
/// the counts restart when the interval elapses. Once at least
/// `min_requests` attempts completed and `failures / requests` reaches
/// `failure_ratio`, the breaker opens. After `open_timeout` it admits up to
/// `half_open_max_probes` concurrent probes: any failing probe reopens it,
/// and that many consecutive successes close it.
#[derive(Debug, Clone)]
pub struct RatioPolicy {
    config: RatioBreakerConfig,
    state: CircuitState,
    window_started_at: Option<DateTime<Utc>>,
    requests: u32,
    failures: u32,
    probes_in_flight: u32,
    probe_successes: u32,
    opened_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
}

impl RatioPolicy {
    /// Creates a closed policy.
    #[must_use]
    pub const fn new(config: RatioBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            window_started_at: None,
            requests: 0,
            failures: 0,
            probes_in_flight: 0,
            probe_successes: 0,
            opened_at: None,
            last_failure_at: None,
        }
    }

    fn max_probes(&self) -> u32 {
        self.config.half_open_max_probes.max(1)
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        match self.state {
            CircuitState::Open => {
                let reopens_at = self
                    .opened_at
                    .and_then(|opened| opened.checked_add_signed(self.config.open_timeout()));
                if reopens_at.is_none_or(|deadline| now >= deadline) {
                    self.state = CircuitState::HalfOpen;
                    self.probes_in_flight = 0;
                    self.probe_successes = 0;
                }
            }
            CircuitState::Closed => {
                let window_ends_at = self
                    .window_started_at
                    .and_then(|started| started.checked_add_signed(self.config.interval()));
                if window_ends_at.is_none_or(|deadline| now >= deadline) {
                    self.window_started_at = Some(now);
                    self.requests = 0;
                    self.failures = 0;
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "failure ratio is configured as a fraction"
    )]
    fn ratio_exceeded(&self) -> bool {
        if self.requests == 0 || self.requests < self.config.min_requests {
            return false;
        }
        f64::from(self.failures) / f64::from(self.requests) >= self.config.failure_ratio
    }

    fn trip(&mut self, now: DateTime<Utc>) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.probes_in_flight = 0;
        self.probe_successes = 0;
    }

    fn close(&mut self, now: DateTime<Utc>) {
        self.state = CircuitState::Closed;
        self.window_started_at = Some(now);
        self.requests = 0;
        self.failures = 0;
        self.probes_in_flight = 0;
        self.probe_successes = 0;
        self.opened_at = None;
    }
}

impl BreakerPolicy for RatioPolicy {
    fn try_acquire(&mut self, now: DateTime<Utc>) -> Admission {
        self.advance(now);
        match self.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => Admission::Rejected,
            CircuitState::HalfOpen if self.probes_in_flight < self.max_probes() => {
                self.probes_in_flight = self.probes_in_flight.saturating_add(1);
                Admission::Allowed
            }
            CircuitState::HalfOpen => Admission::Rejected,
        }
    }

    fn record_outcome(&mut self, success: bool, now: DateTime<Utc>) {
        if !success {
            self.last_failure_at = Some(now);
        }

        match self.state {
            CircuitState::Closed => {
                self.advance(now);
                self.requests = self.requests.saturating_add(1);
                if !success {
                    self.failures = self.failures.saturating_add(1);
                }
                if self.ratio_exceeded() {
                    self.trip(now);
                }
            }
            CircuitState::HalfOpen => {
                self.probes_in_flight = self.probes_in_flight.saturating_sub(1);
                if !success {
                    self.trip(now);
                    return;
                }
                self.probe_successes = self.probe_successes.saturating_add(1);
                if self.probe_successes >= self.max_probes() {
                    self.close(now);
                }
            }
            // Late outcome of an attempt admitted before the trip.
            CircuitState::Open => {}
        }
    }

    fn release(&mut self, _now: DateTime<Utc>) {
        if self.state == CircuitState::HalfOpen {
            self.probes_in_flight = self.probes_in_flight.saturating_sub(1);
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
            probes_in_flight: self.probes_in_flight,
            last_failure_at: self.last_failure_at,
            opened_at: self.opened_at,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
