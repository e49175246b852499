//! Per-factory circuit breaking around provider construction.
//!
//! A [`BreakerPolicy`] decides whether an attempt may proceed and how
//! outcomes move it between [`CircuitState`]s. [`CircuitBreaker`] owns one
//! boxed policy and applies it to an async `create` call together with a
//! construction timeout and the caller's cancellation token.
//!
//! Two strategies ship with the crate: [`RatioPolicy`] trips on a failure
//! ratio inside a rolling interval, and [`ThresholdPolicy`] trips on a
//! decaying failure count.

mod guard;
mod ratio;
mod threshold;

pub use guard::{BreakerError, CircuitBreaker};
pub use ratio::RatioPolicy;
pub use threshold::ThresholdPolicy;

use crate::catalog::domain::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision returned by [`BreakerPolicy::try_acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The attempt may proceed; its outcome must be recorded or released.
    Allowed,
    /// The attempt must not invoke the factory.
    Rejected,
}

/// Point-in-time breaker figures for metrics and health surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerStats {
    /// Current state.
    pub state: CircuitState,
    /// Completed attempts counted by the policy.
    pub requests: u32,
    /// Failed attempts counted by the policy.
    pub failures: u32,
    /// Half-open probes currently in flight.
    pub probes_in_flight: u32,
    /// When the most recent failure was recorded.
    pub last_failure_at: Option<DateTime<Utc>>,
    /// When the breaker last tripped open.
    pub opened_at: Option<DateTime<Utc>>,
}

/// Strategy contract shared by every breaker variant.
///
/// Every admitted attempt must be followed by exactly one call to either
/// [`record_outcome`](Self::record_outcome) or [`release`](Self::release).
pub trait BreakerPolicy: Send + fmt::Debug {
    /// Asks whether an attempt may proceed at `now`.
    fn try_acquire(&mut self, now: DateTime<Utc>) -> Admission;

    /// Records the outcome of an admitted attempt.
    fn record_outcome(&mut self, success: bool, now: DateTime<Utc>);

    /// Abandons an admitted attempt without recording an outcome.
    fn release(&mut self, now: DateTime<Utc>);

    /// Returns the state at `now`, advancing an expired open state to half-open.
    fn state(&mut self, now: DateTime<Utc>) -> CircuitState;

    /// Returns a figures snapshot at `now`.
    fn stats(&mut self, now: DateTime<Utc>) -> BreakerStats;

    /// Forces the breaker closed and clears every counter.
    fn reset(&mut self);
}
