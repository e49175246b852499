//! Provider catalog: the flavor-independent core of both registries.
//!
//! The catalog tracks registered factories, their lifecycle status, their
//! circuit breakers and the instances built from them. The tool and resource
//! registries are thin specialisations selected through
//! [`ports::ProviderKind`]. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Metadata checks in [`validation`]
//! - Construction guarding in [`breaker`]
//! - Port contracts in [`ports`]
//! - In-memory adapter helpers in [`adapters`]
//! - The generic registry in [`services`]

pub mod adapters;
pub mod breaker;
pub mod domain;
pub mod ports;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;
