//! Domain model for the provider catalog.
//!
//! The catalog domain models provider lifecycle status and its transition
//! table, factory descriptors, per-entry metadata snapshots, circuit state,
//! and registry health. Nothing here touches live provider instances.

mod circuit;
mod descriptor;
mod entry;
mod error;
mod health;
mod ids;
mod status;

pub use circuit::CircuitState;
pub use descriptor::ProviderDescriptor;
pub use entry::CatalogEntry;
pub use error::{InvalidStatusTransition, ParseCircuitStateError, ParseProviderStatusError};
pub use health::{CacheHealth, HealthStatus, RegistryHealth};
pub use ids::InstanceId;
pub use status::{ProviderStatus, is_valid_transition};
