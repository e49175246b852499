//! Port contracts for the provider catalog.

mod factory;
mod kind;

pub use factory::{CreateContext, ProviderConfig, ProviderError, ProviderFactory, ProviderResult};
pub use kind::{EvictionListener, ProviderKind};
