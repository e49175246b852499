//! Registry services shared by every provider flavor.

mod error;
mod registry;

pub use error::{ProviderFailure, RegistryError, RegistryResult};
pub use registry::{FactoryHandle, ProviderRegistry};
