//! Resource flavor of the provider registry.
//!
//! Resources are URI-addressed, readable content providers. Their factories
//! are guarded by a [`ThresholdPolicy`](crate::catalog::breaker::ThresholdPolicy)
//! breaker, and read content is cached per URI with a time-to-live.
//!
//! - Content types in [`domain`]
//! - The instance contract in [`ports`]
//! - The content cache in [`cache`]
//! - In-memory factories in [`adapters`]
//! - Registry specialisation in [`services`]

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod ports;
pub mod services;

pub use cache::ContentCache;
pub use domain::{CachedContent, ResourceBody, ResourceContent};
pub use ports::{Resource, ResourceFactory};
pub use services::{ResourceKind, ResourceRegistry};
