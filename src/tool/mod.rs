//! Tool flavor of the provider registry.
//!
//! Tools are named, invocable capabilities. Their factories are guarded by
//! a [`RatioPolicy`](crate::catalog::breaker::RatioPolicy) breaker, and
//! [`ToolRegistry::invoke`] is the single entry point a protocol dispatcher
//! calls to run one.
//!
//! - Domain types in [`domain`]
//! - The instance contract in [`ports`]
//! - In-memory factories in [`adapters`]
//! - Registry specialisation in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

pub use domain::ToolDefinition;
pub use ports::{Tool, ToolFactory};
pub use services::{ToolKind, ToolRegistry};
