//! Armature: capability-hosting core for MCP servers.
//!
//! This crate owns the catalog of tools and resources a server exposes:
//! registering provider factories, building instances lazily under circuit
//! breakers, tracking each provider through an explicit lifecycle, and
//! reporting aggregated health. The wire protocol, configuration loading and
//! process lifecycle belong to the host.
//!
//! # Architecture
//!
//! Armature follows hexagonal architecture principles:
//!
//! - **Domain**: lifecycle status, descriptors, entries and health snapshots
//! - **Ports**: factory and instance traits providers implement
//! - **Adapters**: in-memory factories for tests and local wiring
//! - **Services**: the generic registry and its tool and resource flavors
//!
//! # Modules
//!
//! - [`catalog`]: flavor-independent registry core, validation and breakers
//! - [`tool`]: tool registry and invocation
//! - [`resource`]: resource registry and content cache
//! - [`config`]: registry configuration
//!
//! # Examples
//!
//! ```
//! use armature::config::RegistryConfig;
//! use armature::tool::{ToolRegistry, adapters::memory::StaticToolFactory};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
//! let registry: ToolRegistry = ToolRegistry::with_config(RegistryConfig::default());
//! registry
//!     .register("echo", Arc::new(StaticToolFactory::echo("echo", "Echoes its input")))
//!     .expect("valid tool");
//! registry.start().expect("registry starts");
//!
//! let output = registry.invoke("echo", json!({"text": "hi"})).await.expect("tool runs");
//! assert_eq!(output["echo"]["text"], "hi");
//! # });
//! ```

pub mod catalog;
pub mod config;
pub mod resource;
pub mod tool;
