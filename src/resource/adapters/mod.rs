//! Resource factory adapters.

pub mod memory;
