//! Tool factory adapters.

pub mod memory;
