//! Adapter helpers shared by the in-memory provider factories.

pub mod memory;
