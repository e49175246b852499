//! Unit tests for the provider catalog.

mod support;
