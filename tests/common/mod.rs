//! Common test utilities for flipbook-dl integration tests

#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod sink;

pub use fixtures::*;
pub use sink::*;
