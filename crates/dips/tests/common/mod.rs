//! Shared test utilities for dips integration tests.
//!
//! This module provides:
//! - `TestHarness` with an on-disk store, an in-memory index and a recording queue
//! - Builders for METS manifests

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
