//! Test infrastructure for the search registry.
//!
//! Provides a recording in-memory cluster and helpers for writing mapping
//! and template trees to temporary directories.

#![allow(dead_code)]

pub mod fixtures;
pub mod logs;
pub mod mock;

pub use fixtures::*;
pub use logs::*;
pub use mock::*;
