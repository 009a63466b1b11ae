//! Pea benchmarking suite
//!
//! Benchmarks for the module-aliasing engine: tracking synthetic package
//! graphs of varying depth and width, and loading graph snapshots.

pub mod common;

pub use common::*;
