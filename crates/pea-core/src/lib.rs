//! # pea-core
//!
//! Core types and utilities shared across all Pea crates.
//!
//! This crate provides:
//! - The package graph read model (packages, targets, products) consumed by the
//!   module-aliasing engine
//! - Identity types used as arena keys for that graph
//! - PeaError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (PackageGraph, Target, Product, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{PeaError, PeaResult};
pub use types::{
    Package, PackageGraph, PackageIdentity, Product, ProductId, ProductRef, SourceLanguage,
    SourceSet, Target, TargetDependency, TargetId,
};
