//! Core data types for Pea package graphs.
//!
//! This module provides the read model the module-aliasing engine works on:
//! - Identity types used as arena keys
//! - Packages, targets and products
//! - Source sets with language detection

pub mod graph;
pub mod identity;
pub mod package;
pub mod product;
pub mod source;
pub mod target;

// Re-export all public types
pub use graph::PackageGraph;
pub use identity::{PackageIdentity, ProductId, TargetId};
pub use package::Package;
pub use product::Product;
pub use source::{SourceLanguage, SourceSet};
pub use target::{ModuleAliases, ProductRef, Target, TargetDependency};
