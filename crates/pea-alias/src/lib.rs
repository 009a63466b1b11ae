//! Module aliasing engine for Pea package graphs
//!
//! When two packages in a graph each define a module with the same name, a
//! consuming package may ask for an upstream module to be compiled under a
//! different name. This crate records those requests, propagates them down
//! the package tree (following chains of renames), and reconciles requests
//! that sibling dependencies make independently for the same module.

pub mod diagnostics;
pub mod index;
pub mod propagate;
pub mod reconcile;
pub mod registry;
pub mod tracker;

// Re-export main types
pub use diagnostics::{Diagnostic, DiagnosticsSink, Severity, TracingSink};
pub use index::{PackageTree, ProductIndex};
pub use registry::{AliasRegistry, ModuleAlias};
pub use tracker::{AliasOptions, AliasReport, ModuleAliasTracker};

use pea_core::error::PeaError;

/// Result type for aliasing operations
pub type AliasResult<T> = Result<T, PeaError>;
