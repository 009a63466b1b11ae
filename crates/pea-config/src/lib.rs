//! Configuration parsing for Pea
//!
//! This crate handles parsing and validation of pea.toml, layering it with
//! the global config, environment and command-line overrides, and loading
//! package graph snapshots for the module-aliasing engine.

pub mod merge;
pub mod snapshot;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use snapshot::{load_snapshot, parse_snapshot, DependencySpec, GraphSnapshot};
pub use self::toml::{parse_pea_toml, AliasingSection, PackageSection, PeaToml};

use pea_core::error::PeaError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, PeaError>;
