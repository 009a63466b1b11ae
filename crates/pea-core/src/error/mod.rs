//! Error types and result aliases for Pea operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Pea ecosystem with actionable error messages.

use thiserror::Error;

/// Unified error type for all Pea operations
#[derive(Error, Debug)]
pub enum PeaError {
    // Config errors
    #[error("Failed to parse {file}: {message} at line {line}, column {column}")]
    TomlParse {
        file: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Graph lookup errors
    #[error("Package '{name}' not found in package graph")]
    PackageNotFound { name: String },

    #[error("Product '{product}' not found in package '{package}'")]
    ProductNotFound { package: String, product: String },

    #[error("Target '{target}' not found in package '{package}'")]
    TargetNotFound { package: String, target: String },

    // Module aliasing errors
    #[error(
        "Multiple aliases requested for module '{module}' of product '{product}' from package '{package}': {aliases}"
    )]
    ConflictingRename {
        module: String,
        product: String,
        package: String,
        aliases: String,
    },

    #[error(
        "Target '{target}' of product '{product}' from package '{package}' cannot be aliased: its sources are not all in the primary language"
    )]
    UnsupportedRenameTarget {
        target: String,
        product: String,
        package: String,
    },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Pea operations
pub type PeaResult<T> = Result<T, PeaError>;

impl PeaError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a config validation error
    pub fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error was raised while registering or validating module aliases
    pub fn is_alias_error(&self) -> bool {
        matches!(
            self,
            PeaError::ConflictingRename { .. } | PeaError::UnsupportedRenameTarget { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PeaError::ConflictingRename { .. } => {
                Some("Request the same alias for this module everywhere it is renamed")
            },
            PeaError::UnsupportedRenameTarget { .. } => {
                Some("Only targets written entirely in the primary language can be aliased; split other sources into their own target")
            },
            PeaError::CircularDependency { .. } => {
                Some("Remove circular dependencies by restructuring your packages")
            },
            PeaError::PackageNotFound { .. } | PeaError::ProductNotFound { .. } => {
                Some("Check the package and product names in the dependency declaration")
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_rename_display() {
        let error = PeaError::ConflictingRename {
            module: "Utils".to_string(),
            product: "Utils".to_string(),
            package: "lib".to_string(),
            aliases: "BarUtils, FooUtils".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("'Utils'"));
        assert!(message.contains("'lib'"));
        assert!(message.contains("BarUtils, FooUtils"));
        assert!(error.is_alias_error());
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;

        let error = PeaError::io(
            "Failed to read graph.toml".to_string(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );

        assert!(error.source().is_some());
        assert!(!error.is_alias_error());
        assert_eq!(error.suggestion(), None);
    }
}
