//! Identity types used as arena keys into the package graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a package in the graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIdentity(String);

/// Globally unique product identifier (declaring package + product name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId {
    pub package: PackageIdentity,
    pub name: String,
}

/// Globally unique target identifier (declaring package + target name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId {
    pub package: PackageIdentity,
    pub name: String,
}

impl PackageIdentity {
    /// Create a new package identity
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the identity as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ProductId {
    pub fn new(package: impl Into<PackageIdentity>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.name)
    }
}

impl TargetId {
    pub fn new(package: impl Into<PackageIdentity>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.name)
    }
}
