//! Package graph arena.
//!
//! The graph builder owns every package here; the aliasing engine only holds
//! identity keys and resolves them through these lookups.

use super::{Package, PackageIdentity, Product, ProductId, Target, TargetId};
use crate::error::{PeaError, PeaResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// All packages of one build, keyed by identity in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageGraph {
    packages: IndexMap<PackageIdentity, Package>,
}

impl PackageGraph {
    /// Create a new empty package graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package; fails if the identity is already taken
    pub fn add_package(&mut self, package: Package) -> PeaResult<()> {
        if self.packages.contains_key(&package.identity) {
            return Err(PeaError::config(
                "package",
                format!("duplicate package identity '{}'", package.identity),
            ));
        }
        self.packages.insert(package.identity.clone(), package);
        Ok(())
    }

    pub fn package(&self, identity: &PackageIdentity) -> Option<&Package> {
        self.packages.get(identity)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Identities of every package, in insertion order
    pub fn package_ids(&self) -> impl Iterator<Item = &PackageIdentity> {
        self.packages.keys()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn target(&self, id: &TargetId) -> Option<&Target> {
        self.packages.get(&id.package)?.targets.get(&id.name)
    }

    pub fn target_mut(&mut self, id: &TargetId) -> Option<&mut Target> {
        self.packages.get_mut(&id.package)?.targets.get_mut(&id.name)
    }

    /// Look up a target, failing with `TargetNotFound`
    pub fn require_target(&self, id: &TargetId) -> PeaResult<&Target> {
        self.target(id).ok_or_else(|| target_not_found(id))
    }

    /// Mutable lookup of a target, failing with `TargetNotFound`
    pub fn require_target_mut(&mut self, id: &TargetId) -> PeaResult<&mut Target> {
        self.target_mut(id).ok_or_else(|| target_not_found(id))
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.packages.get(&id.package)?.products.get(&id.name)
    }

    /// Look up a product, failing with `PackageNotFound` or `ProductNotFound`
    pub fn require_product(&self, id: &ProductId) -> PeaResult<&Product> {
        let package = self
            .packages
            .get(&id.package)
            .ok_or_else(|| PeaError::PackageNotFound {
                name: id.package.to_string(),
            })?;
        package
            .products
            .get(&id.name)
            .ok_or_else(|| PeaError::ProductNotFound {
                package: id.package.to_string(),
                product: id.name.clone(),
            })
    }

    /// Every target carrying at least one rename, in graph order
    pub fn aliased_targets(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.packages.values().flat_map(|package| {
            package
                .targets
                .values()
                .filter(|target| target.has_module_aliases())
                .map(|target| (TargetId::new(package.identity.clone(), target.name.clone()), target))
        })
    }
}

fn target_not_found(id: &TargetId) -> PeaError {
    PeaError::TargetNotFound {
        package: id.package.to_string(),
        target: id.name.clone(),
    }
}
