//! Package types.
//!
//! A package owns its targets and products exclusively; everything else in
//! the workspace refers to them through identity keys.

use super::{PackageIdentity, Product, ProductId, Target};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A package in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub identity: PackageIdentity,
    /// Targets keyed by name, in declaration order
    pub targets: IndexMap<String, Target>,
    /// Products keyed by name, in declaration order
    pub products: IndexMap<String, Product>,
}

impl Package {
    /// Create an empty package
    pub fn new(identity: impl Into<PackageIdentity>) -> Self {
        Self {
            identity: identity.into(),
            targets: IndexMap::new(),
            products: IndexMap::new(),
        }
    }

    /// Add a target, replacing any target with the same name
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.insert(target.name.clone(), target);
        self
    }

    /// Add a product declared by this package
    pub fn with_product(mut self, name: impl Into<String>, targets: &[&str]) -> Self {
        let mut product = Product::new(self.identity.clone(), name);
        product.targets = targets.iter().map(|t| t.to_string()).collect();
        self.products.insert(product.name.clone(), product);
        self
    }

    /// Check if a name is a valid package name
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '@'))
            && !name.starts_with('-')
            && !name.ends_with('-')
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.get(name)
    }

    /// Identifiers of every product, in declaration order
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.products.values().map(Product::id)
    }
}
