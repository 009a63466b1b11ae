//! Product types.
//!
//! A product is the externally consumable face of a package: a named list of
//! the package's targets.

use super::{PackageIdentity, ProductId, TargetId};
use serde::{Deserialize, Serialize};

/// A named grouping of targets exposed to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub package: PackageIdentity,
    pub name: String,
    /// Directly declared target names, in declaration order
    pub targets: Vec<String>,
}

impl Product {
    pub fn new(package: impl Into<PackageIdentity>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn id(&self) -> ProductId {
        ProductId::new(self.package.clone(), self.name.clone())
    }

    /// Identifiers of the directly declared targets
    pub fn target_ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.targets
            .iter()
            .map(|name| TargetId::new(self.package.clone(), name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_ids() {
        let product = Product::new("lib", "Utils").with_target("Utils").with_target("Helpers");

        assert_eq!(product.id(), ProductId::new("lib", "Utils"));
        assert_eq!(
            product.target_ids().collect::<Vec<_>>(),
            vec![TargetId::new("lib", "Utils"), TargetId::new("lib", "Helpers")]
        );
    }
}
