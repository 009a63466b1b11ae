//! Registry of requested module renames.
//!
//! Requests are stored per origin package (the package declaring the module)
//! and per product through which the rename was requested. Within one origin
//! package a module name may only ever be given one alias.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use pea_core::error::PeaError;
use pea_core::types::{PackageIdentity, ProductId, ProductRef, Target};

use crate::AliasResult;

/// A single rename request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleAlias {
    /// Original module name
    pub name: String,
    /// Name the module should be compiled under
    pub alias: String,
    /// Package declaring the module
    pub origin_package: PackageIdentity,
    /// Package whose dependency declaration asked for the rename
    pub consuming_package: PackageIdentity,
}

/// Rename requests keyed by origin package, then by requesting product
#[derive(Debug, Default, Clone)]
pub struct AliasRegistry {
    aliases: IndexMap<PackageIdentity, IndexMap<ProductId, Vec<ModuleAlias>>>,
}

impl ModuleAlias {
    pub fn new(
        name: impl Into<String>,
        alias: impl Into<String>,
        origin_package: PackageIdentity,
        consuming_package: PackageIdentity,
    ) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            origin_package,
            consuming_package,
        }
    }

    /// Copy of this request pointing at a different final alias
    pub fn with_alias(&self, alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..self.clone()
        }
    }
}

impl AliasRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the renames that `targets` request on the products they depend on.
    ///
    /// Returns the origin package of every product dependency that carried a
    /// rename mapping, in declaration order, so the caller can record the
    /// package tree edges. Nothing is committed if any request conflicts.
    pub fn register_dependency_renames<'a, I>(
        &mut self,
        targets: I,
        consuming_package: &PackageIdentity,
    ) -> AliasResult<Vec<PackageIdentity>>
    where
        I: IntoIterator<Item = &'a Target>,
    {
        let mut staged: Vec<(ProductId, ModuleAlias)> = Vec::new();
        let mut origins = Vec::new();

        for target in targets {
            for product in target.product_dependencies() {
                if product.module_aliases.is_none() {
                    continue;
                }
                self.check_conflicts(product, &staged)?;
                origins.push(product.package.clone());

                let product_id = product.id();
                for (name, alias) in product.module_aliases.iter().flatten() {
                    staged.push((
                        product_id.clone(),
                        ModuleAlias::new(
                            name.as_str(),
                            alias.as_str(),
                            product.package.clone(),
                            consuming_package.clone(),
                        ),
                    ));
                }
            }
        }

        for (product_id, alias) in staged {
            debug!(
                "Registered alias {} -> {} for {} (requested by {})",
                alias.name, alias.alias, product_id, alias.consuming_package
            );
            self.aliases
                .entry(alias.origin_package.clone())
                .or_default()
                .entry(product_id)
                .or_default()
                .push(alias);
        }

        Ok(origins)
    }

    /// Fail if `product` requests an alias that differs from one already
    /// registered (or staged) for the same module of the same origin package
    fn check_conflicts(
        &self,
        product: &ProductRef,
        staged: &[(ProductId, ModuleAlias)],
    ) -> AliasResult<()> {
        let origin = &product.package;
        let staged_for_origin = staged
            .iter()
            .map(|(_, alias)| alias)
            .filter(|alias| alias.origin_package == *origin);

        let existing: Vec<&ModuleAlias> = self.aliases_for_origin(origin).chain(staged_for_origin).collect();

        for (name, requested) in product.module_aliases.iter().flatten() {
            let previous: Vec<&str> = existing
                .iter()
                .filter(|alias| alias.name == *name)
                .map(|alias| alias.alias.as_str())
                .collect();

            if previous.iter().any(|alias| *alias != requested.as_str()) {
                let mut values: BTreeSet<&str> = previous.into_iter().collect();
                values.insert(requested.as_str());
                return Err(PeaError::ConflictingRename {
                    module: name.clone(),
                    product: product.name.clone(),
                    package: origin.to_string(),
                    aliases: values.into_iter().collect::<Vec<_>>().join(", "),
                });
            }
        }

        Ok(())
    }

    /// Requests registered under an origin package, grouped by product
    pub fn for_origin(&self, origin: &PackageIdentity) -> Option<&IndexMap<ProductId, Vec<ModuleAlias>>> {
        self.aliases.get(origin)
    }

    /// Every request registered under an origin package
    pub fn aliases_for_origin<'a>(
        &'a self,
        origin: &PackageIdentity,
    ) -> impl Iterator<Item = &'a ModuleAlias> + 'a {
        self.aliases
            .get(origin)
            .into_iter()
            .flat_map(|by_product| by_product.values().flatten())
    }

    /// The alias registered for a module of an origin package, if any
    pub fn alias_for(&self, origin: &PackageIdentity, name: &str) -> Option<&str> {
        self.aliases_for_origin(origin)
            .find(|alias| alias.name == name)
            .map(|alias| alias.alias.as_str())
    }

    /// Total number of registered requests
    pub fn len(&self) -> usize {
        self.aliases
            .values()
            .flat_map(|by_product| by_product.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pea_core::types::ProductRef;

    fn consumer(name: &str, deps: Vec<ProductRef>) -> Target {
        deps.into_iter()
            .fold(Target::new(name), |target, dep| target.with_product_dependency(dep))
    }

    #[test]
    fn test_registry_creation() {
        let registry = AliasRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_records_origin_and_consumer() {
        let mut registry = AliasRegistry::new();
        let app = PackageIdentity::new("app");
        let target = consumer(
            "App",
            vec![
                ProductRef::new("lib", "Utils").with_alias("Utils", "FooUtils"),
                ProductRef::new("plain", "Plain"),
            ],
        );

        let origins = registry.register_dependency_renames([&target], &app).unwrap();

        assert_eq!(origins, vec![PackageIdentity::new("lib")]);
        assert_eq!(registry.len(), 1);
        let alias = registry.aliases_for_origin(&PackageIdentity::new("lib")).next().unwrap();
        assert_eq!(alias.name, "Utils");
        assert_eq!(alias.alias, "FooUtils");
        assert_eq!(alias.consuming_package, app);
        assert!(registry
            .for_origin(&PackageIdentity::new("lib"))
            .unwrap()
            .contains_key(&ProductId::new("lib", "Utils")));
    }

    #[test]
    fn test_conflicting_alias_across_products_of_same_origin() {
        let mut registry = AliasRegistry::new();
        let first = consumer("A", vec![ProductRef::new("lib", "Utils").with_alias("Utils", "FooUtils")]);
        let second = consumer("B", vec![ProductRef::new("lib", "Extras").with_alias("Utils", "BarUtils")]);

        registry.register_dependency_renames([&first], &PackageIdentity::new("a")).unwrap();
        let error = registry
            .register_dependency_renames([&second], &PackageIdentity::new("b"))
            .unwrap_err();

        match error {
            PeaError::ConflictingRename { module, product, package, aliases } => {
                assert_eq!(module, "Utils");
                assert_eq!(product, "Extras");
                assert_eq!(package, "lib");
                assert_eq!(aliases, "BarUtils, FooUtils");
            }
            other => panic!("Expected ConflictingRename, got {:?}", other),
        }
    }

    #[test]
    fn test_same_alias_twice_is_accepted() {
        let mut registry = AliasRegistry::new();
        let first = consumer("A", vec![ProductRef::new("lib", "Utils").with_alias("Utils", "FooUtils")]);
        let second = consumer("B", vec![ProductRef::new("lib", "Utils").with_alias("Utils", "FooUtils")]);

        registry.register_dependency_renames([&first], &PackageIdentity::new("a")).unwrap();
        registry.register_dependency_renames([&second], &PackageIdentity::new("b")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.alias_for(&PackageIdentity::new("lib"), "Utils"), Some("FooUtils"));
    }

    #[test]
    fn test_same_name_in_different_origins_is_independent() {
        let mut registry = AliasRegistry::new();
        let target = consumer(
            "App",
            vec![
                ProductRef::new("left", "Left").with_alias("Shared", "LeftShared"),
                ProductRef::new("right", "Right").with_alias("Shared", "RightShared"),
            ],
        );

        registry.register_dependency_renames([&target], &PackageIdentity::new("app")).unwrap();

        assert_eq!(registry.alias_for(&PackageIdentity::new("left"), "Shared"), Some("LeftShared"));
        assert_eq!(registry.alias_for(&PackageIdentity::new("right"), "Shared"), Some("RightShared"));
    }

    #[test]
    fn test_conflict_leaves_registry_untouched() {
        let mut registry = AliasRegistry::new();
        let first = consumer("First", vec![ProductRef::new("lib", "Utils").with_alias("Utils", "FooUtils")]);
        let second = consumer("Second", vec![ProductRef::new("lib", "Utils").with_alias("Utils", "BarUtils")]);

        let result = registry.register_dependency_renames([&first, &second], &PackageIdentity::new("app"));

        assert!(matches!(result, Err(PeaError::ConflictingRename { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_with_alias_keeps_provenance() {
        let alias = ModuleAlias::new("Utils", "FooUtils", "lib".into(), "app".into());
        let chained = alias.with_alias("BarUtils");

        assert_eq!(chained.name, "Utils");
        assert_eq!(chained.alias, "BarUtils");
        assert_eq!(chained.origin_package, alias.origin_package);
        assert_eq!(chained.consuming_package, alias.consuming_package);
    }
}
