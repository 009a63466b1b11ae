//! Target and target dependency types.
//!
//! A target is one compilation module of a package. Besides its declared
//! dependencies it carries a rename mapping (original module name -> alias)
//! which the aliasing engine mutates and the compiler invocation layer reads.

use super::{PackageIdentity, ProductId, SourceSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from original module name to the name it is compiled under
pub type ModuleAliases = BTreeMap<String, String>;

/// A compilation unit of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    /// Name the module is compiled under; differs from `name` once aliased
    module_name: String,
    pub dependencies: Vec<TargetDependency>,
    pub sources: SourceSet,
    module_aliases: ModuleAliases,
}

/// A dependency declared by a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetDependency {
    /// Another target of the same package
    Target { name: String },
    /// A product of some package, optionally renaming some of its modules
    Product(ProductRef),
}

/// Reference to a product from a target dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub package: PackageIdentity,
    pub name: String,
    pub module_aliases: Option<ModuleAliases>,
}

impl Target {
    /// Create a new target with no dependencies or sources
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module_name: name.clone(),
            name,
            dependencies: Vec::new(),
            sources: SourceSet::default(),
            module_aliases: ModuleAliases::new(),
        }
    }

    /// Add a dependency on another target of the same package
    pub fn with_target_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(TargetDependency::Target { name: name.into() });
        self
    }

    /// Add a dependency on a product
    pub fn with_product_dependency(mut self, product: ProductRef) -> Self {
        self.dependencies.push(TargetDependency::Product(product));
        self
    }

    /// Set the source files of this target
    pub fn with_sources(mut self, sources: SourceSet) -> Self {
        self.sources = sources;
        self
    }

    /// Attach a rename mapping before aliasing runs (as the manifest loader does)
    pub fn with_module_aliases(mut self, aliases: ModuleAliases) -> Self {
        self.module_aliases = aliases;
        self
    }

    /// Name the module is compiled under
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn module_aliases(&self) -> &ModuleAliases {
        &self.module_aliases
    }

    pub fn module_alias(&self, name: &str) -> Option<&str> {
        self.module_aliases.get(name).map(String::as_str)
    }

    pub fn has_module_aliases(&self) -> bool {
        !self.module_aliases.is_empty()
    }

    /// Record `original -> alias`; returns true if the mapping changed.
    ///
    /// Aliasing the target's own name also renames its compiled module.
    pub fn add_module_alias(&mut self, original: &str, alias: &str) -> bool {
        if original == self.name {
            self.module_name = alias.to_string();
        }
        match self.module_aliases.get(original) {
            Some(existing) if existing == alias => false,
            _ => {
                self.module_aliases
                    .insert(original.to_string(), alias.to_string());
                true
            }
        }
    }

    /// Remove the alias recorded for `original`, restoring the compiled name if needed
    pub fn remove_module_alias(&mut self, original: &str) -> Option<String> {
        let removed = self.module_aliases.remove(original);
        if removed.is_some() && original == self.name {
            self.module_name = self.name.clone();
        }
        removed
    }

    /// Drop entries mapping to `alias` under any key other than `keep`
    pub fn remove_stale_aliases(&mut self, alias: &str, keep: &str) -> Vec<String> {
        let stale: Vec<String> = self
            .module_aliases
            .iter()
            .filter(|(key, value)| value.as_str() == alias && key.as_str() != keep)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.remove_module_alias(key);
        }
        stale
    }

    /// Materialize the rename of this target's own module, if one is recorded
    pub fn apply_alias(&mut self) {
        if let Some(alias) = self.module_aliases.get(&self.name) {
            self.module_name = alias.clone();
        }
    }

    /// Check whether this target declares a dependency with the given name
    pub fn depends_on_name(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dep| dep.name() == name)
    }

    /// Check whether this target directly depends on the given product
    pub fn depends_on_product(&self, product: &ProductId) -> bool {
        self.product_dependencies()
            .any(|dep| dep.package == product.package && dep.name == product.name)
    }

    /// Names of the same-package targets this target depends on
    pub fn target_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().filter_map(|dep| match dep {
            TargetDependency::Target { name } => Some(name.as_str()),
            TargetDependency::Product(_) => None,
        })
    }

    /// Product references declared by this target
    pub fn product_dependencies(&self) -> impl Iterator<Item = &ProductRef> {
        self.dependencies.iter().filter_map(|dep| match dep {
            TargetDependency::Product(product) => Some(product),
            TargetDependency::Target { .. } => None,
        })
    }
}

impl TargetDependency {
    /// Declared name of the dependency (target or product name)
    pub fn name(&self) -> &str {
        match self {
            TargetDependency::Target { name } => name,
            TargetDependency::Product(product) => &product.name,
        }
    }
}

impl ProductRef {
    /// Reference a product without requesting any renames
    pub fn new(package: impl Into<PackageIdentity>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            module_aliases: None,
        }
    }

    /// Request that `original` be compiled as `alias` for this consumer
    pub fn with_alias(mut self, original: impl Into<String>, alias: impl Into<String>) -> Self {
        self.module_aliases
            .get_or_insert_with(ModuleAliases::new)
            .insert(original.into(), alias.into());
        self
    }

    pub fn id(&self) -> ProductId {
        ProductId::new(self.package.clone(), self.name.clone())
    }

    /// Keys whose requested alias is exactly `name`
    pub fn keys_aliased_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.module_aliases
            .iter()
            .flatten()
            .filter(move |(_, alias)| alias.as_str() == name)
            .map(|(key, _)| key.as_str())
    }
}
