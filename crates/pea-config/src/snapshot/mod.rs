//! Package graph snapshots.
//!
//! A snapshot is a TOML description of an already-resolved package graph:
//! packages, their targets (with sources and dependencies) and their
//! products. It lets the CLI and tests build a [`PackageGraph`] without the
//! manifest loader.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::toml::parse_document;
use crate::ConfigResult;
use pea_core::error::PeaError;
use pea_core::types::{ModuleAliases, Package, PackageGraph, ProductRef, SourceSet, Target};

/// A whole graph snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageSnapshot>,
}

/// `[[package]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSnapshot {
    pub name: String,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetSnapshot>,
    #[serde(default, rename = "product")]
    pub products: Vec<ProductSnapshot>,
}

/// `[[package.target]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetSnapshot {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<Utf8PathBuf>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    /// Renames attached by the manifest before aliasing runs
    #[serde(default, skip_serializing_if = "ModuleAliases::is_empty")]
    pub module_aliases: ModuleAliases,
}

/// `[[package.product]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

/// A target dependency (same-package target, or product of some package)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Target {
        target: String,
    },
    Product {
        product: String,
        package: String,
        #[serde(default, rename = "module-aliases", skip_serializing_if = "Option::is_none")]
        module_aliases: Option<ModuleAliases>,
    },
}

/// Parse a snapshot document
pub fn parse_snapshot(content: &str) -> ConfigResult<GraphSnapshot> {
    parse_snapshot_named("snapshot", content)
}

fn parse_snapshot_named(file: &str, content: &str) -> ConfigResult<GraphSnapshot> {
    let snapshot: GraphSnapshot = parse_document(file, content)?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Load a snapshot file and build its package graph
pub async fn load_snapshot(path: &Utf8Path) -> ConfigResult<PackageGraph> {
    debug!("Loading graph snapshot from {}", path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PeaError::io(format!("Failed to read {}", path), e))?;

    let snapshot = parse_snapshot_named(path.as_str(), &content)?;
    snapshot.into_graph()
}

impl GraphSnapshot {
    /// Check names and intra-package references
    pub fn validate(&self) -> ConfigResult<()> {
        let mut packages = HashSet::new();
        for package in &self.packages {
            if !Package::is_valid_name(&package.name) {
                return Err(PeaError::config(
                    "package.name",
                    format!("Invalid package name '{}'", package.name),
                ));
            }
            if !packages.insert(package.name.as_str()) {
                return Err(PeaError::config(
                    "package.name",
                    format!("Package '{}' is declared more than once", package.name),
                ));
            }
            package.validate()?;
        }
        Ok(())
    }

    /// Build the package graph described by this snapshot
    pub fn into_graph(self) -> ConfigResult<PackageGraph> {
        let mut graph = PackageGraph::new();
        for package in self.packages {
            graph.add_package(package.into_package())?;
        }
        debug!("Built package graph with {} packages", graph.package_count());
        Ok(graph)
    }
}

impl PackageSnapshot {
    fn validate(&self) -> ConfigResult<()> {
        let mut targets = HashSet::new();
        for target in &self.targets {
            if target.name.is_empty() {
                return Err(PeaError::config(
                    "package.target.name",
                    format!("Package '{}' has a target without a name", self.name),
                ));
            }
            if !targets.insert(target.name.as_str()) {
                return Err(PeaError::config(
                    "package.target.name",
                    format!("Target '{}' is declared more than once in package '{}'", target.name, self.name),
                ));
            }
        }

        for target in &self.targets {
            for dependency in &target.dependencies {
                if let DependencySpec::Target { target: name } = dependency {
                    if !targets.contains(name.as_str()) {
                        return Err(PeaError::config(
                            "package.target.dependencies",
                            format!(
                                "Target '{}' of package '{}' depends on unknown target '{}'",
                                target.name, self.name, name
                            ),
                        ));
                    }
                }
            }
        }

        let mut products = HashSet::new();
        for product in &self.products {
            if !products.insert(product.name.as_str()) {
                return Err(PeaError::config(
                    "package.product.name",
                    format!("Product '{}' is declared more than once in package '{}'", product.name, self.name),
                ));
            }
            if let Some(missing) = product.targets.iter().find(|name| !targets.contains(name.as_str())) {
                return Err(PeaError::config(
                    "package.product.targets",
                    format!(
                        "Product '{}' of package '{}' lists unknown target '{}'",
                        product.name, self.name, missing
                    ),
                ));
            }
        }

        Ok(())
    }

    fn into_package(self) -> Package {
        let mut package = Package::new(self.name.as_str());
        for target in self.targets {
            package = package.with_target(target.into_target());
        }
        for product in self.products {
            let targets: Vec<&str> = product.targets.iter().map(String::as_str).collect();
            package = package.with_product(product.name.as_str(), &targets);
        }
        package
    }
}

impl TargetSnapshot {
    fn into_target(self) -> Target {
        let mut target = Target::new(self.name).with_sources(SourceSet::new(self.sources));
        for dependency in self.dependencies {
            target = match dependency {
                DependencySpec::Target { target: name } => target.with_target_dependency(name),
                DependencySpec::Product {
                    product,
                    package,
                    module_aliases,
                } => target.with_product_dependency(ProductRef {
                    module_aliases,
                    ..ProductRef::new(package.as_str(), product)
                }),
            };
        }
        if !self.module_aliases.is_empty() {
            target = target.with_module_aliases(self.module_aliases);
        }
        target
    }
}
