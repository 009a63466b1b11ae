//! Propagation of rename requests down the package tree.
//!
//! A depth-first walk starts at each root package and threads one buffer of
//! pending renames through the whole subtree. Renames registered against a
//! package enter the buffer when the walk reaches that package, are applied to
//! the targets that declare or depend on the renamed module, and are dropped
//! once used. Whatever is still pending when a leaf is reached is discarded.
//!
//! Sibling subtrees share the buffer, so the order children were recorded in
//! matters: a rename consumed under one child is gone for the next.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, info, warn};

use pea_core::error::PeaError;
use pea_core::types::{PackageGraph, PackageIdentity};

use crate::index::{PackageTree, ProductIndex};
use crate::registry::{AliasRegistry, ModuleAlias};
use crate::AliasResult;

/// Pending renames keyed by original module name
pub type AliasBuffer = IndexMap<String, ModuleAlias>;

/// Follow the buffered alias of `name` through further buffered renames.
///
/// Returns `None` if `name` is not buffered. A chain that loops back on
/// itself resolves to the immediate alias.
pub fn resolve_chain(buffer: &AliasBuffer, name: &str) -> Option<String> {
    let immediate = buffer.get(name)?.alias.as_str();
    let mut visited: HashSet<&str> = HashSet::from([name]);
    let mut current = immediate;

    while let Some(next) = buffer.get(current) {
        if !visited.insert(current) {
            warn!(
                "Alias chain for module '{}' loops back to '{}', keeping '{}'",
                name, current, immediate
            );
            return Some(immediate.to_string());
        }
        current = next.alias.as_str();
    }

    Some(current.to_string())
}

/// Result of one propagation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationOutcome {
    /// Root packages the walk started from, in walk order
    pub roots: Vec<PackageIdentity>,
    /// Number of rename entries added to or changed on targets
    pub applied: usize,
}

/// Depth-first walker applying registered renames to targets
pub struct Propagator<'a> {
    registry: &'a AliasRegistry,
    packages: &'a PackageTree,
    products: &'a ProductIndex,
    graph: &'a mut PackageGraph,
    on_path: Vec<PackageIdentity>,
    applied: usize,
}

impl<'a> Propagator<'a> {
    pub fn new(
        registry: &'a AliasRegistry,
        packages: &'a PackageTree,
        products: &'a ProductIndex,
        graph: &'a mut PackageGraph,
    ) -> Self {
        Self {
            registry,
            packages,
            products,
            graph,
            on_path: Vec::new(),
            applied: 0,
        }
    }

    /// Walk every root of the package tree, each with a fresh buffer
    pub fn run(mut self) -> AliasResult<PropagationOutcome> {
        if self.packages.is_empty() {
            debug!("Package tree is empty, nothing to propagate");
            return Ok(PropagationOutcome::default());
        }

        let roots = self.packages.roots();
        if roots.is_empty() {
            let cycle = self
                .packages
                .parent_cycle()
                .unwrap_or_else(|| "package tree has no root".to_string());
            return Err(PeaError::CircularDependency { cycle });
        }

        for root in &roots {
            debug!("Propagating renames from root package {}", root);
            let mut buffer = AliasBuffer::new();
            self.propagate(root, &mut buffer)?;
        }

        info!(
            "Propagated renames from {} root package(s), {} alias entries applied",
            roots.len(),
            self.applied
        );
        Ok(PropagationOutcome {
            roots,
            applied: self.applied,
        })
    }

    fn propagate(&mut self, package: &PackageIdentity, buffer: &mut AliasBuffer) -> AliasResult<()> {
        if self.on_path.contains(package) {
            warn!("Package {} depends on itself through renamed products, skipping", package);
            return Ok(());
        }
        self.on_path.push(package.clone());

        self.enqueue_registered(package, buffer);
        self.apply_pending(package, buffer)?;

        let children: Vec<PackageIdentity> = self.packages.children(package).cloned().collect();
        if children.is_empty() {
            if !buffer.is_empty() {
                debug!("Dropping {} unused rename(s) at leaf package {}", buffer.len(), package);
            }
            buffer.clear();
        }
        for child in &children {
            self.propagate(child, buffer)?;
        }

        self.on_path.pop();
        Ok(())
    }

    /// Buffer every rename registered against `package` that is not already pending
    fn enqueue_registered(&self, package: &PackageIdentity, buffer: &mut AliasBuffer) {
        let mut inserted = Vec::new();
        for alias in self.registry.aliases_for_origin(package) {
            if buffer.contains_key(&alias.name) {
                continue;
            }
            buffer.insert(alias.name.clone(), alias.clone());
            inserted.push(alias.name.clone());
        }

        // Chains are resolved once every fresh entry is in place
        for name in inserted {
            let Some(entry) = buffer.get(&name) else {
                continue;
            };
            let Some(resolved) = resolve_chain(buffer, &name) else {
                continue;
            };
            if resolved != entry.alias {
                debug!("Chained alias {} -> {} (via {})", name, resolved, entry.alias);
                let chained = entry.with_alias(resolved);
                buffer.insert(name, chained);
            }
        }
    }

    /// Apply buffered renames to the targets of every product of `package`
    fn apply_pending(&mut self, package: &PackageIdentity, buffer: &mut AliasBuffer) -> AliasResult<()> {
        let products = self.products;
        let Some(indexed) = products.products_of(package) else {
            return Ok(());
        };

        let mut used: IndexSet<String> = IndexSet::new();
        for (product_id, reachable) in indexed {
            for matched in reachable {
                let Some(pending) = buffer.get(&matched.name) else {
                    continue;
                };
                let name = pending.name.clone();
                let alias = pending.alias.clone();
                let resolved = resolve_chain(buffer, &name).unwrap_or_else(|| alias.clone());

                for target_id in reachable {
                    let target = self.graph.require_target_mut(target_id)?;

                    let direct = target.name == name || target.depends_on_name(&name);
                    if direct {
                        if target.add_module_alias(&name, &alias) {
                            debug!("Applied {} -> {} to {} ({})", name, alias, target_id, product_id);
                            self.applied += 1;
                        }
                        used.insert(name.clone());
                    }

                    let pre_chained: Vec<String> = target
                        .product_dependencies()
                        .flat_map(|dependency| dependency.keys_aliased_to(&name))
                        .map(str::to_string)
                        .collect();
                    if direct || pre_chained.len() > 1 {
                        for key in pre_chained {
                            if target.add_module_alias(&key, &resolved) {
                                debug!("Applied chained {} -> {} to {}", key, resolved, target_id);
                                self.applied += 1;
                            }
                        }
                    }
                }
            }
        }

        for name in used {
            buffer.shift_remove(&name);
        }
        Ok(())
    }
}
