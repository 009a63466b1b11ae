//! Reconciliation of renames requested by sibling products.
//!
//! After propagation, a product may consume several child products that each
//! carry their own rename for the same module. Walking the product graph
//! bottom-up, each parent either takes over the agreed alias, adopts what the
//! other children agree on, or drops the alias and reports a diagnostic.

use std::collections::{BTreeSet, HashSet};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, info};

use pea_core::types::{PackageGraph, ProductId, TargetId};

use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::index::ProductIndex;
use crate::AliasResult;

/// An alias removed from a target because its dependencies disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedAlias {
    pub target: TargetId,
    pub module: String,
    /// Every alias requested for the module, sorted
    pub aliases: Vec<String>,
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub reconciled_products: usize,
    pub applied: usize,
    pub dropped: Vec<DroppedAlias>,
}

/// Post-order walker over the product graph
pub struct Reconciler<'a> {
    products: &'a ProductIndex,
    graph: &'a mut PackageGraph,
    sink: &'a mut dyn DiagnosticsSink,
    reconciled: HashSet<ProductId>,
    /// Every (target, module) ever dropped, across runs
    settled: &'a mut HashSet<(TargetId, String)>,
    dropped: IndexMap<(TargetId, String), Vec<String>>,
    applied: usize,
}

impl<'a> Reconciler<'a> {
    /// `settled` carries the drops of earlier runs; they are neither re-added nor reported again
    pub fn new(
        products: &'a ProductIndex,
        graph: &'a mut PackageGraph,
        sink: &'a mut dyn DiagnosticsSink,
        settled: &'a mut HashSet<(TargetId, String)>,
    ) -> Self {
        Self {
            products,
            graph,
            sink,
            settled,
            reconciled: HashSet::new(),
            dropped: IndexMap::new(),
            applied: 0,
        }
    }

    /// Reconcile every product reachable from the given top-level products
    pub fn run(mut self, top_level: &[ProductId]) -> AliasResult<ReconcileOutcome> {
        for product in top_level {
            self.reconcile(product)?;
        }

        info!(
            "Reconciled {} product(s): {} alias entries applied, {} dropped",
            self.reconciled.len(),
            self.applied,
            self.dropped.len()
        );
        Ok(ReconcileOutcome {
            reconciled_products: self.reconciled.len(),
            applied: self.applied,
            dropped: self
                .dropped
                .into_iter()
                .map(|((target, module), aliases)| DroppedAlias { target, module, aliases })
                .collect(),
        })
    }

    fn reconcile(&mut self, product: &ProductId) -> AliasResult<()> {
        if !self.reconciled.insert(product.clone()) {
            return Ok(());
        }

        let products = self.products;
        let children = products.children(product);
        for child in &children {
            self.reconcile(child)?;
        }
        if children.is_empty() {
            return Ok(());
        }
        debug!("Reconciling {} against {} child product(s)", product, children.len());

        let mut held: HashSet<String> = HashSet::new();
        for target_id in products.direct_targets(product) {
            let target = self.graph.require_target(target_id)?;
            held.extend(target.module_aliases().keys().cloned());
        }
        let reachable: IndexSet<&TargetId> = products.reachable_targets(product).iter().collect();
        let direct: HashSet<&TargetId> = products.direct_targets(product).iter().collect();

        for child in &children {
            let mut requested: Vec<(String, String)> = Vec::new();
            for target_id in products.direct_targets(child) {
                let target = self.graph.require_target(target_id)?;
                requested.extend(
                    target
                        .module_aliases()
                        .iter()
                        .filter(|(name, _)| !held.contains(*name))
                        .map(|(name, alias)| (name.clone(), alias.clone())),
                );
            }
            if requested.is_empty() {
                continue;
            }

            // Direct targets of the product, plus any reachable target depending on the child
            let mut consumers = Vec::new();
            for target_id in &reachable {
                if direct.contains(*target_id) || self.depends_on(target_id, child, &mut HashSet::new())? {
                    consumers.push((*target_id).clone());
                }
            }
            let siblings: Vec<&ProductId> = children.iter().filter(|sibling| *sibling != child).collect();

            for (name, alias) in &requested {
                let others = self.sibling_values(&siblings, name)?;
                for consumer in &consumers {
                    self.settle(consumer, child, &siblings, name, alias, &others)?;
                }
            }
        }

        Ok(())
    }

    /// Decide the alias of `name` on one consuming target
    fn settle(
        &mut self,
        consumer: &TargetId,
        child: &ProductId,
        siblings: &[&ProductId],
        name: &str,
        alias: &str,
        others: &BTreeSet<String>,
    ) -> AliasResult<()> {
        let key = (consumer.clone(), name.to_string());
        if self.settled.contains(&key) {
            return Ok(());
        }

        if others.len() > 1 {
            debug!("Siblings disagree on {} for {}, leaving unresolved", name, consumer);
            return Ok(());
        }

        if let Some(agreed) = others.iter().next() {
            if !self.declares_target(child, name)? {
                let target = self.graph.require_target_mut(consumer)?;
                if target.add_module_alias(name, agreed) {
                    debug!("Adopted sibling alias {} -> {} on {}", name, agreed, consumer);
                    self.applied += 1;
                }
                return Ok(());
            }
        }

        let conflicts = self.sibling_conflicts(siblings, name, alias)?;
        let target = self.graph.require_target_mut(consumer)?;
        if !conflicts.is_empty() {
            target.remove_module_alias(name);

            let mut values = conflicts;
            values.insert(alias.to_string());
            let aliases: Vec<String> = values.into_iter().collect();
            self.sink.emit(
                Diagnostic::info(format!(
                    "Dropped alias for module '{}' on target '{}': dependencies request conflicting aliases {}",
                    name,
                    consumer,
                    aliases.join(", ")
                ))
                .with_target(consumer.clone()),
            );
            self.settled.insert(key.clone());
            self.dropped.insert(key, aliases);
            return Ok(());
        }

        if target.name != name {
            let stale = target.remove_stale_aliases(alias, name);
            if !stale.is_empty() {
                debug!("Removed superseded aliases {:?} from {}", stale, consumer);
            }
            if target.add_module_alias(name, alias) {
                debug!("Applied {} -> {} to {}", name, alias, consumer);
                self.applied += 1;
            }
        }
        Ok(())
    }

    /// Alias values for `name` on the direct targets of the sibling products
    fn sibling_values(&self, siblings: &[&ProductId], name: &str) -> AliasResult<BTreeSet<String>> {
        let mut values = BTreeSet::new();
        for sibling in siblings {
            for target_id in self.products.direct_targets(sibling) {
                let target = self.graph.require_target(target_id)?;
                if let Some(value) = target.module_alias(name) {
                    values.insert(value.to_string());
                }
            }
        }
        Ok(values)
    }

    /// Values on sibling targets that disagree with `alias` for `name`.
    ///
    /// A sibling target named `name` that carries no alias counts as `name`.
    fn sibling_conflicts(&self, siblings: &[&ProductId], name: &str, alias: &str) -> AliasResult<BTreeSet<String>> {
        let mut conflicts = BTreeSet::new();
        for sibling in siblings {
            for target_id in self.products.reachable_targets(sibling) {
                let target = self.graph.require_target(target_id)?;
                let value = match target.module_alias(name) {
                    Some(value) => value,
                    None if target.name == name => name,
                    None => continue,
                };
                if value != alias {
                    conflicts.insert(value.to_string());
                }
            }
        }
        Ok(conflicts)
    }

    fn declares_target(&self, product: &ProductId, name: &str) -> AliasResult<bool> {
        for target_id in self.products.reachable_targets(product) {
            if target_id.name == name {
                self.graph.require_target(target_id)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether a target depends on `product` directly or through its target dependencies
    fn depends_on(&self, target_id: &TargetId, product: &ProductId, seen: &mut HashSet<TargetId>) -> AliasResult<bool> {
        if !seen.insert(target_id.clone()) {
            return Ok(false);
        }
        let target = self.graph.require_target(target_id)?;
        if target.depends_on_product(product) {
            return Ok(true);
        }
        for name in target.target_dependencies() {
            let dependency = TargetId::new(target_id.package.clone(), name);
            if self.depends_on(&dependency, product, seen)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
