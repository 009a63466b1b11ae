//! Module alias tracker.
//!
//! The graph builder drives the tracker package by package: it registers the
//! renames each package's targets request, indexes and validates every
//! product, and finally runs propagation followed by reconciliation once for
//! the whole graph.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument};

use pea_core::error::PeaError;
use pea_core::types::{Package, PackageGraph, PackageIdentity, ProductId, SourceLanguage, Target, TargetId};

use crate::diagnostics::DiagnosticsSink;
use crate::index::{PackageTree, ProductIndex};
use crate::propagate::Propagator;
use crate::reconcile::{DroppedAlias, Reconciler};
use crate::registry::AliasRegistry;
use crate::AliasResult;


/// Options controlling alias validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasOptions {
    /// Language every renamed target must be written in
    pub primary_language: SourceLanguage,
}

/// Summary of one propagation and reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AliasReport {
    pub roots: Vec<PackageIdentity>,
    pub applied: usize,
    pub reconciled_products: usize,
    pub dropped: Vec<DroppedAlias>,
}

/// Records rename requests and applies them to a package graph
#[derive(Debug, Default)]
pub struct ModuleAliasTracker {
    options: AliasOptions,
    registry: AliasRegistry,
    packages: PackageTree,
    products: ProductIndex,
    /// (target, module) pairs reconciliation dropped in any run so far
    dropped: HashSet<(TargetId, String)>,
    /// Set when anything was registered, indexed or validated since the last run
    pending: bool,
}

impl ModuleAliasTracker {
    /// Create a tracker with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AliasOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &AliasOptions {
        &self.options
    }

    pub fn registry(&self) -> &AliasRegistry {
        &self.registry
    }

    pub fn package_tree(&self) -> &PackageTree {
        &self.packages
    }

    pub fn product_index(&self) -> &ProductIndex {
        &self.products
    }

    /// Register the renames that `targets` of `package` request on their product dependencies
    pub fn register_dependency_renames<'a, I>(&mut self, targets: I, package: &PackageIdentity) -> AliasResult<()>
    where
        I: IntoIterator<Item = &'a Target>,
    {
        let origins = self.registry.register_dependency_renames(targets, package)?;
        for origin in &origins {
            self.packages.add_edge(package, origin);
        }
        if !origins.is_empty() {
            self.pending = true;
        }
        Ok(())
    }

    /// Cache the reachable targets and product edges of a product
    pub fn index_product(&mut self, graph: &PackageGraph, product: &ProductId) -> AliasResult<()> {
        self.products.index_product(graph, product)?;
        self.pending = true;
        Ok(())
    }

    /// Check that every aliased target reachable from `product` can be renamed,
    /// then materialize each target's own rename
    pub fn validate_and_apply_direct_aliases(&mut self, graph: &mut PackageGraph, product: &ProductId) -> AliasResult<()> {
        let language = self.options.primary_language;
        for target_id in self.products.reachable_targets(product) {
            let target = graph.require_target_mut(target_id)?;
            if !target.has_module_aliases() {
                continue;
            }
            if !target.sources.is_homogeneous(language) {
                return Err(PeaError::UnsupportedRenameTarget {
                    target: target.name.clone(),
                    product: product.name.clone(),
                    package: product.package.to_string(),
                });
            }
            target.apply_alias();
            debug!("Validated aliased target {} ({})", target_id, target.module_name());
        }
        self.pending = true;
        Ok(())
    }

    /// Propagate registered renames down the package tree, then reconcile
    /// sibling products. Does nothing if nothing changed since the last run.
    #[instrument(skip_all)]
    pub fn run(&mut self, graph: &mut PackageGraph, sink: &mut dyn DiagnosticsSink) -> AliasResult<AliasReport> {
        if !self.pending {
            debug!("No new registrations since the last run");
            return Ok(AliasReport::default());
        }

        self.products.validate_no_cycles()?;
        let propagation = Propagator::new(&self.registry, &self.packages, &self.products, graph).run()?;

        let top_level = self.products.top_level_products();
        let reconciliation = Reconciler::new(&self.products, graph, sink, &mut self.dropped).run(&top_level)?;

        self.pending = false;
        let report = AliasReport {
            roots: propagation.roots,
            applied: propagation.applied + reconciliation.applied,
            reconciled_products: reconciliation.reconciled_products,
            dropped: reconciliation.dropped,
        };
        info!(
            "Module aliasing complete: {} applied, {} dropped",
            report.applied,
            report.dropped.len()
        );
        Ok(report)
    }

    /// Drive every step for a whole graph in the order the graph builder would
    #[instrument(skip_all, fields(packages = graph.package_count()))]
    pub fn track_graph(&mut self, graph: &mut PackageGraph, sink: &mut dyn DiagnosticsSink) -> AliasResult<AliasReport> {
        let packages: Vec<Package> = graph.packages().cloned().collect();
        for package in &packages {
            self.register_dependency_renames(package.targets.values(), &package.identity)?;
            for product in package.product_ids() {
                self.index_product(graph, &product)?;
                self.validate_and_apply_direct_aliases(graph, &product)?;
            }
        }
        self.run(graph, sink)
    }
}
