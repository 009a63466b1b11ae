//! Product dependency index using petgraph
//!
//! Records which products depend on which (through target-level product
//! dependencies) and caches, per product, every target reachable from it.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use pea_core::error::PeaError;
use pea_core::types::{PackageGraph, PackageIdentity, ProductId, TargetId};

use crate::AliasResult;

/// Product graph plus reachable-target cache
#[derive(Debug, Default)]
pub struct ProductIndex {
    /// Parent product -> child product edges
    graph: DiGraph<ProductId, ()>,
    /// Map from ProductId to NodeIndex for fast lookups
    node_map: HashMap<ProductId, NodeIndex>,
    /// Package -> product -> targets reachable from the product
    reachable: IndexMap<PackageIdentity, IndexMap<ProductId, Vec<TargetId>>>,
    /// Product -> directly declared targets
    direct: HashMap<ProductId, Vec<TargetId>>,
}

impl ProductIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute and cache the targets reachable from `product_id`, and record
    /// an edge to every product that any of those targets depends on.
    ///
    /// Reachable order: the recursive target dependencies of each direct
    /// target, then the direct targets themselves. Duplicates are kept.
    pub fn index_product(&mut self, graph: &PackageGraph, product_id: &ProductId) -> AliasResult<()> {
        let product = graph.require_product(product_id)?;
        let direct: Vec<TargetId> = product.target_ids().collect();

        let mut reachable = Vec::new();
        for target_id in &direct {
            graph.require_target(target_id)?;
            let mut seen = HashSet::new();
            collect_target_dependencies(graph, target_id, &mut seen, &mut reachable)?;
        }
        reachable.extend(direct.iter().cloned());

        let parent = self.add_product(product_id);
        let mut visited = HashSet::new();
        for target_id in &reachable {
            if !visited.insert(target_id) {
                continue;
            }
            let target = graph.require_target(target_id)?;
            for dependency in target.product_dependencies() {
                let child_id = dependency.id();
                if child_id == *product_id {
                    continue;
                }
                let child = self.add_product(&child_id);
                self.graph.add_edge(parent, child, ());
                debug!("Product edge {} -> {}", product_id, child_id);
            }
        }

        debug!(
            "Indexed product {} ({} direct, {} reachable targets)",
            product_id,
            direct.len(),
            reachable.len()
        );
        self.reachable
            .entry(product_id.package.clone())
            .or_default()
            .insert(product_id.clone(), reachable);
        self.direct.insert(product_id.clone(), direct);

        Ok(())
    }

    /// Add a product node, returning the existing index if present
    fn add_product(&mut self, product_id: &ProductId) -> NodeIndex {
        if let Some(index) = self.node_map.get(product_id) {
            return *index;
        }
        let index = self.graph.add_node(product_id.clone());
        self.node_map.insert(product_id.clone(), index);
        index
    }

    /// Indexed products of a package with their reachable targets
    pub fn products_of(&self, package: &PackageIdentity) -> Option<&IndexMap<ProductId, Vec<TargetId>>> {
        self.reachable.get(package)
    }

    /// Targets reachable from a product (empty if the product was never indexed)
    pub fn reachable_targets(&self, product_id: &ProductId) -> &[TargetId] {
        self.reachable
            .get(&product_id.package)
            .and_then(|products| products.get(product_id))
            .map_or(&[], Vec::as_slice)
    }

    /// Directly declared targets of a product (empty if never indexed)
    pub fn direct_targets(&self, product_id: &ProductId) -> &[TargetId] {
        self.direct.get(product_id).map_or(&[], Vec::as_slice)
    }

    pub fn is_indexed(&self, product_id: &ProductId) -> bool {
        self.direct.contains_key(product_id)
    }

    /// Child products in the order their edges were recorded, deduplicated
    pub fn children(&self, product_id: &ProductId) -> Vec<ProductId> {
        self.neighbors(product_id, Direction::Outgoing)
    }

    /// Parent products in the order their edges were recorded, deduplicated
    pub fn parents(&self, product_id: &ProductId) -> Vec<ProductId> {
        self.neighbors(product_id, Direction::Incoming)
    }

    fn neighbors(&self, product_id: &ProductId, direction: Direction) -> Vec<ProductId> {
        let Some(index) = self.node_map.get(product_id) else {
            return Vec::new();
        };
        // petgraph lists the most recently added edge first
        let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(*index, direction).collect();
        nodes.reverse();
        nodes
            .into_iter()
            .map(|node| self.graph[node].clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Indexed products with no parent product, in indexing order
    pub fn top_level_products(&self) -> Vec<ProductId> {
        self.reachable
            .values()
            .flat_map(|products| products.keys())
            .filter(|product_id| {
                self.node_map.get(*product_id).map_or(true, |index| {
                    self.graph
                        .neighbors_directed(*index, Direction::Incoming)
                        .next()
                        .is_none()
                })
            })
            .cloned()
            .collect()
    }

    pub fn product_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check for cycles and return detailed error if found
    pub fn validate_no_cycles(&self) -> AliasResult<()> {
        use petgraph::algo::toposort;

        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle_node) => {
                let cycle = self.extract_cycle_path(cycle_node.node_id());
                Err(PeaError::CircularDependency {
                    cycle: Self::format_cycle(&cycle),
                })
            }
        }
    }

    /// Extract the cycle path from a node that's part of a cycle
    fn extract_cycle_path(&self, start_node: NodeIndex) -> Vec<ProductId> {
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut current = start_node;

        // Follow first outgoing edges until a node repeats
        loop {
            if let Some(position) = path.iter().position(|node| *node == current) {
                return path[position..]
                    .iter()
                    .map(|node| self.graph[*node].clone())
                    .collect();
            }
            path.push(current);

            match self.graph.edges(current).next() {
                Some(edge) => current = edge.target(),
                None => break,
            }
        }

        path.into_iter().map(|node| self.graph[node].clone()).collect()
    }

    /// Format cycle as "a -> b -> c -> a"
    pub fn format_cycle(cycle: &[ProductId]) -> String {
        if cycle.is_empty() {
            return "No cycle".to_string();
        }

        let mut names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        names.push(names[0].clone());
        names.join(" -> ")
    }
}

/// Depth-first collection of same-package target dependencies
fn collect_target_dependencies(
    graph: &PackageGraph,
    target_id: &TargetId,
    seen: &mut HashSet<TargetId>,
    out: &mut Vec<TargetId>,
) -> AliasResult<()> {
    let target = graph.require_target(target_id)?;
    for name in target.target_dependencies() {
        let dependency = TargetId::new(target_id.package.clone(), name);
        if !seen.insert(dependency.clone()) {
            continue;
        }
        graph.require_target(&dependency)?;
        out.push(dependency.clone());
        collect_target_dependencies(graph, &dependency, seen, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pea_core::types::{Package, ProductRef, Target};

    fn id(package: &str, name: &str) -> ProductId {
        ProductId::new(package, name)
    }

    fn graph() -> PackageGraph {
        let mut graph = PackageGraph::new();
        graph
            .add_package(
                Package::new("app")
                    .with_target(
                        Target::new("App")
                            .with_target_dependency("Helpers")
                            .with_product_dependency(ProductRef::new("lib", "Utils")),
                    )
                    .with_target(
                        Target::new("Helpers")
                            .with_target_dependency("Base")
                            .with_product_dependency(ProductRef::new("log", "Log")),
                    )
                    .with_target(Target::new("Base"))
                    .with_product("App", &["App"]),
            )
            .unwrap();
        graph
            .add_package(
                Package::new("lib")
                    .with_target(Target::new("Utils").with_product_dependency(ProductRef::new("log", "Log")))
                    .with_product("Utils", &["Utils"]),
            )
            .unwrap();
        graph
            .add_package(Package::new("log").with_target(Target::new("Log")).with_product("Log", &["Log"]))
            .unwrap();
        graph
    }

    fn index_all(graph: &PackageGraph) -> ProductIndex {
        let mut index = ProductIndex::new();
        for package in graph.packages() {
            for product in package.product_ids() {
                index.index_product(graph, &product).unwrap();
            }
        }
        index
    }

    #[test]
    fn test_index_creation() {
        let index = ProductIndex::new();
        assert_eq!(index.product_count(), 0);
        assert_eq!(index.edge_count(), 0);
    }

    #[test]
    fn test_reachable_targets_order() {
        let graph = graph();
        let index = index_all(&graph);

        let names: Vec<&str> = index
            .reachable_targets(&id("app", "App"))
            .iter()
            .map(|target| target.name.as_str())
            .collect();
        assert_eq!(names, vec!["Helpers", "Base", "App"]);
        assert_eq!(index.direct_targets(&id("app", "App")), &[TargetId::new("app", "App")]);
    }

    #[test]
    fn test_product_edges_include_transitive_target_dependencies() {
        let graph = graph();
        let index = index_all(&graph);

        // App depends on Utils directly and on Log through Helpers
        assert_eq!(index.children(&id("app", "App")), vec![id("log", "Log"), id("lib", "Utils")]);
        assert_eq!(index.parents(&id("log", "Log")), vec![id("app", "App"), id("lib", "Utils")]);
        assert_eq!(index.top_level_products(), vec![id("app", "App")]);
        assert!(index.validate_no_cycles().is_ok());
    }

    #[test]
    fn test_products_of_package() {
        let graph = graph();
        let index = index_all(&graph);

        let products = index.products_of(&PackageIdentity::new("lib")).unwrap();
        assert!(products.contains_key(&id("lib", "Utils")));
        assert!(index.products_of(&PackageIdentity::new("missing")).is_none());
        assert!(index.reachable_targets(&id("missing", "Nope")).is_empty());
        assert!(!index.is_indexed(&id("missing", "Nope")));
    }

    #[test]
    fn test_missing_product_target_is_reported() {
        let mut graph = PackageGraph::new();
        graph.add_package(Package::new("lib").with_product("Utils", &["Ghost"])).unwrap();

        let mut index = ProductIndex::new();
        let result = index.index_product(&graph, &id("lib", "Utils"));
        assert!(matches!(result, Err(PeaError::TargetNotFound { .. })));
    }

    #[test]
    fn test_product_cycle_detection() {
        let mut graph = PackageGraph::new();
        graph
            .add_package(
                Package::new("a")
                    .with_target(Target::new("A").with_product_dependency(ProductRef::new("b", "B")))
                    .with_product("A", &["A"]),
            )
            .unwrap();
        graph
            .add_package(
                Package::new("b")
                    .with_target(Target::new("B").with_product_dependency(ProductRef::new("a", "A")))
                    .with_product("B", &["B"]),
            )
            .unwrap();
        let index = index_all(&graph);

        let error = index.validate_no_cycles().unwrap_err();
        match error {
            PeaError::CircularDependency { cycle } => {
                assert!(cycle.contains("a/A"));
                assert!(cycle.contains("b/B"));
                assert!(cycle.contains("->"));
            }
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_format_cycle() {
        assert_eq!(ProductIndex::format_cycle(&[]), "No cycle");
        assert_eq!(
            ProductIndex::format_cycle(&[id("a", "A"), id("b", "B")]),
            "a/A -> b/B -> a/A"
        );
    }
}
