//! Package tree derived from rename requests.
//!
//! Every consuming package that requests a rename on a product becomes the
//! parent of the product's origin package. Children are kept in insertion
//! order; each child also remembers one parent, the most recently recorded.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use pea_core::types::PackageIdentity;

/// Parent/child edges between packages
#[derive(Debug, Default, Clone)]
pub struct PackageTree {
    children: IndexMap<PackageIdentity, IndexSet<PackageIdentity>>,
    parent: IndexMap<PackageIdentity, PackageIdentity>,
}

impl PackageTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `parent -> child`; the child's parent pointer is always overwritten
    pub fn add_edge(&mut self, parent: &PackageIdentity, child: &PackageIdentity) {
        if parent == child {
            debug!("Ignoring self edge on package {}", parent);
            return;
        }
        if self.children.entry(parent.clone()).or_default().insert(child.clone()) {
            debug!("Package tree edge {} -> {}", parent, child);
        }
        self.parent.insert(child.clone(), parent.clone());
    }

    /// Children of a package in insertion order
    pub fn children(&self, package: &PackageIdentity) -> impl Iterator<Item = &PackageIdentity> {
        self.children.get(package).into_iter().flatten()
    }

    pub fn has_children(&self, package: &PackageIdentity) -> bool {
        self.children.get(package).map_or(false, |children| !children.is_empty())
    }

    /// The most recently recorded parent of a package
    pub fn parent(&self, package: &PackageIdentity) -> Option<&PackageIdentity> {
        self.parent.get(package)
    }

    /// Packages that are parents but have no parent themselves, first seen first
    pub fn roots(&self) -> Vec<PackageIdentity> {
        self.children
            .keys()
            .filter(|package| !self.parent.contains_key(*package))
            .cloned()
            .collect()
    }

    /// Describe a parent-pointer cycle, if the pointers loop
    pub fn parent_cycle(&self) -> Option<String> {
        let start = self.parent.keys().next()?;
        let mut path: Vec<&PackageIdentity> = vec![start];
        let mut current = start;
        while let Some(parent) = self.parent.get(current) {
            if let Some(position) = path.iter().position(|seen| *seen == parent) {
                let mut cycle: Vec<String> = path[position..].iter().map(|p| p.to_string()).collect();
                cycle.push(parent.to_string());
                return Some(cycle.join(" -> "));
            }
            path.push(parent);
            current = parent;
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of distinct parent -> child edges
    pub fn edge_count(&self) -> usize {
        self.children.values().map(IndexSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PackageIdentity {
        PackageIdentity::new(name)
    }

    #[test]
    fn test_empty_tree() {
        let tree = PackageTree::new();
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn test_edges_are_deduplicated() {
        let mut tree = PackageTree::new();
        tree.add_edge(&id("app"), &id("lib"));
        tree.add_edge(&id("app"), &id("lib"));
        tree.add_edge(&id("app"), &id("core"));

        assert_eq!(tree.edge_count(), 2);
        assert_eq!(tree.children(&id("app")).collect::<Vec<_>>(), vec![&id("lib"), &id("core")]);
        assert!(tree.has_children(&id("app")));
        assert!(!tree.has_children(&id("lib")));
    }

    #[test]
    fn test_last_parent_wins() {
        let mut tree = PackageTree::new();
        tree.add_edge(&id("app"), &id("core"));
        tree.add_edge(&id("lib"), &id("core"));

        assert_eq!(tree.parent(&id("core")), Some(&id("lib")));
        // Both parents keep their child edge
        assert_eq!(tree.children(&id("app")).count(), 1);
        assert_eq!(tree.children(&id("lib")).count(), 1);
    }

    #[test]
    fn test_chain_has_a_single_root() {
        let mut tree = PackageTree::new();
        tree.add_edge(&id("lib"), &id("core"));
        tree.add_edge(&id("app"), &id("lib"));

        assert_eq!(tree.roots(), vec![id("app")]);
    }

    #[test]
    fn test_forest_has_every_root() {
        let mut tree = PackageTree::new();
        tree.add_edge(&id("a"), &id("shared-a"));
        tree.add_edge(&id("b"), &id("shared-b"));

        assert_eq!(tree.roots(), vec![id("a"), id("b")]);
    }

    #[test]
    fn test_self_edges_are_ignored() {
        let mut tree = PackageTree::new();
        tree.add_edge(&id("app"), &id("app"));
        assert!(tree.is_empty());
        assert_eq!(tree.parent(&id("app")), None);
    }

    #[test]
    fn test_parent_cycle_detection() {
        let mut tree = PackageTree::new();
        tree.add_edge(&id("a"), &id("b"));
        assert_eq!(tree.parent_cycle(), None);

        tree.add_edge(&id("b"), &id("a"));
        assert!(tree.roots().is_empty());
        let cycle = tree.parent_cycle().unwrap();
        assert!(cycle.contains("a") && cycle.contains("b"));
        assert!(cycle.contains("->"));
    }
}
