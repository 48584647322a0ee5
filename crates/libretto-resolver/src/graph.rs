//! The dependency graph: the resolver's evolving resolution state.
//!
//! Nodes are keyed by package name, never by direct reference — edges are
//! `(issuer name, Constraint)` pairs recorded on the *target* node, so a
//! node can be dropped without untangling a web of pointers (§9 Design
//! Notes: "never hold direct references between nodes"). The graph is
//! naturally cyclic (packages can transitively depend back on an issuer),
//! and this representation makes that a non-issue.
//!
//! `missing()`, `conflicted()` and `needed()` are pure functions of the node
//! set — never cached — so the resolver's progress check can simply compare
//! two snapshots.

use ahash::AHashMap;
use libretto_core::{Constraint, PackageDescriptor};
use std::collections::BTreeSet;

/// One node in the graph: a package name, its descriptor if one has been
/// fetched, and the constraints every issuer currently asserts on it.
#[derive(Debug, Clone)]
struct Node {
    descriptor: Option<PackageDescriptor>,
    /// issuer name -> constraint it asserts on this node.
    incoming: AHashMap<String, Constraint>,
}

impl Node {
    fn empty() -> Self {
        Self { descriptor: None, incoming: AHashMap::new() }
    }

    /// Intersection of every incoming constraint. The universal constraint
    /// if there are no issuers at all (the root node's case).
    fn intersected_constraint(&self) -> Constraint {
        self.incoming
            .values()
            .fold(Constraint::any(), |acc, c| acc.intersect(c))
    }
}

/// A name with the intersected constraint every issuer currently asserts on
/// it, plus the issuers themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEntry {
    pub name: String,
    pub constraint: Constraint,
    pub issuers: BTreeSet<String>,
}

/// A name whose incoming constraints intersect to the empty constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    pub name: String,
    pub constraint: Constraint,
    pub issuers: BTreeSet<String>,
}

/// A name reachable from the root whose descriptor is known and whose
/// intersected incoming constraint is satisfied by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeededEntry {
    pub name: String,
    pub constraint: Constraint,
    pub issuers: BTreeSet<String>,
    pub descriptor: PackageDescriptor,
}

fn issuers_of(node: &Node) -> BTreeSet<String> {
    node.incoming.keys().cloned().collect()
}

/// The evolving dependency resolution state: one node per package name seen
/// so far (root included), edges recorded as per-target incoming
/// constraints.
///
/// `insert`, `clear_unused` and the three derived-view methods are the only
/// entry points (§9: "the only graph entry points").
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    root_name: String,
    nodes: AHashMap<String, Node>,
}

impl DependencyGraph {
    /// Seed a graph with the application's own descriptor as the root node.
    /// The root is never removed by [`Self::clear_unused`] and never
    /// appears in [`Self::missing`], [`Self::conflicted`] or
    /// [`Self::needed`] — those views quantify over *dependency* names, not
    /// the application itself.
    #[must_use]
    pub fn seeded_with_root(root: &PackageDescriptor) -> Self {
        let mut graph = Self {
            root_name: root.name.clone(),
            nodes: AHashMap::new(),
        };
        graph.nodes.insert(root.name.clone(), Node::empty());
        graph.insert(root.clone());
        graph
    }

    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&PackageDescriptor> {
        self.nodes.get(name)?.descriptor.as_ref()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Attach `descriptor` to the node of its name (creating the node if
    /// absent), and add/update an outgoing edge for each of its
    /// dependencies.
    ///
    /// Re-inserting the same `(name, version)` is a no-op. Re-inserting a
    /// different version replaces the descriptor and re-intersects outgoing
    /// edges: dependencies the old version declared but the new one does
    /// not are withdrawn from their target's incoming set first.
    pub fn insert(&mut self, descriptor: PackageDescriptor) {
        let name = descriptor.name.clone();

        if let Some(existing) = self.nodes.get(&name).and_then(|n| n.descriptor.as_ref()) {
            if existing.version == descriptor.version {
                return;
            }
        }

        let previous_deps: Vec<String> = self
            .nodes
            .get(&name)
            .and_then(|n| n.descriptor.as_ref())
            .map(|d| d.dependencies.keys().cloned().collect())
            .unwrap_or_default();

        for dep_name in &previous_deps {
            if !descriptor.dependencies.contains_key(dep_name) {
                if let Some(target) = self.nodes.get_mut(dep_name) {
                    target.incoming.remove(&name);
                }
            }
        }

        for (dep_name, constraint) in &descriptor.dependencies {
            let target = self.nodes.entry(dep_name.clone()).or_insert_with(Node::empty);
            target.incoming.insert(name.clone(), constraint.clone());
        }

        self.nodes.entry(name).or_insert_with(Node::empty).descriptor = Some(descriptor);
    }

    /// Remove nodes not reachable from the root, and every edge originating
    /// from a removed node. Idempotent.
    pub fn clear_unused(&mut self) {
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        let mut stack = vec![self.root_name.clone()];
        while let Some(name) = stack.pop() {
            if !reachable.insert(name.clone()) {
                continue;
            }
            if let Some(deps) = self.nodes.get(&name).and_then(|n| n.descriptor.as_ref()) {
                for dep_name in deps.dependencies.keys() {
                    if !reachable.contains(dep_name) {
                        stack.push(dep_name.clone());
                    }
                }
            }
        }

        let removed: Vec<String> = self
            .nodes
            .keys()
            .filter(|name| !reachable.contains(*name))
            .cloned()
            .collect();

        for name in &removed {
            if let Some(node) = self.nodes.get(name) {
                if let Some(descriptor) = &node.descriptor {
                    let dep_names: Vec<String> = descriptor.dependencies.keys().cloned().collect();
                    for dep_name in dep_names {
                        if let Some(target) = self.nodes.get_mut(&dep_name) {
                            target.incoming.remove(name);
                        }
                    }
                }
            }
            self.nodes.remove(name);
        }

        // A removed node may itself have been the sole issuer keeping
        // another now-orphaned node around; re-run until stable. The node
        // set only shrinks, so this always terminates.
        if !removed.is_empty() {
            self.clear_unused();
        }
    }

    /// Names referenced by at least one edge but with no descriptor
    /// attached yet.
    #[must_use]
    pub fn missing(&self) -> Vec<MissingEntry> {
        self.nodes
            .iter()
            .filter(|(name, node)| *name != &self.root_name && node.descriptor.is_none() && !node.incoming.is_empty())
            .map(|(name, node)| MissingEntry {
                name: name.clone(),
                constraint: node.intersected_constraint(),
                issuers: issuers_of(node),
            })
            .collect()
    }

    /// Names whose incoming edges intersect to the empty constraint.
    #[must_use]
    pub fn conflicted(&self) -> Vec<ConflictEntry> {
        self.nodes
            .iter()
            .filter(|(name, node)| *name != &self.root_name && !node.incoming.is_empty())
            .filter_map(|(name, node)| {
                let constraint = node.intersected_constraint();
                (!constraint.is_valid()).then(|| ConflictEntry {
                    name: name.clone(),
                    constraint,
                    issuers: issuers_of(node),
                })
            })
            .collect()
    }

    /// Names reachable from the root whose descriptor is present and whose
    /// intersected incoming constraint is satisfied by it.
    #[must_use]
    pub fn needed(&self) -> Vec<NeededEntry> {
        self.nodes
            .iter()
            .filter(|(name, _)| *name != &self.root_name)
            .filter_map(|(name, node)| {
                let descriptor = node.descriptor.as_ref()?;
                let constraint = node.intersected_constraint();
                constraint.matches(&descriptor.version).then(|| NeededEntry {
                    name: name.clone(),
                    constraint,
                    issuers: issuers_of(node),
                    descriptor: descriptor.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libretto_core::{NumericVersion, Version};

    fn pkg(name: &str, version: (u64, u64, u64), deps: &[(&str, &str)]) -> PackageDescriptor {
        let mut d = PackageDescriptor::new(name, Version::Number(NumericVersion::new(version.0, version.1, version.2)));
        for (dep, constraint) in deps {
            d.dependencies.insert((*dep).to_string(), Constraint::parse(constraint).unwrap());
        }
        d
    }

    #[test]
    fn seed_with_no_dependencies_has_nothing_missing() {
        let root = pkg("app", (0, 0, 1), &[]);
        let graph = DependencyGraph::seeded_with_root(&root);
        assert!(graph.missing().is_empty());
        assert!(graph.conflicted().is_empty());
        assert!(graph.needed().is_empty());
    }

    #[test]
    fn unattached_dependency_is_missing() {
        let root = pkg("app", (0, 0, 1), &[("libA", ">=1.0.0")]);
        let graph = DependencyGraph::seeded_with_root(&root);
        let missing = graph.missing();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "libA");
        assert!(missing[0].issuers.contains("app"));
    }

    #[test]
    fn inserting_satisfying_descriptor_makes_it_needed() {
        let root = pkg("app", (0, 0, 1), &[("libA", ">=1.0.0")]);
        let mut graph = DependencyGraph::seeded_with_root(&root);
        graph.insert(pkg("libA", (1, 2, 0), &[]));

        assert!(graph.missing().is_empty());
        let needed = graph.needed();
        assert_eq!(needed.len(), 1);
        assert_eq!(needed[0].name, "libA");
    }

    #[test]
    fn conflicting_constraints_are_reported() {
        let root = pkg("app", (0, 0, 1), &[("libA", "*"), ("libC", "*")]);
        let mut graph = DependencyGraph::seeded_with_root(&root);
        graph.insert(pkg("libA", (1, 0, 0), &[("libB", ">=2.0.0")]));
        graph.insert(pkg("libC", (1, 0, 0), &[("libB", "<2.0.0")]));
        graph.insert(pkg("libB", (2, 3, 0), &[]));

        let conflicted = graph.conflicted();
        assert_eq!(conflicted.len(), 1);
        assert_eq!(conflicted[0].name, "libB");
        assert!(conflicted[0].issuers.contains("libA"));
        assert!(conflicted[0].issuers.contains("libC"));
        assert!(graph.needed().is_empty());
    }

    #[test]
    fn reinsert_same_version_is_noop() {
        let root = pkg("app", (0, 0, 1), &[("libA", "*")]);
        let mut graph = DependencyGraph::seeded_with_root(&root);
        graph.insert(pkg("libA", (1, 0, 0), &[("libB", "*")]));
        graph.insert(pkg("libA", (1, 0, 0), &[]));

        // If the reinsert had taken effect, libB's edge would be gone and
        // libB itself would be unreachable after clear_unused.
        assert!(graph.contains("libB"));
    }

    #[test]
    fn reinsert_different_version_withdraws_stale_edges() {
        let root = pkg("app", (0, 0, 1), &[("libA", "*")]);
        let mut graph = DependencyGraph::seeded_with_root(&root);
        graph.insert(pkg("libA", (1, 0, 0), &[("libB", "*")]));
        graph.insert(pkg("libA", (2, 0, 0), &[]));
        graph.clear_unused();

        assert!(!graph.contains("libB"));
    }

    #[test]
    fn clear_unused_drops_unreachable_nodes_but_keeps_root() {
        let root = pkg("app", (0, 0, 1), &[("libA", "*")]);
        let mut graph = DependencyGraph::seeded_with_root(&root);
        graph.insert(pkg("libA", (1, 0, 0), &[]));
        graph.clear_unused();
        assert!(graph.contains("app"));
        assert!(graph.contains("libA"));
    }

    #[test]
    fn invalid_incoming_constraint_is_not_an_immediate_conflict_surface_via_missing() {
        // A dependency whose constraint is empty at insertion time remains
        // a marker in the graph rather than failing eagerly.
        let root = pkg("app", (0, 0, 1), &[("libA", "<1.0.0"), ("libB", "*")]);
        let mut graph = DependencyGraph::seeded_with_root(&root);
        // a second issuer narrows libA's constraint to the empty set before it is ever fetched
        graph.insert(pkg("libB", (1, 0, 0), &[("libA", ">2.0.0")]));

        assert!(graph.missing().iter().any(|m| m.name == "libA"));
        assert!(graph.conflicted().iter().any(|c| c.name == "libA"));
    }
}
