use super::edge::Edge;
use super::id::CommitId;
use super::node::{replace_all, CommitNode};
use crate::error::{GraphError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Directed Acyclic Graph representing commit history.
///
/// The node table is the only owner of nodes: a commit exists in the graph
/// exactly when its id is a key of `nodes`. Edges are derived from the
/// `children` lists.
#[derive(Debug, Clone, Default)]
pub struct CommitDag {
    nodes: HashMap<CommitId, CommitNode>,
}

impl CommitDag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with the same id already exists.
    ///
    /// Returns `true` when the node was inserted.
    pub fn insert(&mut self, node: CommitNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Register `child` in the children of `parent`, at most once.
    ///
    /// Returns `true` when a new edge was recorded.
    pub fn link(&mut self, parent: &CommitId, child: &CommitId) -> Result<bool> {
        if !self.nodes.contains_key(child) {
            return Err(GraphError::StaleAdjacency {
                node: parent.clone(),
                missing: child.clone(),
            });
        }
        let node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| GraphError::UnresolvedParent {
                child: child.clone(),
                parent: parent.clone(),
            })?;

        if node.children.contains(child) {
            return Ok(false);
        }
        node.children.push(child.clone());
        Ok(true)
    }

    /// Remove a node from the table, handing back its last state
    pub fn remove(&mut self, id: &CommitId) -> Option<CommitNode> {
        self.nodes.remove(id)
    }

    /// Replace `old` by `new` in the parent list of `node`
    pub(crate) fn rewrite_parent(
        &mut self,
        node: &CommitId,
        old: &CommitId,
        new: &CommitId,
    ) -> Result<usize> {
        let entry = self.node_mut(node, old)?;
        Ok(replace_all(&mut entry.parents, old, new))
    }

    /// Replace `old` by `new` in the child list of `node`
    pub(crate) fn rewrite_child(
        &mut self,
        node: &CommitId,
        old: &CommitId,
        new: &CommitId,
    ) -> Result<usize> {
        let entry = self.node_mut(node, old)?;
        Ok(replace_all(&mut entry.children, old, new))
    }

    fn node_mut(&mut self, id: &CommitId, referrer: &CommitId) -> Result<&mut CommitNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::StaleAdjacency {
                node: referrer.clone(),
                missing: id.clone(),
            })
    }

    pub fn get(&self, id: &str) -> Option<&CommitNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CommitNode> {
        self.nodes.values()
    }

    /// All node ids in ascending order
    pub fn sorted_ids(&self) -> Vec<&CommitId> {
        let mut ids: Vec<&CommitId> = self.nodes.keys().collect();
        ids.sort_unstable();
        ids
    }

    /// Get all root commits (no parents)
    pub fn roots(&self) -> Vec<&CommitNode> {
        self.nodes.values().filter(|node| node.is_root()).collect()
    }

    /// Get all leaf commits (no children)
    pub fn leaves(&self) -> Vec<&CommitNode> {
        self.nodes.values().filter(|node| node.is_tip()).collect()
    }

    /// Count of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Count of edges, parallel edges counted individually
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.children.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct (parent, child) pairs with their multiplicity, sorted by pair
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for parent in self.sorted_ids() {
            let node = &self.nodes[parent];
            let mut counts: BTreeMap<&CommitId, usize> = BTreeMap::new();
            for child in &node.children {
                *counts.entry(child).or_default() += 1;
            }
            for (child, multiplicity) in counts {
                let is_merge = self.nodes.get(child).is_some_and(CommitNode::is_merge);
                edges.push(if is_merge {
                    Edge::merge(parent.clone(), child.clone(), multiplicity)
                } else {
                    Edge::new(parent.clone(), child.clone(), multiplicity)
                });
            }
        }
        edges
    }

    /// Whether a directed path leads from `from` down to `to`
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        if from == to {
            return self.contains(from);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for child in &node.children {
                if child.as_str() == to {
                    return true;
                }
                if seen.insert(child.as_str()) {
                    stack.push(child.as_str());
                }
            }
        }
        false
    }

    /// Check that every parent/child entry points at a live node and that
    /// both sides of each edge agree on its multiplicity.
    pub fn check_links(&self) -> Result<()> {
        for node in self.nodes.values() {
            for parent in &node.parents {
                let parent_node = self.nodes.get(parent).ok_or_else(|| {
                    GraphError::StaleAdjacency {
                        node: node.id.clone(),
                        missing: parent.clone(),
                    }
                })?;
                let upward = node.parents.iter().filter(|p| *p == parent).count();
                if parent_node.edges_to(&node.id) != upward {
                    return Err(GraphError::StaleAdjacency {
                        node: parent.clone(),
                        missing: node.id.clone(),
                    });
                }
            }
            for child in &node.children {
                if !self.nodes.contains_key(child) {
                    return Err(GraphError::StaleAdjacency {
                        node: node.id.clone(),
                        missing: child.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Order-independent view of the adjacency, for comparing two builds
    pub fn adjacency(&self) -> BTreeMap<CommitId, (Vec<CommitId>, Vec<CommitId>)> {
        self.nodes
            .values()
            .map(|node| {
                let mut children: Vec<CommitId> = node.children.to_vec();
                children.sort_unstable();
                (node.id.clone(), (node.parents.to_vec(), children))
            })
            .collect()
    }

    /// Check if DAG contains orphan branches
    pub fn has_orphan_branches(&self) -> bool {
        self.roots().len() > 1
    }

    /// Get statistics about the DAG
    pub fn stats(&self) -> DagStats {
        let edges = self.edges();

        DagStats {
            total_commits: self.nodes.len(),
            total_edges: self.edge_count(),
            distinct_edges: edges.len(),
            parallel_pairs: edges.iter().filter(|edge| edge.is_parallel()).count(),
            merge_commits: self.nodes.values().filter(|n| n.is_merge()).count(),
            root_commits: self.roots().len(),
            leaf_commits: self.leaves().len(),
            has_orphans: self.has_orphan_branches(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DagStats {
    pub total_commits: usize,
    pub total_edges: usize,
    pub distinct_edges: usize,
    pub parallel_pairs: usize,
    pub merge_commits: usize,
    pub root_commits: usize,
    pub leaf_commits: usize,
    pub has_orphans: bool,
}
