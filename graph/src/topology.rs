//! Topological ordering and edge streaming for pattern consumers.

use crate::core::{CommitDag, CommitId, CommitNode};
use crate::error::{GraphError, Result};
use std::collections::{BTreeMap, HashMap};

/// A topological order of a graph, parents before children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    order: Vec<CommitId>,
}

/// One distinct (parent, child) pair of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEdge<'a> {
    pub parent: &'a CommitNode,
    pub child: &'a CommitNode,
    /// Parallel edges between the pair
    pub multiplicity: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl Topology {
    /// Depth-first postorder over children, reversed.
    ///
    /// Roots are entered in ascending id order and children in stored order,
    /// so the same graph state always yields the same order. Fails with
    /// [`GraphError::Cycle`] if the children links loop back.
    pub fn compute(dag: &CommitDag) -> Result<Self> {
        let mut marks: HashMap<&CommitId, Mark> = HashMap::with_capacity(dag.node_count());
        let mut postorder: Vec<CommitId> = Vec::with_capacity(dag.node_count());

        for start in dag.sorted_ids() {
            if marks.contains_key(start) {
                continue;
            }
            // Explicit stack of (node, next child index); history can be far
            // deeper than the call stack allows.
            let mut stack: Vec<(&CommitNode, usize)> = Vec::new();
            let node = lookup(dag, start, start)?;
            marks.insert(&node.id, Mark::InProgress);
            stack.push((node, 0));

            while let Some(top) = stack.last_mut() {
                let node: &CommitNode = top.0;
                if let Some(child_id) = node.children.get(top.1) {
                    top.1 += 1;
                    match marks.get(child_id) {
                        Some(Mark::Done) => {}
                        Some(Mark::InProgress) => return Err(GraphError::Cycle(child_id.clone())),
                        None => {
                            let child = lookup(dag, &node.id, child_id)?;
                            marks.insert(&child.id, Mark::InProgress);
                            stack.push((child, 0));
                        }
                    }
                } else {
                    marks.insert(&node.id, Mark::Done);
                    postorder.push(node.id.clone());
                    stack.pop();
                }
            }
        }

        postorder.reverse();
        Ok(Self { order: postorder })
    }

    pub fn order(&self) -> &[CommitId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Stream every distinct edge of `dag`, grouped by parent in topological
    /// order. Each call starts a fresh pass over the same order.
    ///
    /// `dag` must be the graph this order was computed from. A graph of a
    /// different size yields [`GraphError::StaleOrder`] first; an ordered or
    /// linked id missing from the graph yields [`GraphError::StaleAdjacency`]
    /// in its place.
    pub fn edges<'a>(&'a self, dag: &'a CommitDag) -> impl Iterator<Item = Result<StreamEdge<'a>>> + 'a {
        let stale = (self.order.len() != dag.node_count()).then(|| GraphError::StaleOrder {
            ordered: self.order.len(),
            nodes: dag.node_count(),
        });

        stale.into_iter().map(Err).chain(self.order.iter().flat_map(move |id| {
            let parent = match lookup(dag, id, id) {
                Ok(parent) => parent,
                Err(err) => return vec![Err(err)],
            };
            let mut counts: Vec<(&CommitId, usize)> = Vec::new();
            for child in &parent.children {
                match counts.iter_mut().find(|(seen, _)| *seen == child) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((child, 1)),
                }
            }
            counts
                .into_iter()
                .map(|(child_id, multiplicity)| {
                    lookup(dag, &parent.id, child_id).map(|child| StreamEdge {
                        parent,
                        child,
                        multiplicity,
                    })
                })
                .collect()
        }))
    }

    /// Position of each id in the order
    pub fn positions(&self) -> BTreeMap<&CommitId, usize> {
        self.order.iter().enumerate().map(|(idx, id)| (id, idx)).collect()
    }
}

fn lookup<'a>(dag: &'a CommitDag, referrer: &CommitId, id: &CommitId) -> Result<&'a CommitNode> {
    dag.get(id.as_str()).ok_or_else(|| GraphError::StaleAdjacency {
        node: referrer.clone(),
        missing: id.clone(),
    })
}
