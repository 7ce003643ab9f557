use super::id::CommitId;
use super::shape::{BranchPolicy, Shape};
use smallvec::SmallVec;

/// Adjacency list; most commits have one or two neighbours on each side
pub type Adjacency = SmallVec<[CommitId; 2]>;

/// A commit node in the DAG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    /// Unique commit ID (SHA)
    pub id: CommitId,
    /// Parent commit IDs, in the order the commit declares them
    pub parents: Adjacency,
    /// Child commit IDs, filled in while linking
    pub children: Adjacency,
}

impl CommitNode {
    /// A repeated parent keeps only its first position; git accepts such
    /// commits but they add no edge.
    pub fn new(id: CommitId, parents: impl IntoIterator<Item = CommitId>) -> Self {
        let mut unique = Adjacency::new();
        for parent in parents {
            if !unique.contains(&parent) {
                unique.push(parent);
            }
        }
        Self {
            id,
            parents: unique,
            children: Adjacency::new(),
        }
    }

    /// Check if this is a root commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Check if this is a tip (no children)
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if this is a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Exactly one parent and one child
    pub fn is_sequential(&self) -> bool {
        self.parents.len() == 1 && self.children.len() == 1
    }

    /// Classification from the current degree counts
    pub fn shape(&self, policy: BranchPolicy) -> Shape {
        Shape::from_degrees(self.parents.len(), self.children.len(), policy)
    }

    /// Number of parallel edges from this node to `child`
    pub fn edges_to(&self, child: &CommitId) -> usize {
        self.children.iter().filter(|id| *id == child).count()
    }
}

/// Replace every occurrence of `old` with `new`, returning how many were replaced
pub(crate) fn replace_all(list: &mut Adjacency, old: &CommitId, new: &CommitId) -> usize {
    let mut replaced = 0;
    for entry in list.iter_mut().filter(|entry| *entry == old) {
        *entry = new.clone();
        replaced += 1;
    }
    replaced
}
