use super::id::CommitId;
use serde::Serialize;

/// An edge connecting two commits, directed from parent to child
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    /// Source commit ID (parent)
    pub parent: CommitId,
    /// Target commit ID (child)
    pub child: CommitId,
    /// Number of parallel edges between the pair. Always 1 after
    /// construction; condensation can raise it when two collapsed paths
    /// share both endpoints.
    pub multiplicity: usize,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Regular parent-child relationship
    Regular,
    /// Edge into a merge commit
    Merge,
}

impl Edge {
    pub fn new(parent: CommitId, child: CommitId, multiplicity: usize) -> Self {
        Self {
            parent,
            child,
            multiplicity,
            edge_type: EdgeType::Regular,
        }
    }

    pub fn merge(parent: CommitId, child: CommitId, multiplicity: usize) -> Self {
        Self {
            parent,
            child,
            multiplicity,
            edge_type: EdgeType::Merge,
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.multiplicity > 1
    }
}
