use crate::core::CommitId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    /// A declared parent that the commit source cannot produce
    #[error("commit {child} declares parent {parent}, which is missing from history")]
    UnresolvedParent { child: CommitId, parent: CommitId },

    /// Adjacency recorded on a node points at a node that is no longer live
    #[error("node {node} references {missing}, which is not in the graph")]
    StaleAdjacency { node: CommitId, missing: CommitId },

    #[error("splicing out {node} would make {target} its own parent")]
    SelfLoop { node: CommitId, target: CommitId },

    #[error("history has more than {limit} commits")]
    CommitLimit { limit: usize },

    /// A topological order applied to a graph it was not computed from
    #[error("order covers {ordered} commits but the graph has {nodes}")]
    StaleOrder { ordered: usize, nodes: usize },

    #[error("cycle detected through commit {0}")]
    Cycle(CommitId),

    #[error("reference {reference} could not be walked: {message}")]
    Source { reference: String, message: String },

    #[error(transparent)]
    Git(#[from] git2::Error),
}
