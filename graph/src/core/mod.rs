pub mod id;
pub mod node;
pub mod edge;
pub mod shape;
pub mod dag;

pub use id::CommitId;
pub use node::{Adjacency, CommitNode};
pub use edge::{Edge, EdgeType};
pub use shape::{BranchPolicy, Category, Shape};
pub use dag::{CommitDag, DagStats};
