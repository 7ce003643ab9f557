use commit_graph::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown pattern `{0}` (expected maintenance-cycle, structural-domain or fully-condensed)")]
    UnknownPattern(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
