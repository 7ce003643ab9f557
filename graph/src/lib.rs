//! Commit graph construction and condensation.
//!
//! History flows in one direction: a [`CommitSource`] feeds the
//! [`GraphBuilder`], the resulting [`CommitDag`] is classified, condensed
//! down to its structural commits, and finally ordered by [`Topology`] so
//! pattern queries can stream its edges. [`Analysis`] runs the whole chain.

pub mod core;
pub mod error;
pub mod source;
pub mod git_backend;
pub mod builder;
pub mod classify;
pub mod condense;
pub mod topology;
pub mod pipeline;

pub use core::{BranchPolicy, Category, CommitDag, CommitId, CommitNode, DagStats, Edge, EdgeType, Shape};
pub use error::{GraphError, Result};
pub use source::{BranchRef, CommitRecord, CommitSource, MemorySource, RefFilter, RefKind};
pub use git_backend::GitWalker;
pub use builder::{BuildStats, GraphBuilder};
pub use classify::{classify, CategoryCounts, Classification};
pub use condense::{condense, CondenseReport};
pub use topology::{StreamEdge, Topology};
pub use pipeline::{Analysis, GraphSummary, PipelineOptions};
