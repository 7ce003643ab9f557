use crate::builder::{BuildStats, GraphBuilder};
use crate::classify::{classify, CategoryCounts, Classification};
use crate::condense::{condense, CondenseReport};
use crate::core::{BranchPolicy, CommitDag};
use crate::error::Result;
use crate::source::{CommitSource, RefFilter};
use crate::topology::{StreamEdge, Topology};
use serde::Serialize;
use tracing::{info, instrument};

/// Knobs for one analysis run
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub filter: RefFilter,
    pub max_commits: Option<usize>,
    pub policy: BranchPolicy,
}

/// Size and shape of a graph at one phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub distinct_edges: usize,
    pub categories: CategoryCounts,
}

impl GraphSummary {
    fn of(dag: &CommitDag, classification: &Classification) -> Self {
        let stats = dag.stats();
        Self {
            nodes: stats.total_commits,
            edges: stats.total_edges,
            distinct_edges: stats.distinct_edges,
            categories: classification.counts(),
        }
    }
}

/// Result of a full run. The condensed graph is frozen: only shared
/// borrows of it are handed out.
#[derive(Debug)]
pub struct Analysis {
    policy: BranchPolicy,
    build: BuildStats,
    original: GraphSummary,
    condense: CondenseReport,
    condensed: GraphSummary,
    dag: CommitDag,
    classification: Classification,
    topology: Topology,
}

impl Analysis {
    /// Build, classify, condense, re-classify and order, strictly in that
    /// sequence.
    #[instrument(skip_all)]
    pub fn run<S: CommitSource + ?Sized>(source: &S, options: &PipelineOptions) -> Result<Self> {
        let (mut dag, build) = GraphBuilder::new()
            .ref_filter(options.filter.clone())
            .max_commits(options.max_commits)
            .build_with_stats(source)?;

        let original = GraphSummary::of(&dag, &classify(&dag, options.policy));

        let condense = condense(&mut dag)?;

        // Degrees changed around every splice, so earlier shapes are stale.
        let classification = classify(&dag, options.policy);
        let condensed = GraphSummary::of(&dag, &classification);
        let topology = Topology::compute(&dag)?;

        info!(
            original_nodes = original.nodes,
            condensed_nodes = condensed.nodes,
            "analysis complete"
        );

        Ok(Self {
            policy: options.policy,
            build,
            original,
            condense,
            condensed,
            dag,
            classification,
            topology,
        })
    }

    pub fn policy(&self) -> BranchPolicy {
        self.policy
    }

    pub fn build_stats(&self) -> &BuildStats {
        &self.build
    }

    pub fn original(&self) -> &GraphSummary {
        &self.original
    }

    pub fn condense_report(&self) -> &CondenseReport {
        &self.condense
    }

    pub fn condensed(&self) -> &GraphSummary {
        &self.condensed
    }

    pub fn dag(&self) -> &CommitDag {
        &self.dag
    }

    /// Shapes of the condensed graph
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Distinct edges of the condensed graph in topological order
    pub fn edges(&self) -> impl Iterator<Item = Result<StreamEdge<'_>>> + '_ {
        self.topology.edges(&self.dag)
    }
}
