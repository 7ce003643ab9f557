use crate::core::{CommitDag, CommitId, CommitNode};
use crate::error::{GraphError, Result};
use crate::source::{CommitSource, RefFilter};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Builder for constructing a commit DAG from a [`CommitSource`]
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    filter: RefFilter,
    max_commits: Option<usize>,
}

/// Counters collected while building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub references: usize,
    pub visits: usize,
    pub lazily_resolved: usize,
    pub edges: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which references get walked
    pub fn ref_filter(mut self, filter: RefFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Refuse histories with more than `limit` distinct commits. The build
    /// stops with [`GraphError::CommitLimit`] as soon as the limit is passed.
    pub fn max_commits(mut self, limit: Option<usize>) -> Self {
        self.max_commits = limit;
        self
    }

    /// Build the graph
    pub fn build<S: CommitSource + ?Sized>(&self, source: &S) -> Result<CommitDag> {
        self.build_with_stats(source).map(|(dag, _)| dag)
    }

    /// Build the graph and report what it took.
    ///
    /// Construction, parent resolution and linking run to completion in that
    /// order; any failure discards the partial graph.
    #[instrument(skip_all)]
    pub fn build_with_stats<S: CommitSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<(CommitDag, BuildStats)> {
        let mut dag = CommitDag::new();
        let mut stats = BuildStats::default();

        let references = self.filter.select(source.references()?);
        stats.references = references.len();

        for reference in &references {
            let mut visits = 0usize;
            let mut inserted = 0usize;
            for record in source.iter_commits(reference)? {
                let record = record?;
                visits += 1;
                if dag.insert(CommitNode::new(record.id, record.parents)) {
                    inserted += 1;
                    self.check_limit(&dag)?;
                }
            }
            debug!(reference = %reference.name, visits, inserted, "walked reference");
            stats.visits += visits;
        }

        stats.lazily_resolved = self.resolve_parents(source, &mut dag)?;
        stats.edges = link(&mut dag)?;

        info!(
            references = stats.references,
            commits = dag.node_count(),
            edges = stats.edges,
            "built commit graph"
        );
        Ok((dag, stats))
    }

    fn check_limit(&self, dag: &CommitDag) -> Result<()> {
        match self.max_commits {
            Some(limit) if dag.node_count() > limit => Err(GraphError::CommitLimit { limit }),
            _ => Ok(()),
        }
    }

    /// Make sure every declared parent has a node, asking the source for
    /// commits no reference walk produced.
    fn resolve_parents<S: CommitSource + ?Sized>(&self, source: &S, dag: &mut CommitDag) -> Result<usize> {
        let mut pending: Vec<(CommitId, CommitId)> = dag
            .nodes()
            .flat_map(|node| {
                node.parents
                    .iter()
                    .map(move |parent| (node.id.clone(), parent.clone()))
            })
            .filter(|(_, parent)| !dag.contains(parent.as_str()))
            .collect();
        pending.sort_unstable();

        let mut resolved = 0;
        while let Some((child, parent)) = pending.pop() {
            if dag.contains(parent.as_str()) {
                continue;
            }
            let record = source
                .find_commit(&parent)?
                .ok_or_else(|| GraphError::UnresolvedParent {
                    child: child.clone(),
                    parent: parent.clone(),
                })?;

            for grandparent in &record.parents {
                if !dag.contains(grandparent.as_str()) {
                    pending.push((record.id.clone(), grandparent.clone()));
                }
            }
            dag.insert(CommitNode::new(record.id, record.parents));
            self.check_limit(dag)?;
            resolved += 1;
        }

        if resolved > 0 {
            debug!(resolved, "resolved parents outside the walked references");
        }
        Ok(resolved)
    }
}

/// Fill in children lists. Nodes are visited in id order so the children
/// order does not depend on which reference was walked first.
fn link(dag: &mut CommitDag) -> Result<usize> {
    let declared: Vec<(CommitId, Vec<CommitId>)> = dag
        .sorted_ids()
        .into_iter()
        .filter_map(|id| dag.get(id.as_str()))
        .map(|node| (node.id.clone(), node.parents.to_vec()))
        .collect();

    let mut edges = 0;
    for (child, parents) in declared {
        for parent in &parents {
            if dag.link(parent, &child)? {
                edges += 1;
            }
        }
    }
    Ok(edges)
}
