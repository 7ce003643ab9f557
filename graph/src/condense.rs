//! Condensation: splicing out pass-through commits.
//!
//! A sequential node (one parent, one child) carries no structure. Removing
//! it and pointing its parent straight at its child keeps every path
//! between the remaining nodes. When two collapsed paths share both
//! endpoints the parent ends up with the child listed twice; that repeated
//! entry is the parallel edge the pattern queries look for.

use crate::core::{CommitDag, CommitId};
use crate::error::{GraphError, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CondenseReport {
    /// Sequential nodes spliced out
    pub removed: usize,
    /// Scans over the node table, the last one finding nothing to do
    pub passes: usize,
    /// Parent/child pairs joined by more than one edge afterwards
    pub parallel_pairs: usize,
}

/// Remove sequential nodes until none is left.
///
/// Running it again on the result is a no-op. Errors leave the graph in an
/// unspecified state and must be treated as fatal.
#[instrument(skip_all, fields(nodes = dag.node_count()))]
pub fn condense(dag: &mut CommitDag) -> Result<CondenseReport> {
    let mut report = CondenseReport::default();

    loop {
        report.passes += 1;
        let mut candidates: Vec<CommitId> = dag
            .nodes()
            .filter(|node| node.is_sequential())
            .map(|node| node.id.clone())
            .collect();
        if candidates.is_empty() {
            break;
        }
        candidates.sort_unstable();

        let mut removed = 0;
        for id in &candidates {
            // Splicing a neighbour never changes this node's degrees, but
            // the table is the authority on what is still live.
            let Some(node) = dag.get(id.as_str()) else {
                continue;
            };
            if !node.is_sequential() {
                continue;
            }
            let parent = node.parents[0].clone();
            let child = node.children[0].clone();
            splice(dag, id, &parent, &child)?;
            removed += 1;
        }
        debug!(pass = report.passes, removed, "condensation pass");
        report.removed += removed;
        if removed == 0 {
            break;
        }
    }

    report.parallel_pairs = dag.edges().iter().filter(|edge| edge.is_parallel()).count();
    info!(
        removed = report.removed,
        remaining = dag.node_count(),
        parallel_pairs = report.parallel_pairs,
        "condensed commit graph"
    );
    Ok(report)
}

/// Replace `parent -> node -> child` by `parent -> child` and drop `node`
fn splice(dag: &mut CommitDag, node: &CommitId, parent: &CommitId, child: &CommitId) -> Result<()> {
    if parent == node || parent == child {
        return Err(GraphError::SelfLoop {
            node: node.clone(),
            target: parent.clone(),
        });
    }
    if child == node {
        return Err(GraphError::SelfLoop {
            node: node.clone(),
            target: child.clone(),
        });
    }

    if dag.rewrite_parent(child, node, parent)? == 0 {
        return Err(GraphError::StaleAdjacency {
            node: child.clone(),
            missing: node.clone(),
        });
    }
    if dag.rewrite_child(parent, node, child)? == 0 {
        return Err(GraphError::StaleAdjacency {
            node: parent.clone(),
            missing: node.clone(),
        });
    }
    dag.remove(node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::core::CommitNode;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn build(source: MemorySource) -> CommitDag {
        GraphBuilder::new().build(&source).unwrap()
    }

    fn linear() -> CommitDag {
        build(
            MemorySource::new()
                .commit("A", &[])
                .commit("B", &["A"])
                .commit("C", &["B"])
                .commit("D", &["C"])
                .branch("main", "D"),
        )
    }

    #[test]
    fn linear_history_collapses_to_one_edge() {
        let mut dag = linear();
        let report = condense(&mut dag).unwrap();

        assert_eq!(report.removed, 2);
        assert_eq!(dag.node_count(), 2);
        assert_eq!(dag.get("A").unwrap().children.to_vec(), vec![CommitId::from("D")]);
        assert_eq!(dag.get("D").unwrap().parents.to_vec(), vec![CommitId::from("A")]);
        assert_eq!(report.parallel_pairs, 0);
        dag.check_links().unwrap();
    }

    #[test]
    fn diamond_leaves_parallel_edges() {
        let mut dag = build(
            MemorySource::new()
                .commit("A", &[])
                .commit("B", &["A"])
                .commit("C", &["A"])
                .commit("D", &["B", "C"])
                .branch("main", "D"),
        );
        let report = condense(&mut dag).unwrap();

        assert_eq!(report.removed, 2);
        assert!(!dag.contains("B") && !dag.contains("C"));
        let a = dag.get("A").unwrap();
        assert_eq!(a.edges_to(&"D".into()), 2);
        assert_eq!(dag.get("D").unwrap().parents.len(), 2);
        assert_eq!(report.parallel_pairs, 1);

        let edges = dag.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].multiplicity, 2);
        dag.check_links().unwrap();
    }

    #[test]
    fn condensing_twice_is_a_no_op() {
        let mut dag = linear();
        condense(&mut dag).unwrap();
        let before = dag.adjacency();

        let again = condense(&mut dag).unwrap();
        assert_eq!(again.removed, 0);
        assert_eq!(again.passes, 1);
        assert_eq!(dag.adjacency(), before);
    }

    #[test]
    fn empty_and_single_node_graphs_are_untouched() {
        let mut empty = CommitDag::new();
        assert_eq!(condense(&mut empty).unwrap().removed, 0);

        let mut single = build(MemorySource::new().commit("A", &[]).branch("main", "A"));
        assert_eq!(condense(&mut single).unwrap().removed, 0);
        assert_eq!(single.node_count(), 1);
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let mut dag = CommitDag::new();
        dag.insert(CommitNode::new("x".into(), [CommitId::from("y")]));
        dag.insert(CommitNode::new("y".into(), [CommitId::from("x")]));
        dag.link(&"y".into(), &"x".into()).unwrap();
        dag.link(&"x".into(), &"y".into()).unwrap();

        let err = condense(&mut dag).unwrap_err();
        assert!(matches!(err, GraphError::SelfLoop { .. }));
    }

    #[test]
    fn stale_child_is_fatal() {
        let mut dag = CommitDag::new();
        dag.insert(CommitNode::new("a".into(), []));
        dag.insert(CommitNode::new("s".into(), [CommitId::from("a")]));
        dag.insert(CommitNode::new("c".into(), [CommitId::from("s")]));
        dag.link(&"a".into(), &"s".into()).unwrap();
        dag.link(&"s".into(), &"c".into()).unwrap();
        dag.remove(&"c".into());

        let err = condense(&mut dag).unwrap_err();
        assert!(matches!(err, GraphError::StaleAdjacency { .. }));
    }

    /// Random DAG over `n` nodes where node `j` may have any `i < j` as a parent
    fn random_history() -> impl Strategy<Value = MemorySource> {
        (2usize..14).prop_flat_map(|n| {
            proptest::collection::vec(proptest::collection::vec(any::<bool>(), n), n).prop_map(
                move |matrix| {
                    let names: Vec<String> = (0..n).map(|i| format!("n{i:02}")).collect();
                    let mut source = MemorySource::new();
                    let mut has_child = vec![false; n];
                    for j in 0..n {
                        let parents: Vec<usize> =
                            (0..j).filter(|&i| matrix[j][i] && j - i <= 3).collect();
                        for &i in &parents {
                            has_child[i] = true;
                        }
                        let parents: Vec<&str> = parents.iter().map(|&i| names[i].as_str()).collect();
                        source = source.commit(&names[j], &parents);
                    }
                    for (i, name) in names.iter().enumerate() {
                        if !has_child[i] {
                            source = source.branch(name, name);
                        }
                    }
                    source
                },
            )
        })
    }

    proptest! {
        #[test]
        fn condensation_preserves_reachability(source in random_history()) {
            let original = GraphBuilder::new().build(&source).unwrap();
            let mut condensed = original.clone();
            condense(&mut condensed).unwrap();

            prop_assert!(condensed.nodes().all(|node| !node.is_sequential()));
            condensed.check_links().unwrap();

            let survivors: Vec<&CommitId> = condensed.sorted_ids();
            for x in &survivors {
                for y in &survivors {
                    if x == y {
                        continue;
                    }
                    prop_assert_eq!(
                        original.reaches(x.as_str(), y.as_str()),
                        condensed.reaches(x.as_str(), y.as_str())
                    );
                }
            }
        }

        #[test]
        fn condensation_reaches_fixed_point(source in random_history()) {
            let mut dag = GraphBuilder::new().build(&source).unwrap();
            condense(&mut dag).unwrap();
            let snapshot = dag.adjacency();
            let again = condense(&mut dag).unwrap();
            prop_assert_eq!(again.removed, 0);
            prop_assert_eq!(dag.adjacency(), snapshot);
        }
    }
}
