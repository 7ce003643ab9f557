//! Degree-based classification of commits.
//!
//! Shapes are never stored on nodes: [`Classification`] is a snapshot taken
//! from the adjacency at one point in time, so classifying again after
//! condensation is just another call.

use crate::core::{BranchPolicy, Category, CommitDag, CommitId, Shape};
use serde::Serialize;
use std::collections::HashMap;
use tracing::instrument;

/// Shapes of every node plus per-category totals
#[derive(Debug, Clone, Default)]
pub struct Classification {
    shapes: HashMap<CommitId, Shape>,
    counts: CategoryCounts,
}

/// Number of nodes in each category. Categories overlap, so the fields do
/// not sum to the node count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub terminal: usize,
    pub sequential: usize,
    pub structural: usize,
    pub branching: usize,
    pub merging: usize,
}

impl CategoryCounts {
    fn record(&mut self, shape: &Shape) {
        self.terminal += usize::from(shape.terminal);
        self.sequential += usize::from(shape.sequential);
        self.structural += usize::from(shape.structural);
        self.branching += usize::from(shape.branching);
        self.merging += usize::from(shape.merging);
    }

    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Terminal => self.terminal,
            Category::Sequential => self.sequential,
            Category::Structural => self.structural,
            Category::Branching => self.branching,
            Category::Merging => self.merging,
        }
    }
}

impl Classification {
    pub fn shape(&self, id: &str) -> Option<Shape> {
        self.shapes.get(id).copied()
    }

    pub fn counts(&self) -> CategoryCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Ids in `category`, sorted
    pub fn members(&self, category: Category) -> Vec<&CommitId> {
        let mut ids: Vec<&CommitId> = self
            .shapes
            .iter()
            .filter(|(_, shape)| shape.has(category))
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Classify every node of a fully linked graph. O(V).
#[instrument(skip_all, fields(nodes = dag.node_count()))]
pub fn classify(dag: &CommitDag, policy: BranchPolicy) -> Classification {
    let mut counts = CategoryCounts::default();
    let shapes = dag
        .nodes()
        .map(|node| {
            let shape = node.shape(policy);
            counts.record(&shape);
            (node.id.clone(), shape)
        })
        .collect();

    tracing::debug!(?counts, "classified commits");
    Classification { shapes, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::source::MemorySource;

    fn build(source: MemorySource) -> CommitDag {
        GraphBuilder::new().build(&source).unwrap()
    }

    #[test]
    fn diamond_shapes() {
        let dag = build(
            MemorySource::new()
                .commit("A", &[])
                .commit("B", &["A"])
                .commit("C", &["A"])
                .commit("D", &["B", "C"])
                .branch("main", "D"),
        );
        let classes = classify(&dag, BranchPolicy::DegreeOnly);

        let a = classes.shape("A").unwrap();
        // 0 + 2 edges is not above two
        assert!(a.terminal && a.branching && !a.structural);
        let b = classes.shape("B").unwrap();
        assert!(b.sequential && !b.terminal);
        let d = classes.shape("D").unwrap();
        assert!(d.terminal && d.merging && !d.structural);

        let counts = classes.counts();
        assert_eq!(counts.terminal, 2);
        assert_eq!(counts.sequential, 2);
        assert_eq!(counts.structural, 0);
        assert_eq!(counts.branching, 1);
        assert_eq!(counts.merging, 1);
        assert_eq!(classes.members(Category::Sequential).len(), 2);
    }

    #[test]
    fn policy_changes_degenerate_junctions() {
        let dag = build(
            MemorySource::new()
                .commit("A", &[])
                .commit("B", &["A"])
                .commit("C", &["A"])
                .branch("left", "B")
                .branch("right", "C"),
        );
        let loose = classify(&dag, BranchPolicy::DegreeOnly);
        let strict = classify(&dag, BranchPolicy::RequireOpposite);
        assert!(loose.shape("A").unwrap().branching);
        assert!(!strict.shape("A").unwrap().branching);
    }

    #[test]
    fn empty_and_single_node_graphs() {
        let empty = classify(&CommitDag::new(), BranchPolicy::DegreeOnly);
        assert!(empty.is_empty());
        assert_eq!(empty.counts(), CategoryCounts::default());

        let single = build(MemorySource::new().commit("A", &[]).branch("main", "A"));
        let classes = classify(&single, BranchPolicy::DegreeOnly);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes.counts().terminal, 1);
        assert_eq!(classes.counts().sequential, 0);
    }

    #[test]
    fn structural_excludes_sequential_everywhere() {
        let dag = build(
            MemorySource::new()
                .commit("A", &[])
                .commit("B", &["A"])
                .commit("C", &["B"])
                .commit("D", &["B", "C"])
                .commit("E", &["D"])
                .branch("main", "E"),
        );
        let classes = classify(&dag, BranchPolicy::DegreeOnly);
        for node in dag.nodes() {
            let shape = classes.shape(node.id.as_str()).unwrap();
            assert!(!(shape.structural && shape.sequential), "{}", node.id);
        }
    }
}
