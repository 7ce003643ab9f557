//! Graph facts in solver form.
//!
//! Every node contributes one boolean per [`Category`] and every streamed
//! parent/child pair one integer, its edge multiplicity. Symbols are named
//! after the category and the commit ids, e.g. `branching(<id>)` and
//! `edges(<parent>,<child>)`.

use crate::error::Result;
use crate::formula::Formula;
use commit_graph::{BranchPolicy, Category, CommitDag, CommitId, Shape, Topology};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Boolean symbol for `category` of node `id`
pub fn category_symbol(category: Category, id: &CommitId) -> String {
    format!("{}({id})", category.as_str())
}

/// Integer symbol for the number of edges from `parent` to `child`
pub fn edges_symbol(parent: &CommitId, child: &CommitId) -> String {
    format!("edges({parent},{child})")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFact {
    pub id: CommitId,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFact {
    pub parent: CommitId,
    pub child: CommitId,
    pub multiplicity: usize,
}

/// Facts about one frozen graph
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    policy: BranchPolicy,
    /// Sorted by id
    nodes: Vec<NodeFact>,
    /// In stream order
    pairs: Vec<PairFact>,
    index: HashMap<CommitId, usize>,
}

impl FactSet {
    /// Order `dag` and collect its facts
    pub fn from_graph(dag: &CommitDag, policy: BranchPolicy) -> Result<Self> {
        let topology = Topology::compute(dag)?;
        Self::from_topology(dag, &topology, policy)
    }

    /// Collect facts using an order already computed for `dag`. Fails if the
    /// order belongs to another graph.
    #[instrument(skip_all, fields(nodes = dag.node_count()))]
    pub fn from_topology(dag: &CommitDag, topology: &Topology, policy: BranchPolicy) -> Result<Self> {
        let nodes: Vec<NodeFact> = dag
            .sorted_ids()
            .into_iter()
            .filter_map(|id| dag.get(id.as_str()))
            .map(|node| NodeFact {
                id: node.id.clone(),
                shape: node.shape(policy),
            })
            .collect();

        let pairs = topology
            .edges(dag)
            .map(|edge| {
                edge.map(|edge| PairFact {
                    parent: edge.parent.id.clone(),
                    child: edge.child.id.clone(),
                    multiplicity: edge.multiplicity,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let index = nodes
            .iter()
            .enumerate()
            .map(|(idx, fact)| (fact.id.clone(), idx))
            .collect();

        debug!(nodes = nodes.len(), pairs = pairs.len(), "collected facts");
        Ok(Self {
            policy,
            nodes,
            pairs,
            index,
        })
    }

    pub fn policy(&self) -> BranchPolicy {
        self.policy
    }

    pub fn nodes(&self) -> &[NodeFact] {
        &self.nodes
    }

    pub fn pairs(&self) -> &[PairFact] {
        &self.pairs
    }

    pub fn shape(&self, id: &CommitId) -> Option<Shape> {
        self.index.get(id).map(|&idx| self.nodes[idx].shape)
    }

    /// Conjunction binding every symbol to its value
    pub fn assertions(&self) -> Formula {
        let node_literals = self.nodes.iter().flat_map(|fact| {
            Category::ALL.iter().map(move |&category| {
                Formula::literal(category_symbol(category, &fact.id), fact.shape.has(category))
            })
        });
        let pair_values = self.pairs.iter().map(|pair| {
            Formula::eq(
                edges_symbol(&pair.parent, &pair.child),
                i64::try_from(pair.multiplicity).unwrap_or(i64::MAX),
            )
        });
        Formula::all(node_literals.chain(pair_values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use commit_graph::{condense, GraphBuilder, MemorySource};
    use pretty_assertions::assert_eq;

    fn condensed_diamond() -> CommitDag {
        let mut dag = GraphBuilder::new()
            .build(
                &MemorySource::new()
                    .commit("A", &[])
                    .commit("B", &["A"])
                    .commit("C", &["A"])
                    .commit("D", &["B", "C"])
                    .branch("main", "D"),
            )
            .unwrap();
        condense(&mut dag).unwrap();
        dag
    }

    #[test]
    fn one_pair_fact_per_distinct_edge() {
        let facts = FactSet::from_graph(&condensed_diamond(), BranchPolicy::DegreeOnly).unwrap();
        assert_eq!(
            facts.pairs(),
            &[PairFact {
                parent: "A".into(),
                child: "D".into(),
                multiplicity: 2,
            }]
        );
        assert_eq!(facts.nodes().len(), 2);
        assert!(facts.shape(&"A".into()).unwrap().branching);
        assert!(facts.shape(&"D".into()).unwrap().merging);
    }

    #[test]
    fn assertions_cover_every_symbol() {
        let facts = FactSet::from_graph(&condensed_diamond(), BranchPolicy::DegreeOnly).unwrap();
        let Formula::And(literals) = facts.assertions() else {
            panic!("assertions must be a conjunction");
        };
        // 2 nodes x 5 categories + 1 pair
        assert_eq!(literals.len(), 11);
        assert!(literals.contains(&Formula::var("branching(A)")));
        assert!(literals.contains(&!Formula::var("sequential(D)")));
        assert!(literals.contains(&Formula::eq("edges(A,D)", 2)));
    }

    #[test]
    fn order_from_another_graph_is_an_error() {
        let uncondensed = GraphBuilder::new()
            .build(&MemorySource::new().commit("A", &[]).commit("B", &["A"]).branch("main", "B"))
            .unwrap();
        let topology = Topology::compute(&uncondensed).unwrap();

        let err = FactSet::from_topology(&condensed_diamond(), &topology, BranchPolicy::DegreeOnly).unwrap_err();
        assert!(matches!(err, QueryError::Graph(_)));
    }

    #[test]
    fn symbol_names() {
        let id = CommitId::from("abc");
        assert_eq!(category_symbol(Category::Merging, &id), "merging(abc)");
        assert_eq!(edges_symbol(&id, &"def".into()), "edges(abc,def)");
    }
}
