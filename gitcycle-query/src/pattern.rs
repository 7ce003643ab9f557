use crate::error::QueryError;
use crate::facts::{category_symbol, edges_symbol, FactSet};
use crate::formula::{Formula, Term};
use crate::solver::{ModelValue, Solver, SolverResult};
use commit_graph::{Category, CommitId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

/// Minimum number of parallel edges for a maintenance cycle
pub const MIN_PARALLEL_EDGES: i64 = 2;

/// Selector naming the pair a maintenance cycle was found on
pub fn witness_symbol(parent: &CommitId, child: &CommitId) -> String {
    format!("witness({parent},{child})")
}

/// Structural questions that can be asked about a condensed graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// A branching node and a merging node joined by at least two direct
    /// edges, neither of them sequential
    MaintenanceCycle,
    /// Every node is terminal or structural
    StructuralDomain,
    /// No node is sequential
    FullyCondensed,
}

impl Pattern {
    pub const ALL: [Pattern; 3] = [
        Pattern::MaintenanceCycle,
        Pattern::StructuralDomain,
        Pattern::FullyCondensed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pattern::MaintenanceCycle => "maintenance-cycle",
            Pattern::StructuralDomain => "structural-domain",
            Pattern::FullyCondensed => "fully-condensed",
        }
    }

    /// The pattern as a formula over the symbols of `facts`
    pub fn formula(&self, facts: &FactSet) -> Formula {
        let var = |category: Category, id: &CommitId| Formula::var(category_symbol(category, id));

        match self {
            Pattern::MaintenanceCycle => Formula::any(facts.pairs().iter().map(|pair| {
                let (u, v) = (&pair.parent, &pair.child);
                Formula::all([
                    Formula::var(witness_symbol(u, v)),
                    var(Category::Branching, u),
                    var(Category::Merging, v),
                    Formula::ge(
                        Term::Sym(edges_symbol(u, v)),
                        Term::Int(MIN_PARALLEL_EDGES),
                    ),
                    !var(Category::Sequential, u),
                    !var(Category::Sequential, v),
                ])
            })),
            Pattern::StructuralDomain => Formula::all(facts.nodes().iter().map(|node| {
                Formula::any([
                    var(Category::Terminal, &node.id),
                    var(Category::Structural, &node.id),
                ])
            })),
            Pattern::FullyCondensed => Formula::all(
                facts
                    .nodes()
                    .iter()
                    .map(|node| !var(Category::Sequential, &node.id)),
            ),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pattern {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-").to_ascii_lowercase();
        Pattern::ALL
            .into_iter()
            .find(|pattern| pattern.name() == wanted)
            .ok_or_else(|| QueryError::UnknownPattern(s.to_string()))
    }
}

/// Answer to one pattern query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Sat {
        /// Parent and child of a matching pair, when the model names one
        witness: Option<(CommitId, CommitId)>,
    },
    Unsat,
    Unknown,
}

impl Verdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Sat { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Sat {
                witness: Some((parent, child)),
            } => write!(f, "SAT ({} -> {})", parent.short(), child.short()),
            Verdict::Sat { witness: None } => f.write_str("SAT"),
            Verdict::Unsat => f.write_str("UNSAT"),
            Verdict::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A pattern bound to the facts of one graph
#[derive(Debug, Clone, Copy)]
pub struct PatternQuery<'a> {
    facts: &'a FactSet,
    pattern: Pattern,
}

impl<'a> PatternQuery<'a> {
    pub fn new(facts: &'a FactSet, pattern: Pattern) -> Self {
        Self { facts, pattern }
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Assertions conjoined with the pattern
    pub fn formula(&self) -> Formula {
        Formula::all([self.facts.assertions(), self.pattern.formula(self.facts)])
    }

    #[instrument(skip_all, fields(pattern = %self.pattern))]
    pub fn run(&self, solver: &mut dyn Solver) -> Verdict {
        let verdict = match solver.check(&self.formula()) {
            SolverResult::Sat(model) => Verdict::Sat {
                witness: model.and_then(|model| {
                    self.facts
                        .pairs()
                        .iter()
                        .find(|pair| {
                            model.get(&witness_symbol(&pair.parent, &pair.child))
                                == Some(&ModelValue::Bool(true))
                        })
                        .map(|pair| (pair.parent.clone(), pair.child.clone()))
                }),
            },
            SolverResult::Unsat => Verdict::Unsat,
            SolverResult::Unknown => Verdict::Unknown,
        };
        info!(solver = solver.name(), %verdict, "pattern checked");
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::DpllSolver;
    use commit_graph::{condense, BranchPolicy, CommitDag, GraphBuilder, MemorySource};
    use pretty_assertions::assert_eq;

    fn graph(source: MemorySource, condensed: bool) -> CommitDag {
        let mut dag = GraphBuilder::new().build(&source).unwrap();
        if condensed {
            condense(&mut dag).unwrap();
        }
        dag
    }

    fn diamond() -> MemorySource {
        MemorySource::new()
            .commit("A", &[])
            .commit("B", &["A"])
            .commit("C", &["A"])
            .commit("D", &["B", "C"])
            .branch("main", "D")
    }

    fn linear() -> MemorySource {
        MemorySource::new()
            .commit("A", &[])
            .commit("B", &["A"])
            .commit("C", &["B"])
            .commit("D", &["C"])
            .branch("main", "D")
    }

    fn run(dag: &CommitDag, pattern: Pattern) -> Verdict {
        let facts = FactSet::from_graph(dag, BranchPolicy::DegreeOnly).unwrap();
        PatternQuery::new(&facts, pattern).run(&mut DpllSolver::default())
    }

    #[test]
    fn condensed_diamond_is_a_maintenance_cycle() {
        let verdict = run(&graph(diamond(), true), Pattern::MaintenanceCycle);
        assert_eq!(
            verdict,
            Verdict::Sat {
                witness: Some(("A".into(), "D".into()))
            }
        );
    }

    #[test]
    fn uncondensed_diamond_has_no_parallel_edges() {
        assert_eq!(run(&graph(diamond(), false), Pattern::MaintenanceCycle), Verdict::Unsat);
    }

    #[test]
    fn linear_history_is_not_a_maintenance_cycle() {
        let dag = graph(linear(), true);
        assert_eq!(dag.node_count(), 2);
        assert_eq!(run(&dag, Pattern::MaintenanceCycle), Verdict::Unsat);
    }

    #[test]
    fn condensation_produces_structural_domain() {
        assert_eq!(run(&graph(linear(), false), Pattern::StructuralDomain), Verdict::Unsat);
        assert!(run(&graph(linear(), true), Pattern::StructuralDomain).is_sat());

        assert_eq!(run(&graph(diamond(), false), Pattern::FullyCondensed), Verdict::Unsat);
        assert!(run(&graph(diamond(), true), Pattern::FullyCondensed).is_sat());
    }

    #[test]
    fn empty_graph() {
        let dag = CommitDag::new();
        assert_eq!(run(&dag, Pattern::MaintenanceCycle), Verdict::Unsat);
        assert_eq!(run(&dag, Pattern::FullyCondensed), Verdict::Sat { witness: None });
    }

    #[test]
    fn require_opposite_policy_rejects_root_branching() {
        // After condensing the diamond, A is a root, so it only branches
        // under the degree-only policy.
        let dag = graph(diamond(), true);
        let facts = FactSet::from_graph(&dag, BranchPolicy::RequireOpposite).unwrap();
        let verdict = PatternQuery::new(&facts, Pattern::MaintenanceCycle).run(&mut DpllSolver::default());
        assert_eq!(verdict, Verdict::Unsat);
    }

    fn double_diamond() -> MemorySource {
        diamond()
            .commit("E", &["D"])
            .commit("F", &["D"])
            .commit("G", &["E", "F"])
            .branch("next", "G")
    }

    #[test]
    fn first_matching_pair_is_the_witness() {
        let verdict = run(&graph(double_diamond(), true), Pattern::MaintenanceCycle);
        assert_eq!(
            verdict,
            Verdict::Sat {
                witness: Some(("A".into(), "D".into()))
            }
        );
    }

    #[test]
    fn budget_exhaustion_is_unknown() {
        // Two matching pairs leave a choice the solver has to decide.
        let dag = graph(double_diamond(), true);
        let facts = FactSet::from_graph(&dag, BranchPolicy::DegreeOnly).unwrap();
        let verdict = PatternQuery::new(&facts, Pattern::MaintenanceCycle).run(&mut DpllSolver::new(0));
        assert_eq!(verdict, Verdict::Unknown);
    }

    #[test]
    fn parses_pattern_names() {
        assert_eq!("maintenance-cycle".parse::<Pattern>().unwrap(), Pattern::MaintenanceCycle);
        assert_eq!("maintenance_cycle".parse::<Pattern>().unwrap(), Pattern::MaintenanceCycle);
        assert_eq!("Fully-Condensed".parse::<Pattern>().unwrap(), Pattern::FullyCondensed);
        assert!(matches!(
            "spiral".parse::<Pattern>(),
            Err(QueryError::UnknownPattern(name)) if name == "spiral"
        ));
    }
}
