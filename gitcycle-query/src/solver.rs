//! Satisfiability backends.
//!
//! Queries talk to a [`Solver`] only; [`DpllSolver`] is the built-in one.
//! It folds ground atoms, propagates top-level literals and branches on the
//! remaining boolean symbols until it runs out of decisions.

use crate::formula::{Formula, Term};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Decision budget of [`DpllSolver::default`]
pub const DEFAULT_MAX_DECISIONS: u64 = 1_000_000;

pub trait Solver {
    /// Name of this solver
    fn name(&self) -> &'static str;

    /// Decide satisfiability of `formula`
    fn check(&mut self, formula: &Formula) -> SolverResult;
}

/// Solver result
#[derive(Debug, Clone, PartialEq)]
pub enum SolverResult {
    /// Satisfiable (with optional model/assignment)
    Sat(Option<Model>),

    /// Unsatisfiable (contradiction)
    Unsat,

    /// Unknown (budget exceeded, unbound integer symbols)
    Unknown,
}

impl SolverResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolverResult::Sat(_))
    }
}

/// Symbol assignment returned with a SAT answer
pub type Model = HashMap<String, ModelValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValue {
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, Default)]
struct Assignment {
    bools: HashMap<String, bool>,
    ints: HashMap<String, i64>,
}

impl Assignment {
    fn into_model(self) -> Model {
        self.bools
            .into_iter()
            .map(|(name, value)| (name, ModelValue::Bool(value)))
            .chain(self.ints.into_iter().map(|(name, value)| (name, ModelValue::Int(value))))
            .collect()
    }

    fn int(&self, term: &Term) -> Option<i64> {
        match term {
            Term::Int(value) => Some(*value),
            Term::Sym(name) => self.ints.get(name).copied(),
        }
    }
}

enum Outcome {
    Sat(Assignment),
    Unsat,
    Unknown,
}

/// Backtracking search with literal propagation
#[derive(Debug, Clone)]
pub struct DpllSolver {
    max_decisions: u64,
    decisions: u64,
}

impl Default for DpllSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DECISIONS)
    }
}

impl DpllSolver {
    pub fn new(max_decisions: u64) -> Self {
        Self {
            max_decisions,
            decisions: 0,
        }
    }

    /// Decisions spent by the last `check`
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    fn search(&mut self, formula: &Formula, mut assignment: Assignment) -> Outcome {
        let mut current = simplify(formula, &assignment);
        loop {
            match propagate(&current, &mut assignment) {
                Propagation::Conflict => return Outcome::Unsat,
                Propagation::Fixed => break,
                Propagation::Assigned => current = simplify(&current, &assignment),
            }
        }

        let branch_on = match &current {
            Formula::Const(true) => return Outcome::Sat(assignment),
            Formula::Const(false) => return Outcome::Unsat,
            other => match other.bool_symbols().into_iter().next() {
                Some(name) => name.to_string(),
                // Only integer atoms with free symbols are left
                None => return Outcome::Unknown,
            },
        };

        let mut unknown = false;
        for value in [true, false] {
            if self.decisions >= self.max_decisions {
                return Outcome::Unknown;
            }
            self.decisions += 1;
            trace!(symbol = %branch_on, value, "decide");

            let mut branch = assignment.clone();
            branch.bools.insert(branch_on.clone(), value);
            match self.search(&current, branch) {
                Outcome::Sat(model) => return Outcome::Sat(model),
                Outcome::Unsat => {}
                Outcome::Unknown => unknown = true,
            }
        }
        if unknown {
            Outcome::Unknown
        } else {
            Outcome::Unsat
        }
    }
}

impl Solver for DpllSolver {
    fn name(&self) -> &'static str {
        "dpll"
    }

    fn check(&mut self, formula: &Formula) -> SolverResult {
        self.decisions = 0;
        let result = match self.search(formula, Assignment::default()) {
            Outcome::Sat(assignment) => SolverResult::Sat(Some(assignment.into_model())),
            Outcome::Unsat => SolverResult::Unsat,
            Outcome::Unknown => SolverResult::Unknown,
        };
        debug!(
            solver = self.name(),
            size = formula.size(),
            decisions = self.decisions,
            sat = result.is_sat(),
            "checked formula"
        );
        result
    }
}

enum Propagation {
    Conflict,
    Assigned,
    Fixed,
}

/// Bind every literal that must hold for `formula` to be true.
fn propagate(formula: &Formula, assignment: &mut Assignment) -> Propagation {
    let units: &[Formula] = match formula {
        Formula::And(items) => items,
        single => std::slice::from_ref(single),
    };

    let mut assigned = false;
    for unit in units {
        let conflict = match unit {
            Formula::Var(name) => bind(&mut assignment.bools, name, true, &mut assigned),
            Formula::Not(inner) => match inner.as_ref() {
                Formula::Var(name) => bind(&mut assignment.bools, name, false, &mut assigned),
                _ => false,
            },
            Formula::Eq(name, value) => bind(&mut assignment.ints, name, *value, &mut assigned),
            _ => false,
        };
        if conflict {
            return Propagation::Conflict;
        }
    }

    if assigned {
        Propagation::Assigned
    } else {
        Propagation::Fixed
    }
}

/// Returns true on a conflicting earlier binding
fn bind<V: PartialEq + Copy>(
    table: &mut HashMap<String, V>,
    name: &str,
    value: V,
    assigned: &mut bool,
) -> bool {
    match table.get(name) {
        Some(existing) => *existing != value,
        None => {
            table.insert(name.to_string(), value);
            *assigned = true;
            false
        }
    }
}

/// Substitute known symbols and fold constants
fn simplify(formula: &Formula, assignment: &Assignment) -> Formula {
    match formula {
        Formula::Const(value) => Formula::Const(*value),
        Formula::Var(name) => match assignment.bools.get(name) {
            Some(value) => Formula::Const(*value),
            None => formula.clone(),
        },
        Formula::Not(inner) => match simplify(inner, assignment) {
            Formula::Const(value) => Formula::Const(!value),
            Formula::Not(double) => *double,
            other => !other,
        },
        Formula::And(items) => fold(items, assignment, false),
        Formula::Or(items) => fold(items, assignment, true),
        Formula::Eq(name, value) => match assignment.ints.get(name) {
            Some(bound) => Formula::Const(bound == value),
            None => formula.clone(),
        },
        Formula::Ge(lhs, rhs) => match (assignment.int(lhs), assignment.int(rhs)) {
            (Some(lhs), Some(rhs)) => Formula::Const(lhs >= rhs),
            _ => formula.clone(),
        },
    }
}

/// Fold an n-ary connective whose absorbing constant is `absorbing`
/// (`false` for and, `true` for or)
fn fold(items: &[Formula], assignment: &Assignment, absorbing: bool) -> Formula {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match simplify(item, assignment) {
            Formula::Const(value) if value == absorbing => return Formula::Const(absorbing),
            Formula::Const(_) => {}
            Formula::And(nested) if !absorbing => out.extend(nested),
            Formula::Or(nested) if absorbing => out.extend(nested),
            other => out.push(other),
        }
    }
    match out.len() {
        0 => Formula::Const(!absorbing),
        1 => out.remove(0),
        _ if absorbing => Formula::Or(out),
        _ => Formula::And(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(name: &str) -> Formula {
        Formula::var(name)
    }

    #[test]
    fn conjunction_of_literals_needs_no_decisions() {
        let mut solver = DpllSolver::default();
        let result = solver.check(&Formula::all([v("a"), !v("b"), Formula::eq("n", 2)]));

        let SolverResult::Sat(Some(model)) = result else {
            panic!("expected a model, got {result:?}");
        };
        assert_eq!(model["a"], ModelValue::Bool(true));
        assert_eq!(model["b"], ModelValue::Bool(false));
        assert_eq!(model["n"], ModelValue::Int(2));
        assert_eq!(solver.decisions(), 0);
    }

    #[test]
    fn contradicting_literals_are_unsat() {
        let mut solver = DpllSolver::default();
        assert_eq!(solver.check(&Formula::all([v("a"), !v("a")])), SolverResult::Unsat);
        assert_eq!(
            solver.check(&Formula::all([Formula::eq("n", 1), Formula::eq("n", 2)])),
            SolverResult::Unsat
        );
    }

    #[test]
    fn bound_integers_fold_comparisons() {
        let mut solver = DpllSolver::default();
        let at_least = |k| Formula::ge(Term::Sym("n".into()), Term::Int(k));

        assert!(solver.check(&Formula::all([Formula::eq("n", 2), at_least(2)])).is_sat());
        assert_eq!(
            solver.check(&Formula::all([Formula::eq("n", 1), at_least(2)])),
            SolverResult::Unsat
        );
    }

    #[test]
    fn free_integer_symbol_is_unknown() {
        let mut solver = DpllSolver::default();
        let formula = Formula::ge(Term::Sym("n".into()), Term::Int(2));
        assert_eq!(solver.check(&formula), SolverResult::Unknown);
    }

    #[test]
    fn branches_on_disjunctions() {
        let mut solver = DpllSolver::default();
        // (a or b) and (not a or c) and not c  =>  a false, b true
        let formula = Formula::all([
            Formula::any([v("a"), v("b")]),
            Formula::any([!v("a"), v("c")]),
            !v("c"),
        ]);
        let SolverResult::Sat(Some(model)) = solver.check(&formula) else {
            panic!("expected sat");
        };
        assert_eq!(model.get("b"), Some(&ModelValue::Bool(true)));
        assert_eq!(model.get("c"), Some(&ModelValue::Bool(false)));
    }

    #[test]
    fn exhausts_both_branches_before_unsat() {
        let mut solver = DpllSolver::default();
        // xor(a, b) and (a == b)
        let formula = Formula::all([
            Formula::any([v("a"), v("b")]),
            Formula::any([!v("a"), !v("b")]),
            Formula::any([Formula::all([v("a"), v("b")]), Formula::all([!v("a"), !v("b")])]),
        ]);
        assert_eq!(solver.check(&formula), SolverResult::Unsat);
        assert!(solver.decisions() >= 2);
    }

    #[test]
    fn budget_exhaustion_reports_unknown() {
        let mut solver = DpllSolver::new(0);
        let formula = Formula::any([v("a"), v("b")]);
        assert_eq!(solver.check(&formula), SolverResult::Unknown);
    }

    #[test]
    fn empty_connectives() {
        let mut solver = DpllSolver::default();
        assert!(solver.check(&Formula::all([])).is_sat());
        assert_eq!(solver.check(&Formula::any([])), SolverResult::Unsat);
    }
}
