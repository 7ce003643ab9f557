//! Pattern queries over condensed commit graphs.
//!
//! A [`FactSet`] turns a frozen [`commit_graph::CommitDag`] into symbolic
//! facts, a [`Pattern`] states a structural question over those symbols, and
//! a [`Solver`] decides whether facts and pattern can hold together.
//! [`DpllSolver`] is always available; the `z3` feature adds `Z3Solver`.

pub mod error;
pub mod facts;
pub mod formula;
pub mod pattern;
pub mod solver;
#[cfg(feature = "z3")]
pub mod z3_solver;

pub use error::{QueryError, Result};
pub use facts::{FactSet, NodeFact, PairFact};
pub use formula::{Formula, Term};
pub use pattern::{Pattern, PatternQuery, Verdict};
pub use solver::{DpllSolver, Model, ModelValue, Solver, SolverResult, DEFAULT_MAX_DECISIONS};
#[cfg(feature = "z3")]
pub use z3_solver::Z3Solver;
