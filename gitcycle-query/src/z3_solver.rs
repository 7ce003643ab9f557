//! Z3 backend for pattern queries.
//!
//! Only available when compiled with `--features z3`, which links against
//! the system Z3 library:
//!
//! ```bash
//! apt-get install libz3-dev  # Linux
//! brew install z3            # macOS
//! cargo build --release --features z3
//! ```

use crate::formula::{Formula, Term};
use crate::solver::{Model, ModelValue, Solver, SolverResult};
use std::collections::BTreeMap;
use tracing::debug;
use z3::ast::{Ast, Bool, Int};
use z3::{Config, Context, SatResult};

/// Default per-check timeout of [`Z3Solver::new`]
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Decides formulas with Z3. Each check runs in a fresh context, so no
/// assertions leak between queries.
#[derive(Debug, Clone)]
pub struct Z3Solver {
    timeout_ms: u64,
}

impl Default for Z3Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Z3Solver {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_MS)
    }

    /// A check that runs past `timeout_ms` answers [`SolverResult::Unknown`]
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }
}

/// Formula to Z3 AST, remembering every symbol for model extraction
struct Translation<'ctx> {
    ctx: &'ctx Context,
    bools: BTreeMap<String, Bool<'ctx>>,
    ints: BTreeMap<String, Int<'ctx>>,
}

impl<'ctx> Translation<'ctx> {
    fn new(ctx: &'ctx Context) -> Self {
        Self {
            ctx,
            bools: BTreeMap::new(),
            ints: BTreeMap::new(),
        }
    }

    fn bool_var(&mut self, name: &str) -> Bool<'ctx> {
        let ctx = self.ctx;
        self.bools
            .entry(name.to_string())
            .or_insert_with(|| Bool::new_const(ctx, name))
            .clone()
    }

    fn int_var(&mut self, name: &str) -> Int<'ctx> {
        let ctx = self.ctx;
        self.ints
            .entry(name.to_string())
            .or_insert_with(|| Int::new_const(ctx, name))
            .clone()
    }

    fn term(&mut self, term: &Term) -> Int<'ctx> {
        match term {
            Term::Int(value) => Int::from_i64(self.ctx, *value),
            Term::Sym(name) => self.int_var(name),
        }
    }

    fn formula(&mut self, formula: &Formula) -> Bool<'ctx> {
        match formula {
            Formula::Const(value) => Bool::from_bool(self.ctx, *value),
            Formula::Var(name) => self.bool_var(name),
            Formula::Not(inner) => self.formula(inner).not(),
            Formula::And(items) => {
                let items: Vec<Bool<'ctx>> = items.iter().map(|item| self.formula(item)).collect();
                Bool::and(self.ctx, &items.iter().collect::<Vec<_>>())
            }
            Formula::Or(items) => {
                let items: Vec<Bool<'ctx>> = items.iter().map(|item| self.formula(item)).collect();
                Bool::or(self.ctx, &items.iter().collect::<Vec<_>>())
            }
            Formula::Eq(name, value) => self.int_var(name)._eq(&Int::from_i64(self.ctx, *value)),
            Formula::Ge(lhs, rhs) => {
                let lhs = self.term(lhs);
                let rhs = self.term(rhs);
                lhs.ge(&rhs)
            }
        }
    }

    fn model(&self, model: &z3::Model<'ctx>) -> Model {
        let bools = self.bools.iter().filter_map(|(name, var)| {
            let value = model.eval(var, true)?.as_bool()?;
            Some((name.clone(), ModelValue::Bool(value)))
        });
        let ints = self.ints.iter().filter_map(|(name, var)| {
            let value = model.eval(var, true)?.as_i64()?;
            Some((name.clone(), ModelValue::Int(value)))
        });
        bools.chain(ints).collect()
    }
}

impl Solver for Z3Solver {
    fn name(&self) -> &'static str {
        "z3"
    }

    fn check(&mut self, formula: &Formula) -> SolverResult {
        let mut cfg = Config::new();
        cfg.set_timeout_msec(self.timeout_ms);
        let ctx = Context::new(&cfg);
        let solver = z3::Solver::new(&ctx);

        let mut translation = Translation::new(&ctx);
        solver.assert(&translation.formula(formula));

        let result = match solver.check() {
            SatResult::Sat => SolverResult::Sat(solver.get_model().map(|model| translation.model(&model))),
            SatResult::Unsat => SolverResult::Unsat,
            SatResult::Unknown => SolverResult::Unknown,
        };
        debug!(
            solver = self.name(),
            size = formula.size(),
            symbols = translation.bools.len() + translation.ints.len(),
            sat = result.is_sat(),
            "checked formula"
        );
        result
    }
}
