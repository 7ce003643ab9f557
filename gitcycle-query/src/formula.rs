//! Quantifier-free formulas over boolean and integer symbols.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Not;

/// Integer operand of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Int(i64),
    Sym(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Const(bool),
    /// Boolean symbol
    Var(String),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    /// Integer symbol bound to a value
    Eq(String, i64),
    Ge(Term, Term),
}

impl Formula {
    pub fn var(name: impl Into<String>) -> Self {
        Formula::Var(name.into())
    }

    /// `var` if `value` holds, its negation otherwise
    pub fn literal(name: impl Into<String>, value: bool) -> Self {
        let var = Formula::var(name);
        if value {
            var
        } else {
            !var
        }
    }

    /// Conjunction; empty is `true`
    pub fn all(items: impl IntoIterator<Item = Formula>) -> Self {
        Formula::And(items.into_iter().collect())
    }

    /// Disjunction; empty is `false`
    pub fn any(items: impl IntoIterator<Item = Formula>) -> Self {
        Formula::Or(items.into_iter().collect())
    }

    pub fn eq(name: impl Into<String>, value: i64) -> Self {
        Formula::Eq(name.into(), value)
    }

    pub fn ge(lhs: Term, rhs: Term) -> Self {
        Formula::Ge(lhs, rhs)
    }

    /// Boolean symbols, sorted
    pub fn bool_symbols(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_bools(&mut out);
        out
    }

    fn collect_bools<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Formula::Var(name) => {
                out.insert(name.as_str());
            }
            Formula::Not(inner) => inner.collect_bools(out),
            Formula::And(items) | Formula::Or(items) => {
                for item in items {
                    item.collect_bools(out);
                }
            }
            Formula::Const(_) | Formula::Eq(..) | Formula::Ge(..) => {}
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            Formula::Not(inner) => 1 + inner.size(),
            Formula::And(items) | Formula::Or(items) => 1 + items.iter().map(Formula::size).sum::<usize>(),
            _ => 1,
        }
    }
}

impl Not for Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::Not(Box::new(self))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Int(value) => write!(f, "{value}"),
            Term::Sym(name) => write!(f, "|{name}|"),
        }
    }
}

/// SMT-LIB style s-expression; symbols are quoted with `|...|`
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Const(value) => write!(f, "{value}"),
            Formula::Var(name) => write!(f, "|{name}|"),
            Formula::Not(inner) => write!(f, "(not {inner})"),
            Formula::And(items) | Formula::Or(items) => {
                let op = if matches!(self, Formula::And(_)) { "and" } else { "or" };
                if items.is_empty() {
                    return write!(f, "{}", op == "and");
                }
                write!(f, "({op}")?;
                for item in items {
                    write!(f, " {item}")?;
                }
                write!(f, ")")
            }
            Formula::Eq(name, value) => write!(f, "(= |{name}| {value})"),
            Formula::Ge(lhs, rhs) => write!(f, "(>= {lhs} {rhs})"),
        }
    }
}
