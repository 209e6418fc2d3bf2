//! Eliminated variables

use crate::justification::JustificationSet;
use eqsolve_symbolic::{SymExpr, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `variable` is replaced by `value` everywhere, given `justification`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Substitution {
    pub variable: Symbol,
    pub value: SymExpr,
    pub justification: JustificationSet,
}

impl Substitution {
    pub fn new(variable: Symbol, value: SymExpr, justification: JustificationSet) -> Self {
        Substitution {
            variable,
            value,
            justification,
        }
    }

    /// Rewrite this substitution's value with a later one.
    ///
    /// The result depends on `later`'s premises only if the value mentioned
    /// the variable `later` eliminates.
    pub fn backsubstitute(&self, later: &Substitution, rounds: usize) -> Substitution {
        if !self.value.contains_var(&later.variable.name) {
            return self.clone();
        }
        Substitution {
            variable: self.variable.clone(),
            value: self
                .value
                .substitute(&later.variable.name, &later.value)
                .simplify_with_rounds(rounds),
            justification: self.justification.union(&later.justification),
        }
    }

    /// Apply to an arbitrary expression, without simplifying
    pub fn apply(&self, expr: &SymExpr) -> SymExpr {
        expr.substitute(&self.variable.name, &self.value)
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.variable, self.value)?;
        if !self.justification.is_empty() {
            write!(f, " {}", self.justification)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqsolve_symbolic::DEFAULT_SIMPLIFY_ROUNDS as ROUNDS;

    #[test]
    fn backsubstitute_rewrites_value() {
        // x -> y + 1, then y -> 2 gives x -> 3
        let x_subst = Substitution::new(
            Symbol::new("x"),
            SymExpr::var("y") + SymExpr::int(1),
            JustificationSet::empty(),
        );
        let y_subst = Substitution::new(Symbol::new("y"), SymExpr::int(2), JustificationSet::empty());

        let rewritten = x_subst.backsubstitute(&y_subst, ROUNDS);
        assert_eq!(rewritten.variable, Symbol::new("x"));
        assert_eq!(rewritten.value, SymExpr::int(3));
    }

    #[test]
    fn backsubstitute_leaves_independent_value() {
        let x_subst = Substitution::new(Symbol::new("x"), SymExpr::int(5), JustificationSet::empty());
        let y_subst = Substitution::new(Symbol::new("y"), SymExpr::int(2), JustificationSet::empty());
        assert_eq!(x_subst.backsubstitute(&y_subst, ROUNDS), x_subst);
    }

    #[test]
    fn display() {
        let s = Substitution::new(Symbol::new("x"), SymExpr::int(-2), JustificationSet::empty());
        assert_eq!(s.to_string(), "x -> -2");
    }
}
