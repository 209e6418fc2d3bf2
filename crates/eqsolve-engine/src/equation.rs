//! Equations of the form `expression == 0`

use crate::justification::JustificationSet;
use crate::substitution::Substitution;
use eqsolve_symbolic::{SymExpr, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Asserts `expression == 0` under `justification`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equation {
    pub expression: SymExpr,
    pub justification: JustificationSet,
}

impl Equation {
    /// An unconditional equation `expression == 0`
    pub fn new(expression: SymExpr) -> Self {
        Equation {
            expression,
            justification: JustificationSet::empty(),
        }
    }

    /// Lower `lhs == rhs` to `lhs - rhs == 0`
    pub fn between(lhs: SymExpr, rhs: SymExpr) -> Self {
        Self::new(SymExpr::sub(lhs, rhs))
    }

    pub fn with_justification(expression: SymExpr, justification: JustificationSet) -> Self {
        Equation {
            expression,
            justification,
        }
    }

    /// The same equation with its expression simplified
    pub fn simplified(&self, rounds: usize) -> Equation {
        Equation {
            expression: self.expression.simplify_with_rounds(rounds),
            justification: self.justification.clone(),
        }
    }

    /// The expression is the literal number zero
    pub fn is_tautology(&self) -> bool {
        self.expression.is_zero()
    }

    /// The expression is a number and that number is nonzero
    pub fn is_contradiction(&self) -> bool {
        self.expression
            .as_coeff()
            .map(|c| !c.is_zero())
            .unwrap_or(false)
    }

    pub fn mentions(&self, var: &Symbol) -> bool {
        self.expression.contains_var(&var.name)
    }

    /// Variables of this equation that are still in `residual`
    pub fn residual_vars(&self, residual: &BTreeSet<Symbol>) -> Vec<Symbol> {
        self.expression
            .free_vars()
            .into_iter()
            .filter(|v| residual.contains(v))
            .collect()
    }

    /// Rewrite with one substitution.
    ///
    /// Equations that do not mention the substituted variable are returned
    /// unchanged, so they do not pick up its premises.
    pub fn backsubstitute(&self, subst: &Substitution, rounds: usize) -> Equation {
        if !self.mentions(&subst.variable) {
            return self.clone();
        }
        Equation {
            expression: self
                .expression
                .substitute(&subst.variable.name, &subst.value)
                .simplify_with_rounds(rounds),
            justification: self.justification.union(&subst.justification),
        }
    }

    /// Rewrite with every substitution, in sequence order
    pub fn apply_substitutions(&self, substs: &[Substitution], rounds: usize) -> Equation {
        substs
            .iter()
            .fold(self.simplified(rounds), |eq, s| eq.backsubstitute(s, rounds))
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = 0", self.expression)?;
        if !self.justification.is_empty() {
            write!(f, " {}", self.justification)?;
        }
        Ok(())
    }
}

/// Drop equations whose expression is the literal zero, keeping order
pub fn flush_tautologies(equations: Vec<Equation>) -> Vec<Equation> {
    equations.into_iter().filter(|eq| !eq.is_tautology()).collect()
}

/// Equations that reduced to a nonzero number
pub fn contradictions(equations: &[Equation]) -> Vec<Equation> {
    equations
        .iter()
        .filter(|eq| eq.is_contradiction())
        .cloned()
        .collect()
}
