//! The state threaded through a solve

use crate::equation::Equation;
use crate::substitution::Substitution;
use eqsolve_symbolic::{SymExpr, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A partially or fully reduced system.
///
/// `substitutions` is ordered most recent first. No variable with a
/// substitution is residual, and after every reduction no substitution value
/// mentions an eliminated variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub residual_equations: Vec<Equation>,
    pub residual_variables: BTreeSet<Symbol>,
    pub substitutions: Vec<Substitution>,
    pub tough_equations: Vec<Equation>,
}

impl Solution {
    /// A fresh system: every equation residual, no substitutions yet
    pub fn new(equations: Vec<Equation>, variables: impl IntoIterator<Item = Symbol>) -> Self {
        Solution {
            residual_equations: equations,
            residual_variables: variables.into_iter().collect(),
            substitutions: Vec::new(),
            tough_equations: Vec::new(),
        }
    }

    pub fn substitution_for(&self, var: &str) -> Option<&Substitution> {
        self.substitutions.iter().find(|s| s.variable.name == var)
    }

    /// The value `var` was eliminated to, if it was eliminated
    pub fn value_of(&self, var: &str) -> Option<&SymExpr> {
        self.substitution_for(var).map(|s| &s.value)
    }

    pub fn is_eliminated(&self, var: &str) -> bool {
        self.substitution_for(var).is_some()
    }

    /// No equation is left to reduce
    pub fn is_complete(&self) -> bool {
        self.residual_equations.is_empty() && self.tough_equations.is_empty()
    }

    /// Move tough equations back behind the residual ones for another try
    pub fn requeue_tough(mut self) -> Self {
        let tough = std::mem::take(&mut self.tough_equations);
        self.residual_equations.extend(tough);
        self
    }

    /// Residual and tough equations, residual first
    pub fn pending_equations(&self) -> impl Iterator<Item = &Equation> {
        self.residual_equations
            .iter()
            .chain(self.tough_equations.iter())
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.substitutions {
            writeln!(f, "{}", s)?;
        }
        for eq in self.pending_equations() {
            writeln!(f, "residual: {}", eq)?;
        }
        if !self.residual_variables.is_empty() {
            let names: Vec<_> = self
                .residual_variables
                .iter()
                .map(|v| v.name.as_str())
                .collect();
            writeln!(f, "free: {}", names.join(", "))?;
        }
        Ok(())
    }
}
