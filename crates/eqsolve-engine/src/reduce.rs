//! Reduction step: fold one new substitution into a solution

use crate::equation::{contradictions, flush_tautologies, Equation};
use crate::solution::Solution;
use crate::substitution::Substitution;
use tracing::{debug, trace};

/// Result of folding a substitution into a solution
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// The smaller solution, with the new substitution first
    Reduced(Solution),
    /// Equations that collapsed to a nonzero number, residual before tough
    Contradiction(Vec<Equation>),
}

impl Reduction {
    pub fn is_contradiction(&self) -> bool {
        matches!(self, Reduction::Contradiction(_))
    }
}

/// Back-substitute `subst` into every prior substitution and every residual
/// and tough equation of `previous`, drop the equations that became `0`, and
/// report the ones that became a nonzero number.
///
/// `previous` must no longer contain the equation `subst` was isolated from.
pub fn use_new_substitution(subst: Substitution, previous: Solution, rounds: usize) -> Reduction {
    trace!(substitution = %subst, "reducing");

    let Solution {
        residual_equations,
        mut residual_variables,
        substitutions,
        tough_equations,
    } = previous;

    let rewrite = |eqs: Vec<Equation>| -> Vec<Equation> {
        flush_tautologies(
            eqs.iter()
                .map(|eq| eq.backsubstitute(&subst, rounds))
                .collect(),
        )
    };
    let new_equations = rewrite(residual_equations);
    let new_tough = rewrite(tough_equations);

    let mut conflicts = contradictions(&new_equations);
    conflicts.extend(contradictions(&new_tough));
    if !conflicts.is_empty() {
        debug!(
            substitution = %subst,
            conflicts = conflicts.len(),
            "substitution exposes a contradiction"
        );
        return Reduction::Contradiction(conflicts);
    }

    let mut new_substitutions = Vec::with_capacity(substitutions.len() + 1);
    new_substitutions.extend(
        substitutions
            .iter()
            .map(|prior| prior.backsubstitute(&subst, rounds)),
    );
    residual_variables.remove(&subst.variable);
    new_substitutions.insert(0, subst);

    Reduction::Reduced(Solution {
        residual_equations: new_equations,
        residual_variables,
        substitutions: new_substitutions,
        tough_equations: new_tough,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::justification::JustificationSet;
    use eqsolve_symbolic::{SymExpr, Symbol, DEFAULT_SIMPLIFY_ROUNDS as ROUNDS};

    fn subst(var: &str, value: SymExpr) -> Substitution {
        Substitution::new(Symbol::new(var), value, JustificationSet::empty())
    }

    #[test]
    fn eliminated_variable_leaves_residual_set() {
        let sol = Solution::new(
            vec![Equation::between(SymExpr::var("y"), SymExpr::var("x"))],
            [Symbol::new("x"), Symbol::new("y")],
        );
        let Reduction::Reduced(next) = use_new_substitution(subst("x", SymExpr::int(3)), sol, ROUNDS)
        else {
            panic!("expected a reduced solution");
        };

        assert!(!next.residual_variables.contains(&Symbol::new("x")));
        assert!(next.residual_variables.contains(&Symbol::new("y")));
        assert_eq!(next.residual_equations.len(), 1);
        assert!(!next.residual_equations[0].mentions(&Symbol::new("x")));
    }

    #[test]
    fn tough_contradictions_are_reported_after_residual_ones() {
        let mut sol = Solution::new(
            vec![Equation::between(SymExpr::var("x"), SymExpr::int(2))],
            [Symbol::new("x")],
        );
        sol.tough_equations
            .push(Equation::between(SymExpr::var("x"), SymExpr::int(5)));

        match use_new_substitution(subst("x", SymExpr::int(1)), sol, ROUNDS) {
            Reduction::Contradiction(eqs) => {
                assert_eq!(eqs.len(), 2);
                assert_eq!(eqs[0].expression, SymExpr::int(-1));
                assert_eq!(eqs[1].expression, SymExpr::int(-4));
            }
            other => panic!("expected contradiction, got {:?}", other),
        }
    }

    #[test]
    fn tautologies_are_flushed_from_tough_queue() {
        let mut sol = Solution::new(vec![], [Symbol::new("x")]);
        sol.tough_equations
            .push(Equation::between(SymExpr::var("x"), SymExpr::int(2)));

        let reduction = use_new_substitution(subst("x", SymExpr::int(2)), sol, ROUNDS);
        let Reduction::Reduced(next) = reduction else {
            panic!("expected a reduced solution");
        };
        assert!(next.tough_equations.is_empty());
    }
}
