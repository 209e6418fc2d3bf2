//! Post-hoc verification of substitutions

use crate::equation::Equation;
use crate::substitution::Substitution;
use eqsolve_symbolic::{SymExpr, DEFAULT_SIMPLIFY_ROUNDS};

/// True iff applying every substitution to every equation leaves exactly the
/// number zero. An equation that still mentions a symbol afterwards counts
/// as incorrect.
pub fn correct_substitutions(equations: &[Equation], substitutions: &[Substitution]) -> bool {
    first_incorrect(equations, substitutions).is_none()
}

/// Index and rewritten expression of the first equation that does not
/// reduce to zero
pub fn first_incorrect(
    equations: &[Equation],
    substitutions: &[Substitution],
) -> Option<(usize, SymExpr)> {
    equations.iter().enumerate().find_map(|(i, eq)| {
        let applied = eq.apply_substitutions(substitutions, DEFAULT_SIMPLIFY_ROUNDS);
        let reduces_to_zero = applied.expression.is_num() && applied.expression.is_zero();
        (!reduces_to_zero).then_some((i, applied.expression))
    })
}
