use crate::equation::Equation;
use eqsolve_symbolic::SymbolicError;
use thiserror::Error;

/// Errors from misusing the engine.
///
/// A search that finds no solution is not an error; see
/// [`SolveOutcome`](crate::SolveOutcome).
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("variable '{0}' has already been eliminated")]
    AlreadyEliminated(String),

    #[error("equation contradicts the current solution: {0}")]
    Contradiction(Equation),

    #[error("the system is unsatisfiable; no further equations can be asserted")]
    Unsatisfiable,

    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
}

pub type Result<T> = std::result::Result<T, SolverError>;
