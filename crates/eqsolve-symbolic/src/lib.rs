//! eqsolve symbolic expression engine
//!
//! This crate provides the expression algebra the equation-reduction engine
//! treats as its collaborator: building expressions, substituting variables,
//! simplifying to a canonical form and isolating a variable.
//!
//! # Architecture
//!
//! The symbolic engine uses a tree-based expression representation with:
//! - Compact coefficient representation (rational + float fallback)
//! - Symbol table for variable interning
//! - Staged normalization to a canonical form
//! - Polynomial isolation oracle for degree one and two
//!
//! # Design Principles
//!
//! 1. **Exact where possible**: rationals and perfect-square roots stay exact,
//!    irrational roots stay symbolic
//! 2. **Canonical forms**: normalization makes "reduces to the number 0" a
//!    structural test
//! 3. **Pluggable isolation**: solvers depend on the [`Isolate`] trait, not on
//!    a particular method

mod coeff;
mod expr;
mod isolate;
mod normalize;
mod symbol;

pub use coeff::Coefficient;
pub use expr::{SymExpr, SymExprKind, DEFAULT_SIMPLIFY_ROUNDS};
pub use isolate::{polynomial_degree, Isolate, PolynomialIsolator};
pub use normalize::{NormPass, StagedNormalizer};
pub use symbol::{Symbol, SymbolAttrs, SymbolId, SymbolTable};

/// Error type for symbolic operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SymbolicError {
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, SymbolicError>;
