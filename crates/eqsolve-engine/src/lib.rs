//! eqsolve incremental equation-reduction engine
//!
//! Eliminates variables from a system of equations one at a time: an
//! equation is solved for a variable, the result is substituted through the
//! rest of the system, and equations that collapse to a nonzero number
//! expose a contradiction. When a variable has several roots the engine
//! opens a case split and backtracks over the roots.
//!
//! # Architecture
//!
//! - [`justification`]: premises recording case-split decisions
//! - [`equation`], [`substitution`], [`solution`]: the data threaded through a solve
//! - [`reduce`]: folding one substitution into a solution
//! - [`isolate`]: asking the oracle for candidate substitutions
//! - [`driver`]: depth-first search with explicit choice points
//! - [`session`]: incremental use over a growing set of equations
//! - [`check`]: post-hoc verification of substitutions
//!
//! ```
//! use eqsolve_engine::{solve_system, Equation};
//! use eqsolve_symbolic::{SymExpr, Symbol};
//!
//! let report = solve_system(
//!     vec![Equation::between(SymExpr::var("x") + SymExpr::int(1), SymExpr::int(3))],
//!     [Symbol::new("x")],
//! );
//! assert_eq!(report.solution().unwrap().value_of("x"), Some(&SymExpr::int(2)));
//! ```

pub mod check;
pub mod config;
pub mod driver;
pub mod equation;
pub mod error;
pub mod isolate;
pub mod justification;
pub mod reduce;
pub mod session;
pub mod solution;
pub mod substitution;

pub use check::{correct_substitutions, first_incorrect};
pub use config::{ConfigLoader, SolverConfig};
pub use driver::{solve_system, Conflict, Driver, SolveOutcome, SolveReport, SolveStats};
pub use equation::{contradictions, flush_tautologies, Equation};
pub use error::{Result, SolverError};
pub use isolate::{isolate_var, BranchContext, Candidate};
pub use justification::{JustificationSet, Premise, SplitAllocator, SplitId};
pub use reduce::{use_new_substitution, Reduction};
pub use session::Session;
pub use solution::Solution;
pub use substitution::Substitution;
