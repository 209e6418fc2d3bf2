//! A growing system of equations solved incrementally

use crate::config::SolverConfig;
use crate::driver::{Conflict, Driver, SolveOutcome, SolveReport};
use crate::equation::Equation;
use crate::error::{Result, SolverError};
use crate::solution::Solution;
use crate::substitution::Substitution;
use eqsolve_symbolic::{SymExpr, Symbol, SymbolAttrs, SymbolTable};
use tracing::{debug, info};

/// Owns the current [`Solution`] and folds new equations into it.
///
/// Equations are lowered through the substitutions found so far as they are
/// asserted. A contradiction that depends on an earlier case-split choice
/// reopens the system from the original equations; one that depends on no
/// choice is reported as an error.
pub struct Session {
    driver: Driver,
    symbols: SymbolTable,
    originals: Vec<Equation>,
    solution: Solution,
    conflict: Option<Conflict>,
}

impl Session {
    pub fn new() -> Self {
        Self::build(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SolverConfig) -> Self {
        Session {
            driver: Driver::new(config),
            symbols: SymbolTable::new(),
            originals: Vec::new(),
            solution: Solution::default(),
            conflict: None,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        self.driver.config()
    }

    /// Add `name` to the variables to eliminate
    pub fn declare(&mut self, name: &str) -> Result<Symbol> {
        self.declare_with_attrs(name, SymbolAttrs::default())
    }

    pub fn declare_with_attrs(&mut self, name: &str, attrs: SymbolAttrs) -> Result<Symbol> {
        if self.solution.is_eliminated(name) {
            return Err(SolverError::AlreadyEliminated(name.to_string()));
        }
        let id = self.symbols.intern_with_attrs(name, attrs)?;
        let symbol = self.symbols.resolve(name)?.clone();
        debug!(variable = %symbol, id = id.0, "declared");
        self.solution.residual_variables.insert(symbol.clone());
        Ok(symbol)
    }

    /// Assert `lhs == rhs`
    pub fn assert_between(&mut self, lhs: SymExpr, rhs: SymExpr) -> Result<()> {
        self.assert_equation(Equation::between(lhs, rhs))
    }

    /// Queue `equation`, rewritten through the current substitutions
    pub fn assert_equation(&mut self, equation: Equation) -> Result<()> {
        if self.conflict.is_some() {
            return Err(SolverError::Unsatisfiable);
        }

        let rounds = self.config().max_simplify_rounds;
        let lowered = equation.apply_substitutions(&self.solution.substitutions, rounds);

        if lowered.is_contradiction() {
            if lowered.justification.is_empty() {
                return Err(SolverError::Contradiction(lowered));
            }
            debug!(
                equation = %lowered,
                "assertion conflicts with a case-split choice; reopening"
            );
            self.originals.push(equation);
            self.reopen();
            return Ok(());
        }

        self.originals.push(equation);
        if !lowered.is_tautology() {
            self.solution.residual_equations.push(lowered);
        }
        Ok(())
    }

    /// Run the driver on the queued equations.
    ///
    /// Solved and stuck solutions become the new state. An unsatisfiable
    /// result that depends on earlier case-split choices is retried once
    /// from the original equations before the session is marked
    /// unsatisfiable.
    pub fn solve(&mut self) -> Result<SolveReport> {
        if self.conflict.is_some() {
            return Err(SolverError::Unsatisfiable);
        }

        let mut report = self.run();
        if let SolveOutcome::Unsatisfiable(conflict) = &report.outcome {
            if !conflict.explanation.is_empty() {
                debug!(explanation = %conflict.explanation, "retrying from original equations");
                self.reopen();
                report = self.run();
            }
        }

        match &report.outcome {
            SolveOutcome::Solved(solution) | SolveOutcome::Stuck(solution) => {
                self.solution = solution.clone();
            }
            SolveOutcome::Unsatisfiable(conflict) => {
                info!(conflict = %conflict, "system is unsatisfiable");
                self.conflict = Some(conflict.clone());
            }
            SolveOutcome::StepLimit => {}
        }
        Ok(report)
    }

    fn run(&mut self) -> SolveReport {
        self.driver
            .solve_against(self.solution.clone(), &self.originals)
    }

    /// Forget every substitution and queue all original equations again
    fn reopen(&mut self) {
        let variables = self.symbols.iter().map(|(_, s)| s.clone());
        self.solution = Solution::new(self.originals.clone(), variables);
    }

    /// Substitutions found so far, most recent first
    pub fn substitutions(&self) -> &[Substitution] {
        &self.solution.substitutions
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn original_equations(&self) -> &[Equation] {
        &self.originals
    }

    pub fn value_of(&self, name: &str) -> Option<&SymExpr> {
        self.solution.value_of(name)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.conflict.is_some()
    }

    pub fn conflict(&self) -> Option<&Conflict> {
        self.conflict.as_ref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
