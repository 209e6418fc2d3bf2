//! Incremental solve: depth-first search over isolation choices
//!
//! Each frame picks one residual equation and one residual variable that the
//! oracle can isolate, then tries the candidate roots in order. A root whose
//! reduction succeeds is explored recursively; the first branch that finishes
//! without contradiction wins. When every root of a case split fails, the
//! failure is explained by the premises the branches depended on, minus the
//! split that was just exhausted. A root that leaves the system stuck does not
//! close its split: the siblings are still tried, and the first stuck
//! solution is reported only if none of them solves.
//!
//! Selection policy:
//! - equations mentioning fewer residual variables are tried first, ties in
//!   sequence order;
//! - within an equation, residual variables are tried in name order;
//! - an equation that cannot be isolated for any of its residual variables is
//!   parked in the tough queue. The tough queue is moved back behind the
//!   residual equations after every successful reduction.

use crate::check::first_incorrect;
use crate::config::SolverConfig;
use crate::equation::{contradictions, flush_tautologies, Equation};
use crate::isolate::{isolate_var, BranchContext, Candidate};
use crate::justification::{JustificationSet, SplitAllocator};
use crate::reduce::{use_new_substitution, Reduction};
use crate::solution::Solution;
use eqsolve_symbolic::{Isolate, PolynomialIsolator, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, debug_span, trace, warn};

/// Why a search found no consistent completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Equations that reduced to a nonzero number in the last failing branch
    pub contradictions: Vec<Equation>,
    /// Premises the failure still depends on once exhausted splits are
    /// resolved away. Empty at the top level means no choice of roots helps.
    pub explanation: JustificationSet,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eqs: Vec<String> = self.contradictions.iter().map(|e| e.to_string()).collect();
        write!(f, "contradiction: {}", eqs.join("; "))?;
        if !self.explanation.is_empty() {
            write!(f, " under {}", self.explanation)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolveOutcome {
    /// No residual equations or no residual variables remain
    Solved(Solution),
    /// Equations remain but none can be isolated for a residual variable
    Stuck(Solution),
    /// Every branch ended in contradiction
    Unsatisfiable(Conflict),
    /// The step budget ran out before the search finished
    StepLimit,
}

impl SolveOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            SolveOutcome::Solved(_) => "solved",
            SolveOutcome::Stuck(_) => "stuck",
            SolveOutcome::Unsatisfiable(_) => "unsatisfiable",
            SolveOutcome::StepLimit => "step-limit",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Reduction steps attempted
    pub steps: usize,
    /// Case splits opened
    pub splits: usize,
    /// Reductions that exposed a contradiction
    pub contradictions: usize,
    /// Deepest branch reached, in eliminations
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub stats: SolveStats,
    /// Result of checking a solved system against its original equations;
    /// `None` when not solved or verification is disabled
    pub verified: Option<bool>,
}

impl SolveReport {
    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Solved(_))
    }

    /// The solution reached, solved or stuck
    pub fn solution(&self) -> Option<&Solution> {
        match &self.outcome {
            SolveOutcome::Solved(s) | SolveOutcome::Stuck(s) => Some(s),
            _ => None,
        }
    }

    pub fn conflict(&self) -> Option<&Conflict> {
        match &self.outcome {
            SolveOutcome::Unsatisfiable(c) => Some(c),
            _ => None,
        }
    }
}

enum Branch {
    /// Solved or out of steps unwinds at once; stuck unwinds once the
    /// enclosing split has no sibling left to try
    Finished(SolveOutcome),
    Failed(Conflict),
}

enum Choice {
    Isolated {
        variable: Symbol,
        equation: Equation,
        candidates: Vec<Candidate>,
        rest: Solution,
    },
    Stuck(Solution),
}

pub struct Driver {
    config: SolverConfig,
    oracle: Box<dyn Isolate>,
    splits: SplitAllocator,
    stats: SolveStats,
}

impl Driver {
    /// A driver using the polynomial isolator
    pub fn new(config: SolverConfig) -> Self {
        let oracle = PolynomialIsolator::new().with_simplify_rounds(config.max_simplify_rounds);
        Self::with_oracle(config, oracle)
    }

    pub fn with_oracle(config: SolverConfig, oracle: impl Isolate + 'static) -> Self {
        Driver {
            config,
            oracle: Box::new(oracle),
            splits: SplitAllocator::new(),
            stats: SolveStats::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve `initial`, verifying against its own pending equations
    pub fn solve(&mut self, initial: Solution) -> SolveReport {
        let originals: Vec<Equation> = initial.pending_equations().cloned().collect();
        self.solve_against(initial, &originals)
    }

    /// Solve `initial`, verifying a solved result against `originals`
    pub fn solve_against(&mut self, initial: Solution, originals: &[Equation]) -> SolveReport {
        let _span = debug_span!(
            "solve",
            equations = initial.pending_equations().count(),
            variables = initial.residual_variables.len()
        )
        .entered();

        // Split ids are unique across solves: carried-over substitutions keep
        // their premises.
        let first_split = self.splits.count();
        self.stats = SolveStats::default();

        let outcome = match self.prepare(initial) {
            Ok(prepared) => match self.search(prepared, BranchContext::root()) {
                Branch::Finished(outcome) => outcome,
                Branch::Failed(conflict) => SolveOutcome::Unsatisfiable(conflict),
            },
            Err(conflict) => SolveOutcome::Unsatisfiable(conflict),
        };
        self.stats.splits = (self.splits.count() - first_split) as usize;

        let verified = match &outcome {
            SolveOutcome::Solved(solution) if self.config.verify_solutions => {
                Some(self.verify(solution, originals))
            }
            _ => None,
        };

        debug!(
            outcome = outcome.name(),
            steps = self.stats.steps,
            splits = self.stats.splits,
            contradictions = self.stats.contradictions,
            "solve finished"
        );

        SolveReport {
            outcome,
            stats: self.stats,
            verified,
        }
    }

    /// Simplify the incoming equations, drop tautologies and reject
    /// equations that are already contradictory
    fn prepare(&self, initial: Solution) -> Result<Solution, Conflict> {
        let rounds = self.config.max_simplify_rounds;
        let Solution {
            residual_equations,
            residual_variables,
            substitutions,
            tough_equations,
        } = initial;

        let simplify = |eqs: Vec<Equation>| -> Vec<Equation> {
            flush_tautologies(eqs.iter().map(|eq| eq.simplified(rounds)).collect())
        };
        let residual_equations = simplify(residual_equations);
        let tough_equations = simplify(tough_equations);

        let mut conflicts = contradictions(&residual_equations);
        conflicts.extend(contradictions(&tough_equations));
        if !conflicts.is_empty() {
            let explanation = explain(&conflicts);
            return Err(Conflict {
                contradictions: conflicts,
                explanation,
            });
        }

        Ok(Solution {
            residual_equations,
            residual_variables,
            substitutions,
            tough_equations,
        })
    }

    fn search(&mut self, solution: Solution, ctx: BranchContext) -> Branch {
        self.stats.max_depth = self.stats.max_depth.max(ctx.depth);

        let solution = solution.requeue_tough();
        if solution.is_complete() || solution.residual_variables.is_empty() {
            return Branch::Finished(SolveOutcome::Solved(solution));
        }

        let (variable, equation, candidates, rest) = match self.choose(solution, &ctx) {
            Choice::Isolated {
                variable,
                equation,
                candidates,
                rest,
            } => (variable, equation, candidates, rest),
            Choice::Stuck(solution) => {
                debug!(
                    depth = ctx.depth,
                    tough = solution.tough_equations.len(),
                    "no equation can be isolated"
                );
                return Branch::Finished(SolveOutcome::Stuck(solution));
            }
        };

        let split = candidates
            .first()
            .and_then(|c| c.premise.as_ref())
            .map(|p| p.split);
        if let Some(split) = split {
            debug!(
                split = split.0,
                variable = %variable,
                equation = %equation,
                roots = candidates.len(),
                "opening case split"
            );
        }

        let rounds = self.config.max_simplify_rounds;
        let mut explanation = JustificationSet::empty();
        let mut last_contradictions = Vec::new();
        let mut stuck = None;

        for candidate in candidates {
            if let Some(max) = self.config.max_steps {
                if self.stats.steps >= max {
                    debug!(steps = self.stats.steps, "step limit reached");
                    return Branch::Finished(SolveOutcome::StepLimit);
                }
            }
            self.stats.steps += 1;

            let child = ctx.enter(candidate.premise.as_ref());
            trace!(depth = child.depth, substitution = %candidate.substitution, "trying");

            let failure = match use_new_substitution(candidate.substitution, rest.clone(), rounds)
            {
                Reduction::Reduced(next) => match self.search(next, child) {
                    Branch::Failed(conflict) => conflict,
                    Branch::Finished(SolveOutcome::Stuck(solution)) if split.is_some() => {
                        trace!(
                            tough = solution.tough_equations.len(),
                            "root left the system stuck"
                        );
                        stuck.get_or_insert(solution);
                        continue;
                    }
                    finished => return finished,
                },
                Reduction::Contradiction(equations) => {
                    self.stats.contradictions += 1;
                    Conflict {
                        explanation: explain(&equations),
                        contradictions: equations,
                    }
                }
            };

            let Some(split) = split else {
                return Branch::Failed(failure);
            };
            trace!(split = split.0, explanation = %failure.explanation, "root failed");
            explanation = explanation.union(&failure.explanation.without(split));
            last_contradictions = failure.contradictions;
        }

        if let Some(solution) = stuck {
            return Branch::Finished(SolveOutcome::Stuck(solution));
        }
        Branch::Failed(Conflict {
            contradictions: last_contradictions,
            explanation,
        })
    }

    /// Pick the first isolatable (equation, variable) pair, parking the
    /// equations passed over in the tough queue
    fn choose(&mut self, solution: Solution, ctx: &BranchContext) -> Choice {
        let Solution {
            residual_equations,
            residual_variables,
            substitutions,
            mut tough_equations,
        } = solution;

        let mut order: Vec<(usize, Vec<Symbol>)> = residual_equations
            .iter()
            .map(|eq| eq.residual_vars(&residual_variables))
            .enumerate()
            .collect();
        order.sort_by_key(|(_, vars)| vars.len());

        let mut picked = None;
        let mut parked = Vec::new();
        'equations: for (idx, vars) in order {
            for var in vars {
                let candidates = isolate_var(
                    self.oracle.as_ref(),
                    &var,
                    &residual_equations[idx],
                    ctx,
                    &mut self.splits,
                );
                if !candidates.is_empty() {
                    picked = Some((idx, var, candidates));
                    break 'equations;
                }
            }
            parked.push(idx);
        }
        parked.sort_unstable();

        let mut slots: Vec<Option<Equation>> = residual_equations.into_iter().map(Some).collect();
        for idx in parked {
            if let Some(eq) = slots[idx].take() {
                trace!(equation = %eq, "parking tough equation");
                tough_equations.push(eq);
            }
        }

        match picked {
            Some((idx, variable, candidates)) => {
                let equation = slots[idx].take();
                let rest = Solution {
                    residual_equations: slots.into_iter().flatten().collect(),
                    residual_variables,
                    substitutions,
                    tough_equations,
                };
                match equation {
                    Some(equation) => Choice::Isolated {
                        variable,
                        equation,
                        candidates,
                        rest,
                    },
                    None => Choice::Stuck(rest),
                }
            }
            None => Choice::Stuck(Solution {
                residual_equations: slots.into_iter().flatten().collect(),
                residual_variables,
                substitutions,
                tough_equations,
            }),
        }
    }

    /// Check the substitutions against every original equation whose
    /// rewritten form mentions no symbol; parametric equations cannot
    /// reduce to a number and are skipped
    fn verify(&self, solution: &Solution, originals: &[Equation]) -> bool {
        let rounds = self.config.max_simplify_rounds;
        let closed: Vec<Equation> = originals
            .iter()
            .filter(|eq| {
                eq.apply_substitutions(&solution.substitutions, rounds)
                    .expression
                    .is_closed()
            })
            .cloned()
            .collect();

        match first_incorrect(&closed, &solution.substitutions) {
            None => true,
            Some((idx, residue)) => {
                warn!(
                    equation = %closed[idx],
                    residue = %residue,
                    "solution does not satisfy an original equation"
                );
                false
            }
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

fn explain(equations: &[Equation]) -> JustificationSet {
    equations
        .iter()
        .fold(JustificationSet::empty(), |acc, eq| acc.union(&eq.justification))
}

/// Solve `equations` over `variables` with the default configuration
pub fn solve_system(
    equations: Vec<Equation>,
    variables: impl IntoIterator<Item = Symbol>,
) -> SolveReport {
    Driver::default().solve(Solution::new(equations, variables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqsolve_symbolic::SymExpr;

    fn var(name: &str) -> SymExpr {
        SymExpr::var(name)
    }

    fn sym(name: &str) -> Symbol {
        Symbol::new(name)
    }

    #[test]
    fn linear_system_solves() {
        // x + y = 3, x - y = 1
        let report = solve_system(
            vec![
                Equation::between(var("x") + var("y"), SymExpr::int(3)),
                Equation::between(var("x") - var("y"), SymExpr::int(1)),
            ],
            [sym("x"), sym("y")],
        );

        let solution = report.solution().unwrap();
        assert!(report.is_solved());
        assert_eq!(solution.value_of("x"), Some(&SymExpr::int(2)));
        assert_eq!(solution.value_of("y"), Some(&SymExpr::int(1)));
        assert_eq!(report.verified, Some(true));
        assert_eq!(report.stats.splits, 0);
    }

    #[test]
    fn prepare_rejects_constant_contradiction() {
        let report = solve_system(
            vec![Equation::between(SymExpr::int(1), SymExpr::int(2))],
            [sym("x")],
        );
        let conflict = report.conflict().unwrap();
        assert_eq!(conflict.contradictions.len(), 1);
        assert!(conflict.explanation.is_empty());
        assert_eq!(report.stats.steps, 0);
    }

    #[test]
    fn fewest_residual_variables_first() {
        // x + y = 5 is listed first but y - 2 = 0 mentions one variable
        let report = solve_system(
            vec![
                Equation::between(var("x") + var("y"), SymExpr::int(5)),
                Equation::between(var("y"), SymExpr::int(2)),
            ],
            [sym("x"), sym("y")],
        );
        let solution = report.solution().unwrap();
        assert_eq!(solution.substitutions.last().unwrap().variable, sym("y"));
        assert_eq!(solution.value_of("x"), Some(&SymExpr::int(3)));
    }

    #[test]
    fn second_root_is_tried_after_a_contradiction() {
        // x^2 = 4 offers x = 2 first, which x + 2 = 0 rejects
        let report = solve_system(
            vec![
                Equation::between(
                    SymExpr::pow(var("x"), SymExpr::int(2)),
                    SymExpr::int(4),
                ),
                Equation::between(var("x") * var("y") + SymExpr::int(2), SymExpr::int(0)),
                Equation::between(var("y"), SymExpr::int(1)),
            ],
            [sym("x"), sym("y")],
        );

        let solution = report.solution().unwrap();
        assert_eq!(solution.value_of("x"), Some(&SymExpr::int(-2)));
        assert_eq!(report.stats.splits, 1);
        assert!(report.stats.contradictions >= 1);
    }

    #[test]
    fn unisolatable_equations_leave_the_system_stuck() {
        let report = solve_system(
            vec![Equation::new(SymExpr::func("sin", vec![var("x")]))],
            [sym("x")],
        );
        match report.outcome {
            SolveOutcome::Stuck(solution) => {
                assert!(solution.residual_equations.is_empty());
                assert_eq!(solution.tough_equations.len(), 1);
                assert!(solution.residual_variables.contains(&sym("x")));
            }
            other => panic!("expected stuck, got {:?}", other),
        }
    }

    #[test]
    fn step_budget_is_enforced() {
        let mut driver = Driver::new(SolverConfig::bounded(1));
        let report = driver.solve(Solution::new(
            vec![
                Equation::between(var("x"), SymExpr::int(1)),
                Equation::between(var("y"), SymExpr::int(2)),
            ],
            [sym("x"), sym("y")],
        ));
        assert_eq!(report.outcome, SolveOutcome::StepLimit);
        assert_eq!(report.stats.steps, 1);
        assert_eq!(report.verified, None);
    }
}
