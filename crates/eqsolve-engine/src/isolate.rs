//! Isolation step: turn an equation into candidate substitutions

use crate::equation::Equation;
use crate::justification::{JustificationSet, Premise, SplitAllocator};
use crate::substitution::Substitution;
use eqsolve_symbolic::{Isolate, Symbol};
use tracing::trace;

/// Branch-local search frame.
///
/// Passed by value into each branch, so leaving a branch restores the
/// caller's premises without any bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct BranchContext {
    /// Premises of every case split enclosing this branch
    pub root_premises: JustificationSet,
    pub depth: usize,
}

impl BranchContext {
    pub fn root() -> Self {
        Self::default()
    }

    /// The frame for a child branch, optionally under a new premise
    pub fn enter(&self, premise: Option<&Premise>) -> BranchContext {
        let mut root_premises = self.root_premises.clone();
        if let Some(p) = premise {
            root_premises.insert(p.clone());
        }
        BranchContext {
            root_premises,
            depth: self.depth + 1,
        }
    }
}

/// One way of eliminating a variable
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub substitution: Substitution,
    /// Set when the candidate is one root of a case split
    pub premise: Option<Premise>,
}

/// Ask `oracle` to solve `eq` for `var`.
///
/// An empty result means the oracle found no isolation; that is not a
/// contradiction. With several roots a case split is opened and each
/// candidate records which root it took. Every candidate's justification
/// covers the branch's root premises and the equation's own justification.
pub fn isolate_var<I>(
    oracle: &I,
    var: &Symbol,
    eq: &Equation,
    ctx: &BranchContext,
    splits: &mut SplitAllocator,
) -> Vec<Candidate>
where
    I: Isolate + ?Sized,
{
    let roots = oracle.roots(var, &eq.expression);
    if roots.is_empty() {
        trace!(variable = %var, equation = %eq, "no isolation");
        return Vec::new();
    }

    let base = ctx.root_premises.union(&eq.justification);
    let split = (roots.len() > 1).then(|| splits.allocate());
    let of = roots.len();

    roots
        .into_iter()
        .enumerate()
        .map(|(root, value)| {
            let premise = split.map(|split| Premise {
                split,
                variable: var.clone(),
                root,
                of,
            });
            let justification = match &premise {
                Some(p) => base.union(&JustificationSet::single(p.clone())),
                None => base.clone(),
            };
            Candidate {
                substitution: Substitution::new(var.clone(), value, justification),
                premise,
            }
        })
        .collect()
}
