//! Expression trees
//!
//! `SymExpr` is an immutable handle around a shared `SymExprKind` node, so
//! cloning an expression is a reference-count bump. Constructors perform
//! only trivial structural clean-up (empty and singleton sums/products);
//! real simplification happens in the [`StagedNormalizer`].

use crate::coeff::Coefficient;
use crate::normalize::StagedNormalizer;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops;
use std::sync::Arc;

/// Default bound on normalizer rounds used by [`SymExpr::simplify`]
pub const DEFAULT_SIMPLIFY_ROUNDS: usize = 8;

/// The node types of an expression tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymExprKind {
    /// Numeric constant
    Num(Coefficient),
    /// Variable reference
    Var(Symbol),
    /// Sum of terms
    Add(Vec<SymExpr>),
    /// Product of factors
    Mul(Vec<SymExpr>),
    /// base ^ exponent
    Pow(Box<SymExpr>, Box<SymExpr>),
    /// Negation
    Neg(Box<SymExpr>),
    /// Uninterpreted function application
    Func(String, Vec<SymExpr>),
}

/// A symbolic expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymExpr {
    pub kind: Arc<SymExprKind>,
}

impl SymExpr {
    fn from_kind(kind: SymExprKind) -> Self {
        SymExpr {
            kind: Arc::new(kind),
        }
    }

    pub fn num(c: Coefficient) -> Self {
        Self::from_kind(SymExprKind::Num(c))
    }

    pub fn int(n: i64) -> Self {
        Self::num(Coefficient::int(n))
    }

    pub fn rational(num: i64, den: i64) -> Self {
        Self::num(Coefficient::rational(num, den))
    }

    /// Float constant; integral values are stored exactly
    pub fn float(f: f64) -> Self {
        Self::num(Coefficient::from_f64_exact(f))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::symbol(Symbol::new(name))
    }

    pub fn symbol(symbol: Symbol) -> Self {
        Self::from_kind(SymExprKind::Var(symbol))
    }

    /// Sum of terms. An empty sum is `0`, a singleton is its only term.
    pub fn add(mut terms: Vec<SymExpr>) -> Self {
        match terms.len() {
            0 => Self::int(0),
            1 => terms.pop().unwrap_or_else(|| Self::int(0)),
            _ => Self::from_kind(SymExprKind::Add(terms)),
        }
    }

    /// Product of factors. An empty product is `1`, a singleton is its only factor.
    pub fn mul(mut factors: Vec<SymExpr>) -> Self {
        match factors.len() {
            0 => Self::int(1),
            1 => factors.pop().unwrap_or_else(|| Self::int(1)),
            _ => Self::from_kind(SymExprKind::Mul(factors)),
        }
    }

    pub fn pow(base: SymExpr, exp: SymExpr) -> Self {
        Self::from_kind(SymExprKind::Pow(Box::new(base), Box::new(exp)))
    }

    pub fn neg(inner: SymExpr) -> Self {
        Self::from_kind(SymExprKind::Neg(Box::new(inner)))
    }

    pub fn func(name: impl Into<String>, args: Vec<SymExpr>) -> Self {
        Self::from_kind(SymExprKind::Func(name.into(), args))
    }

    /// Principal square root, represented as `e^(1/2)`
    pub fn sqrt(inner: SymExpr) -> Self {
        Self::pow(inner, Self::rational(1, 2))
    }

    /// `a - b`
    pub fn sub(a: SymExpr, b: SymExpr) -> Self {
        Self::add(vec![a, Self::neg(b)])
    }

    /// `a / b`, as `a * b^-1`
    pub fn div(a: SymExpr, b: SymExpr) -> Self {
        Self::mul(vec![a, Self::pow(b, Self::int(-1))])
    }

    pub fn as_coeff(&self) -> Option<&Coefficient> {
        match self.kind.as_ref() {
            SymExprKind::Num(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&Symbol> {
        match self.kind.as_ref() {
            SymExprKind::Var(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_add(&self) -> Option<&[SymExpr]> {
        match self.kind.as_ref() {
            SymExprKind::Add(terms) => Some(terms),
            _ => None,
        }
    }

    pub fn as_mul(&self) -> Option<&[SymExpr]> {
        match self.kind.as_ref() {
            SymExprKind::Mul(factors) => Some(factors),
            _ => None,
        }
    }

    /// True for a literal number
    pub fn is_num(&self) -> bool {
        self.as_coeff().is_some()
    }

    pub fn is_var(&self) -> bool {
        self.as_var().is_some()
    }

    pub fn is_add(&self) -> bool {
        self.as_add().is_some()
    }

    pub fn is_mul(&self) -> bool {
        self.as_mul().is_some()
    }

    /// True only for the literal number zero
    pub fn is_zero(&self) -> bool {
        self.as_coeff().map(Coefficient::is_zero).unwrap_or(false)
    }

    pub fn is_one(&self) -> bool {
        self.as_coeff().map(Coefficient::is_one).unwrap_or(false)
    }

    /// All variables occurring in the expression, ordered by name
    pub fn free_vars(&self) -> BTreeSet<Symbol> {
        let mut vars = BTreeSet::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars(&self, out: &mut BTreeSet<Symbol>) {
        match self.kind.as_ref() {
            SymExprKind::Num(_) => {}
            SymExprKind::Var(s) => {
                out.insert(s.clone());
            }
            SymExprKind::Add(items) | SymExprKind::Mul(items) | SymExprKind::Func(_, items) => {
                for item in items {
                    item.collect_vars(out);
                }
            }
            SymExprKind::Pow(base, exp) => {
                base.collect_vars(out);
                exp.collect_vars(out);
            }
            SymExprKind::Neg(inner) => inner.collect_vars(out),
        }
    }

    /// Whether the variable `name` occurs anywhere in the expression
    pub fn contains_var(&self, name: &str) -> bool {
        match self.kind.as_ref() {
            SymExprKind::Num(_) => false,
            SymExprKind::Var(s) => s.name == name,
            SymExprKind::Add(items) | SymExprKind::Mul(items) | SymExprKind::Func(_, items) => {
                items.iter().any(|item| item.contains_var(name))
            }
            SymExprKind::Pow(base, exp) => base.contains_var(name) || exp.contains_var(name),
            SymExprKind::Neg(inner) => inner.contains_var(name),
        }
    }

    /// True when no variable occurs in the expression
    pub fn is_closed(&self) -> bool {
        self.free_vars().is_empty()
    }

    /// Replace every occurrence of `name` with `replacement`.
    ///
    /// Purely structural; the result is not simplified. Subtrees that do not
    /// mention `name` are shared with the input.
    pub fn substitute(&self, name: &str, replacement: &SymExpr) -> SymExpr {
        if !self.contains_var(name) {
            return self.clone();
        }
        match self.kind.as_ref() {
            SymExprKind::Num(_) => self.clone(),
            SymExprKind::Var(_) => replacement.clone(),
            SymExprKind::Add(terms) => SymExpr::add(
                terms
                    .iter()
                    .map(|t| t.substitute(name, replacement))
                    .collect(),
            ),
            SymExprKind::Mul(factors) => SymExpr::mul(
                factors
                    .iter()
                    .map(|f| f.substitute(name, replacement))
                    .collect(),
            ),
            SymExprKind::Pow(base, exp) => SymExpr::pow(
                base.substitute(name, replacement),
                exp.substitute(name, replacement),
            ),
            SymExprKind::Neg(inner) => SymExpr::neg(inner.substitute(name, replacement)),
            SymExprKind::Func(fname, args) => SymExpr::func(
                fname.clone(),
                args.iter()
                    .map(|a| a.substitute(name, replacement))
                    .collect(),
            ),
        }
    }

    /// Canonical form, normalizing until a fixpoint is reached
    pub fn simplify(&self) -> SymExpr {
        self.simplify_with_rounds(DEFAULT_SIMPLIFY_ROUNDS)
    }

    pub fn simplify_with_rounds(&self, max_rounds: usize) -> SymExpr {
        StagedNormalizer::canonical().normalize_to_fixpoint(self.clone(), max_rounds)
    }

    /// Positive counterpart of a term that prints with a leading minus
    fn negated_term(&self) -> Option<SymExpr> {
        match self.kind.as_ref() {
            SymExprKind::Num(c) if c.is_negative() => Some(SymExpr::num(c.abs())),
            SymExprKind::Neg(inner) => Some(inner.as_ref().clone()),
            SymExprKind::Mul(factors) => {
                let lead = factors.first()?.as_coeff()?;
                if !lead.is_negative() {
                    return None;
                }
                let mut rest: Vec<_> = factors[1..].to_vec();
                if !lead.is_neg_one() {
                    rest.insert(0, SymExpr::num(lead.abs()));
                }
                Some(SymExpr::mul(rest))
            }
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self.kind.as_ref() {
            SymExprKind::Add(_) => 1,
            SymExprKind::Num(c) if c.is_negative() => 1,
            SymExprKind::Num(c) if !c.is_integer() => 2,
            SymExprKind::Mul(_) | SymExprKind::Neg(_) => 2,
            SymExprKind::Pow(_, _) => 3,
            SymExprKind::Num(_) | SymExprKind::Var(_) | SymExprKind::Func(_, _) => 4,
        }
    }
}

struct Wrapped<'a>(&'a SymExpr, u8);

impl fmt::Display for Wrapped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.precedence() < self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            SymExprKind::Num(c) => write!(f, "{}", c),
            SymExprKind::Var(s) => write!(f, "{}", s),
            SymExprKind::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{}", term)?;
                    } else if let Some(positive) = term.negated_term() {
                        write!(f, " - {}", Wrapped(&positive, 2))?;
                    } else {
                        write!(f, " + {}", term)?;
                    }
                }
                Ok(())
            }
            SymExprKind::Mul(factors) => {
                let mut rest = factors.as_slice();
                if let Some(first) = factors.first() {
                    if let Some(c) = first.as_coeff() {
                        if c.is_neg_one() && factors.len() > 1 {
                            f.write_str("-")?;
                        } else {
                            write!(f, "{}*", c)?;
                        }
                        rest = &factors[1..];
                    }
                }
                for (i, factor) in rest.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write!(f, "{}", Wrapped(factor, 3))?;
                }
                Ok(())
            }
            SymExprKind::Pow(base, exp) => {
                write!(f, "{}^{}", Wrapped(base, 4), Wrapped(exp, 4))
            }
            SymExprKind::Neg(inner) => write!(f, "-{}", Wrapped(inner, 3)),
            SymExprKind::Func(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<i64> for SymExpr {
    fn from(n: i64) -> Self {
        SymExpr::int(n)
    }
}

impl From<Coefficient> for SymExpr {
    fn from(c: Coefficient) -> Self {
        SymExpr::num(c)
    }
}

impl ops::Add for SymExpr {
    type Output = SymExpr;

    fn add(self, rhs: Self) -> Self::Output {
        SymExpr::add(vec![self, rhs])
    }
}

impl ops::Sub for SymExpr {
    type Output = SymExpr;

    fn sub(self, rhs: Self) -> Self::Output {
        SymExpr::sub(self, rhs)
    }
}

impl ops::Mul for SymExpr {
    type Output = SymExpr;

    fn mul(self, rhs: Self) -> Self::Output {
        SymExpr::mul(vec![self, rhs])
    }
}

impl ops::Neg for SymExpr {
    type Output = SymExpr;

    fn neg(self) -> Self::Output {
        SymExpr::neg(self)
    }
}
