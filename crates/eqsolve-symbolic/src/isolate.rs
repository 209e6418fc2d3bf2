//! Single-variable isolation
//!
//! Given `expr == 0` and a variable, produce the values the variable can
//! take. Zero roots means the expression cannot be solved for the variable
//! with the methods available here; it says nothing about satisfiability.

use crate::coeff::Coefficient;
use crate::expr::{SymExpr, SymExprKind, DEFAULT_SIMPLIFY_ROUNDS};
use crate::symbol::Symbol;

/// Highest degree the polynomial isolator solves
const MAX_DEGREE: u32 = 2;

/// Isolation oracle: solves `expr == 0` for `var`.
///
/// Roots are returned in a stable order; callers treat the first root as the
/// preferred branch.
pub trait Isolate {
    fn roots(&self, var: &Symbol, expr: &SymExpr) -> Vec<SymExpr>;
}

/// Isolates variables occurring polynomially with degree one or two and a
/// numeric leading coefficient
#[derive(Debug, Clone)]
pub struct PolynomialIsolator {
    simplify_rounds: usize,
}

impl PolynomialIsolator {
    pub fn new() -> Self {
        PolynomialIsolator {
            simplify_rounds: DEFAULT_SIMPLIFY_ROUNDS,
        }
    }

    pub fn with_simplify_rounds(mut self, rounds: usize) -> Self {
        self.simplify_rounds = rounds;
        self
    }

    fn simplify(&self, expr: SymExpr) -> SymExpr {
        expr.simplify_with_rounds(self.simplify_rounds)
    }

    /// Coefficients of `expr` as a polynomial in `var` of degree at most two,
    /// lowest power first, trimmed so the last entry is the nonzero leading
    /// coefficient.
    ///
    /// Returns `None` when `var` occurs non-polynomially or with a higher
    /// degree. The degree is checked before any coefficient is built; the
    /// coefficients themselves never mention `var`.
    pub fn coefficients(&self, expr: &SymExpr, var: &Symbol) -> Option<Vec<SymExpr>> {
        let degree = polynomial_degree(expr, var).filter(|d| *d <= MAX_DEGREE)?;
        let mut buckets: Vec<Vec<SymExpr>> = vec![Vec::new(); degree as usize + 1];

        let terms: Vec<SymExpr> = match expr.as_add() {
            Some(terms) => terms.to_vec(),
            None => vec![expr.clone()],
        };
        for term in &terms {
            let (power, coeff) = extract_term_var_power(term, var);
            if coeff.contains_var(&var.name) {
                return None;
            }
            buckets.get_mut(power as usize)?.push(coeff);
        }

        let mut coeffs: Vec<SymExpr> = buckets
            .into_iter()
            .map(|b| self.simplify(SymExpr::add(b)))
            .collect();
        while coeffs.len() > 1 && coeffs.last().map(SymExpr::is_zero).unwrap_or(false) {
            coeffs.pop();
        }
        Some(coeffs)
    }

    fn solve_linear(&self, a: &Coefficient, b: &SymExpr) -> SymExpr {
        // a*x + b = 0  =>  x = -b/a
        let inv_a = Coefficient::int(1) / a.clone();
        self.simplify(SymExpr::mul(vec![
            SymExpr::num(-inv_a),
            b.clone(),
        ]))
    }

    fn solve_quadratic(&self, a: &Coefficient, b: &SymExpr, c: &SymExpr) -> Vec<SymExpr> {
        let b_squared = SymExpr::pow(b.clone(), SymExpr::int(2));
        let four_ac = SymExpr::mul(vec![SymExpr::num(Coefficient::int(4) * a.clone()), c.clone()]);
        let discriminant = self.simplify(SymExpr::sub(b_squared, four_ac));

        let neg_b = SymExpr::neg(b.clone());
        let inv_two_a = SymExpr::num(Coefficient::int(1) / (Coefficient::int(2) * a.clone()));

        if let Some(d) = discriminant.as_coeff() {
            if d.is_negative() {
                return vec![];
            }
            if d.is_zero() {
                return vec![self.simplify(SymExpr::mul(vec![inv_two_a, neg_b]))];
            }
        }

        let sqrt_disc = SymExpr::sqrt(discriminant);
        let plus = SymExpr::mul(vec![
            inv_two_a.clone(),
            SymExpr::add(vec![neg_b.clone(), sqrt_disc.clone()]),
        ]);
        let minus = SymExpr::mul(vec![
            inv_two_a,
            SymExpr::add(vec![neg_b, SymExpr::neg(sqrt_disc)]),
        ]);

        vec![self.simplify(plus), self.simplify(minus)]
    }
}

impl Default for PolynomialIsolator {
    fn default() -> Self {
        Self::new()
    }
}

impl Isolate for PolynomialIsolator {
    fn roots(&self, var: &Symbol, expr: &SymExpr) -> Vec<SymExpr> {
        let expanded = self.simplify(expr.clone());
        let coeffs = match self.coefficients(&expanded, var) {
            Some(coeffs) => coeffs,
            None => return vec![],
        };

        let leading = coeffs.last().and_then(|c| c.as_coeff().cloned());
        match (coeffs.len(), leading) {
            (2, Some(a)) if !a.is_zero() => vec![self.solve_linear(&a, &coeffs[0])],
            (3, Some(a)) if !a.is_zero() => self.solve_quadratic(&a, &coeffs[1], &coeffs[0]),
            _ => vec![],
        }
    }
}

/// Degree of `expr` in `var`, or `None` when `var` occurs non-polynomially
/// or the degree does not fit in a `u32`
pub fn polynomial_degree(expr: &SymExpr, var: &Symbol) -> Option<u32> {
    match expr.kind.as_ref() {
        SymExprKind::Num(_) => Some(0),
        SymExprKind::Var(s) => Some(u32::from(s == var)),
        SymExprKind::Pow(base, exp) => {
            if base.as_var() == Some(var) {
                exp.as_coeff()
                    .and_then(|c| c.as_integer())
                    .and_then(|n| u32::try_from(n).ok())
            } else if expr.contains_var(&var.name) {
                None
            } else {
                Some(0)
            }
        }
        SymExprKind::Add(terms) => {
            let mut max_degree = 0u32;
            for t in terms {
                let d = polynomial_degree(t, var)?;
                max_degree = max_degree.max(d);
            }
            Some(max_degree)
        }
        SymExprKind::Mul(factors) => {
            let mut total_degree = 0u32;
            for f in factors {
                total_degree = total_degree.checked_add(polynomial_degree(f, var)?)?;
            }
            Some(total_degree)
        }
        SymExprKind::Neg(inner) => polynomial_degree(inner, var),
        SymExprKind::Func(_, _) => {
            if expr.contains_var(&var.name) {
                None
            } else {
                Some(0)
            }
        }
    }
}

fn extract_term_var_power(term: &SymExpr, var: &Symbol) -> (u32, SymExpr) {
    match term.kind.as_ref() {
        SymExprKind::Var(s) if s == var => (1, SymExpr::int(1)),
        SymExprKind::Pow(base, exp) if base.as_var() == Some(var) => {
            match exp.as_coeff().and_then(|c| c.as_integer()) {
                Some(n) if n >= 0 => (u32::try_from(n).unwrap_or(u32::MAX), SymExpr::int(1)),
                _ => (0, term.clone()),
            }
        }
        SymExprKind::Mul(factors) => {
            let mut power = 0u32;
            let mut coeff_factors = Vec::new();

            for f in factors {
                let (p, c) = extract_term_var_power(f, var);
                power = power.saturating_add(p);
                coeff_factors.push(c);
            }

            (power, SymExpr::mul(coeff_factors))
        }
        SymExprKind::Neg(inner) => {
            let (power, coeff) = extract_term_var_power(inner, var);
            (power, SymExpr::neg(coeff))
        }
        _ => (0, term.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Symbol {
        Symbol::new("x")
    }

    #[test]
    fn test_linear_root() {
        // 2*x + 4 = 0  =>  x = -2
        let expr = SymExpr::add(vec![
            SymExpr::mul(vec![SymExpr::int(2), SymExpr::var("x")]),
            SymExpr::int(4),
        ]);
        let roots = PolynomialIsolator::new().roots(&x(), &expr);
        assert_eq!(roots, vec![SymExpr::int(-2)]);
    }

    #[test]
    fn test_linear_root_with_parameter() {
        // x - y - 1 = 0  =>  x = y + 1
        let expr = SymExpr::add(vec![
            SymExpr::var("x"),
            SymExpr::neg(SymExpr::var("y")),
            SymExpr::int(-1),
        ]);
        let roots = PolynomialIsolator::new().roots(&x(), &expr);
        assert_eq!(roots.len(), 1);
        let check = SymExpr::sub(roots[0].clone(), SymExpr::var("y") + SymExpr::int(1));
        assert!(check.simplify().is_zero());
    }

    #[test]
    fn test_quadratic_two_roots() {
        // x^2 - 4 = 0  =>  x = 2, x = -2
        let expr = SymExpr::sub(
            SymExpr::pow(SymExpr::var("x"), SymExpr::int(2)),
            SymExpr::int(4),
        );
        let roots = PolynomialIsolator::new().roots(&x(), &expr);
        assert_eq!(roots, vec![SymExpr::int(2), SymExpr::int(-2)]);
    }

    #[test]
    fn test_quadratic_irrational_roots_substitute_back() {
        // x^2 - 2 = 0
        let expr = SymExpr::sub(
            SymExpr::pow(SymExpr::var("x"), SymExpr::int(2)),
            SymExpr::int(2),
        );
        let roots = PolynomialIsolator::new().roots(&x(), &expr);
        assert_eq!(roots.len(), 2);
        for root in roots {
            assert!(!root.is_num());
            assert!(expr.substitute("x", &root).simplify().is_zero());
        }
    }

    #[test]
    fn test_quadratic_double_and_no_roots() {
        // (x - 3)^2 = 0 has a single root
        let square = SymExpr::pow(
            SymExpr::sub(SymExpr::var("x"), SymExpr::int(3)),
            SymExpr::int(2),
        );
        assert_eq!(
            PolynomialIsolator::new().roots(&x(), &square),
            vec![SymExpr::int(3)]
        );

        // x^2 + 1 = 0 has no real roots
        let no_real = SymExpr::add(vec![
            SymExpr::pow(SymExpr::var("x"), SymExpr::int(2)),
            SymExpr::int(1),
        ]);
        assert!(PolynomialIsolator::new().roots(&x(), &no_real).is_empty());
    }

    #[test]
    fn test_unsupported_forms_have_no_roots() {
        let iso = PolynomialIsolator::new();

        // Variable absent
        assert!(iso.roots(&x(), &SymExpr::var("y")).is_empty());

        // Symbolic leading coefficient
        let scaled = SymExpr::sub(
            SymExpr::mul(vec![SymExpr::var("y"), SymExpr::var("x")]),
            SymExpr::int(1),
        );
        assert!(iso.roots(&x(), &scaled).is_empty());

        // Transcendental occurrence
        let trig = SymExpr::func("sin", vec![SymExpr::var("x")]);
        assert!(iso.roots(&x(), &trig).is_empty());

        // Cubic
        let cubic = SymExpr::sub(
            SymExpr::pow(SymExpr::var("x"), SymExpr::int(3)),
            SymExpr::int(8),
        );
        assert!(iso.roots(&x(), &cubic).is_empty());
    }

    #[test]
    fn test_huge_exponent_has_no_roots() {
        // x^3000000000 - 1 = 0
        let expr = SymExpr::sub(
            SymExpr::pow(SymExpr::var("x"), SymExpr::int(3_000_000_000)),
            SymExpr::int(1),
        );
        let iso = PolynomialIsolator::new();
        assert_eq!(polynomial_degree(&expr, &x()), Some(3_000_000_000));
        assert!(iso.coefficients(&expr, &x()).is_none());
        assert!(iso.roots(&x(), &expr).is_empty());

        // 4e9 + 4e9 overflows u32
        let huge = SymExpr::pow(SymExpr::var("x"), SymExpr::int(4_000_000_000));
        let product = SymExpr::mul(vec![huge.clone(), huge]);
        assert_eq!(polynomial_degree(&product, &x()), None);
    }

    #[test]
    fn test_cancelled_leading_coefficient_is_trimmed() {
        // 2*x + (3 - 3)*x^2: the quadratic bucket folds to zero and is trimmed
        let expr = SymExpr::add(vec![
            SymExpr::mul(vec![SymExpr::int(2), SymExpr::var("x")]),
            SymExpr::mul(vec![
                SymExpr::add(vec![SymExpr::int(3), SymExpr::int(-3)]),
                SymExpr::pow(SymExpr::var("x"), SymExpr::int(2)),
            ]),
        ]);
        let iso = PolynomialIsolator::new().with_simplify_rounds(1);
        let coeffs = iso.coefficients(&expr, &x()).unwrap();
        assert_eq!(coeffs, vec![SymExpr::int(0), SymExpr::int(2)]);
    }

    #[test]
    fn test_coefficients_lowest_power_first() {
        // 3*x^2 - 5*x + 7
        let expr = SymExpr::add(vec![
            SymExpr::mul(vec![
                SymExpr::int(3),
                SymExpr::pow(SymExpr::var("x"), SymExpr::int(2)),
            ]),
            SymExpr::mul(vec![SymExpr::int(-5), SymExpr::var("x")]),
            SymExpr::int(7),
        ]);
        let coeffs = PolynomialIsolator::new().coefficients(&expr, &x()).unwrap();
        assert_eq!(
            coeffs,
            vec![SymExpr::int(7), SymExpr::int(-5), SymExpr::int(3)]
        );
    }
}
