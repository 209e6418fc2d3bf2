use eqsolve_symbolic::{Isolate, PolynomialIsolator, SymExpr, Symbol};

fn x() -> SymExpr {
    SymExpr::var("x")
}

fn y() -> SymExpr {
    SymExpr::var("y")
}

#[test]
fn equal_expressions_reach_the_same_form() {
    let pairs = vec![
        (x() * y() + y() * x(), SymExpr::int(2) * x() * y()),
        (
            SymExpr::pow(x() + SymExpr::int(1), SymExpr::int(2)),
            SymExpr::pow(x(), SymExpr::int(2)) + SymExpr::int(2) * x() + SymExpr::int(1),
        ),
        (x() * x() * x(), SymExpr::pow(x(), SymExpr::int(3))),
        (-(x() - y()), y() - x()),
    ];
    for (lhs, rhs) in pairs {
        let difference = SymExpr::sub(lhs.clone(), rhs.clone()).simplify();
        assert!(
            difference.is_num() && difference.is_zero(),
            "{} - ({}) simplified to {}",
            lhs,
            rhs,
            difference
        );
    }
}

#[test]
fn roots_substitute_back_to_zero() {
    let isolator: Box<dyn Isolate> = Box::new(PolynomialIsolator::new());
    let cases = vec![
        SymExpr::int(3) * x() - SymExpr::int(7),
        SymExpr::pow(x(), SymExpr::int(2)) - SymExpr::int(5) * x() + SymExpr::int(6),
        SymExpr::pow(x(), SymExpr::int(2)) - SymExpr::int(3),
    ];
    for expr in cases {
        let roots = isolator.roots(&Symbol::new("x"), &expr);
        assert!(!roots.is_empty(), "{} should have roots", expr);
        for root in roots {
            let residue = expr.substitute("x", &root).simplify();
            assert!(residue.is_zero(), "{} at x = {} left {}", expr, root, residue);
        }
    }
}

#[test]
fn substitution_keeps_other_symbols() {
    let expr = x() * y() + SymExpr::int(1);
    let rewritten = expr.substitute("x", &SymExpr::int(2)).simplify();
    assert!(rewritten.contains_var("y"));
    assert!(!rewritten.contains_var("x"));
    assert!(!rewritten.is_closed());
}
