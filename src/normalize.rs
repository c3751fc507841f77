//! Conversion of arbitrary expressions into sum-of-products form.

use crate::{simplify, BooleanExpr};

/// Convert `expr` into disjunctive normal form.
///
/// The result is `True`, `False`, a literal, an `And` of literals, or an `Or`
/// whose operands are literals or `And`s of literals. Negation is pushed down
/// with De Morgan's laws and `And` is distributed over `Or`.
///
/// Distribution is not bounded: an `And` of `n` disjunctions with `k`
/// operands each expands into up to `k^n` products.
#[must_use]
pub fn normalize(expr: &BooleanExpr) -> BooleanExpr {
    match simplify(expr) {
        BooleanExpr::Not(inner) => match *inner {
            BooleanExpr::And(ops) => normalize(&BooleanExpr::or_all(ops.into_iter().map(|op| !op))),
            BooleanExpr::Or(ops) => normalize(&BooleanExpr::and_all(ops.into_iter().map(|op| !op))),
            literal => !literal,
        },
        BooleanExpr::And(ops) => distribute(&ops.iter().map(normalize).collect::<Vec<_>>()),
        BooleanExpr::Or(ops) => simplify(&BooleanExpr::or_all(ops.iter().map(normalize))),
        other => other,
    }
}

/// Distribute a conjunction of normalized operands over their disjunctions.
fn distribute(operands: &[BooleanExpr]) -> BooleanExpr {
    let (disjunctions, rest): (Vec<&BooleanExpr>, Vec<&BooleanExpr>) = operands
        .iter()
        .partition(|op| matches!(op, BooleanExpr::Or(_)));

    let mut terms: Vec<Vec<BooleanExpr>> = vec![rest.into_iter().cloned().collect()];
    for disjunction in disjunctions {
        let BooleanExpr::Or(choices) = disjunction else {
            continue;
        };
        terms = terms
            .iter()
            .flat_map(|term| {
                choices.iter().map(move |choice| {
                    let mut expanded = term.clone();
                    expanded.push(choice.clone());
                    expanded
                })
            })
            .collect();
    }

    if terms.len() == 1 {
        let term = terms.pop().unwrap_or_default();
        return simplify(&BooleanExpr::and_all(term));
    }
    normalize(&BooleanExpr::or_all(terms.into_iter().map(BooleanExpr::and_all)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;

    #[test]
    fn literals_and_constants_unchanged() {
        assert_eq!(normalize(&BooleanExpr::True), BooleanExpr::True);
        assert_eq!(normalize(&BooleanExpr::False), BooleanExpr::False);
        assert_eq!(normalize(&reference("a")), reference("a"));
        assert_eq!(normalize(&!reference("a")), !reference("a"));
    }

    #[test]
    fn de_morgan_over_and() {
        let expr = !reference("a").and(reference("b"));
        assert_eq!(normalize(&expr), (!reference("a")).or(!reference("b")));
    }

    #[test]
    fn de_morgan_over_or() {
        let expr = !reference("a").or(reference("b"));
        assert_eq!(normalize(&expr), (!reference("a")).and(!reference("b")));
    }

    #[test]
    fn distributes_and_over_or() {
        let expr = reference("a").and(reference("b").or(reference("c")));
        let expected = reference("a")
            .and(reference("b"))
            .or(reference("a").and(reference("c")));
        assert_eq!(normalize(&expr), expected);
    }

    #[test]
    fn cartesian_product_of_two_disjunctions() {
        let expr = reference("a")
            .or(reference("b"))
            .and(reference("c").or(reference("d")));
        let expected = BooleanExpr::or_all([
            reference("a").and(reference("c")),
            reference("a").and(reference("d")),
            reference("b").and(reference("c")),
            reference("b").and(reference("d")),
        ]);
        assert_eq!(normalize(&expr), expected);
    }

    #[test]
    fn contradictory_products_are_dropped() {
        // a & (b | !a)  ==  a & b
        let expr = reference("a").and(reference("b").or(!reference("a")));
        assert_eq!(normalize(&expr), reference("a").and(reference("b")));
    }

    #[test]
    fn nested_negation_is_pushed_to_literals() {
        let expr = !(reference("a").or((!reference("b")).and(reference("c"))));
        let normalized = normalize(&expr);
        assert!(normalized.is_dnf(), "{normalized} is not in DNF");
        assert_eq!(
            normalized,
            (!reference("a")).and(reference("b")).or((!reference("a")).and(!reference("c")))
        );
    }

    #[test]
    fn nested_or_in_or_is_flattened() {
        let expr = reference("a").or(reference("b").and(reference("c").or(reference("d"))));
        let normalized = normalize(&expr);
        assert_eq!(
            normalized,
            BooleanExpr::or_all([
                reference("a"),
                reference("b").and(reference("c")),
                reference("b").and(reference("d")),
            ])
        );
    }

    #[test]
    fn idempotent() {
        let expr = (reference("a").or(!reference("b"))).and(!(reference("c").and(reference("a"))));
        let once = normalize(&expr);
        assert_eq!(normalize(&once), once);
        assert!(once.is_dnf());
    }

    #[test]
    fn tautology_collapses() {
        let expr = reference("a").or(!reference("a")).and(reference("b").or(BooleanExpr::True));
        assert_eq!(normalize(&expr), BooleanExpr::True);
    }
}
