//! Local algebraic simplification of [`BooleanExpr`] trees.

use std::collections::BTreeSet;

use crate::BooleanExpr;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

impl Connective {
    /// `True` for `And`, `False` for `Or`.
    fn identity(self) -> BooleanExpr {
        match self {
            Connective::And => BooleanExpr::True,
            Connective::Or => BooleanExpr::False,
        }
    }

    /// `False` for `And`, `True` for `Or`.
    fn dominator(self) -> BooleanExpr {
        match self {
            Connective::And => BooleanExpr::False,
            Connective::Or => BooleanExpr::True,
        }
    }

    fn build(self, operands: BTreeSet<BooleanExpr>) -> BooleanExpr {
        match self {
            Connective::And => BooleanExpr::and_all(operands),
            Connective::Or => BooleanExpr::or_all(operands),
        }
    }
}

/// Apply local identities bottom-up: double negation, constant folding,
/// flattening of nested same-connective nodes, identity removal, dominator
/// collapse and complementary pairs (`x & !x`, `x | !x`).
///
/// Total and pure; the result is a fixed point (`simplify(simplify(e)) ==
/// simplify(e)`).
#[must_use]
pub fn simplify(expr: &BooleanExpr) -> BooleanExpr {
    match expr {
        BooleanExpr::True | BooleanExpr::False | BooleanExpr::Ref(_) => expr.clone(),
        BooleanExpr::Not(inner) => match simplify(inner) {
            BooleanExpr::True => BooleanExpr::False,
            BooleanExpr::False => BooleanExpr::True,
            BooleanExpr::Not(x) => *x,
            other => !other,
        },
        BooleanExpr::And(ops) => reduce(Connective::And, ops.iter().map(simplify)),
        BooleanExpr::Or(ops) => reduce(Connective::Or, ops.iter().map(simplify)),
    }
}

/// Reduce already simplified operands of one connective.
fn reduce(connective: Connective, operands: impl Iterator<Item = BooleanExpr>) -> BooleanExpr {
    let identity = connective.identity();
    let dominator = connective.dominator();

    let mut flat = BTreeSet::new();
    for operand in operands {
        match (connective, operand) {
            (Connective::And, BooleanExpr::And(nested)) | (Connective::Or, BooleanExpr::Or(nested)) => {
                flat.extend(nested);
            }
            (_, other) => {
                flat.insert(other);
            }
        }
    }

    let negated: BTreeSet<&BooleanExpr> = flat
        .iter()
        .filter_map(|op| match op {
            BooleanExpr::Not(inner) => Some(inner.as_ref()),
            _ => None,
        })
        .collect();
    let has_complement = flat.iter().any(|op| negated.contains(op));

    if has_complement || flat.contains(&dominator) {
        return dominator;
    }

    flat.remove(&identity);
    match flat.len() {
        0 => identity,
        1 => flat.into_iter().next().unwrap_or(identity),
        _ => connective.build(flat),
    }
}
