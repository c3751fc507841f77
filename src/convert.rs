use std::collections::BTreeMap;

use crate::{normalize, BooleanExpr, Criterion, Expression, Targeting, TargetingError};

/// Externally authored tree into the internal ADT. Unspecified nodes are
/// vacuously satisfied.
pub(crate) fn to_boolean_expr(expression: &Expression) -> BooleanExpr {
    match expression {
        Expression::Ref(name) => BooleanExpr::Ref(name.clone()),
        Expression::Not(inner) => !to_boolean_expr(inner),
        Expression::And(ops) => BooleanExpr::and_all(ops.iter().map(to_boolean_expr)),
        Expression::Or(ops) => BooleanExpr::or_all(ops.iter().map(to_boolean_expr)),
        Expression::Unspecified => BooleanExpr::True,
    }
}

impl From<&Expression> for BooleanExpr {
    /// Structural conversion without simplification.
    fn from(expression: &Expression) -> Self {
        to_boolean_expr(expression)
    }
}

/// Internal ADT back into the external shape. `True` becomes an empty `And`
/// and `False` an empty `Or`; operands keep their canonical order.
pub(crate) fn to_expression(expr: &BooleanExpr) -> Expression {
    match expr {
        BooleanExpr::True => Expression::And(Vec::new()),
        BooleanExpr::False => Expression::Or(Vec::new()),
        BooleanExpr::Ref(name) => Expression::Ref(name.clone()),
        BooleanExpr::Not(inner) => !to_expression(inner),
        BooleanExpr::And(ops) => Expression::And(ops.iter().map(to_expression).collect()),
        BooleanExpr::Or(ops) => Expression::Or(ops.iter().map(to_expression).collect()),
    }
}

/// Normalize the expression of `targeting` and keep only the criteria that
/// are still reachable.
pub(crate) fn from_targeting(
    targeting: &Targeting,
) -> Result<(BooleanExpr, BTreeMap<String, Criterion>), TargetingError> {
    let expression = normalize(&to_boolean_expr(&targeting.expression));
    let refs = restrict(&expression, &targeting.criteria)?;
    Ok((expression, refs))
}

/// The subset of `criteria` reachable from `expression`.
pub(crate) fn restrict(
    expression: &BooleanExpr,
    criteria: &BTreeMap<String, Criterion>,
) -> Result<BTreeMap<String, Criterion>, TargetingError> {
    expression
        .refs()
        .into_iter()
        .map(|name| match criteria.get(name) {
            Some(criterion) => Ok((name.to_owned(), criterion.clone())),
            None => Err(TargetingError::UndefinedCriterion {
                name: name.to_owned(),
            }),
        })
        .collect()
}
