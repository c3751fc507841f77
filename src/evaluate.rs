use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use crate::types::EvaluationReport;
use crate::{BooleanExpr, CompareError, Context, Criterion};

pub(crate) fn eval_expr(expr: &BooleanExpr, is_true: &impl Fn(&str) -> bool) -> bool {
    match expr {
        BooleanExpr::True => true,
        BooleanExpr::False => false,
        BooleanExpr::Ref(name) => is_true(name),
        BooleanExpr::Not(inner) => !eval_expr(inner, is_true),
        BooleanExpr::And(ops) => ops.iter().all(|op| eval_expr(op, is_true)),
        BooleanExpr::Or(ops) => ops.iter().any(|op| eval_expr(op, is_true)),
    }
}

/// Names of the refs that hold for `ctx`: attribute criteria are matched
/// against the context, segment criteria are answered by `membership`.
pub(crate) fn resolve_true_refs(
    refs: &BTreeMap<String, Criterion>,
    ctx: &Context,
    membership: &impl Fn(&str) -> bool,
) -> Result<HashSet<String>, CompareError> {
    let mut true_refs = HashSet::new();
    for (name, criterion) in refs {
        let holds = match criterion {
            Criterion::Attribute(attr) => attr.matches(ctx)?,
            Criterion::Segment(seg) => membership(&seg.segment_name),
        };
        if holds {
            true_refs.insert(name.clone());
        }
    }
    Ok(true_refs)
}

pub(crate) fn evaluate_detailed(
    expression: &BooleanExpr,
    refs: &BTreeMap<String, Criterion>,
    ctx: &Context,
    membership: &impl Fn(&str) -> bool,
) -> Result<EvaluationReport, CompareError> {
    let start = Instant::now();
    let true_refs = resolve_true_refs(refs, ctx, membership)?;
    let matched = eval_expr(expression, &|name| true_refs.contains(name));
    let duration = start.elapsed();

    let outcomes = refs
        .keys()
        .map(|name| (name.clone(), true_refs.contains(name)))
        .collect();
    Ok(EvaluationReport::new(matched, outcomes, duration))
}
