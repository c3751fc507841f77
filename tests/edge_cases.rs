use std::collections::HashSet;

use targex::{
    normalize, reference, simplify, BooleanExpr, CompareError, Context, Criterion, Expression,
    Rule, Targeting, TargetingError, TargetingExpression, Value, ValueKind,
};

fn truths(names: &[&str]) -> HashSet<String> {
    names.iter().map(|&n| n.to_owned()).collect()
}

#[test]
fn unspecified_expression_always_matches() {
    let t = Targeting::new(Expression::Unspecified).criterion("a", Criterion::segment("s"));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    assert_eq!(expr, TargetingExpression::always());
    assert!(expr.eval(&HashSet::new()));
}

#[test]
fn contradiction_prunes_every_criterion() {
    let t = Targeting::new(Expression::reference("a").and(!Expression::reference("a")))
        .criterion("a", Criterion::segment("s"));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    assert_eq!(expr.expression(), &BooleanExpr::False);
    assert!(expr.refs().is_empty());
    assert!(!expr.eval(&truths(&["a"])));
}

#[test]
fn identity_and_absorption() {
    let a = reference("a");
    assert_eq!(simplify(&BooleanExpr::and_all([])), BooleanExpr::True);
    assert_eq!(simplify(&BooleanExpr::or_all([])), BooleanExpr::False);
    assert_eq!(simplify(&a.clone().and(!a.clone())), BooleanExpr::False);
    assert_eq!(simplify(&a.clone().or(!a)), BooleanExpr::True);
}

#[test]
fn deeply_nested_negation() {
    let mut expr = reference("x");
    for _ in 0..51 {
        expr = !expr;
    }
    assert_eq!(normalize(&expr), !reference("x"));
}

#[test]
fn wide_disjunction() {
    let names: Vec<String> = (0..200).map(|i| format!("r{i}")).collect();
    let expr = BooleanExpr::or_all(names.iter().map(|n| reference(n)));
    let n = normalize(&expr);
    assert!(n.is_dnf());
    assert_eq!(n.refs().len(), 200);
    assert!(n.eval(&truths(&["r199"])));
    assert!(!n.eval(&HashSet::new()));
}

#[test]
fn distribution_blow_up_is_exact() {
    // (a1 | b1) & (a2 | b2) & ... & (a6 | b6) has 2^6 products.
    let factors = (1..=6).map(|i| reference(&format!("a{i}")).or(reference(&format!("b{i}"))));
    let n = normalize(&BooleanExpr::and_all(factors));
    match &n {
        BooleanExpr::Or(terms) => assert_eq!(terms.len(), 64),
        other => panic!("expected Or, got {other}"),
    }
}

#[test]
fn and_with_three_way_collision() {
    let one = |segment: &str| {
        TargetingExpression::from_targeting(
            &Targeting::new(Expression::reference("x")).criterion("x", Criterion::segment(segment)),
        )
        .unwrap()
    };
    let ab = one("a").and_with(&one("b"));
    let abc = ab.and_with(&one("c"));
    assert_eq!(abc.refs().len(), 3);
    let segments: HashSet<&str> = abc
        .segment_refs()
        .values()
        .map(|s| s.segment_name.as_str())
        .collect();
    assert_eq!(segments, HashSet::from(["a", "b", "c"]));
}

#[test]
fn rewrite_with_identity_mapper_is_noop() {
    let t = Targeting::new(Expression::reference("a").or(Expression::reference("b")))
        .criterion("a", Criterion::segment("s"))
        .criterion("b", Criterion::attribute("x", Rule::eq(1_i64)));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    assert_eq!(expr.rewrite_criteria(|_, _| None).unwrap(), expr);
}

#[test]
fn rewrite_collision_reports_name() {
    let t = Targeting::new(Expression::reference("a").or(Expression::reference("b")))
        .criterion("a", Criterion::segment("s"))
        .criterion("b", Criterion::segment("t"));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    let err = expr
        .rewrite_criteria(|_, c| Some(("merged".to_owned(), c.clone())))
        .unwrap_err();
    assert_eq!(err, TargetingError::AmbiguousRename { name: "merged".into() });
}

#[test]
fn kind_mismatch_is_not_comparable() {
    let t = Targeting::new(Expression::reference("a"))
        .criterion("a", Criterion::attribute("age", Rule::eq(18_i64)));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    let ctx = Context::new().set("age", "eighteen");
    assert_eq!(
        expr.evaluate(&ctx, |_| false),
        Err(CompareError::NotComparable {
            left: ValueKind::String,
            right: ValueKind::Number,
        })
    );
}

#[test]
fn ordering_strings_is_not_orderable() {
    let t = Targeting::new(Expression::reference("a")).criterion(
        "a",
        Criterion::attribute(
            "name",
            Rule::range(targex::RangeRule::default().start_inclusive("m")),
        ),
    );
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    let ctx = Context::new().set("name", "zed");
    assert_eq!(
        expr.evaluate(&ctx, |_| false),
        Err(CompareError::NotOrderable {
            kind: ValueKind::String
        })
    );
}

#[test]
fn missing_attribute_is_false_not_error() {
    let t = Targeting::new(!Expression::reference("a"))
        .criterion("a", Criterion::attribute("age", Rule::eq(18_i64)));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    assert_eq!(expr.evaluate(&Context::new(), |_| false), Ok(true));
}

#[test]
fn evaluate_detailed_reports_true_refs() {
    let t = Targeting::new(Expression::reference("b").and(Expression::reference("a")))
        .criterion("a", Criterion::attribute("x", Rule::eq(true)))
        .criterion("b", Criterion::segment("seg"));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    let report = expr
        .evaluate_detailed(&Context::new().set("x", true), |s| s == "seg")
        .unwrap();
    assert!(report.matched());
    assert_eq!(report.true_refs(), ["a", "b"]);
}

#[test]
fn number_tolerance_reaches_criteria() {
    let t = Targeting::new(Expression::reference("a"))
        .criterion("a", Criterion::attribute("score", Rule::eq(5_i64)));
    let expr = TargetingExpression::from_targeting(&t).unwrap();
    assert!(expr
        .evaluate(&Context::new().set("score", 5.000_000_01), |_| false)
        .unwrap());
    assert!(!expr
        .evaluate(&Context::new().set("score", 5.1), |_| false)
        .unwrap());
    assert_eq!(Value::from(5.0), Value::Number(5.0));
}

#[test]
fn delimiter_names_do_not_merge_operands() {
    let t = Targeting::new(
        Expression::reference("a | b")
            .or(Expression::reference("c"))
            .and(Expression::reference("a").or(Expression::reference("b | c"))),
    )
    .criterion("a | b", Criterion::segment("s1"))
    .criterion("c", Criterion::segment("s2"))
    .criterion("a", Criterion::segment("s3"))
    .criterion("b | c", Criterion::segment("s4"));
    let expr = TargetingExpression::from_targeting(&t).unwrap();

    let refs: Vec<&str> = expr.refs().keys().map(String::as_str).collect();
    assert_eq!(refs, ["a", "a | b", "b | c", "c"]);
    assert!(!expr.eval(&truths(&["a"])));
    assert!(expr.eval(&truths(&["a", "c"])));
    assert!(expr.eval(&truths(&["a | b", "b | c"])));
}
