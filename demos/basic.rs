use targex::{Context, TargetingExpression};

fn main() {
    let expr = TargetingExpression::from_dsl(
        r#"
criterion country = attribute user.country == "SE"
criterion adult   = attribute user.age >= 18
criterion beta    = segment "beta-testers"

# the second disjunct is redundant once country holds
match country AND (adult OR NOT country)
"#,
    )
    .expect("failed to build targeting expression");

    println!("{expr}");
    println!("attributes to evaluate: {:?}", expr.attribute_refs().keys().collect::<Vec<_>>());

    let ctx = Context::new()
        .set("user.country", "SE")
        .set("user.age", 25_i64);

    match expr.evaluate_detailed(&ctx, |_| false) {
        Ok(report) => println!("{report}"),
        Err(e) => eprintln!("evaluation failed: {e}"),
    }
}
