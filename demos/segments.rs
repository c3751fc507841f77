use std::collections::HashMap;

use targex::{Context, Targeting, TargetingError, TargetingExpression};

fn main() {
    let mut segments: HashMap<String, Targeting> = HashMap::new();
    segments.insert(
        "nordics".to_owned(),
        Targeting::from_dsl(r#"criterion c = attribute user.country in {"SE", "NO", "DK", "FI"}
match c"#)
        .expect("invalid segment"),
    );
    segments.insert(
        "power-users".to_owned(),
        Targeting::from_dsl(
            r#"
criterion sessions = attribute user.sessions >= 100
criterion region   = segment "nordics"
match sessions AND region
"#,
        )
        .expect("invalid segment"),
    );

    let flag = Targeting::from_dsl(
        r#"
criterion power = segment "power-users"
criterion staff = attribute user.staff == true
match power OR staff
"#,
    )
    .expect("invalid flag targeting");

    let expr = TargetingExpression::materialize(&flag, &segments).expect("materialization failed");
    println!("{expr}\n");

    let ctx = Context::new()
        .set("user.country", "NO")
        .set("user.sessions", 250_i64)
        .set("user.staff", false);
    println!("matches: {:?}", expr.evaluate(&ctx, |_| false));

    // A segment that reaches itself is rejected.
    segments.insert(
        "nordics".to_owned(),
        Targeting::from_dsl("criterion back = segment \"power-users\"\nmatch back")
            .expect("invalid segment"),
    );
    match TargetingExpression::materialize(&flag, &segments) {
        Err(e @ TargetingError::CyclicSegmentReference { .. }) => println!("rejected: {e}"),
        other => println!("unexpected: {other:?}"),
    }
}
