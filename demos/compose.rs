use targex::{Context, Criterion, TargetingExpression};

fn main() {
    // Two independently authored rules that both call their criterion `x`.
    let rollout = TargetingExpression::from_dsl(
        "criterion x = attribute user.country == \"SE\"\nmatch x",
    )
    .expect("invalid rollout");
    let experiment = TargetingExpression::from_dsl(
        "criterion x = attribute user.bucket < 50\nmatch x",
    )
    .expect("invalid experiment");

    let combined = rollout.and_with(&experiment);
    println!("{combined}\n");

    let ctx = Context::new()
        .set("user.country", "SE")
        .set("user.bucket", 12_i64);
    println!("matches: {:?}", combined.evaluate(&ctx, |_| false));

    // Point every attribute at a namespaced attribute path.
    let namespaced = combined
        .rewrite_criteria(|name, criterion| match criterion {
            Criterion::Attribute(attr) => {
                let mut attr = attr.clone();
                attr.attribute_name = format!("v2.{}", attr.attribute_name);
                Some((name.to_owned(), Criterion::Attribute(attr)))
            }
            Criterion::Segment(_) => None,
        })
        .expect("rewrite failed");
    println!("{namespaced}");
}
