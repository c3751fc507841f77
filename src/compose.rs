//! Composition and renaming of targeting expressions.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::{normalize, BooleanExpr, Criterion, TargetingError};

/// Joins a colliding ref name and its numeric suffix when two expressions are
/// conjoined.
pub const RENAME_SEPARATOR: &str = "_";

type Refs = BTreeMap<String, Criterion>;

/// Conjunction of two independently authored expressions.
///
/// Every ref name used by both sides is renamed on both sides to a fresh name
/// that collides with nothing in either side, so each criterion keeps its own
/// meaning in the result.
pub(crate) fn and_with(
    left: (&BooleanExpr, &Refs),
    right: (&BooleanExpr, &Refs),
) -> (BooleanExpr, Refs) {
    let (left_expr, left_refs) = left;
    let (right_expr, right_refs) = right;

    let mut taken: BTreeSet<String> = left_refs.keys().chain(right_refs.keys()).cloned().collect();
    let shared: Vec<&String> = left_refs
        .keys()
        .filter(|name| right_refs.contains_key(*name))
        .collect();

    let mut left_renames = BTreeMap::new();
    let mut right_renames = BTreeMap::new();
    for name in shared {
        let left_name = fresh_name(name, &mut taken);
        let right_name = fresh_name(name, &mut taken);
        trace!(%name, %left_name, %right_name, "renaming shared ref");
        left_renames.insert(name.clone(), left_name);
        right_renames.insert(name.clone(), right_name);
    }
    if !left_renames.is_empty() {
        debug!(shared = left_renames.len(), "renamed colliding refs for conjunction");
    }

    let (left_expr, mut refs) = apply_renames(left_expr, left_refs, &left_renames);
    let (right_expr, right_refs) = apply_renames(right_expr, right_refs, &right_renames);
    refs.extend(right_refs);

    let expression = normalize(&left_expr.and(right_expr));
    let reachable = expression.refs();
    refs.retain(|name, _| reachable.contains(name.as_str()));
    (expression, refs)
}

/// First `{base}_{n}` (n = 1, 2, ...) not yet in `taken`; the result is
/// recorded in `taken`.
pub(crate) fn fresh_name(base: &str, taken: &mut BTreeSet<String>) -> String {
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}{RENAME_SEPARATOR}{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn apply_renames(
    expr: &BooleanExpr,
    refs: &Refs,
    renames: &BTreeMap<String, String>,
) -> (BooleanExpr, Refs) {
    if renames.is_empty() {
        return (expr.clone(), refs.clone());
    }
    let renamed_expr = rename_refs(expr, renames);
    let renamed_refs = refs
        .iter()
        .map(|(name, criterion)| {
            let name = renames.get(name).unwrap_or(name);
            (name.clone(), criterion.clone())
        })
        .collect();
    (renamed_expr, renamed_refs)
}

fn rename_refs(expr: &BooleanExpr, renames: &BTreeMap<String, String>) -> BooleanExpr {
    expr.substitute(&|name| match renames.get(name) {
        Some(new_name) => BooleanExpr::Ref(new_name.clone()),
        None => BooleanExpr::Ref(name.to_owned()),
    })
}

/// Apply `mapper` to every criterion. `None` keeps the entry as is,
/// `Some((name, criterion))` replaces it; the expression is renamed to match.
///
/// Fails with [`TargetingError::AmbiguousRename`] when two entries end up with
/// the same name.
pub(crate) fn rewrite_criteria(
    expr: &BooleanExpr,
    refs: &Refs,
    mut mapper: impl FnMut(&str, &Criterion) -> Option<(String, Criterion)>,
) -> Result<(BooleanExpr, Refs), TargetingError> {
    let mut renames = BTreeMap::new();
    let mut rewritten = Refs::new();
    for (name, criterion) in refs {
        let (new_name, new_criterion) = mapper(name, criterion)
            .unwrap_or_else(|| (name.clone(), criterion.clone()));
        if rewritten.contains_key(&new_name) {
            return Err(TargetingError::AmbiguousRename { name: new_name });
        }
        if new_name != *name {
            renames.insert(name.clone(), new_name.clone());
        }
        rewritten.insert(new_name, new_criterion);
    }

    let expression = if renames.is_empty() {
        expr.clone()
    } else {
        rename_refs(expr, &renames)
    };
    Ok((expression, rewritten))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reference, Rule};

    fn refs(entries: &[(&str, Criterion)]) -> Refs {
        entries
            .iter()
            .map(|(name, c)| ((*name).to_owned(), c.clone()))
            .collect()
    }

    #[test]
    fn fresh_names_skip_taken() {
        let mut taken: BTreeSet<String> = ["a", "a_1", "a_3"].iter().map(|s| (*s).to_owned()).collect();
        assert_eq!(fresh_name("a", &mut taken), "a_2");
        assert_eq!(fresh_name("a", &mut taken), "a_4");
        assert!(taken.contains("a_2"));
    }

    #[test]
    fn disjoint_names_are_kept() {
        let left = refs(&[("a", Criterion::segment("s1"))]);
        let right = refs(&[("b", Criterion::segment("s2"))]);
        let (expr, merged) = and_with((&reference("a"), &left), (&reference("b"), &right));
        assert_eq!(expr, reference("a").and(reference("b")));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["a"], Criterion::segment("s1"));
        assert_eq!(merged["b"], Criterion::segment("s2"));
    }

    #[test]
    fn shared_names_are_renamed_on_both_sides() {
        let left = refs(&[("x", Criterion::attribute("country", Rule::eq("SE")))]);
        let right = refs(&[("x", Criterion::attribute("country", Rule::eq("NO")))]);
        let (expr, merged) = and_with((&reference("x"), &left), (&!reference("x"), &right));

        assert_eq!(expr, reference("x_1").and(!reference("x_2")));
        assert_eq!(merged["x_1"], Criterion::attribute("country", Rule::eq("SE")));
        assert_eq!(merged["x_2"], Criterion::attribute("country", Rule::eq("NO")));
        assert!(!merged.contains_key("x"));
    }

    #[test]
    fn renaming_avoids_existing_suffixes() {
        let left = refs(&[
            ("x", Criterion::segment("a")),
            ("x_1", Criterion::segment("b")),
        ]);
        let right = refs(&[("x", Criterion::segment("c"))]);
        let left_expr = reference("x").or(reference("x_1"));
        let (expr, merged) = and_with((&left_expr, &left), (&reference("x"), &right));

        assert_eq!(merged.len(), 3);
        assert_eq!(merged["x_1"], Criterion::segment("b"));
        assert_eq!(merged["x_2"], Criterion::segment("a"));
        assert_eq!(merged["x_3"], Criterion::segment("c"));
        assert_eq!(
            expr,
            reference("x_2")
                .and(reference("x_3"))
                .or(reference("x_1").and(reference("x_3")))
        );
    }

    #[test]
    fn rewrite_renames_expression() {
        let r = refs(&[("a", Criterion::segment("s")), ("b", Criterion::segment("t"))]);
        let (expr, rewritten) = rewrite_criteria(&reference("a").and(reference("b")), &r, |name, c| {
            (name == "a").then(|| ("renamed".to_owned(), c.clone()))
        })
        .unwrap();
        assert_eq!(expr, reference("renamed").and(reference("b")));
        assert!(rewritten.contains_key("renamed"));
        assert!(rewritten.contains_key("b"));
        assert!(!rewritten.contains_key("a"));
    }

    #[test]
    fn rewrite_can_replace_criterion() {
        let r = refs(&[("a", Criterion::segment("old"))]);
        let (expr, rewritten) = rewrite_criteria(&reference("a"), &r, |name, _| {
            Some((name.to_owned(), Criterion::segment("new")))
        })
        .unwrap();
        assert_eq!(expr, reference("a"));
        assert_eq!(rewritten["a"], Criterion::segment("new"));
    }

    #[test]
    fn rewrite_collision_is_ambiguous() {
        let r = refs(&[("a", Criterion::segment("s")), ("b", Criterion::segment("t"))]);
        let result = rewrite_criteria(&reference("a").or(reference("b")), &r, |_, c| {
            Some(("same".to_owned(), c.clone()))
        });
        assert_eq!(
            result,
            Err(TargetingError::AmbiguousRename {
                name: "same".into()
            })
        );
    }

    #[test]
    fn rewrite_collision_with_unchanged_entry() {
        let r = refs(&[("a", Criterion::segment("s")), ("b", Criterion::segment("t"))]);
        let result = rewrite_criteria(&reference("a").or(reference("b")), &r, |name, c| {
            (name == "b").then(|| ("a".to_owned(), c.clone()))
        });
        assert!(matches!(result, Err(TargetingError::AmbiguousRename { .. })));
    }
}
