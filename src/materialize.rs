//! Recursive inlining of segment references.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::{compose, convert, normalize, BooleanExpr, Criterion, Targeting, TargetingError};

/// Joins the outer ref name and an inlined segment's internal ref name.
///
/// When the joined name is already used by another ref, the inlined ref gets
/// the next free `{joined}_{n}` instead.
pub const SEGMENT_SEPARATOR: &str = "/";

/// Looks up the targeting definition of a named segment.
///
/// Called once per reachable segment reference during
/// [`TargetingExpression::materialize`](crate::TargetingExpression::materialize);
/// any caching or parallelism is up to the implementation.
pub trait SegmentSource {
    /// The definition of `segment_name`, or `None` if there is no such segment.
    fn fetch(&self, segment_name: &str) -> Option<Targeting>;
}

impl<F> SegmentSource for F
where
    F: Fn(&str) -> Option<Targeting>,
{
    fn fetch(&self, segment_name: &str) -> Option<Targeting> {
        self(segment_name)
    }
}

impl SegmentSource for HashMap<String, Targeting> {
    fn fetch(&self, segment_name: &str) -> Option<Targeting> {
        self.get(segment_name).cloned()
    }
}

impl SegmentSource for BTreeMap<String, Targeting> {
    fn fetch(&self, segment_name: &str) -> Option<Targeting> {
        self.get(segment_name).cloned()
    }
}

pub(crate) fn materialize(
    targeting: &Targeting,
    source: &impl SegmentSource,
) -> Result<(BooleanExpr, BTreeMap<String, Criterion>), TargetingError> {
    materialize_path(targeting, source, &[])
}

/// `path` holds the segments entered on the way to `targeting`. Each branch
/// extends its own copy, so a segment reached through two disjoint paths is
/// not a cycle.
fn materialize_path(
    targeting: &Targeting,
    source: &impl SegmentSource,
    path: &[String],
) -> Result<(BooleanExpr, BTreeMap<String, Criterion>), TargetingError> {
    let (expression, criteria) = convert::from_targeting(targeting)?;

    let mut taken: BTreeSet<String> = criteria.keys().cloned().collect();
    let mut refs = BTreeMap::new();
    let mut inlined: HashMap<String, BooleanExpr> = HashMap::new();
    for (name, criterion) in criteria {
        let segment_name = match criterion {
            Criterion::Segment(seg) => seg.segment_name,
            attribute @ Criterion::Attribute(_) => {
                refs.insert(name, attribute);
                continue;
            }
        };

        let mut branch = path.to_vec();
        branch.push(segment_name.clone());
        if path.contains(&segment_name) {
            warn!(path = %branch.join(" -> "), "cyclic segment reference");
            return Err(TargetingError::CyclicSegmentReference { path: branch });
        }

        let segment = source
            .fetch(&segment_name)
            .ok_or_else(|| TargetingError::UnknownSegment {
                segment: segment_name.clone(),
            })?;
        debug!(outer_ref = %name, segment = %segment_name, depth = branch.len(), "inlining segment");

        let (segment_expr, segment_refs) = materialize_path(&segment, source, &branch)?;
        let prefixed: HashMap<&str, String> = segment_refs
            .keys()
            .map(|inner| {
                let joined = format!("{name}{SEGMENT_SEPARATOR}{inner}");
                let joined = if taken.insert(joined.clone()) {
                    joined
                } else {
                    compose::fresh_name(&joined, &mut taken)
                };
                (inner.as_str(), joined)
            })
            .collect();
        let (segment_expr, segment_refs) =
            compose::rewrite_criteria(&segment_expr, &segment_refs, |inner, c| {
                prefixed.get(inner).map(|joined| (joined.clone(), c.clone()))
            })?;

        refs.extend(segment_refs);
        inlined.insert(name, segment_expr);
    }

    if inlined.is_empty() {
        return Ok((expression, refs));
    }

    let spliced = expression.substitute(&|name| {
        inlined
            .get(name)
            .cloned()
            .unwrap_or_else(|| BooleanExpr::Ref(name.to_owned()))
    });
    let expression = normalize(&spliced);
    let reachable = expression.refs();
    refs.retain(|name, _| reachable.contains(name.as_str()));
    Ok((expression, refs))
}
