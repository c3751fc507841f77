use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::quoting::name_token;
use super::{
    AttributeCriterion, BooleanExpr, CompareError, Context, Criterion, EvaluationReport,
    SegmentCriterion, Targeting, TargetingError,
};
use crate::materialize::SegmentSource;

/// A normalized targeting expression paired with the criteria its refs are
/// bound to.
///
/// Immutable: every operation returns a new instance, so a value can be
/// shared across threads behind `Arc` and evaluated concurrently.
///
/// Every ref reachable in [`expression()`](Self::expression) has an entry in
/// [`refs()`](Self::refs), and every entry is reachable.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use targex::TargetingExpression;
///
/// let expr = TargetingExpression::from_dsl(
///     r#"
///     criterion a = attribute user.country == "SE"
///     criterion b = attribute user.tier in {"gold"}
///     match a AND (b OR NOT a)
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(expr.expression().to_string(), "(a & b)");
/// let truths: HashSet<String> = ["a".to_owned(), "b".to_owned()].into();
/// assert!(expr.eval(&truths));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TargetingExpression {
    pub(crate) expression: BooleanExpr,
    pub(crate) refs: BTreeMap<String, Criterion>,
}

impl TargetingExpression {
    /// The expression that always matches and references nothing.
    #[must_use]
    pub fn always() -> Self {
        Self {
            expression: BooleanExpr::True,
            refs: BTreeMap::new(),
        }
    }

    /// Convert and normalize an external definition, dropping criteria that
    /// normalization proved irrelevant.
    ///
    /// Segment criteria are kept as opaque refs; see
    /// [`materialize()`](Self::materialize) to inline them.
    ///
    /// # Errors
    ///
    /// Returns [`TargetingError::UndefinedCriterion`] if the expression
    /// references a name that has no criterion.
    pub fn from_targeting(targeting: &Targeting) -> Result<Self, TargetingError> {
        let (expression, refs) = crate::convert::from_targeting(targeting)?;
        Ok(Self { expression, refs })
    }

    /// Parse the targeting DSL and convert it.
    ///
    /// # Errors
    ///
    /// Returns [`TargexError`](crate::TargexError) on parse or conversion failure.
    pub fn from_dsl(input: &str) -> Result<Self, crate::TargexError> {
        let targeting = crate::parse::parse(input)?;
        Ok(Self::from_targeting(&targeting)?)
    }

    /// Read a DSL file and convert it.
    ///
    /// # Errors
    ///
    /// Returns [`TargexError`](crate::TargexError) on I/O, parse, or conversion failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::TargexError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }

    /// Convert `targeting` and recursively inline every segment criterion
    /// with the segment's own (materialized) expression, fetched from
    /// `source`. Inlined refs are prefixed with the outer ref name and
    /// [`SEGMENT_SEPARATOR`](crate::SEGMENT_SEPARATOR).
    ///
    /// # Errors
    ///
    /// - [`TargetingError::CyclicSegmentReference`] if a segment is reached
    ///   again along its own path (reaching it through two disjoint paths is
    ///   fine).
    /// - [`TargetingError::UnknownSegment`] if `source` has no definition.
    /// - [`TargetingError::UndefinedCriterion`] for an invalid definition
    ///   anywhere in the graph.
    pub fn materialize(
        targeting: &Targeting,
        source: &impl SegmentSource,
    ) -> Result<Self, TargetingError> {
        let (expression, refs) = crate::materialize::materialize(targeting, source)?;
        Ok(Self { expression, refs })
    }

    /// Conjunction with an independently authored expression. Ref names used
    /// by both sides are renamed apart first, so for every context the result
    /// matches exactly when both inputs match.
    #[must_use]
    pub fn and_with(&self, other: &TargetingExpression) -> Self {
        let (expression, refs) = crate::compose::and_with(
            (&self.expression, &self.refs),
            (&other.expression, &other.refs),
        );
        Self { expression, refs }
    }

    /// Rewrite criteria with `mapper`: `None` keeps an entry, `Some((name,
    /// criterion))` replaces it. Refs in the expression follow the new names.
    ///
    /// # Errors
    ///
    /// Returns [`TargetingError::AmbiguousRename`] if two entries map to the
    /// same name.
    pub fn rewrite_criteria(
        &self,
        mapper: impl FnMut(&str, &Criterion) -> Option<(String, Criterion)>,
    ) -> Result<Self, TargetingError> {
        let (expression, refs) =
            crate::compose::rewrite_criteria(&self.expression, &self.refs, mapper)?;
        Ok(Self { expression, refs })
    }

    /// Evaluate against the set of ref names that hold.
    #[must_use]
    pub fn eval(&self, true_refs: &HashSet<String>) -> bool {
        self.expression.eval(true_refs)
    }

    /// Names of the refs that hold for `ctx`. Attribute criteria are matched
    /// against the context; segment criteria are answered by `membership`,
    /// called with the segment name.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError`] if an attribute's value kind does not fit its
    /// rule.
    pub fn resolve_true_refs(
        &self,
        ctx: &Context,
        membership: impl Fn(&str) -> bool,
    ) -> Result<HashSet<String>, CompareError> {
        crate::evaluate::resolve_true_refs(&self.refs, ctx, &membership)
    }

    /// [`resolve_true_refs()`](Self::resolve_true_refs) followed by
    /// [`eval()`](Self::eval).
    ///
    /// # Errors
    ///
    /// Same as [`resolve_true_refs()`](Self::resolve_true_refs).
    pub fn evaluate(
        &self,
        ctx: &Context,
        membership: impl Fn(&str) -> bool,
    ) -> Result<bool, CompareError> {
        let true_refs = self.resolve_true_refs(ctx, membership)?;
        Ok(self.eval(&true_refs))
    }

    /// Evaluate with diagnostics: the result, the refs that held and timing.
    ///
    /// # Errors
    ///
    /// Same as [`resolve_true_refs()`](Self::resolve_true_refs).
    pub fn evaluate_detailed(
        &self,
        ctx: &Context,
        membership: impl Fn(&str) -> bool,
    ) -> Result<EvaluationReport, CompareError> {
        crate::evaluate::evaluate_detailed(&self.expression, &self.refs, ctx, &membership)
    }

    #[must_use]
    pub fn expression(&self) -> &BooleanExpr {
        &self.expression
    }

    #[must_use]
    pub fn refs(&self) -> &BTreeMap<String, Criterion> {
        &self.refs
    }

    /// The attribute-typed subset of [`refs()`](Self::refs): the attributes a
    /// caller must evaluate.
    #[must_use]
    pub fn attribute_refs(&self) -> BTreeMap<&str, &AttributeCriterion> {
        self.refs
            .iter()
            .filter_map(|(name, c)| c.as_attribute().map(|attr| (name.as_str(), attr)))
            .collect()
    }

    /// The segment-typed subset of [`refs()`](Self::refs). Empty after
    /// [`materialize()`](Self::materialize).
    #[must_use]
    pub fn segment_refs(&self) -> BTreeMap<&str, &SegmentCriterion> {
        self.refs
            .iter()
            .filter_map(|(name, c)| c.as_segment().map(|seg| (name.as_str(), seg)))
            .collect()
    }

    /// Back to the external shape, e.g. for storage. Feeding the result to
    /// [`from_targeting()`](Self::from_targeting) yields an equal value.
    #[must_use]
    pub fn to_targeting(&self) -> Targeting {
        Targeting {
            expression: crate::convert::to_expression(&self.expression),
            criteria: self.refs.clone(),
        }
    }
}

impl Default for TargetingExpression {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Display for TargetingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, criterion) in &self.refs {
            writeln!(f, "criterion {} = {criterion}", name_token(name))?;
        }
        write!(f, "match {}", self.expression)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{reference, Expression, Rule};

    fn truths(names: &[&str]) -> HashSet<String> {
        names.iter().map(|&n| n.to_owned()).collect()
    }

    fn scenario() -> TargetingExpression {
        let targeting = Targeting::new(
            Expression::reference("a")
                .and(Expression::reference("b").or(!Expression::reference("a"))),
        )
        .criterion("a", Criterion::attribute("country", Rule::eq("SE")))
        .criterion("b", Criterion::segment("beta"));
        TargetingExpression::from_targeting(&targeting).unwrap()
    }

    #[test]
    fn concrete_scenario() {
        let expr = scenario();
        assert_eq!(expr.expression(), &reference("a").and(reference("b")));
        assert!(expr.eval(&truths(&["a", "b"])));
        assert!(!expr.eval(&truths(&["a"])));
        assert!(!expr.eval(&truths(&["b"])));
    }

    #[test]
    fn attribute_and_segment_refs() {
        let expr = scenario();
        assert_eq!(expr.attribute_refs().keys().copied().collect::<Vec<_>>(), ["a"]);
        assert_eq!(expr.segment_refs().keys().copied().collect::<Vec<_>>(), ["b"]);
        assert_eq!(expr.segment_refs()["b"].segment_name, "beta");
    }

    #[test]
    fn always_is_neutral_for_and_with() {
        let expr = scenario();
        assert_eq!(expr.and_with(&TargetingExpression::always()), expr);
        assert_eq!(TargetingExpression::always().and_with(&expr), expr);
    }

    #[test]
    fn and_with_self_keeps_both_copies() {
        let expr = scenario();
        let both = expr.and_with(&expr);
        assert_eq!(both.refs().len(), 4);
        assert!(both.eval(&truths(&["a_1", "b_1", "a_2", "b_2"])));
        assert!(!both.eval(&truths(&["a_1", "b_1", "a_2"])));
    }

    #[test]
    fn round_trips_through_targeting() {
        let expr = scenario();
        let again = TargetingExpression::from_targeting(&expr.to_targeting()).unwrap();
        assert_eq!(again, expr);
    }

    #[test]
    fn constant_round_trip() {
        let never = TargetingExpression::from_targeting(&Targeting::new(Expression::Or(vec![])))
            .unwrap();
        assert_eq!(never.expression(), &BooleanExpr::False);
        let again = TargetingExpression::from_targeting(&never.to_targeting()).unwrap();
        assert_eq!(again, never);
    }

    #[test]
    fn materialize_replaces_segment_refs() {
        let mut segments = HashMap::new();
        segments.insert(
            "beta".to_owned(),
            Targeting::new(Expression::reference("t"))
                .criterion("t", Criterion::attribute("tier", Rule::eq("gold"))),
        );
        let targeting = scenario().to_targeting();
        let expr = TargetingExpression::materialize(&targeting, &segments).unwrap();
        assert!(expr.segment_refs().is_empty());
        assert_eq!(expr.expression(), &reference("a").and(reference("b/t")));
    }

    #[test]
    fn rewrite_criteria_to_other_segment() {
        let expr = scenario()
            .rewrite_criteria(|_, c| match c {
                Criterion::Segment(_) => Some(("b".to_owned(), Criterion::segment("gamma"))),
                Criterion::Attribute(_) => None,
            })
            .unwrap();
        assert_eq!(expr.segment_refs()["b"].segment_name, "gamma");
    }

    #[test]
    fn display_lists_criteria() {
        let text = scenario().to_string();
        assert!(text.contains("criterion a = attribute country == \"SE\""));
        assert!(text.contains("criterion b = segment \"beta\""));
        assert!(text.ends_with("match (a & b)"));
    }
}
