use std::fmt;

use super::quoting::{name_token, Quoted};
use super::{CompareError, Context, Value};
use crate::compare;

/// The definition bound to a ref name: either a direct attribute comparison
/// or an indirection to another named rule set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Criterion {
    Attribute(AttributeCriterion),
    Segment(SegmentCriterion),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeCriterion {
    pub attribute_name: String,
    pub rule: Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentCriterion {
    pub segment_name: String,
}

/// How an attribute's value is matched.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Rule {
    Eq(EqRule),
    Set(SetRule),
    Range(RangeRule),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EqRule {
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetRule {
    pub values: Vec<Value>,
}

/// Bounds of a range match. Absent bounds are unconstrained.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RangeRule {
    pub start_inclusive: Option<Value>,
    pub start_exclusive: Option<Value>,
    pub end_inclusive: Option<Value>,
    pub end_exclusive: Option<Value>,
}

impl Criterion {
    #[must_use]
    pub fn attribute(attribute_name: &str, rule: Rule) -> Self {
        Criterion::Attribute(AttributeCriterion {
            attribute_name: attribute_name.to_owned(),
            rule,
        })
    }

    #[must_use]
    pub fn segment(segment_name: &str) -> Self {
        Criterion::Segment(SegmentCriterion {
            segment_name: segment_name.to_owned(),
        })
    }

    #[must_use]
    pub fn as_attribute(&self) -> Option<&AttributeCriterion> {
        match self {
            Criterion::Attribute(attr) => Some(attr),
            Criterion::Segment(_) => None,
        }
    }

    #[must_use]
    pub fn as_segment(&self) -> Option<&SegmentCriterion> {
        match self {
            Criterion::Segment(seg) => Some(seg),
            Criterion::Attribute(_) => None,
        }
    }
}

impl Rule {
    #[must_use]
    pub fn eq(value: impl Into<Value>) -> Self {
        Rule::Eq(EqRule {
            value: value.into(),
        })
    }

    #[must_use]
    pub fn set<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Rule::Set(SetRule {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    #[must_use]
    pub fn range(range: RangeRule) -> Self {
        Rule::Range(range)
    }
}

impl RangeRule {
    #[must_use]
    pub fn start_inclusive(mut self, value: impl Into<Value>) -> Self {
        self.start_inclusive = Some(value.into());
        self
    }

    #[must_use]
    pub fn start_exclusive(mut self, value: impl Into<Value>) -> Self {
        self.start_exclusive = Some(value.into());
        self
    }

    #[must_use]
    pub fn end_inclusive(mut self, value: impl Into<Value>) -> Self {
        self.end_inclusive = Some(value.into());
        self
    }

    #[must_use]
    pub fn end_exclusive(mut self, value: impl Into<Value>) -> Self {
        self.end_exclusive = Some(value.into());
        self
    }

    /// Whether `v` satisfies every present bound.
    fn contains(&self, v: &Value) -> Result<bool, CompareError> {
        if let Some(start) = &self.start_inclusive {
            if !compare::order(start.kind())?.lte(start, v)? {
                return Ok(false);
            }
        }
        if let Some(start) = &self.start_exclusive {
            if !compare::order(start.kind())?.lt(start, v)? {
                return Ok(false);
            }
        }
        if let Some(end) = &self.end_inclusive {
            if !compare::order(end.kind())?.lte(v, end)? {
                return Ok(false);
            }
        }
        if let Some(end) = &self.end_exclusive {
            if !compare::order(end.kind())?.lt(v, end)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl AttributeCriterion {
    /// Match this criterion against the attribute values in `ctx`.
    ///
    /// A missing attribute never matches. List attributes match when any of
    /// their elements does.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError`] when the attribute's value kind does not fit
    /// the rule (e.g. a string attribute against a range of numbers).
    pub fn matches(&self, ctx: &Context) -> Result<bool, CompareError> {
        let Some(values) = ctx.get(&self.attribute_name) else {
            return Ok(false);
        };
        match &self.rule {
            Rule::Eq(rule) => compare::contains(values, &rule.value),
            Rule::Set(rule) => compare::overlap(values, &rule.values),
            Rule::Range(range) => {
                for v in values {
                    if range.contains(v)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Eq(rule) => write!(f, "== {}", rule.value),
            Rule::Set(rule) => {
                write!(f, "in {{")?;
                for (i, v) in rule.values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "}}")
            }
            Rule::Range(range) => {
                let bounds = [
                    (">=", &range.start_inclusive),
                    (">", &range.start_exclusive),
                    ("<=", &range.end_inclusive),
                    ("<", &range.end_exclusive),
                ];
                if bounds.iter().all(|(_, bound)| bound.is_none()) {
                    return f.write_str("exists");
                }
                let mut first = true;
                for (op, bound) in bounds {
                    if let Some(v) = bound {
                        if !first {
                            write!(f, ", ")?;
                        }
                        write!(f, "{op} {v}")?;
                        first = false;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Attribute(attr) => {
                write!(f, "attribute {} {}", name_token(&attr.attribute_name), attr.rule)
            }
            Criterion::Segment(seg) => write!(f, "segment {}", Quoted(&seg.segment_name)),
        }
    }
}
