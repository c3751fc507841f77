//! Targeting expressions for feature-flag resolution.
//!
//! A [`Targeting`] definition (an expression tree over named criteria) is
//! converted into a [`TargetingExpression`]: a [`BooleanExpr`] in disjunctive
//! normal form plus the criteria its refs are bound to. Expressions can be
//! conjoined without name clashes ([`TargetingExpression::and_with`]), have
//! their segment references inlined ([`TargetingExpression::materialize`])
//! and be evaluated against the set of refs that hold.

pub mod compare;
mod compose;
mod convert;
mod error;
mod evaluate;
mod materialize;
mod normalize;
pub mod parse;
#[cfg(feature = "binary-cache")]
mod serial;
mod simplify;
mod types;

pub use compose::RENAME_SEPARATOR;
pub use compare::NUMBER_TOLERANCE;
pub use error::TargexError;
pub use materialize::{SegmentSource, SEGMENT_SEPARATOR};
pub use normalize::normalize;
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use simplify::simplify;
pub use types::{
    reference, AttributeCriterion, BooleanExpr, CompareError, Context, Criterion, EqRule,
    EvaluationReport, Expression, Operands, RangeRule, Rule, SegmentCriterion, SetRule, Targeting,
    TargetingError, TargetingExpression, Timestamp, Value, ValueKind, AND_DELIMITER, OR_DELIMITER,
};
