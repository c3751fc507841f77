mod context;
mod criterion;
mod error;
mod evaluation_report;
mod expr;
mod quoting;
mod targeting;
mod targeting_expression;
mod value;

pub use context::Context;
pub use criterion::{
    AttributeCriterion, Criterion, EqRule, RangeRule, Rule, SegmentCriterion, SetRule,
};
pub use error::{CompareError, TargetingError};
pub use evaluation_report::EvaluationReport;
pub use expr::{reference, BooleanExpr, Operands, AND_DELIMITER, OR_DELIMITER};
pub use targeting::{Expression, Targeting};
pub use targeting_expression::TargetingExpression;
pub use value::{Timestamp, Value, ValueKind};

pub(crate) use quoting::{is_ident_char, is_ident_start};
