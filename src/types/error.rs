use thiserror::Error;

use super::value::ValueKind;

/// Errors raised while building, composing or materializing a
/// [`TargetingExpression`](super::TargetingExpression).
///
/// All of them describe malformed targeting data rather than transient
/// conditions; callers should treat the affected rule as broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetingError {
    #[error("cyclic segment reference: {}", path.join(" -> "))]
    CyclicSegmentReference { path: Vec<String> },

    #[error("ambiguous rename: more than one criterion maps to '{name}'")]
    AmbiguousRename { name: String },

    #[error("expression references undefined criterion '{name}'")]
    UndefinedCriterion { name: String },

    #[error("unknown segment '{segment}'")]
    UnknownSegment { segment: String },
}

/// Errors raised by the value comparator when a comparison has no defined
/// semantics for the given value kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("cannot compare {left} with {right}")]
    NotComparable { left: ValueKind, right: ValueKind },

    #[error("{kind} values have no ordering")]
    NotOrderable { kind: ValueKind },

    #[error("invalid semantic version '{version}'")]
    InvalidVersion { version: String },
}
