use thiserror::Error;

use crate::parse::ParseError;
use crate::{CompareError, TargetingError};

/// Unified error type covering parsing, conversion, comparison and I/O.
///
/// Returned by convenience methods like
/// [`TargetingExpression::from_dsl()`](crate::TargetingExpression::from_dsl).
#[derive(Debug, Error)]
pub enum TargexError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Targeting(#[from] TargetingError),

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
