//! Text format for [`Targeting`] definitions.
//!
//! ```text
//! # comments run to the end of the line
//! criterion se    = attribute user.country == "SE"
//! criterion tier  = attribute user.tier in {"gold", "platinum"}
//! criterion adult = attribute user.age >= 18, < 65
//! criterion app   = attribute app.version >= v"2.1"
//! criterion beta  = segment "beta-testers"
//! match (se OR beta) AND NOT tier
//! ```
//!
//! `&`, `|` and `!` are accepted for `AND`, `OR` and `NOT`, so the
//! [`Display`](std::fmt::Display) output of a
//! [`TargetingExpression`](crate::TargetingExpression) parses back.

mod error;
mod grammar;
mod parser;

pub use error::ParseError;

use crate::Targeting;

/// Parse a DSL input string into a [`Targeting`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid DSL syntax, defines a
/// criterion twice, or does not have exactly one `match` clause.
pub fn parse(input: &str) -> Result<Targeting, ParseError> {
    use winnow::Parser;
    let statements = grammar::parse_statements
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))?;
    parser::assemble(statements)
}
