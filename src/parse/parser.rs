use std::collections::BTreeMap;

use crate::{Criterion, Expression, Targeting};

use super::ParseError;

/// One top-level DSL statement.
#[derive(Debug)]
pub(crate) enum Statement {
    Criterion(String, Criterion),
    Match(Expression),
}

/// Collect statements into a [`Targeting`]: criterion names must be unique
/// and there must be exactly one `match` clause.
pub(crate) fn assemble(statements: Vec<Statement>) -> Result<Targeting, ParseError> {
    let mut criteria = BTreeMap::new();
    let mut expression = None;

    for statement in statements {
        match statement {
            Statement::Criterion(name, criterion) => {
                if criteria.contains_key(&name) {
                    return Err(ParseError::new(format!("duplicate criterion '{name}'")));
                }
                criteria.insert(name, criterion);
            }
            Statement::Match(expr) => {
                if expression.is_some() {
                    return Err(ParseError::new("more than one match clause"));
                }
                expression = Some(expr);
            }
        }
    }

    let expression = expression.ok_or_else(|| ParseError::new("missing match clause"))?;
    Ok(Targeting {
        expression,
        criteria,
    })
}
