use std::collections::BTreeMap;
use std::ops::Not;

use super::Criterion;

/// Externally authored targeting definition: an expression tree over ref
/// names plus the criterion bound to each name.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Targeting {
    pub expression: Expression,
    pub criteria: BTreeMap<String, Criterion>,
}

/// Expression tree as authored. Operand lists are ordered and may contain
/// duplicates; conversion into a [`BooleanExpr`](super::BooleanExpr) makes
/// them canonical.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Expression {
    Ref(String),
    Not(Box<Expression>),
    And(Vec<Expression>),
    Or(Vec<Expression>),
    /// Unset node kind. Treated as vacuously satisfied.
    #[default]
    Unspecified,
}

impl Targeting {
    #[must_use]
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            criteria: BTreeMap::new(),
        }
    }

    /// Bind `criterion` to the ref `name`, replacing any previous binding.
    #[must_use]
    pub fn criterion(mut self, name: &str, criterion: Criterion) -> Self {
        self.criteria.insert(name.to_owned(), criterion);
        self
    }

    /// Parse the targeting DSL.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::parse::ParseError) if the input is not
    /// valid DSL syntax.
    pub fn from_dsl(input: &str) -> Result<Self, crate::parse::ParseError> {
        crate::parse::parse(input)
    }
}

impl Expression {
    #[must_use]
    pub fn reference(name: &str) -> Self {
        Expression::Ref(name.to_owned())
    }

    #[must_use]
    pub fn and(self, other: Expression) -> Self {
        match self {
            Expression::And(mut operands) => {
                operands.push(other);
                Expression::And(operands)
            }
            first => Expression::And(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Expression) -> Self {
        match self {
            Expression::Or(mut operands) => {
                operands.push(other);
                Expression::Or(operands)
            }
            first => Expression::Or(vec![first, other]),
        }
    }
}

impl Not for Expression {
    type Output = Expression;

    fn not(self) -> Expression {
        Expression::Not(Box::new(self))
    }
}
