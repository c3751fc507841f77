use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Outcome of [`TargetingExpression::evaluate_detailed()`](super::TargetingExpression::evaluate_detailed):
/// the match result plus what every ref resolved to.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    matched: bool,
    outcomes: BTreeMap<String, bool>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(matched: bool, outcomes: BTreeMap<String, bool>, duration: Duration) -> Self {
        Self {
            matched,
            outcomes,
            duration,
        }
    }

    #[must_use]
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Refs that held for the context, in name order.
    #[must_use]
    pub fn true_refs(&self) -> Vec<&str> {
        self.refs_where(true)
    }

    /// Refs that did not hold, in name order.
    #[must_use]
    pub fn false_refs(&self) -> Vec<&str> {
        self.refs_where(false)
    }

    /// What `name` resolved to, or `None` if it is not a ref of the expression.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<bool> {
        self.outcomes.get(name).copied()
    }

    /// Time spent resolving refs and folding the expression.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn refs_where(&self, value: bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|&(_, &held)| held == value)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.matched { "match" } else { "no match" };
        write!(f, "{verdict} (")?;
        for (i, (name, held)) in self.outcomes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let sign = if *held { '+' } else { '-' };
            write!(f, "{sign}{name}")?;
        }
        write!(f, ") in {:?}", self.duration)
    }
}
