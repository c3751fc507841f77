use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Not;
use std::sync::Arc;

use super::quoting::name_token;

/// Joins the operand names of a conjunction in its canonical name.
pub const AND_DELIMITER: &str = " & ";
/// Joins the operand names of a disjunction in its canonical name.
pub const OR_DELIMITER: &str = " | ";

/// Immutable boolean expression over named leaf predicates.
///
/// Two expressions are equal when they have the same variant, the same
/// canonical name and the same operands. `And`/`Or` operands are kept in an [`Operands`] set ordered
/// by `(variant rank, canonical name)`, so operand order never affects
/// equality or display.
///
/// Raw constructors do not simplify; use [`simplify`](crate::simplify) or
/// [`normalize`](crate::normalize) to obtain a canonical form.
#[derive(Debug, Clone)]
pub enum BooleanExpr {
    True,
    False,
    Ref(String),
    Not(Box<BooleanExpr>),
    And(Operands),
    Or(Operands),
}

/// Canonically ordered, duplicate-free operand set of an `And` or `Or` node.
///
/// The joined canonical name is computed once on construction and reused by
/// every comparison.
#[derive(Debug, Clone)]
pub struct Operands {
    items: BTreeSet<BooleanExpr>,
    name: Arc<str>,
}

impl Operands {
    fn collect(operands: impl IntoIterator<Item = BooleanExpr>, delimiter: &str) -> Self {
        let items: BTreeSet<BooleanExpr> = operands.into_iter().collect();
        let mut name = String::from("(");
        for (i, operand) in items.iter().enumerate() {
            if i > 0 {
                name.push_str(delimiter);
            }
            name.push_str(&operand.name());
        }
        name.push(')');
        Self {
            items,
            name: name.into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BooleanExpr> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, expr: &BooleanExpr) -> bool {
        self.items.contains(expr)
    }
}

impl<'a> IntoIterator for &'a Operands {
    type Item = &'a BooleanExpr;
    type IntoIter = std::collections::btree_set::Iter<'a, BooleanExpr>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Operands {
    type Item = BooleanExpr;
    type IntoIter = std::collections::btree_set::IntoIter<BooleanExpr>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl BooleanExpr {
    /// Conjunction of the given operands, deduplicated and canonically ordered.
    #[must_use]
    pub fn and_all(operands: impl IntoIterator<Item = BooleanExpr>) -> Self {
        BooleanExpr::And(Operands::collect(operands, AND_DELIMITER))
    }

    /// Disjunction of the given operands, deduplicated and canonically ordered.
    #[must_use]
    pub fn or_all(operands: impl IntoIterator<Item = BooleanExpr>) -> Self {
        BooleanExpr::Or(Operands::collect(operands, OR_DELIMITER))
    }

    #[must_use]
    pub fn and(self, other: BooleanExpr) -> Self {
        Self::and_all([self, other])
    }

    #[must_use]
    pub fn or(self, other: BooleanExpr) -> Self {
        Self::or_all([self, other])
    }

    /// Variant rank used as the primary ordering key:
    /// `True < False < Ref < Not < And < Or`.
    fn rank(&self) -> u8 {
        match self {
            BooleanExpr::True => 0,
            BooleanExpr::False => 1,
            BooleanExpr::Ref(_) => 2,
            BooleanExpr::Not(_) => 3,
            BooleanExpr::And(_) => 4,
            BooleanExpr::Or(_) => 5,
        }
    }

    /// Canonical name: the display form and the secondary ordering key.
    /// Refs that are not plain identifiers are quoted, so a name containing
    /// a delimiter cannot pass for a connective.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            BooleanExpr::True => Cow::Borrowed("true"),
            BooleanExpr::False => Cow::Borrowed("false"),
            BooleanExpr::Ref(name) => name_token(name),
            BooleanExpr::Not(inner) => Cow::Owned(format!("!{}", inner.name())),
            BooleanExpr::And(ops) | BooleanExpr::Or(ops) => Cow::Borrowed(&ops.name),
        }
    }

    /// A literal is a `Ref` or the negation of a `Ref`.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        match self {
            BooleanExpr::Ref(_) => true,
            BooleanExpr::Not(inner) => matches!(**inner, BooleanExpr::Ref(_)),
            _ => false,
        }
    }

    /// Whether this expression has the sum-of-products shape produced by
    /// [`normalize`](crate::normalize): a constant, a literal, an `And` of
    /// literals, or an `Or` of literals and `And`s of literals.
    #[must_use]
    pub fn is_dnf(&self) -> bool {
        fn is_product(expr: &BooleanExpr) -> bool {
            match expr {
                BooleanExpr::And(ops) => ops.len() >= 2 && ops.iter().all(BooleanExpr::is_literal),
                other => other.is_literal(),
            }
        }

        match self {
            BooleanExpr::True | BooleanExpr::False => true,
            BooleanExpr::Or(ops) => ops.len() >= 2 && ops.iter().all(is_product),
            other => is_product(other),
        }
    }

    /// Names of every `Ref` reachable in this expression.
    #[must_use]
    pub fn refs(&self) -> BTreeSet<&str> {
        let mut refs = BTreeSet::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut BTreeSet<&'a str>) {
        match self {
            BooleanExpr::Ref(name) => {
                refs.insert(name.as_str());
            }
            BooleanExpr::Not(inner) => inner.collect_refs(refs),
            BooleanExpr::And(ops) | BooleanExpr::Or(ops) => {
                for op in ops {
                    op.collect_refs(refs);
                }
            }
            BooleanExpr::True | BooleanExpr::False => {}
        }
    }

    /// Evaluate with `true_refs` as the set of refs that hold.
    #[must_use]
    pub fn eval(&self, true_refs: &HashSet<String>) -> bool {
        crate::evaluate::eval_expr(self, &|name| true_refs.contains(name))
    }

    /// Evaluate with `is_true` deciding each ref.
    #[must_use]
    pub fn eval_with(&self, is_true: impl Fn(&str) -> bool) -> bool {
        crate::evaluate::eval_expr(self, &is_true)
    }

    /// Rebuild this expression with every `Ref` replaced by `f(name)`.
    /// Operand sets are re-collected, so the result is canonically ordered.
    #[must_use]
    pub(crate) fn substitute(&self, f: &impl Fn(&str) -> BooleanExpr) -> BooleanExpr {
        match self {
            BooleanExpr::True => BooleanExpr::True,
            BooleanExpr::False => BooleanExpr::False,
            BooleanExpr::Ref(name) => f(name),
            BooleanExpr::Not(inner) => !inner.substitute(f),
            BooleanExpr::And(ops) => BooleanExpr::and_all(ops.iter().map(|op| op.substitute(f))),
            BooleanExpr::Or(ops) => BooleanExpr::or_all(ops.iter().map(|op| op.substitute(f))),
        }
    }
}

impl PartialEq for BooleanExpr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BooleanExpr {}

impl PartialOrd for BooleanExpr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BooleanExpr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.name().cmp(&other.name()))
            .then_with(|| self.cmp_structure(other))
    }
}

impl BooleanExpr {
    /// Tie-break for equal names: a nested connective with fewer than two
    /// operands prints the same whether it is an `And` or an `Or`.
    fn cmp_structure(&self, other: &Self) -> Ordering {
        match (self, other) {
            (BooleanExpr::Not(a), BooleanExpr::Not(b)) => a.cmp(b),
            (BooleanExpr::And(a), BooleanExpr::And(b)) | (BooleanExpr::Or(a), BooleanExpr::Or(b)) => {
                a.iter().cmp(b.iter())
            }
            _ => Ordering::Equal,
        }
    }
}

impl Hash for BooleanExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        self.name().hash(state);
    }
}

impl Not for BooleanExpr {
    type Output = BooleanExpr;

    fn not(self) -> BooleanExpr {
        BooleanExpr::Not(Box::new(self))
    }
}

impl fmt::Display for BooleanExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[must_use]
pub fn reference(name: &str) -> BooleanExpr {
    BooleanExpr::Ref(name.to_owned())
}
