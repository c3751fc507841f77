//! Typed equality and ordering over leaf [`Value`]s.
//!
//! Equality and ordering are only defined between values of the same kind.
//! Mixing kinds, or asking for an ordering of booleans or strings, is reported
//! as a [`CompareError`] instead of guessing.

use std::cmp::Ordering;

use crate::types::{CompareError, Value, ValueKind};

/// Absolute tolerance for non-integral number equality.
pub const NUMBER_TOLERANCE: f64 = 1e-8;

/// Typed equality.
///
/// Numbers that are both exactly integral compare as integers, others within
/// [`NUMBER_TOLERANCE`]. Semantic versions compare by their raw string.
///
/// # Errors
///
/// Returns [`CompareError::NotComparable`] if the values have different kinds.
pub fn eq(a: &Value, b: &Value) -> Result<bool, CompareError> {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Number(a), Value::Number(b)) => Ok(number_eq(*a, *b)),
        (Value::String(a), Value::String(b)) => Ok(a == b),
        (Value::Timestamp(a), Value::Timestamp(b)) => Ok(a == b),
        (Value::SemanticVersion(a), Value::SemanticVersion(b)) => Ok(a == b),
        _ => Err(CompareError::NotComparable {
            left: a.kind(),
            right: b.kind(),
        }),
    }
}

fn number_eq(a: f64, b: f64) -> bool {
    match (exact_integer(a), exact_integer(b)) {
        (Some(a), Some(b)) => a == b,
        _ => (a - b).abs() < NUMBER_TOLERANCE,
    }
}

/// The integer value of `v` if converting to `i64` and back is lossless.
/// `as` saturates, so values outside `[-2^63, 2^63)` are rejected first.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn exact_integer(v: f64) -> Option<i64> {
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    if !(-I64_END..I64_END).contains(&v) {
        return None;
    }
    let i = v as i64;
    (i as f64 == v).then_some(i)
}

/// True if any element of `values` is [`eq`] to `v`.
///
/// # Errors
///
/// Propagates [`CompareError::NotComparable`] from the first kind mismatch.
pub fn contains(values: &[Value], v: &Value) -> Result<bool, CompareError> {
    for candidate in values {
        if eq(candidate, v)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True if any element of `a` is contained in `b`.
///
/// # Errors
///
/// Propagates [`CompareError::NotComparable`] from the first kind mismatch.
pub fn overlap(a: &[Value], b: &[Value]) -> Result<bool, CompareError> {
    for v in a {
        if contains(b, v)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True if any element of `a` is *not* contained in `b_neg`.
///
/// # Errors
///
/// Propagates [`CompareError::NotComparable`] from the first kind mismatch.
pub fn overlap_neg(a: &[Value], b_neg: &[Value]) -> Result<bool, CompareError> {
    for v in a {
        if !contains(b_neg, v)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Strict and non-strict ordering for one orderable [`ValueKind`].
///
/// Obtained from [`order`]; only numbers, timestamps and semantic versions
/// have an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    kind: ValueKind,
}

/// The ordering for values of `kind`.
///
/// # Errors
///
/// Returns [`CompareError::NotOrderable`] for booleans and strings.
pub fn order(kind: ValueKind) -> Result<Order, CompareError> {
    match kind {
        ValueKind::Number | ValueKind::Timestamp | ValueKind::SemanticVersion => Ok(Order { kind }),
        ValueKind::Bool | ValueKind::String => Err(CompareError::NotOrderable { kind }),
    }
}

impl Order {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// `a < b`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::NotComparable`] if either value is not of this
    /// ordering's kind, or [`CompareError::InvalidVersion`] for an
    /// unparseable version.
    pub fn lt(&self, a: &Value, b: &Value) -> Result<bool, CompareError> {
        Ok(self.compare(a, b)? == Some(Ordering::Less))
    }

    /// `a <= b`.
    ///
    /// # Errors
    ///
    /// Same as [`Order::lt`].
    pub fn lte(&self, a: &Value, b: &Value) -> Result<bool, CompareError> {
        Ok(matches!(
            self.compare(a, b)?,
            Some(Ordering::Less | Ordering::Equal)
        ))
    }

    /// `None` when the values are unordered (NaN).
    fn compare(&self, a: &Value, b: &Value) -> Result<Option<Ordering>, CompareError> {
        match (self.kind, a, b) {
            (ValueKind::Number, Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
            (ValueKind::Timestamp, Value::Timestamp(a), Value::Timestamp(b)) => {
                Ok(Some(a.as_nanos().cmp(&b.as_nanos())))
            }
            (ValueKind::SemanticVersion, Value::SemanticVersion(a), Value::SemanticVersion(b)) => {
                Ok(Some(parse_version(a)?.cmp(&parse_version(b)?)))
            }
            _ => Err(CompareError::NotComparable {
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }
}

/// Parse a dotted-numeric version, zero-padding a missing minor or patch
/// component (`"1.2"` -> `1.2.0`).
fn parse_version(raw: &str) -> Result<semver::Version, CompareError> {
    let trimmed = raw.trim();
    if let Ok(version) = semver::Version::parse(trimmed) {
        return Ok(version);
    }

    let core_len = trimmed
        .find(|c| c == '-' || c == '+')
        .unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(core_len);
    let components = core.split('.').count();
    let all_numeric = !core.is_empty()
        && core
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));

    if all_numeric && components < 3 {
        let padded = format!("{core}{}{suffix}", ".0".repeat(3 - components));
        if let Ok(version) = semver::Version::parse(&padded) {
            return Ok(version);
        }
    }

    Err(CompareError::InvalidVersion {
        version: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_equality() {
        assert_eq!(eq(&Value::Number(5.0), &Value::from(5_i64)), Ok(true));
        assert_eq!(eq(&Value::Number(5.000_000_01), &Value::Number(5.0)), Ok(true));
        assert_eq!(eq(&Value::Number(5.1), &Value::Number(5.2)), Ok(false));
        assert_eq!(eq(&Value::Number(-3.0), &Value::Number(-3.0)), Ok(true));
    }

    #[test]
    fn large_integers_compare_exactly() {
        // 2^53 and 2^53 + 2 are both exactly representable and distinct.
        let a = Value::Number(9_007_199_254_740_992.0);
        let b = Value::Number(9_007_199_254_740_994.0);
        assert_eq!(eq(&a, &b), Ok(false));
        assert_eq!(eq(&a, &a), Ok(true));
    }

    #[test]
    fn nan_is_never_equal() {
        assert_eq!(eq(&Value::Number(f64::NAN), &Value::Number(f64::NAN)), Ok(false));
    }

    #[test]
    fn exact_integer_round_trip() {
        assert_eq!(exact_integer(7.0), Some(7));
        assert_eq!(exact_integer(7.5), None);
        assert_eq!(exact_integer(1e30), None);
        assert_eq!(exact_integer(f64::NAN), None);
        assert_eq!(exact_integer(2f64.powi(63)), None);
        assert_eq!(exact_integer(-(2f64.powi(63))), Some(i64::MIN));
        assert_eq!(exact_integer(f64::INFINITY), None);
    }

    #[test]
    fn other_kinds_equality() {
        assert_eq!(eq(&Value::Bool(true), &Value::Bool(true)), Ok(true));
        assert_eq!(eq(&Value::from("a"), &Value::from("b")), Ok(false));
        assert_eq!(
            eq(&Value::timestamp(10, 5), &Value::timestamp(10, 5)),
            Ok(true)
        );
        assert_eq!(
            eq(&Value::timestamp(10, 5), &Value::timestamp(10, 6)),
            Ok(false)
        );
        // raw string compare, not parsed
        assert_eq!(
            eq(&Value::version("1.2"), &Value::version("1.2.0")),
            Ok(false)
        );
    }

    #[test]
    fn mixed_kinds_are_not_comparable() {
        assert_eq!(
            eq(&Value::Bool(true), &Value::from("true")),
            Err(CompareError::NotComparable {
                left: ValueKind::Bool,
                right: ValueKind::String,
            })
        );
    }

    #[test]
    fn contains_and_overlap() {
        let list = [Value::from("a"), Value::from("b")];
        assert_eq!(contains(&list, &Value::from("b")), Ok(true));
        assert_eq!(contains(&list, &Value::from("c")), Ok(false));
        assert_eq!(contains(&[], &Value::from("c")), Ok(false));

        let other = [Value::from("c"), Value::from("a")];
        assert_eq!(overlap(&list, &other), Ok(true));
        assert_eq!(overlap(&list, &[Value::from("z")]), Ok(false));
    }

    #[test]
    fn overlap_neg_finds_excluded_element() {
        let a = [Value::Number(1.0), Value::Number(2.0)];
        assert_eq!(overlap_neg(&a, &[Value::Number(1.0)]), Ok(true));
        assert_eq!(
            overlap_neg(&a, &[Value::Number(1.0), Value::Number(2.0)]),
            Ok(false)
        );
        assert_eq!(overlap_neg(&[], &[Value::Number(1.0)]), Ok(false));
    }

    #[test]
    fn number_order() {
        let ord = order(ValueKind::Number).unwrap();
        assert_eq!(ord.lt(&Value::Number(1.0), &Value::Number(2.0)), Ok(true));
        assert_eq!(ord.lt(&Value::Number(2.0), &Value::Number(2.0)), Ok(false));
        assert_eq!(ord.lte(&Value::Number(2.0), &Value::Number(2.0)), Ok(true));
        assert_eq!(ord.lte(&Value::Number(f64::NAN), &Value::Number(2.0)), Ok(false));
    }

    #[test]
    fn timestamp_order_uses_nanos() {
        let ord = order(ValueKind::Timestamp).unwrap();
        assert_eq!(
            ord.lt(&Value::timestamp(10, 1), &Value::timestamp(10, 2)),
            Ok(true)
        );
        assert_eq!(
            ord.lt(&Value::timestamp(9, 999_999_999), &Value::timestamp(10, 0)),
            Ok(true)
        );
        assert_eq!(
            ord.lte(&Value::timestamp(11, 0), &Value::timestamp(10, 5)),
            Ok(false)
        );
    }

    #[test]
    fn version_order_is_numeric() {
        let ord = order(ValueKind::SemanticVersion).unwrap();
        assert_eq!(
            ord.lt(&Value::version("1.2.0"), &Value::version("1.10.0")),
            Ok(true)
        );
        assert_eq!(
            ord.lt(&Value::version("1.10.0"), &Value::version("1.2.0")),
            Ok(false)
        );
        assert_eq!(
            ord.lte(&Value::version("1.2"), &Value::version("1.2.0")),
            Ok(true)
        );
        assert_eq!(
            ord.lt(&Value::version("2.0.0-beta.1"), &Value::version("2.0.0")),
            Ok(true)
        );
    }

    #[test]
    fn invalid_version() {
        let ord = order(ValueKind::SemanticVersion).unwrap();
        assert_eq!(
            ord.lt(&Value::version("banana"), &Value::version("1.0.0")),
            Err(CompareError::InvalidVersion {
                version: "banana".into()
            })
        );
    }

    #[test]
    fn bool_and_string_are_not_orderable() {
        assert_eq!(
            order(ValueKind::Bool),
            Err(CompareError::NotOrderable {
                kind: ValueKind::Bool
            })
        );
        assert_eq!(
            order(ValueKind::String),
            Err(CompareError::NotOrderable {
                kind: ValueKind::String
            })
        );
    }

    #[test]
    fn order_rejects_wrong_kind() {
        let ord = order(ValueKind::Number).unwrap();
        assert!(matches!(
            ord.lt(&Value::timestamp(1, 0), &Value::Number(2.0)),
            Err(CompareError::NotComparable { .. })
        ));
    }
}
