//! Binary serialization of [`TargetingExpression`] values.
//!
//! A 32-byte fixed header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"TGEX"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! The format version must match exactly; the engine version is
//! informational. Operand sets are stored in canonical order and re-collected
//! on decode, so a decoded expression compares equal to the encoded one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    AttributeCriterion, BooleanExpr, Criterion, EqRule, RangeRule, Rule, SegmentCriterion,
    SetRule, TargetingExpression, Timestamp, Value,
};

const MAGIC: &[u8; 4] = b"TGEX";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

/// Errors that can occur when serializing a [`TargetingExpression`] to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("bincode encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("payload of {0} bytes does not fit the header length field")]
    TooLarge(usize),
}

/// Errors that can occur when deserializing a [`TargetingExpression`] from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("missing TGEX magic bytes")]
    BadMagic,

    #[error("blob uses format v{blob}, this build reads v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("payload does not match its BLAKE3 checksum")]
    ChecksumMismatch,

    #[error("expected {expected} bytes, found {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("bincode decoding failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("invalid targeting expression: {0}")]
    Validation(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedTargeting {
    ref_count: usize,
    expression: SerializedExpr,
    refs: Vec<(String, SerializedCriterion)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedExpr {
    True,
    False,
    Ref(String),
    Not(Box<SerializedExpr>),
    And(Vec<SerializedExpr>),
    Or(Vec<SerializedExpr>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedCriterion {
    Attribute {
        attribute_name: String,
        rule: SerializedRule,
    },
    Segment(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedRule {
    Eq(SerializedValue),
    Set(Vec<SerializedValue>),
    Range([Option<SerializedValue>; 4]),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedValue {
    Bool(bool),
    Number(f64),
    Str(String),
    Timestamp(i64, i32),
    Version(String),
}

fn serialize_expr(expr: &BooleanExpr) -> SerializedExpr {
    match expr {
        BooleanExpr::True => SerializedExpr::True,
        BooleanExpr::False => SerializedExpr::False,
        BooleanExpr::Ref(name) => SerializedExpr::Ref(name.clone()),
        BooleanExpr::Not(inner) => SerializedExpr::Not(Box::new(serialize_expr(inner))),
        BooleanExpr::And(ops) => SerializedExpr::And(ops.iter().map(serialize_expr).collect()),
        BooleanExpr::Or(ops) => SerializedExpr::Or(ops.iter().map(serialize_expr).collect()),
    }
}

fn deserialize_expr(expr: SerializedExpr) -> BooleanExpr {
    match expr {
        SerializedExpr::True => BooleanExpr::True,
        SerializedExpr::False => BooleanExpr::False,
        SerializedExpr::Ref(name) => BooleanExpr::Ref(name),
        SerializedExpr::Not(inner) => !deserialize_expr(*inner),
        SerializedExpr::And(ops) => BooleanExpr::and_all(ops.into_iter().map(deserialize_expr)),
        SerializedExpr::Or(ops) => BooleanExpr::or_all(ops.into_iter().map(deserialize_expr)),
    }
}

fn serialize_value(value: &Value) -> SerializedValue {
    match value {
        Value::Bool(v) => SerializedValue::Bool(*v),
        Value::Number(v) => SerializedValue::Number(*v),
        Value::String(v) => SerializedValue::Str(v.clone()),
        Value::Timestamp(ts) => SerializedValue::Timestamp(ts.seconds, ts.nanos),
        Value::SemanticVersion(v) => SerializedValue::Version(v.clone()),
    }
}

fn deserialize_value(value: SerializedValue) -> Value {
    match value {
        SerializedValue::Bool(v) => Value::Bool(v),
        SerializedValue::Number(v) => Value::Number(v),
        SerializedValue::Str(v) => Value::String(v),
        SerializedValue::Timestamp(seconds, nanos) => Value::Timestamp(Timestamp::new(seconds, nanos)),
        SerializedValue::Version(v) => Value::SemanticVersion(v),
    }
}

fn serialize_criterion(criterion: &Criterion) -> SerializedCriterion {
    match criterion {
        Criterion::Segment(seg) => SerializedCriterion::Segment(seg.segment_name.clone()),
        Criterion::Attribute(attr) => SerializedCriterion::Attribute {
            attribute_name: attr.attribute_name.clone(),
            rule: match &attr.rule {
                Rule::Eq(rule) => SerializedRule::Eq(serialize_value(&rule.value)),
                Rule::Set(rule) => SerializedRule::Set(rule.values.iter().map(serialize_value).collect()),
                Rule::Range(range) => SerializedRule::Range(
                    [
                        &range.start_inclusive,
                        &range.start_exclusive,
                        &range.end_inclusive,
                        &range.end_exclusive,
                    ]
                    .map(|bound| bound.as_ref().map(serialize_value)),
                ),
            },
        },
    }
}

fn deserialize_criterion(criterion: SerializedCriterion) -> Criterion {
    match criterion {
        SerializedCriterion::Segment(segment_name) => {
            Criterion::Segment(SegmentCriterion { segment_name })
        }
        SerializedCriterion::Attribute {
            attribute_name,
            rule,
        } => {
            let rule = match rule {
                SerializedRule::Eq(value) => Rule::Eq(EqRule {
                    value: deserialize_value(value),
                }),
                SerializedRule::Set(values) => Rule::Set(SetRule {
                    values: values.into_iter().map(deserialize_value).collect(),
                }),
                SerializedRule::Range(bounds) => {
                    let [start_inclusive, start_exclusive, end_inclusive, end_exclusive] =
                        bounds.map(|bound| bound.map(deserialize_value));
                    Rule::Range(RangeRule {
                        start_inclusive,
                        start_exclusive,
                        end_inclusive,
                        end_exclusive,
                    })
                }
            };
            Criterion::Attribute(AttributeCriterion {
                attribute_name,
                rule,
            })
        }
    }
}

fn validate(ser: &SerializedTargeting) -> Result<(), DeserializeError> {
    if ser.ref_count != ser.refs.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} refs but payload has {}",
            ser.ref_count,
            ser.refs.len()
        )));
    }
    for window in ser.refs.windows(2) {
        if window[0].0 >= window[1].0 {
            return Err(DeserializeError::Validation(format!(
                "refs not sorted or duplicated at '{}'",
                window[1].0
            )));
        }
    }
    Ok(())
}

/// Every ref reachable in the expression must have a criterion, and every
/// criterion must be reachable.
fn check_refs(
    expression: &BooleanExpr,
    refs: &BTreeMap<String, Criterion>,
) -> Result<(), DeserializeError> {
    let reachable = expression.refs();
    if let Some(missing) = reachable.iter().find(|name| !refs.contains_key(**name)) {
        return Err(DeserializeError::Validation(format!(
            "ref '{missing}' has no criterion"
        )));
    }
    if let Some(unused) = refs.keys().find(|name| !reachable.contains(name.as_str())) {
        return Err(DeserializeError::Validation(format!(
            "criterion '{unused}' is not referenced"
        )));
    }
    Ok(())
}

/// Fixed-size prefix of every blob.
#[derive(Debug, PartialEq, Eq)]
struct Header {
    format_version: u16,
    payload_len: u32,
    checksum: [u8; 16],
}

impl Header {
    fn for_payload(payload: &[u8]) -> Result<Self, SerializeError> {
        let payload_len =
            u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;
        Ok(Self {
            format_version: FORMAT_VERSION,
            payload_len,
            checksum: checksum(payload),
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.format_version.to_le_bytes());
        out.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&self.payload_len.to_le_bytes());
        out.extend_from_slice(&self.checksum);
    }

    /// Parse the header, returning it with the bytes that follow.
    #[allow(clippy::cast_possible_truncation)]
    fn read(bytes: &[u8]) -> Result<(Self, &[u8]), DeserializeError> {
        let Some((head, rest)) = bytes.split_first_chunk::<HEADER_SIZE>() else {
            return Err(DeserializeError::LengthMismatch {
                expected: HEADER_SIZE as u32,
                actual: bytes.len(),
            });
        };
        if !head.starts_with(MAGIC) {
            return Err(DeserializeError::BadMagic);
        }
        let mut checksum = [0; 16];
        checksum.copy_from_slice(&head[16..]);
        let header = Self {
            format_version: u16::from_le_bytes([head[4], head[5]]),
            payload_len: u32::from_le_bytes([head[12], head[13], head[14], head[15]]),
            checksum,
        };
        Ok((header, rest))
    }
}

/// First 16 bytes of the payload's BLAKE3 hash.
fn checksum(payload: &[u8]) -> [u8; 16] {
    let mut out = [0; 16];
    out.copy_from_slice(&blake3::hash(payload).as_bytes()[..16]);
    out
}

pub(crate) fn encode(expr: &TargetingExpression) -> Result<Vec<u8>, SerializeError> {
    let mirror = SerializedTargeting {
        ref_count: expr.refs.len(),
        expression: serialize_expr(&expr.expression),
        refs: expr
            .refs
            .iter()
            .map(|(name, criterion)| (name.clone(), serialize_criterion(criterion)))
            .collect(),
    };
    let payload = bincode::serde::encode_to_vec(&mirror, bincode::config::standard())?;
    let header = Header::for_payload(&payload)?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    header.write(&mut out);
    out.extend(payload);
    Ok(out)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<TargetingExpression, DeserializeError> {
    let (header, payload) = Header::read(bytes)?;
    if header.format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: header.format_version,
            supported: FORMAT_VERSION,
        });
    }
    if payload.len() != header.payload_len as usize {
        return Err(DeserializeError::LengthMismatch {
            expected: header.payload_len,
            actual: payload.len(),
        });
    }
    if checksum(payload) != header.checksum {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (mirror, _): (SerializedTargeting, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    validate(&mirror)?;

    let expression = deserialize_expr(mirror.expression);
    let refs: BTreeMap<String, Criterion> = mirror
        .refs
        .into_iter()
        .map(|(name, criterion)| (name, deserialize_criterion(criterion)))
        .collect();
    check_refs(&expression, &refs)?;

    Ok(TargetingExpression { expression, refs })
}

impl TargetingExpression {
    /// Encode into the binary cache format.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if bincode encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        encode(self)
    }

    /// Decode a blob produced by [`to_bytes()`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] if the header, checksum or payload is
    /// invalid.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        decode(bytes)
    }
}
