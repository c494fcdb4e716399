//! Conversion between this engine's untyped [`Record`] model and
//! DynamoDB's typed attribute values.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use dynasql_common::{Error, Result};

use crate::value::{Record, RecordValue};

/// The four attribute shapes this engine cares about for column-type
/// discovery. Defaults to `S` when none of N/BOOL/B applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    S,
    N,
    Bool,
    B,
}

/// Converts a [`Record`] into the store's typed attribute map.
///
/// # Errors
/// Returns [`Error::Codec`] if a value has no representation in the
/// store's attribute model (currently only non-finite floats, which have
/// no decimal-string form DynamoDB's `N` type accepts).
pub fn encode(record: &Record) -> Result<HashMap<String, AttributeValue>> {
    record
        .iter()
        .map(|(name, value)| Ok((name.clone(), encode_value(value)?)))
        .collect()
}

/// Converts a single [`RecordValue`] into a typed attribute value.
pub fn encode_value(value: &RecordValue) -> Result<AttributeValue> {
    Ok(match value {
        RecordValue::String(s) => AttributeValue::S(s.clone()),
        RecordValue::Integer(i) => AttributeValue::N(i.to_string()),
        RecordValue::Float(f) => {
            if !f.is_finite() {
                return Err(Error::Codec(format!("non-finite float {f} has no DynamoDB N representation")));
            }
            AttributeValue::N(f.to_string())
        }
        RecordValue::Bool(b) => AttributeValue::Bool(*b),
        RecordValue::Bytes(bytes) => AttributeValue::B(Blob::new(bytes.clone())),
        RecordValue::List(items) => {
            let encoded = items.iter().map(encode_value).collect::<Result<Vec<_>>>()?;
            AttributeValue::L(encoded)
        }
        RecordValue::Map(map) => AttributeValue::M(encode(map)?),
        RecordValue::Null => AttributeValue::Null(true),
    })
}

/// Converts the store's typed attribute map back into a [`Record`].
#[must_use]
pub fn decode(item: &HashMap<String, AttributeValue>) -> Record {
    item.iter().map(|(name, value)| (name.clone(), decode_value(value))).collect()
}

fn decode_value(value: &AttributeValue) -> RecordValue {
    match value {
        AttributeValue::S(s) => RecordValue::String(s.clone()),
        AttributeValue::N(n) => decode_number(n),
        AttributeValue::Bool(b) => RecordValue::Bool(*b),
        AttributeValue::B(b) => RecordValue::Bytes(b.clone().into_inner()),
        AttributeValue::L(items) => RecordValue::List(items.iter().map(decode_value).collect()),
        AttributeValue::M(map) => RecordValue::Map(decode(map)),
        AttributeValue::Null(_) => RecordValue::Null,
        // Sets and other variants are outside this engine's data model;
        // decode conservatively rather than panicking on unexpected items.
        _ => RecordValue::Null,
    }
}

/// Numbers travel as decimal strings; integral vs. fractional is
/// recovered by checking for a `.` or exponent marker.
fn decode_number(raw: &str) -> RecordValue {
    if raw.contains('.') || raw.contains('e') || raw.contains('E') {
        raw.parse::<f64>().map(RecordValue::Float).unwrap_or(RecordValue::Null)
    } else {
        raw.parse::<i64>()
            .map(RecordValue::Integer)
            .unwrap_or_else(|_| raw.parse::<f64>().map(RecordValue::Float).unwrap_or(RecordValue::Null))
    }
}

/// Best-effort type tag for a single attribute value, used during column
/// discovery.
#[must_use]
pub fn type_tag(value: &AttributeValue) -> TypeTag {
    match value {
        AttributeValue::N(_) => TypeTag::N,
        AttributeValue::Bool(_) => TypeTag::Bool,
        AttributeValue::B(_) => TypeTag::B,
        _ => TypeTag::S,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars() {
        let mut record = Record::new();
        record.insert("name".into(), RecordValue::String("A0".into()));
        record.insert("year".into(), RecordValue::Integer(2000));
        record.insert("price".into(), RecordValue::Float(0.5));
        record.insert("active".into(), RecordValue::Bool(true));
        record.insert("missing".into(), RecordValue::Null);

        let encoded = encode(&record).unwrap();
        let decoded = decode(&encoded);
        assert_eq!(decoded, record);
    }

    #[test]
    fn integral_number_decodes_as_integer() {
        let decoded = decode_number("2000");
        assert_eq!(decoded, RecordValue::Integer(2000));
    }

    #[test]
    fn fractional_number_decodes_as_float() {
        let decoded = decode_number("0.5");
        assert_eq!(decoded, RecordValue::Float(0.5));
    }

    #[test]
    fn exponent_number_decodes_as_float() {
        let decoded = decode_number("1.5e3");
        assert!(matches!(decoded, RecordValue::Float(_)));
    }

    #[test]
    fn non_finite_float_is_a_codec_error() {
        let mut record = Record::new();
        record.insert("x".into(), RecordValue::Float(f64::NAN));
        let err = encode(&record).unwrap_err();
        assert_eq!(err.kind(), dynasql_common::ErrorKind::Codec);
    }

    #[test]
    fn type_tag_defaults_to_string() {
        assert_eq!(type_tag(&AttributeValue::S("x".into())), TypeTag::S);
        assert_eq!(type_tag(&AttributeValue::N("1".into())), TypeTag::N);
        assert_eq!(type_tag(&AttributeValue::Bool(true)), TypeTag::Bool);
        assert_eq!(type_tag(&AttributeValue::Null(true)), TypeTag::S);
    }
}
