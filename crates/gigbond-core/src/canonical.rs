//! # Canonical Encoding
//!
//! The event log chains records by hashing their JSON form, so the same
//! record must always encode to the same bytes. [`CanonicalBytes`] is the
//! single place that encoding happens:
//!
//! - object keys come out sorted, with no insignificant whitespace;
//! - fractional numbers are refused, since every amount is an integer;
//! - strings that parse as RFC 3339 are rewritten to whole-second UTC.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CanonicalizationError;
use crate::temporal::Timestamp;

/// Output of the canonical encoder. Only [`CanonicalBytes::new`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Encode `value` canonically. Fails on fractional numbers or when
    /// `serde_json` cannot represent the value.
    pub fn new(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let normalized = normalize(serde_json::to_value(value)?)?;
        serde_json::to_vec(&normalized)
            .map(Self)
            .map_err(CanonicalizationError::from)
    }

    /// Encoded bytes, ready for hashing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a successful encoding; present to pair with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn normalize(value: Value) -> Result<Value, CanonicalizationError> {
    Ok(match value {
        Value::Number(n) if n.is_f64() => {
            return Err(CanonicalizationError::FloatRejected(
                n.as_f64().unwrap_or(f64::NAN),
            ))
        }
        // Map without `preserve_order` is a BTreeMap: collecting sorts.
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, inner)| normalize(inner).map(|inner| (key, inner)))
                .collect::<Result<Map<_, _>, _>>()?,
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(normalize)
                .collect::<Result<_, _>>()?,
        ),
        Value::String(text) => match chrono::DateTime::parse_from_rfc3339(&text) {
            Ok(parsed) => Value::String(
                Timestamp::from_datetime(parsed.with_timezone(&chrono::Utc)).to_canonical_string(),
            ),
            Err(_) => Value::String(text),
        },
        scalar => scalar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn encode(v: Value) -> String {
        String::from_utf8(CanonicalBytes::new(&v).unwrap().as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn nested_keys_sorted_without_spaces() {
        assert_eq!(
            encode(json!({"z": {"b": 2, "a": 1}, "m": [true, null, "x"]})),
            r#"{"m":[true,null,"x"],"z":{"a":1,"b":2}}"#
        );
    }

    #[test]
    fn fractional_numbers_refused_even_when_nested() {
        let err = CanonicalBytes::new(&json!({"outer": [{"amount": 1.5}]})).unwrap_err();
        assert!(matches!(err, CanonicalizationError::FloatRejected(v) if v == 1.5));
    }

    #[test]
    fn rfc3339_strings_rewritten_to_utc_seconds() {
        assert_eq!(
            encode(json!({"at": "2026-01-15T17:00:00.123+05:00", "note": "not a date"})),
            r#"{"at":"2026-01-15T12:00:00Z","note":"not a date"}"#
        );
    }

    proptest! {
        #[test]
        fn insertion_order_is_irrelevant(
            entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..8),
        ) {
            let forward: Map<String, Value> =
                entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let backward: Map<String, Value> =
                entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
            let a = CanonicalBytes::new(&Value::Object(forward)).unwrap();
            let b = CanonicalBytes::new(&Value::Object(backward)).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
