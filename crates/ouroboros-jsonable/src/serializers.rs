//! serde interop and canonical text
//!
//! `Value` serializes through serde like any other JSON tree. The canonical
//! text used by proxy representations is produced by `serde_json` with a
//! formatter that separates items with `", "` and keys from values with
//! `": "`. Mapping keys are already sorted, so the output is deterministic.

use std::io;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::ser::Formatter;

use crate::types::{Mapping, Sequence, Value};

// ============================================================================
// Serialize
// ============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Object(m) => m.serialize(serializer),
            Value::Array(s) => s.serialize(serializer),
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_entries(|entries| {
            let mut map = serializer.serialize_map(Some(entries.len()))?;
            for (k, v) in entries {
                map.serialize_entry(k, v)?;
            }
            map.end()
        })
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_items(|items| {
            let mut seq = serializer.serialize_seq(Some(items.len()))?;
            for item in items {
                seq.serialize_element(item)?;
            }
            seq.end()
        })
    }
}

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 beyond i64::MAX and all non-integers
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Value {
    /// Copy into an owned `serde_json::Value`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Object(m) => serde_json::Value::Object(m.with_entries(|entries| {
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
            })),
            Value::Array(s) => serde_json::Value::Array(
                s.with_items(|items| items.iter().map(Value::to_json).collect()),
            ),
        }
    }
}

// ============================================================================
// Canonical text
// ============================================================================

/// Compact JSON with a space after each separator
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Render a value as canonical JSON text
///
/// Keys are sorted; non-finite floats render as `null`.
pub fn to_canonical_string(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if value.serialize(&mut ser).is_err() {
        return "null".to_string();
    }
    // serde_json only ever writes valid UTF-8
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_sorted_and_spaced() {
        let v = Value::from(json!({"foo": 123, "bar": 456}));
        assert_eq!(to_canonical_string(&v), r#"{"bar": 456, "foo": 123}"#);
    }

    #[test]
    fn test_canonical_nested() {
        let v = Value::from(json!(["foo", {"b": [1, 2.5], "a": null}]));
        assert_eq!(
            to_canonical_string(&v),
            r#"["foo", {"a": null, "b": [1, 2.5]}]"#
        );
    }

    #[test]
    fn test_float_keeps_fraction() {
        assert_eq!(to_canonical_string(&Value::Float(456.0)), "456.0");
    }

    #[test]
    fn test_json_conversion_preserves_kinds() {
        let original = json!({"i": 1, "f": 1.5, "s": "x", "n": null, "l": [true]});
        let v = Value::from(original.clone());
        assert_eq!(v.to_json(), original);
        let m = v.as_mapping().unwrap();
        assert_eq!(m.get("i"), Some(Value::Int(1)));
        assert_eq!(m.get("f"), Some(Value::Float(1.5)));
    }

    #[test]
    fn test_serialize_through_serde_json() {
        let v = Value::from(json!({"a": [1, 2]}));
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"a":[1,2]}"#);
    }
}
