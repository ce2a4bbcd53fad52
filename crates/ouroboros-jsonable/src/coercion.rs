//! Coercion rules
//!
//! Reads are lenient: an integer field accepts `123.1` and `"123"`. Writes
//! are strict: an integer field only accepts an integer. The one widening
//! allowed on write is integer to float.

use std::fmt;

use crate::errors::{ProxyError, ProxyResult};
use crate::types::{ContainerKind, Value};

// ============================================================================
// Coercion Type
// ============================================================================

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoercionType {
    /// No check, passthrough
    #[default]
    Any,
    Integer,
    Float,
    String,
    /// Mapping container, passed through by handle
    Mapping,
    /// Sequence container, passed through by handle
    Sequence,
}

impl CoercionType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        }
    }

    /// The container kind this type requires, if any
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Self::Mapping => Some(ContainerKind::Mapping),
            Self::Sequence => Some(ContainerKind::Sequence),
            _ => None,
        }
    }

    /// Read-time coercion of a non-null raw value
    pub fn coerce(&self, raw: Value) -> ProxyResult<Value> {
        match (self, raw) {
            (Self::Any, v) => Ok(v),

            (Self::Integer, Value::Int(n)) => Ok(Value::Int(n)),
            (Self::Integer, Value::Float(f)) => truncate(f).map(Value::Int),
            (Self::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ProxyError::invalid_type(format!("'{}' is not an integer", s))),

            (Self::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
            (Self::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (Self::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ProxyError::invalid_type(format!("'{}' is not a number", s))),

            (Self::String, Value::String(s)) => Ok(Value::String(s)),
            (Self::String, Value::Int(n)) => Ok(Value::String(n.to_string())),
            (Self::String, Value::Float(f)) => Ok(Value::String(float_to_string(f))),

            (Self::Mapping, v @ Value::Object(_)) => Ok(v),
            (Self::Sequence, v @ Value::Array(_)) => Ok(v),

            (expected, other) => Err(mismatch(*expected, &other)),
        }
    }

    /// Write-time exact kind check
    ///
    /// Returns the value to store; only integer-to-float widening changes it.
    pub fn check_write(&self, value: &Value) -> ProxyResult<Value> {
        match (self, value) {
            (Self::Any, v) => Ok(v.clone()),
            (Self::Integer, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::String, Value::String(_))
            | (Self::Mapping, Value::Object(_))
            | (Self::Sequence, Value::Array(_)) => Ok(value.clone()),
            (Self::Float, Value::Int(n)) => Ok(Value::Float(*n as f64)),
            (expected, other) => Err(mismatch(*expected, other)),
        }
    }
}

impl fmt::Display for CoercionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl From<ContainerKind> for CoercionType {
    fn from(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::Mapping => Self::Mapping,
            ContainerKind::Sequence => Self::Sequence,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn mismatch(expected: CoercionType, found: &Value) -> ProxyError {
    ProxyError::invalid_type(format!("expected {}, got {}", expected, found.type_name()))
}

/// Truncate toward zero, rejecting values with no i64 counterpart
fn truncate(f: f64) -> ProxyResult<i64> {
    let t = f.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Ok(t as i64)
    } else {
        Err(ProxyError::invalid_type(format!("{} does not fit an integer", f)))
    }
}

/// Canonical decimal text of a float (`123.0`, `123.1`)
fn float_to_string(f: f64) -> String {
    serde_json::Number::from_f64(f)
        .map(|n| n.to_string())
        .unwrap_or_else(|| f.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_read_coercion() {
        let t = CoercionType::Integer;
        assert_eq!(t.coerce(Value::Int(123)).unwrap(), Value::Int(123));
        assert_eq!(t.coerce(Value::Float(123.1)).unwrap(), Value::Int(123));
        assert_eq!(t.coerce(Value::Float(-123.9)).unwrap(), Value::Int(-123));
        assert_eq!(t.coerce(Value::from("123")).unwrap(), Value::Int(123));
        assert!(t.coerce(Value::from("abc")).is_err());
        assert!(t.coerce(Value::from("123.1")).is_err());
        assert!(t.coerce(Value::Bool(true)).is_err());
        assert!(t.coerce(Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_float_read_coercion() {
        let t = CoercionType::Float;
        assert_eq!(t.coerce(Value::Int(123)).unwrap(), Value::Float(123.0));
        assert_eq!(t.coerce(Value::from("123.1")).unwrap(), Value::Float(123.1));
        assert!(t.coerce(Value::object()).is_err());
    }

    #[test]
    fn test_string_read_coercion() {
        let t = CoercionType::String;
        assert_eq!(t.coerce(Value::Int(123)).unwrap(), Value::from("123"));
        assert_eq!(t.coerce(Value::Float(123.1)).unwrap(), Value::from("123.1"));
        assert_eq!(t.coerce(Value::Float(123.0)).unwrap(), Value::from("123.0"));
        assert!(t.coerce(Value::Bool(false)).is_err());
        assert!(t.coerce(Value::array()).is_err());
    }

    #[test]
    fn test_container_coercion_keeps_identity() {
        let raw = Value::object();
        let coerced = CoercionType::Mapping.coerce(raw.clone()).unwrap();
        assert!(coerced.ptr_eq(&raw));
        assert!(CoercionType::Mapping.coerce(Value::array()).is_err());
        assert!(CoercionType::Sequence.coerce(Value::from("bar")).is_err());
    }

    #[test]
    fn test_write_is_exact() {
        assert!(CoercionType::Integer.check_write(&Value::Float(456.1)).is_err());
        assert!(CoercionType::Integer.check_write(&Value::from("456")).is_err());
        assert!(CoercionType::String.check_write(&Value::Int(456)).is_err());
        assert_eq!(
            CoercionType::Float.check_write(&Value::Int(456)).unwrap(),
            Value::Float(456.0)
        );
        assert!(CoercionType::Any.check_write(&Value::Bool(true)).is_ok());
    }
}
