//! Format capability
//!
//! A [`Format`] converts between a native Rust value and its JSON
//! representation. Fields and container-mode proxies call `parse` on read
//! and `format` on write. Formats only ever see one native type; handing a
//! value of any other type to a format-backed slot is an `InvalidType`
//! failure raised before the format runs.
//!
//! With the `formats` feature (default) this module also provides
//! [`UuidFormat`] and [`DateTimeFormat`].

use std::any::Any;
use std::fmt;

use crate::errors::{ProxyError, ProxyResult};
use crate::types::Value;
use crate::value::FieldValue;

// ============================================================================
// Format Trait
// ============================================================================

/// Two-way conversion between a native value and a JSON value
pub trait Format: 'static {
    /// The native type this format produces and accepts
    type Native: Any + fmt::Debug + PartialEq;

    /// Convert a native value to its JSON representation
    fn format(&self, native: &Self::Native) -> ProxyResult<Value>;

    /// Parse a JSON value into the native type
    ///
    /// Malformed input should fail with [`ProxyError::invalid_value`].
    fn parse(&self, raw: &Value) -> ProxyResult<Self::Native>;
}

/// Type-erased format used by descriptors and container adapters
pub(crate) trait DynFormat {
    fn format_dyn(&self, value: &FieldValue) -> ProxyResult<Value>;
    fn parse_dyn(&self, raw: &Value) -> ProxyResult<FieldValue>;
    fn native_name(&self) -> &'static str;
}

impl<F: Format> DynFormat for F {
    fn format_dyn(&self, value: &FieldValue) -> ProxyResult<Value> {
        let native = value.downcast_ref::<F::Native>().ok_or_else(|| {
            ProxyError::invalid_type(format!(
                "expected {}, got {}",
                self.native_name(),
                value.type_name()
            ))
        })?;
        self.format(native)
    }

    fn parse_dyn(&self, raw: &Value) -> ProxyResult<FieldValue> {
        self.parse(raw).map(FieldValue::native)
    }

    fn native_name(&self) -> &'static str {
        std::any::type_name::<F::Native>()
    }
}

// ============================================================================
// Built-in Formats
// ============================================================================

#[cfg(feature = "formats")]
pub use builtin::{DateTimeFormat, UuidFormat};

#[cfg(feature = "formats")]
mod builtin {
    use chrono::{NaiveDate, NaiveDateTime, Timelike};
    use once_cell::sync::Lazy;
    use regex::Regex;
    use uuid::Uuid;

    use super::Format;
    use crate::errors::{ProxyError, ProxyResult};
    use crate::types::Value;

    /// `YYYY-MM-DD HH:MM:SS[.ffffff]`, with `T` also accepted as separator
    static DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,6}))?$")
            .expect("datetime pattern is valid")
    });

    fn expect_str<'a>(raw: &'a Value, what: &str) -> ProxyResult<&'a str> {
        raw.as_str().ok_or_else(|| {
            ProxyError::invalid_type(format!("{} must be a string, got {}", what, raw.type_name()))
        })
    }

    /// UUIDs stored as lowercase hyphenated strings
    ///
    /// # Example
    /// ```
    /// use ouroboros_jsonable::formats::{Format, UuidFormat};
    /// use ouroboros_jsonable::Value;
    ///
    /// let id = UuidFormat.parse(&Value::from("27d861ac-f27e-4ef5-81af-99d2fcd976a6")).unwrap();
    /// assert_eq!(UuidFormat.format(&id).unwrap(), Value::from("27d861ac-f27e-4ef5-81af-99d2fcd976a6"));
    /// assert!(UuidFormat.parse(&Value::from("invalid")).is_err());
    /// ```
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UuidFormat;

    impl Format for UuidFormat {
        type Native = Uuid;

        fn format(&self, native: &Uuid) -> ProxyResult<Value> {
            Ok(Value::String(native.hyphenated().to_string()))
        }

        fn parse(&self, raw: &Value) -> ProxyResult<Uuid> {
            let s = expect_str(raw, "uuid")?;
            Uuid::parse_str(s)
                .map_err(|e| ProxyError::invalid_value(format!("malformed uuid '{}': {}", s, e)))
        }
    }

    /// Naive timestamps stored as `YYYY-MM-DD HH:MM:SS[.ffffff]`
    ///
    /// Microseconds are written only when non-zero; precision beyond
    /// microseconds is truncated on write.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DateTimeFormat;

    impl Format for DateTimeFormat {
        type Native = NaiveDateTime;

        fn format(&self, native: &NaiveDateTime) -> ProxyResult<Value> {
            let text = if native.nanosecond() / 1_000 == 0 {
                native.format("%Y-%m-%d %H:%M:%S").to_string()
            } else {
                native.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
            };
            Ok(Value::String(text))
        }

        fn parse(&self, raw: &Value) -> ProxyResult<NaiveDateTime> {
            let s = expect_str(raw, "timestamp")?;
            let malformed = || ProxyError::invalid_value(format!("malformed timestamp '{}'", s));
            let caps = DATETIME_REGEX.captures(s).ok_or_else(malformed)?;

            let num = |i: usize| -> u32 { caps[i].parse().unwrap_or(u32::MAX) };
            let year: i32 = caps[1].parse().map_err(|_| malformed())?;
            let micros = match caps.get(7) {
                Some(frac) => {
                    let digits = format!("{:0<6}", frac.as_str());
                    digits.parse::<u32>().map_err(|_| malformed())?
                }
                None => 0,
            };

            NaiveDate::from_ymd_opt(year, num(2), num(3))
                .and_then(|date| date.and_hms_micro_opt(num(4), num(5), num(6), micros))
                .ok_or_else(malformed)
        }
    }
}

#[cfg(all(test, feature = "formats"))]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_uuid_round_trip() {
        let id = Uuid::parse_str("b827a618-ac92-4de7-a12a-29c457de3000").unwrap();
        let raw = UuidFormat.format(&id).unwrap();
        assert_eq!(raw, Value::from("b827a618-ac92-4de7-a12a-29c457de3000"));
        assert_eq!(UuidFormat.parse(&raw).unwrap(), id);
    }

    #[test]
    fn test_uuid_rejects_malformed() {
        let err = UuidFormat.parse(&Value::from("invalid")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidValue);
        let err = UuidFormat.parse(&Value::Int(1)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidType);
    }

    #[test]
    fn test_datetime_format_with_and_without_micros() {
        let date = NaiveDate::from_ymd_opt(2017, 3, 4).unwrap();
        let whole = date.and_hms_opt(5, 6, 7).unwrap();
        let fractional = date.and_hms_micro_opt(5, 6, 7, 890).unwrap();

        assert_eq!(
            DateTimeFormat.format(&whole).unwrap(),
            Value::from("2017-03-04 05:06:07")
        );
        assert_eq!(
            DateTimeFormat.format(&fractional).unwrap(),
            Value::from("2017-03-04 05:06:07.000890")
        );
        assert_eq!(
            DateTimeFormat.parse(&Value::from("2017-03-04 05:06:07.000890")).unwrap(),
            fractional
        );
        assert_eq!(
            DateTimeFormat.parse(&Value::from("2017-03-04T05:06:07")).unwrap(),
            whole
        );
    }

    #[test]
    fn test_datetime_rejects_malformed() {
        assert!(DateTimeFormat.parse(&Value::from("2017-13-04 05:06:07")).is_err());
        assert!(DateTimeFormat.parse(&Value::from("04/03/2017")).is_err());
    }

    #[test]
    fn test_dyn_format_type_mismatch() {
        let err = UuidFormat.format_dyn(&FieldValue::from("not-a-uuid")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidType);
    }
}
