//! Values flowing through field accessors
//!
//! A field read can produce a plain JSON value, a native value produced by a
//! [`Format`](crate::formats::Format), or a nested proxy. `FieldValue` covers
//! all three; writes take the same type.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::proxy::Proxy;
use crate::serializers::to_canonical_string;
use crate::types::{Mapping, Sequence, Value};

// ============================================================================
// Native - type-erased format output
// ============================================================================

/// Object-safe view of a native value
pub trait NativeObject: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn NativeObject) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug + PartialEq> NativeObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn NativeObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A native value produced by a format's `parse`
#[derive(Clone)]
pub struct Native(Rc<dyn NativeObject>);

impl Native {
    pub fn new<T: Any + fmt::Debug + PartialEq>(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn type_name(&self) -> &'static str {
        (*self.0).type_name()
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        (*self.0).dyn_eq(&*other.0)
    }
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

// ============================================================================
// FieldValue
// ============================================================================

/// A value read from or written to a proxy
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain JSON value (containers are shared handles)
    Value(Value),
    /// Native value from a format
    Native(Native),
    /// Nested proxy over a sub-container
    Proxy(Proxy),
}

impl FieldValue {
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// Wrap an arbitrary native value
    ///
    /// `Value`, `Proxy` and the JSON scalar types (`String`, `i64`, `f64`,
    /// `bool`) land in their own variants so the result compares equal to
    /// values read back from a proxy.
    pub fn native<T: Any + fmt::Debug + PartialEq>(value: T) -> Self {
        let any: &dyn Any = &value;
        if let Some(v) = any.downcast_ref::<Value>() {
            return Self::Value(v.clone());
        }
        if let Some(s) = any.downcast_ref::<String>() {
            return Self::Value(Value::String(s.clone()));
        }
        if let Some(n) = any.downcast_ref::<i64>() {
            return Self::Value(Value::Int(*n));
        }
        if let Some(f) = any.downcast_ref::<f64>() {
            return Self::Value(Value::Float(*f));
        }
        if let Some(b) = any.downcast_ref::<bool>() {
            return Self::Value(Value::Bool(*b));
        }
        if let Some(p) = any.downcast_ref::<Proxy>() {
            return Self::Proxy(p.clone());
        }
        Self::Native(Native::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Self::Proxy(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_proxy(self) -> Option<Proxy> {
        match self {
            Self::Proxy(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow the native value as `T`
    ///
    /// Plain scalars also borrow as their Rust type: a JSON string as
    /// `String`, an integer as `i64`, a float as `f64`, a boolean as `bool`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Native(n) => n.downcast_ref::<T>(),
            Self::Value(v) => {
                let scalar: Option<&dyn Any> = match v {
                    Value::String(s) => Some(s as &dyn Any),
                    Value::Int(n) => Some(n as &dyn Any),
                    Value::Float(f) => Some(f as &dyn Any),
                    Value::Bool(b) => Some(b as &dyn Any),
                    _ => None,
                };
                scalar
                    .and_then(|s| s.downcast_ref::<T>())
                    .or_else(|| (v as &dyn Any).downcast_ref::<T>())
            }
            Self::Proxy(p) => (p as &dyn Any).downcast_ref::<T>(),
        }
    }

    /// Short description of the runtime kind, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Value(v) => v.type_name(),
            Self::Native(n) => n.type_name(),
            Self::Proxy(_) => "proxy",
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(&to_canonical_string(v)),
            Self::Native(n) => write!(f, "{:?}", n),
            Self::Proxy(p) => write!(f, "{}", p),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

macro_rules! field_value_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

field_value_from_value!(bool, i32, i64, f64, &str, String, Mapping, Sequence);

impl From<usize> for FieldValue {
    fn from(n: usize) -> Self {
        Self::Value(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Proxy> for FieldValue {
    fn from(p: Proxy) -> Self {
        Self::Proxy(p)
    }
}

impl From<&Proxy> for FieldValue {
    fn from(p: &Proxy) -> Self {
        Self::Proxy(p.clone())
    }
}

impl From<Native> for FieldValue {
    fn from(n: Native) -> Self {
        Self::Native(n)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}
