//! Core value model
//!
//! This module defines the JSON value type that proxies read and write.
//! Containers (`Mapping`, `Sequence`) are shared handles: cloning one aliases
//! the same underlying storage, so every proxy over a container sees every
//! mutation immediately.
//!
//! Handles are `Rc<RefCell<_>>` and therefore neither `Send` nor `Sync`.
//! Callers that need to share a document across threads must keep it behind
//! their own synchronization and hand out proxies on one thread only.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::rc::Rc;
use std::str::FromStr;

use crate::errors::{ProxyError, ProxyResult};

// ============================================================================
// Value Enum - JSON values backing a proxy
// ============================================================================

/// A JSON value whose containers are shared, mutable handles
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// String value
    String(String),
    /// Mapping from string key to value
    Object(Mapping),
    /// Ordered sequence of values
    Array(Sequence),
}

impl Value {
    /// Get human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Create an empty mapping value
    pub fn object() -> Self {
        Self::Object(Mapping::new())
    }

    /// Create an empty sequence value
    pub fn array() -> Self {
        Self::Array(Sequence::new())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Array(s) => Some(s),
            _ => None,
        }
    }

    /// Identity comparison for containers
    ///
    /// Returns true when both values are handles to the same mapping or
    /// sequence. Scalars are never identical.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Copy the value into freshly allocated containers
    pub fn deep_clone(&self) -> Value {
        match self {
            Self::Object(m) => Self::Object(m.deep_clone()),
            Self::Array(s) => Self::Array(s.deep_clone()),
            other => other.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Self::Object(m)
    }
}

impl From<Sequence> for Value {
    fn from(s: Sequence) -> Self {
        Self::Array(s)
    }
}

// ============================================================================
// Mapping - shared string-keyed container
// ============================================================================

/// Shared handle to a string-keyed container
///
/// Keys are kept in sorted order, which makes iteration deterministic and
/// lets iteration resume from the last key seen.
#[derive(Clone, Default)]
pub struct Mapping(Rc<RefCell<BTreeMap<String, Value>>>);

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Get the value stored under `key`
    ///
    /// Containers come back as handles to the same storage.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        self.0.borrow_mut().insert(key, value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    /// Snapshot of the current keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// The first key strictly after `after`, or the first key when `None`
    pub fn key_after(&self, after: Option<&str>) -> Option<String> {
        let map = self.0.borrow();
        match after {
            None => map.keys().next().cloned(),
            Some(last) => map
                .range::<str, _>((Bound::Excluded(last), Bound::Unbounded))
                .next()
                .map(|(k, _)| k.clone()),
        }
    }

    /// Run `f` over the entries without cloning them
    pub fn with_entries<R>(&self, f: impl FnOnce(&BTreeMap<String, Value>) -> R) -> R {
        f(&self.0.borrow())
    }

    /// True when both handles point at the same storage
    pub fn ptr_eq(&self, other: &Mapping) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn deep_clone(&self) -> Mapping {
        let copied = self
            .0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.deep_clone()))
            .collect();
        Mapping(Rc::new(RefCell::new(copied)))
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Mapping(Rc::new(RefCell::new(map)))
    }
}

// ============================================================================
// Sequence - shared index-addressed container
// ============================================================================

/// Shared handle to an ordered, index-addressed container
#[derive(Clone, Default)]
pub struct Sequence(Rc<RefCell<Vec<Value>>>);

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replace the value at `index`, returning the previous one
    ///
    /// Returns `None` without touching the sequence when `index` is out of
    /// range.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        let slot = items.get_mut(index)?;
        Some(std::mem::replace(slot, value.into()))
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Remove and return the value at `index`, if in range
    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        (index < items.len()).then(|| items.remove(index))
    }

    /// Replace `start..end` with `values`
    ///
    /// Bounds are clamped to the current length.
    pub fn splice(&self, start: usize, end: usize, values: Vec<Value>) {
        let mut items = self.0.borrow_mut();
        let len = items.len();
        let start = start.min(len);
        let end = end.clamp(start, len);
        items.splice(start..end, values);
    }

    /// Deep-equality membership test
    pub fn contains(&self, value: &Value) -> bool {
        self.0.borrow().iter().any(|item| item == value)
    }

    /// Snapshot of the current items
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Run `f` over the items without cloning them
    pub fn with_items<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.0.borrow())
    }

    /// True when both handles point at the same storage
    pub fn ptr_eq(&self, other: &Sequence) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn deep_clone(&self) -> Sequence {
        let copied = self.0.borrow().iter().map(Value::deep_clone).collect();
        Sequence(Rc::new(RefCell::new(copied)))
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

impl<V: Into<Value>> FromIterator<V> for Sequence {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let items = iter.into_iter().map(Into::into).collect();
        Sequence(Rc::new(RefCell::new(items)))
    }
}

// ============================================================================
// Container - the raw storage a proxy wraps
// ============================================================================

/// Container kinds a proxy class can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// String-keyed container; fields are addressed by key
    Mapping,
    /// Index-addressed container; fields are addressed by position
    Sequence,
}

impl ContainerKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        }
    }

    /// Kind of a raw value, if it is a container at all
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => Some(Self::Mapping),
            Value::Array(_) => Some(Self::Sequence),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ContainerKind {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapping" | "dict" | "object" => Ok(Self::Mapping),
            "sequence" | "list" | "array" => Ok(Self::Sequence),
            other => Err(ProxyError::declaration(
                other,
                format!("'{}' is not a recognized container kind", other),
            )),
        }
    }
}

/// The raw container behind a proxy
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    Mapping(Mapping),
    Sequence(Sequence),
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Mapping(_) => ContainerKind::Mapping,
            Self::Sequence(_) => ContainerKind::Sequence,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Mapping(m) => m.len(),
            Self::Sequence(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The container as a value (a handle to the same storage)
    pub fn to_value(&self) -> Value {
        match self {
            Self::Mapping(m) => Value::Object(m.clone()),
            Self::Sequence(s) => Value::Array(s.clone()),
        }
    }

    /// Accept a raw value as a container of the expected kind
    pub fn from_value(value: Value, expected: ContainerKind) -> ProxyResult<Self> {
        match (value, expected) {
            (Value::Object(m), ContainerKind::Mapping) => Ok(Self::Mapping(m)),
            (Value::Array(s), ContainerKind::Sequence) => Ok(Self::Sequence(s)),
            (other, expected) => Err(ProxyError::invalid_type(format!(
                "expected {} container, got {}",
                expected,
                other.type_name()
            ))),
        }
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        match (self, other) {
            (Self::Mapping(a), Self::Mapping(b)) => a.ptr_eq(b),
            (Self::Sequence(a), Self::Sequence(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
