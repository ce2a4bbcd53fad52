//! Proxy instances
//!
//! A [`Proxy`] is a typed view over one shared container. It holds no data
//! of its own: every field read and write goes straight to the container,
//! so all proxies over the same container, and the container itself, see
//! each change immediately.

use std::fmt;

use serde::ser::{Serialize, Serializer};

use crate::class::ProxyClass;
use crate::container::{Items, Slice};
use crate::errors::{ProxyError, ProxyResult};
use crate::field::FieldDescriptor;
use crate::serializers::to_canonical_string;
use crate::types::{Container, ContainerKind, Value};
use crate::value::FieldValue;

// ============================================================================
// Jsonable
// ============================================================================

/// Types that are views over a JSON value
pub trait Jsonable {
    /// The underlying value; containers are returned as the same handle
    fn jsonable(&self) -> Value;
}

impl Jsonable for Proxy {
    fn jsonable(&self) -> Value {
        self.container.to_value()
    }
}

// ============================================================================
// Proxy
// ============================================================================

/// Live, validating view over a container
#[derive(Debug, Clone)]
pub struct Proxy {
    class: ProxyClass,
    container: Container,
}

impl Proxy {
    pub(crate) fn new(class: ProxyClass, container: Container) -> Self {
        Self { class, container }
    }

    pub fn class(&self) -> &ProxyClass {
        &self.class
    }

    /// The wrapped container handle
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn kind(&self) -> ContainerKind {
        self.container.kind()
    }

    /// True when both proxies wrap the very same container
    pub fn ptr_eq(&self, other: &Proxy) -> bool {
        self.container.ptr_eq(&other.container)
    }

    /// A proxy of `class` over the same container
    pub fn cast(&self, class: &ProxyClass) -> ProxyResult<Proxy> {
        class.wrap(self.jsonable())
    }

    // ------------------------------------------------------------------------
    // field access
    // ------------------------------------------------------------------------

    fn descriptor(&self, name: &str) -> ProxyResult<&FieldDescriptor> {
        self.class
            .field(name)
            .ok_or_else(|| ProxyError::no_such_capability(self.class.name(), format!("field '{}'", name)))
    }

    /// Read a field
    pub fn get(&self, name: &str) -> ProxyResult<FieldValue> {
        self.descriptor(name)?.get(&self.container)
    }

    /// Write a field; a null value unsets an optional field
    pub fn set(&self, name: &str, value: impl Into<FieldValue>) -> ProxyResult<()> {
        self.descriptor(name)?.set(&self.container, value.into())
    }

    /// Unset an optional field
    pub fn delete(&self, name: &str) -> ProxyResult<()> {
        self.descriptor(name)?.delete(&self.container)
    }

    // ------------------------------------------------------------------------
    // container mode
    // ------------------------------------------------------------------------

    pub fn len(&self) -> ProxyResult<usize> {
        self.class.ops().len(self)
    }

    pub fn is_empty(&self) -> ProxyResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Keys of a mapping, items of a sequence
    pub fn iter(&self) -> ProxyResult<Items> {
        self.class.ops().iter(self)
    }

    pub fn contains(&self, probe: impl Into<FieldValue>) -> ProxyResult<bool> {
        self.class.ops().contains(self, &probe.into())
    }

    /// Look up a mapping key or sequence index
    pub fn item(&self, key: impl Into<FieldValue>) -> ProxyResult<FieldValue> {
        self.class.ops().item(self, &key.into())
    }

    pub fn set_item(
        &self,
        key: impl Into<FieldValue>,
        value: impl Into<FieldValue>,
    ) -> ProxyResult<()> {
        self.class.ops().set_item(self, &key.into(), value.into())
    }

    pub fn del_item(&self, key: impl Into<FieldValue>) -> ProxyResult<()> {
        self.class.ops().del_item(self, &key.into())
    }

    pub fn slice(&self, slice: impl Into<Slice>) -> ProxyResult<Vec<FieldValue>> {
        self.class.ops().slice(self, slice.into())
    }

    pub fn set_slice<I, V>(&self, slice: impl Into<Slice>, values: I) -> ProxyResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.class.ops().set_slice(self, slice.into(), values)
    }

    pub fn del_slice(&self, slice: impl Into<Slice>) -> ProxyResult<()> {
        self.class.ops().del_slice(self, slice.into())
    }
}

impl PartialEq for Proxy {
    /// Related classes and deeply equal containers
    fn eq(&self, other: &Self) -> bool {
        (self.class.is_a(&other.class) || other.class.is_a(&self.class))
            && self.container == other.container
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_container() || self.class.is_fieldless() {
            return write!(
                f,
                "{}({})",
                self.class.name(),
                to_canonical_string(&self.jsonable())
            );
        }
        write!(f, "{}(", self.class.name())?;
        for (i, field) in self.class.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match field.get(&self.container) {
                Ok(value) => write!(f, "{}={}", field.name(), value)?,
                Err(e) => write!(f, "{}=<{}>", field.name(), e.kind())?,
            }
        }
        f.write_str(")")
    }
}

impl Serialize for Proxy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.jsonable().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::types::Mapping;
    use serde_json::json;

    fn foo_class() -> ProxyClass {
        ProxyClass::builder("Foo", ContainerKind::Mapping)
            .field(Field::new("id").integer())
            .field(Field::new("name").string().optional())
            .build()
            .unwrap()
    }

    #[test]
    fn test_writes_reach_container() {
        let m: Mapping = [("id", 1)].into_iter().collect();
        let foo = foo_class().wrap(m.clone()).unwrap();
        foo.set("name", "bar").unwrap();
        assert_eq!(m.get("name"), Some(Value::from("bar")));
        assert!(foo.jsonable().ptr_eq(&Value::Object(m)));
    }

    #[test]
    fn test_unknown_field() {
        let foo = foo_class().wrap_json(json!({"id": 1})).unwrap();
        let err = foo.get("nope").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NoSuchCapability);
    }

    #[test]
    fn test_field_repr() {
        let foo = foo_class().wrap_json(json!({"id": 1, "name": "x"})).unwrap();
        assert_eq!(foo.to_string(), r#"Foo(id=1, name="x")"#);
    }

    #[test]
    fn test_fieldless_repr() {
        let class = ProxyClass::builder("Foo", ContainerKind::Mapping)
            .build()
            .unwrap();
        let foo = class.wrap_json(json!({"foo": 123, "bar": 456})).unwrap();
        assert_eq!(foo.to_string(), r#"Foo({"bar": 456, "foo": 123})"#);
    }

    #[test]
    fn test_equality_is_structural() {
        let class = foo_class();
        let a = class.wrap_json(json!({"id": 1})).unwrap();
        let b = class.wrap_json(json!({"id": 1})).unwrap();
        let c = class.wrap_json(json!({"id": 2})).unwrap();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn test_non_container_has_no_length() {
        let foo = foo_class().wrap_json(json!({"id": 1})).unwrap();
        assert_eq!(foo.len().unwrap_err().kind(), crate::ErrorKind::NoSuchCapability);
        assert!(foo.iter().is_err());
        assert!(foo.item("id").is_err());
    }
}
