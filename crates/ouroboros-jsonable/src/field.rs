//! Field declarations and the per-slot accessor pipeline
//!
//! A [`Field`] is what users declare. When a class is built each field is
//! resolved into a [`FieldDescriptor`] bound to a concrete storage address,
//! and every proxy read, write and delete for that name runs through the
//! descriptor's `get`, `set` and `delete`.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::class::ProxyClass;
use crate::coercion::CoercionType;
use crate::errors::{ProxyError, ProxyResult};
use crate::formats::{DynFormat, Format};
use crate::proxy::Jsonable;
use crate::types::{Container, Value};
use crate::value::FieldValue;

/// Validity check evaluated on every read and write of a field
pub type Predicate = Rc<dyn Fn(&FieldValue) -> bool>;

// ============================================================================
// Storage Address
// ============================================================================

/// Where a field lives in its container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Key in a mapping container
    Key(String),
    /// Position in a sequence container
    Index(usize),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "key {:?}", key),
            Self::Index(index) => write!(f, "index {}", index),
        }
    }
}

// ============================================================================
// Field - declaration builder
// ============================================================================

/// Declaration of one proxy field
///
/// # Example
///
/// ```
/// use ouroboros_jsonable::{ContainerKind, Field, ProxyClass};
///
/// let user = ProxyClass::builder("User", ContainerKind::Mapping)
///     .field(Field::new("id").integer())
///     .field(Field::new("name").string().optional())
///     .field(Field::new("age").integer().predicate(|v| v.as_i64().is_some_and(|n| n >= 0)))
///     .build()
///     .unwrap();
/// assert_eq!(user.fields().len(), 3);
/// ```
#[derive(Clone)]
pub struct Field {
    name: String,
    key: Option<String>,
    index: Option<usize>,
    coercion: Option<CoercionType>,
    optional: bool,
    predicate: Option<Predicate>,
    proxy: Option<ProxyClass>,
    format: Option<Rc<dyn DynFormat>>,
}

impl Field {
    /// Create a required, untyped field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            index: None,
            coercion: None,
            optional: false,
            predicate: None,
            proxy: None,
            format: None,
        }
    }

    /// Set the declared coercion type
    pub fn of_type(mut self, coercion: CoercionType) -> Self {
        self.coercion = Some(coercion);
        self
    }

    pub fn integer(self) -> Self {
        self.of_type(CoercionType::Integer)
    }

    pub fn float(self) -> Self {
        self.of_type(CoercionType::Float)
    }

    pub fn string(self) -> Self {
        self.of_type(CoercionType::String)
    }

    pub fn mapping(self) -> Self {
        self.of_type(CoercionType::Mapping)
    }

    pub fn sequence(self) -> Self {
        self.of_type(CoercionType::Sequence)
    }

    /// Allow null / absent values
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Store under `key` instead of the field name (mapping classes)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Store at a fixed position instead of the declaration position
    /// (sequence classes)
    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Reject values for which `predicate` returns false
    pub fn predicate(mut self, predicate: impl Fn(&FieldValue) -> bool + 'static) -> Self {
        self.predicate = Some(Rc::new(predicate));
        self
    }

    /// Wrap the stored sub-container in `class` on read
    pub fn proxy(mut self, class: &ProxyClass) -> Self {
        self.proxy = Some(class.clone());
        self
    }

    /// Convert through `format` on read and write
    pub fn format<F: Format>(mut self, format: F) -> Self {
        self.format = Some(Rc::new(format));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key_override(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub(crate) fn index_override(&self) -> Option<usize> {
        self.index
    }

    /// The effective coercion type
    ///
    /// A nested proxy without an explicit type implies the proxy's container
    /// kind; an explicit type that disagrees with it is a declaration error.
    pub fn coercion_type(&self) -> ProxyResult<CoercionType> {
        match (&self.proxy, self.coercion) {
            (None, declared) => Ok(declared.unwrap_or_default()),
            (Some(class), None) => Ok(class.kind().into()),
            (Some(class), Some(declared)) => {
                if declared.container_kind() == Some(class.kind()) {
                    Ok(declared)
                } else {
                    Err(ProxyError::declaration(
                        class.name(),
                        format!(
                            "field '{}' declared as {} but its proxy wraps a {}",
                            self.name,
                            declared,
                            class.kind()
                        ),
                    ))
                }
            }
        }
    }

    /// Bind the declaration to a storage address
    pub(crate) fn resolve(self, address: Address) -> ProxyResult<FieldDescriptor> {
        let coercion = self.coercion_type()?;
        Ok(FieldDescriptor {
            name: self.name,
            address,
            coercion,
            optional: self.optional,
            predicate: self.predicate,
            proxy: self.proxy,
            format: self.format,
        })
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("index", &self.index)
            .field("coercion", &self.coercion)
            .field("optional", &self.optional)
            .field("predicate", &self.predicate.is_some())
            .field("proxy", &self.proxy.as_ref().map(ProxyClass::name))
            .field("format", &self.format.as_ref().map(|fm| fm.native_name()))
            .finish()
    }
}

// ============================================================================
// FieldDescriptor - resolved accessor for one slot
// ============================================================================

/// A field bound to its storage address
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    address: Address,
    coercion: CoercionType,
    optional: bool,
    predicate: Option<Predicate>,
    proxy: Option<ProxyClass>,
    format: Option<Rc<dyn DynFormat>>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn coercion(&self) -> CoercionType {
        self.coercion
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn has_format(&self) -> bool {
        self.format.is_some()
    }

    /// Nested proxy class, if any
    pub fn proxy(&self) -> Option<&ProxyClass> {
        self.proxy.as_ref()
    }

    // ------------------------------------------------------------------------
    // get
    // ------------------------------------------------------------------------

    /// Read, coerce, parse, check and wrap the slot's value
    pub fn get(&self, container: &Container) -> ProxyResult<FieldValue> {
        let raw = match self.read(container)? {
            Some(raw) => raw,
            None => return Ok(FieldValue::null()),
        };
        if raw.is_null() {
            return if self.optional {
                Ok(FieldValue::null())
            } else {
                Err(ProxyError::invalid_type("required value is null").with_field(&self.name))
            };
        }

        let coerced = self
            .coercion
            .coerce(raw)
            .map_err(|e| e.with_field(&self.name))?;
        let value = match &self.format {
            Some(format) => format
                .parse_dyn(&coerced)
                .map_err(|e| e.with_field(&self.name))?,
            None => FieldValue::Value(coerced.clone()),
        };
        self.check_predicate(&value)?;

        match &self.proxy {
            Some(class) => class.wrap(coerced).map(FieldValue::Proxy),
            None => Ok(value),
        }
    }

    /// Raw slot content; `None` for an absent optional mapping key
    fn read(&self, container: &Container) -> ProxyResult<Option<Value>> {
        let raw = match (container, &self.address) {
            (Container::Mapping(m), Address::Key(key)) => m.get(key),
            (Container::Sequence(s), Address::Index(index)) => s.get(*index),
            _ => return Err(self.address_mismatch(container)),
        };
        match raw {
            Some(raw) => Ok(Some(raw)),
            None if self.optional && matches!(container, Container::Mapping(_)) => Ok(None),
            None => Err(self.missing()),
        }
    }

    // ------------------------------------------------------------------------
    // set
    // ------------------------------------------------------------------------

    /// Validate `value` and store its raw form in the slot
    pub fn set(&self, container: &Container, value: FieldValue) -> ProxyResult<()> {
        if value.is_null() {
            if !self.optional {
                return Err(
                    ProxyError::invalid_type("required field cannot be set to null")
                        .with_field(&self.name),
                );
            }
            return self.clear(container);
        }

        let raw = self.to_raw(&value).map_err(|e| e.with_field(&self.name))?;
        match (&value, &self.proxy) {
            (FieldValue::Proxy(_), _) => self.check_predicate(&FieldValue::Value(raw.clone()))?,
            (_, Some(class)) => {
                class.wrap(raw.clone()).map_err(|e| {
                    ProxyError::invalid_type(format!("not a valid {}: {}", class.name(), e))
                        .with_field(&self.name)
                })?;
                self.check_predicate(&value)?;
            }
            _ => self.check_predicate(&value)?,
        }

        trace!(field = %self.name, address = %self.address, "field write");
        self.write(container, raw)
    }

    /// The raw value to store for `value`
    fn to_raw(&self, value: &FieldValue) -> ProxyResult<Value> {
        if let FieldValue::Proxy(proxy) = value {
            return match &self.proxy {
                Some(class) if proxy.class().is_a(class) => Ok(proxy.jsonable()),
                Some(class) => Err(ProxyError::invalid_type(format!(
                    "expected {} proxy, got {}",
                    class.name(),
                    proxy.class().name()
                ))),
                None => Err(ProxyError::invalid_type(format!(
                    "field does not take proxies, got {}",
                    proxy.class().name()
                ))),
            };
        }
        if let Some(format) = &self.format {
            return format.format_dyn(value);
        }
        match value {
            FieldValue::Value(v) => self.coercion.check_write(v),
            other => Err(ProxyError::invalid_type(format!(
                "expected {}, got {}",
                self.coercion,
                other.type_name()
            ))),
        }
    }

    fn write(&self, container: &Container, raw: Value) -> ProxyResult<()> {
        match (container, &self.address) {
            (Container::Mapping(m), Address::Key(key)) => {
                m.insert(key.clone(), raw);
                Ok(())
            }
            (Container::Sequence(s), Address::Index(index)) => match s.set(*index, raw) {
                Some(_) => Ok(()),
                None => Err(self.missing()),
            },
            _ => Err(self.address_mismatch(container)),
        }
    }

    // ------------------------------------------------------------------------
    // delete
    // ------------------------------------------------------------------------

    /// Unset an optional field; required fields cannot be deleted
    pub fn delete(&self, container: &Container) -> ProxyResult<()> {
        if !self.optional {
            return Err(ProxyError::ImmutableField {
                field: self.name.clone(),
            });
        }
        self.clear(container)
    }

    /// Mapping: remove the key. Sequence: null the position, which must exist.
    fn clear(&self, container: &Container) -> ProxyResult<()> {
        match (container, &self.address) {
            (Container::Mapping(m), Address::Key(key)) => {
                m.remove(key);
                Ok(())
            }
            (Container::Sequence(s), Address::Index(index)) => match s.set(*index, Value::Null) {
                Some(_) => Ok(()),
                None => Err(self.missing()),
            },
            _ => Err(self.address_mismatch(container)),
        }
    }

    // ------------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------------

    fn check_predicate(&self, value: &FieldValue) -> ProxyResult<()> {
        match &self.predicate {
            Some(predicate) if !predicate(value) => Err(ProxyError::InvalidValue {
                field: Some(self.name.clone()),
                message: format!("{} rejected by predicate", value),
            }),
            _ => Ok(()),
        }
    }

    fn missing(&self) -> ProxyError {
        ProxyError::MissingField {
            field: self.name.clone(),
            address: self.address.clone(),
        }
    }

    fn address_mismatch(&self, container: &Container) -> ProxyError {
        ProxyError::invalid_type(format!(
            "{} cannot address a {} container",
            self.address,
            container.kind()
        ))
        .with_field(&self.name)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("coercion", &self.coercion)
            .field("optional", &self.optional)
            .field("predicate", &self.predicate.is_some())
            .field("proxy", &self.proxy.as_ref().map(ProxyClass::name))
            .field("format", &self.format.as_ref().map(|fm| fm.native_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContainerKind, Mapping, Sequence};

    fn mapping_field(field: Field) -> FieldDescriptor {
        let address = Address::Key(field.name().to_string());
        field.resolve(address).unwrap()
    }

    fn sequence_field(field: Field, index: usize) -> FieldDescriptor {
        field.resolve(Address::Index(index)).unwrap()
    }

    #[test]
    fn test_get_missing_required_key() {
        let desc = mapping_field(Field::new("bar"));
        let container = Container::Mapping(Mapping::new());
        let err = desc.get(&container).unwrap_err();
        assert!(matches!(err, ProxyError::MissingField { .. }));
    }

    #[test]
    fn test_get_absent_optional_key_is_null() {
        let desc = mapping_field(Field::new("bar").optional());
        let container = Container::Mapping(Mapping::new());
        assert!(desc.get(&container).unwrap().is_null());
    }

    #[test]
    fn test_get_out_of_range_optional_index_is_missing() {
        let desc = sequence_field(Field::new("bar").optional(), 0);
        let container = Container::Sequence(Sequence::new());
        assert!(matches!(
            desc.get(&container).unwrap_err(),
            ProxyError::MissingField { .. }
        ));
    }

    #[test]
    fn test_required_null_is_type_error() {
        let desc = mapping_field(Field::new("bar"));
        let m: Mapping = [("bar", Value::Null)].into_iter().collect();
        let err = desc.get(&Container::Mapping(m)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidType);
    }

    #[test]
    fn test_delete_required_leaves_container_untouched() {
        let desc = mapping_field(Field::new("bar"));
        let m: Mapping = [("bar", 1)].into_iter().collect();
        let err = desc.delete(&Container::Mapping(m.clone())).unwrap_err();
        assert!(matches!(err, ProxyError::ImmutableField { .. }));
        assert_eq!(m.get("bar"), Some(Value::Int(1)));
    }

    #[test]
    fn test_sequence_write_requires_existing_index() {
        let desc = sequence_field(Field::new("bar"), 2);
        let s: Sequence = [1].into_iter().collect();
        let err = desc
            .set(&Container::Sequence(s), FieldValue::from(5))
            .unwrap_err();
        assert!(matches!(err, ProxyError::MissingField { .. }));
    }

    #[test]
    fn test_coercion_type_from_proxy() {
        let inner = ProxyClass::builder("Inner", ContainerKind::Sequence)
            .field(Field::new("id").integer())
            .build()
            .unwrap();
        assert_eq!(
            Field::new("inner").proxy(&inner).coercion_type().unwrap(),
            CoercionType::Sequence
        );
        assert!(Field::new("inner").integer().proxy(&inner).coercion_type().is_err());
        assert!(Field::new("inner").mapping().proxy(&inner).coercion_type().is_err());
    }

    #[derive(Debug)]
    struct Trimmed;

    impl Format for Trimmed {
        type Native = String;

        fn format(&self, native: &String) -> ProxyResult<Value> {
            Ok(Value::String(native.trim().to_string()))
        }

        fn parse(&self, raw: &Value) -> ProxyResult<String> {
            raw.as_str()
                .map(str::to_string)
                .ok_or_else(|| ProxyError::invalid_type("expected string"))
        }
    }

    #[test]
    fn test_string_format_accepts_plain_strings() {
        let desc = mapping_field(Field::new("name").string().format(Trimmed));
        let m = Mapping::new();
        let container = Container::Mapping(m.clone());
        desc.set(&container, FieldValue::from("  alice ")).unwrap();
        assert_eq!(m.get("name"), Some(Value::from("alice")));
        assert_eq!(desc.get(&container).unwrap().as_str(), Some("alice"));
    }
}
