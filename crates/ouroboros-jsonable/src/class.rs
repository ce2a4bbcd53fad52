//! Proxy classes
//!
//! A [`ProxyClass`] is the runtime descriptor that proxies are created
//! from. It is built once through [`ProxyClassBuilder`], is immutable
//! afterwards and is cheap to clone (clones share the same descriptor).

use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::config::ProxyOptions;
use crate::container::{ContainerOps, DefaultContainerOps};
use crate::errors::ProxyResult;
use crate::field::{Field, FieldDescriptor};
use crate::fieldset::FieldSet;
use crate::formats::Format;
use crate::proxy::Proxy;
use crate::types::{Container, ContainerKind, Value};

struct ClassInner {
    name: String,
    doc: Option<String>,
    module: Option<String>,
    kind: ContainerKind,
    parents: Vec<ProxyClass>,
    fields: FieldSet,
    options: ProxyOptions,
    ops: Rc<dyn ContainerOps>,
}

// ============================================================================
// ProxyClass
// ============================================================================

/// Runtime descriptor of a proxy class
#[derive(Clone)]
pub struct ProxyClass(Rc<ClassInner>);

impl ProxyClass {
    /// Start declaring a class over `kind` containers
    pub fn builder(name: impl Into<String>, kind: ContainerKind) -> ProxyClassBuilder {
        ProxyClassBuilder::new(name, kind)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.0.doc.as_deref()
    }

    /// Module path the class was declared in, if recorded
    pub fn module(&self) -> Option<&str> {
        self.0.module.as_deref()
    }

    pub fn kind(&self) -> ContainerKind {
        self.0.kind
    }

    /// Aggregated fields, inherited ones included
    pub fn fields(&self) -> &FieldSet {
        &self.0.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0.fields.get(name)
    }

    pub fn parents(&self) -> &[ProxyClass] {
        &self.0.parents
    }

    /// The parent fields were inherited from, else the first parent
    pub fn parent(&self) -> Option<&ProxyClass> {
        self.0
            .parents
            .iter()
            .find(|p| !p.fields().is_empty())
            .or_else(|| self.0.parents.first())
    }

    pub fn options(&self) -> &ProxyOptions {
        &self.0.options
    }

    pub(crate) fn ops(&self) -> &dyn ContainerOps {
        &*self.0.ops
    }

    pub fn is_container(&self) -> bool {
        self.0.options.is_container_mode()
    }

    pub fn is_fieldless(&self) -> bool {
        self.0.fields.is_empty()
    }

    /// True when `self` is `other` or extends it, directly or not
    pub fn extends(&self, other: &ProxyClass) -> bool {
        self.is_a(other)
    }

    pub fn is_a(&self, other: &ProxyClass) -> bool {
        self == other || self.0.parents.iter().any(|p| p.is_a(other))
    }

    /// Wrap `value` without copying it
    ///
    /// Fails with `InvalidType` when the value is not a container of this
    /// class's kind, and with the field's error when a required field does
    /// not validate. Optional fields are checked lazily on access.
    pub fn wrap(&self, value: impl Into<Value>) -> ProxyResult<Proxy> {
        let container = Container::from_value(value.into(), self.kind())?;
        for field in self.0.fields.required() {
            field.get(&container)?;
        }
        trace!(class = %self.name(), "wrapped container");
        Ok(Proxy::new(self.clone(), container))
    }

    /// Wrap a `serde_json` document (copied into fresh containers)
    pub fn wrap_json(&self, json: serde_json::Value) -> ProxyResult<Proxy> {
        self.wrap(Value::from(json))
    }
}

impl PartialEq for ProxyClass {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ProxyClass {}

impl fmt::Debug for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClass")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("fields", &self.0.fields.names())
            .field("container", &self.is_container())
            .finish()
    }
}

impl fmt::Display for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

// ============================================================================
// ProxyClassBuilder
// ============================================================================

/// Declaration of a proxy class
pub struct ProxyClassBuilder {
    name: String,
    kind: ContainerKind,
    doc: Option<String>,
    module: Option<String>,
    parents: Vec<ProxyClass>,
    fields: Vec<Field>,
    options: Option<ProxyOptions>,
    ops: Option<Rc<dyn ContainerOps>>,
}

impl ProxyClassBuilder {
    pub fn new(name: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            doc: None,
            module: None,
            parents: Vec::new(),
            fields: Vec::new(),
            options: None,
            ops: None,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Inherit from `parent`; at most one parent may carry fields
    pub fn extends(mut self, parent: &ProxyClass) -> Self {
        self.parents.push(parent.clone());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Replace all container-mode options at once
    pub fn options(mut self, options: ProxyOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn as_container(self, enabled: bool) -> Self {
        self.map_options(|o| o.as_container(enabled))
    }

    pub fn key_format<F: Format>(self, format: F) -> Self {
        self.map_options(|o| o.key_format(format))
    }

    pub fn item_format<F: Format>(self, format: F) -> Self {
        self.map_options(|o| o.item_format(format))
    }

    pub fn item_proxy(self, class: &ProxyClass) -> Self {
        self.map_options(|o| o.item_proxy(class))
    }

    /// Override container operations; unimplemented methods keep the
    /// stock behaviour
    pub fn container_ops(mut self, ops: impl ContainerOps + 'static) -> Self {
        self.ops = Some(Rc::new(ops));
        self
    }

    fn map_options(mut self, f: impl FnOnce(ProxyOptions) -> ProxyOptions) -> Self {
        self.options = Some(f(self.options.take().unwrap_or_default()));
        self
    }

    /// Validate the declaration and produce the class
    pub fn build(self) -> ProxyResult<ProxyClass> {
        let fields = FieldSet::aggregate(&self.name, self.kind, &self.parents, self.fields)?;

        // Container behaviour is inherited unless redeclared
        let inherited = self.parents.iter().find(|p| p.is_container());
        let options = match (self.options, inherited) {
            (Some(options), _) => options,
            (None, Some(parent)) => parent.options().clone(),
            (None, None) => ProxyOptions::default(),
        };
        options.validate(&self.name, self.kind, fields.len())?;

        let ops = match (self.ops, inherited) {
            (Some(ops), _) => ops,
            (None, Some(parent)) => parent.0.ops.clone(),
            (None, None) => Rc::new(DefaultContainerOps),
        };

        debug!(
            class = %self.name,
            kind = %self.kind,
            fields = fields.len(),
            container = options.is_container_mode(),
            "built proxy class"
        );

        Ok(ProxyClass(Rc::new(ClassInner {
            name: self.name,
            doc: self.doc,
            module: self.module,
            kind: self.kind,
            parents: self.parents,
            fields,
            options,
            ops,
        })))
    }
}

impl fmt::Debug for ProxyClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClassBuilder")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parents", &self.parents)
            .field("fields", &self.fields)
            .field("options", &self.options)
            .finish()
    }
}
