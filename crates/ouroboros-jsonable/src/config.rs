//! Class options
//!
//! `ProxyOptions` controls whether a class behaves as a container and how
//! its keys and items are converted. Any transformation option turns
//! container mode on.

use std::fmt;
use std::rc::Rc;

use crate::class::ProxyClass;
use crate::errors::{ProxyError, ProxyResult};
use crate::formats::{DynFormat, Format};
use crate::types::ContainerKind;

// ============================================================================
// Proxy Options
// ============================================================================

/// Container-mode configuration of a proxy class
#[derive(Clone, Default)]
pub struct ProxyOptions {
    as_container: bool,
    key_format: Option<Rc<dyn DynFormat>>,
    item_format: Option<Rc<dyn DynFormat>>,
    item_proxy: Option<ProxyClass>,
}

impl ProxyOptions {
    /// Create options with container mode off
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave as a mapping / sequence over the raw container
    pub fn as_container(mut self, enabled: bool) -> Self {
        self.as_container = enabled;
        self
    }

    /// Convert mapping keys through `format` (mapping classes only)
    pub fn key_format<F: Format>(mut self, format: F) -> Self {
        self.key_format = Some(Rc::new(format));
        self
    }

    /// Convert items through `format`
    pub fn item_format<F: Format>(mut self, format: F) -> Self {
        self.item_format = Some(Rc::new(format));
        self
    }

    /// Wrap items in `class`
    pub fn item_proxy(mut self, class: &ProxyClass) -> Self {
        self.item_proxy = Some(class.clone());
        self
    }

    /// True when the class behaves as a container
    pub fn is_container_mode(&self) -> bool {
        self.as_container
            || self.key_format.is_some()
            || self.item_format.is_some()
            || self.item_proxy.is_some()
    }

    pub fn has_key_format(&self) -> bool {
        self.key_format.is_some()
    }

    pub fn has_item_format(&self) -> bool {
        self.item_format.is_some()
    }

    pub fn item_proxy_class(&self) -> Option<&ProxyClass> {
        self.item_proxy.as_ref()
    }

    pub(crate) fn key_format_dyn(&self) -> Option<&dyn DynFormat> {
        self.key_format.as_deref()
    }

    pub(crate) fn item_format_dyn(&self) -> Option<&dyn DynFormat> {
        self.item_format.as_deref()
    }

    /// Check the options against the class they configure
    pub(crate) fn validate(&self, class: &str, kind: ContainerKind, fields: usize) -> ProxyResult<()> {
        if !self.is_container_mode() {
            return Ok(());
        }
        if fields > 0 {
            return Err(ProxyError::declaration(
                class,
                "container mode cannot be combined with fields",
            ));
        }
        if self.key_format.is_some() && kind == ContainerKind::Sequence {
            return Err(ProxyError::declaration(
                class,
                "key format requires a mapping class",
            ));
        }
        if self.item_format.is_some() && self.item_proxy.is_some() {
            return Err(ProxyError::declaration(
                class,
                "item format and item proxy are mutually exclusive",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ProxyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyOptions")
            .field("as_container", &self.as_container)
            .field("key_format", &self.key_format.as_ref().map(|fm| fm.native_name()))
            .field("item_format", &self.item_format.as_ref().map(|fm| fm.native_name()))
            .field("item_proxy", &self.item_proxy.as_ref().map(ProxyClass::name))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
