//! Proxy error types
//!
//! Every failure raised by a field accessor, a container-mode operation or
//! a class declaration is a `ProxyError`. Callers branch on
//! [`ProxyError::kind`].

use std::fmt;

use thiserror::Error;

use crate::field::Address;

// ============================================================================
// Proxy Result
// ============================================================================

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

// ============================================================================
// Proxy Error
// ============================================================================

/// Errors raised while declaring proxy classes or accessing proxies
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProxyError {
    /// A required field's storage address is absent
    #[error("missing field '{field}' ({address})")]
    MissingField { field: String, address: Address },

    /// A value's kind does not satisfy the declared type
    #[error("invalid type{}: {message}", field_suffix(.field))]
    InvalidType {
        field: Option<String>,
        message: String,
    },

    /// A predicate or format rejected the value
    #[error("invalid value{}: {message}", field_suffix(.field))]
    InvalidValue {
        field: Option<String>,
        message: String,
    },

    /// Delete attempted on a required field
    #[error("field '{field}' is required and cannot be deleted")]
    ImmutableField { field: String },

    /// Container-mode lookup of an absent key
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// Container-mode access past the end of a sequence
    #[error("index {index} out of range (len: {len})")]
    IndexOutOfRange { index: i64, len: usize },

    /// The proxy class does not provide the requested field or operation
    #[error("{class} has no {capability}")]
    NoSuchCapability { class: String, capability: String },

    /// Structural error while building a proxy class
    #[error("invalid declaration of {class}: {message}")]
    Declaration { class: String, message: String },
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|name| format!(" for field '{}'", name))
        .unwrap_or_default()
}

impl ProxyError {
    /// Create a type error
    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::InvalidType {
            field: None,
            message: message.into(),
        }
    }

    /// Create a value error
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: None,
            message: message.into(),
        }
    }

    /// Create a declaration error for `class`
    pub fn declaration(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Declaration {
            class: class.into(),
            message: message.into(),
        }
    }

    pub fn no_such_capability(class: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::NoSuchCapability {
            class: class.into(),
            capability: capability.into(),
        }
    }

    /// Attach a field name to type/value errors that do not carry one yet
    pub fn with_field(self, name: &str) -> Self {
        match self {
            Self::InvalidType { field: None, message } => Self::InvalidType {
                field: Some(name.to_string()),
                message,
            },
            Self::InvalidValue { field: None, message } => Self::InvalidValue {
                field: Some(name.to_string()),
                message,
            },
            other => other,
        }
    }

    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::InvalidType { .. } => ErrorKind::InvalidType,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::ImmutableField { .. } => ErrorKind::ImmutableField,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::NoSuchCapability { .. } => ErrorKind::NoSuchCapability,
            Self::Declaration { .. } => ErrorKind::Declaration,
        }
    }

    /// True for the kinds a caller treats as "wrong type" failures
    pub fn is_type_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidType | ErrorKind::ImmutableField | ErrorKind::Declaration
        )
    }

    /// True for lookups that found nothing (missing field, key or index)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingField | ErrorKind::KeyNotFound | ErrorKind::IndexOutOfRange
        )
    }
}

// ============================================================================
// Error Kind Classification
// ============================================================================

/// Classification of proxy errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required field absent from the container
    MissingField,

    /// Type mismatch on read, write or construction
    InvalidType,

    /// Predicate or format rejection
    InvalidValue,

    /// Delete of a required field
    ImmutableField,

    /// Container-mode key lookup miss
    KeyNotFound,

    /// Container-mode index past the end
    IndexOutOfRange,

    /// Field or container operation not provided by the class
    NoSuchCapability,

    /// Class declaration rejected at build time
    Declaration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => write!(f, "missing_field"),
            Self::InvalidType => write!(f, "invalid_type"),
            Self::InvalidValue => write!(f, "invalid_value"),
            Self::ImmutableField => write!(f, "immutable_field"),
            Self::KeyNotFound => write!(f, "key_not_found"),
            Self::IndexOutOfRange => write!(f, "index_out_of_range"),
            Self::NoSuchCapability => write!(f, "no_such_capability"),
            Self::Declaration => write!(f, "declaration"),
        }
    }
}
