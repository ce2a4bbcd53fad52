//! Ouroboros Jsonable
//!
//! Typed, validating views over live JSON containers.
//!
//! Instead of deserializing a document into fresh structs, a [`ProxyClass`]
//! describes the fields of a mapping or sequence and [`ProxyClass::wrap`]
//! returns a [`Proxy`] that reads and writes those fields directly on the
//! container, validating every access. Any number of proxies can view the
//! same document; a write through one is visible through all of them.
//!
//! # Features
//!
//! - **formats** (default): [`UuidFormat`] and [`DateTimeFormat`] built on
//!   `uuid` and `chrono`
//!
//! # Example
//!
//! ```rust
//! use ouroboros_jsonable::{ContainerKind, Field, ProxyClass, Value};
//! use serde_json::json;
//!
//! let user = ProxyClass::builder("User", ContainerKind::Mapping)
//!     .field(Field::new("id").integer())
//!     .field(Field::new("name").string().optional())
//!     .build()
//!     .unwrap();
//!
//! let doc = Value::from(json!({"id": "7"}));
//! let proxy = user.wrap(doc.clone()).unwrap();
//! assert_eq!(proxy.get("id").unwrap().as_i64(), Some(7));
//!
//! proxy.set("name", "alice").unwrap();
//! assert_eq!(doc.to_json(), json!({"id": "7", "name": "alice"}));
//!
//! // writes are exact: "8" is not an integer
//! assert!(proxy.set("id", "8").is_err());
//! ```

pub mod class;
pub mod coercion;
pub mod config;
pub mod container;
pub mod errors;
pub mod field;
pub mod fieldset;
pub mod formats;
pub mod proxy;
pub mod serializers;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use class::{ProxyClass, ProxyClassBuilder};
pub use coercion::CoercionType;
pub use config::ProxyOptions;
pub use container::{ContainerOps, DefaultContainerOps, Items, Slice};
pub use errors::{ErrorKind, ProxyError, ProxyResult};
pub use field::{Address, Field, FieldDescriptor, Predicate};
pub use fieldset::FieldSet;
pub use formats::Format;
#[cfg(feature = "formats")]
pub use formats::{DateTimeFormat, UuidFormat};
pub use proxy::{Jsonable, Proxy};
pub use serializers::to_canonical_string;
pub use types::{Container, ContainerKind, Mapping, Sequence, Value};
pub use value::{FieldValue, Native};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
