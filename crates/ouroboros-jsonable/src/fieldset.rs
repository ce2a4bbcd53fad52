//! Field aggregation
//!
//! A class's fields are its parent's fields overlaid with its own. Only one
//! parent may carry fields; a redeclared field replaces the inherited one in
//! place, keeping its position and storage address unless it overrides the
//! address itself.

use std::collections::HashSet;

use crate::class::ProxyClass;
use crate::errors::{ProxyError, ProxyResult};
use crate::field::{Address, Field, FieldDescriptor};
use crate::types::ContainerKind;

/// Ordered name → descriptor mapping of one class
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<FieldDescriptor>,
}

impl FieldSet {
    /// Merge `parents` and `own` declarations for class `class`
    pub(crate) fn aggregate(
        class: &str,
        kind: ContainerKind,
        parents: &[ProxyClass],
        own: Vec<Field>,
    ) -> ProxyResult<Self> {
        let declaration = |message: String| ProxyError::declaration(class, message);

        if let Some(parent) = parents.iter().find(|p| p.kind() != kind) {
            return Err(declaration(format!(
                "parent {} is a {} class, expected {}",
                parent.name(),
                parent.kind(),
                kind
            )));
        }
        let mut carrying = parents.iter().filter(|p| !p.fields().is_empty());
        let inherited = carrying.next();
        if let Some(second) = carrying.next() {
            return Err(declaration(format!(
                "fields inherited from both {} and {}",
                inherited.map(ProxyClass::name).unwrap_or_default(),
                second.name()
            )));
        }

        let mut fields: Vec<FieldDescriptor> = inherited
            .map(|p| p.fields().iter().cloned().collect())
            .unwrap_or_default();

        let mut seen = HashSet::new();
        for field in own {
            if !seen.insert(field.name().to_string()) {
                return Err(declaration(format!("field '{}' declared twice", field.name())));
            }
            match (kind, field.key_override(), field.index_override()) {
                (ContainerKind::Sequence, Some(_), _) => {
                    return Err(declaration(format!(
                        "field '{}' sets a key on a sequence class",
                        field.name()
                    )))
                }
                (ContainerKind::Mapping, _, Some(_)) => {
                    return Err(declaration(format!(
                        "field '{}' sets an index on a mapping class",
                        field.name()
                    )))
                }
                _ => {}
            }

            let replaced = fields.iter().position(|f| f.name() == field.name());
            let address = match (field.key_override(), field.index_override(), replaced) {
                (Some(key), _, _) => Address::Key(key.to_string()),
                (_, Some(index), _) => Address::Index(index),
                (None, None, Some(pos)) => fields[pos].address().clone(),
                (None, None, None) => match kind {
                    ContainerKind::Mapping => Address::Key(field.name().to_string()),
                    ContainerKind::Sequence => Address::Index(next_index(&fields)),
                },
            };

            let descriptor = field
                .resolve(address)
                .map_err(|e| match e {
                    ProxyError::Declaration { message, .. } => declaration(message),
                    other => other,
                })?;
            match replaced {
                Some(pos) => fields[pos] = descriptor,
                None => fields.push(descriptor),
            }
        }

        let mut addresses = HashSet::new();
        for field in &fields {
            if !addresses.insert(field.address().clone()) {
                return Err(declaration(format!(
                    "field '{}' shares {} with another field",
                    field.name(),
                    field.address()
                )));
            }
        }

        Ok(Self { fields })
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Descriptors in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(FieldDescriptor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Descriptors of fields that must be present
    pub fn required(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_optional())
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One past the highest index in use
fn next_index(fields: &[FieldDescriptor]) -> usize {
    fields
        .iter()
        .filter_map(|f| match f.address() {
            Address::Index(i) => Some(*i + 1),
            Address::Key(_) => None,
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, kind: ContainerKind, fields: Vec<Field>) -> ProxyClass {
        ProxyClass::builder(name, kind).fields(fields).build().unwrap()
    }

    #[test]
    fn test_own_fields_in_order() {
        let set = FieldSet::aggregate(
            "Foo",
            ContainerKind::Sequence,
            &[],
            vec![Field::new("a"), Field::new("b"), Field::new("c")],
        )
        .unwrap();
        assert_eq!(set.names(), vec!["a", "b", "c"]);
        assert_eq!(set.get("c").unwrap().address(), &Address::Index(2));
    }

    #[test]
    fn test_redeclaration_keeps_position() {
        let parent = class(
            "Base",
            ContainerKind::Sequence,
            vec![Field::new("a"), Field::new("b")],
        );
        let set = FieldSet::aggregate(
            "Child",
            ContainerKind::Sequence,
            &[parent],
            vec![Field::new("c"), Field::new("a").integer()],
        )
        .unwrap();
        assert_eq!(set.names(), vec!["a", "b", "c"]);
        assert_eq!(set.get("a").unwrap().address(), &Address::Index(0));
        assert_eq!(set.get("c").unwrap().address(), &Address::Index(2));
        assert_eq!(set.get("a").unwrap().coercion(), crate::CoercionType::Integer);
    }

    #[test]
    fn test_two_field_carrying_parents_rejected() {
        let a = class("A", ContainerKind::Mapping, vec![Field::new("x")]);
        let b = class("B", ContainerKind::Mapping, vec![Field::new("y")]);
        let err = FieldSet::aggregate("C", ContainerKind::Mapping, &[a, b], vec![]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Declaration);
    }

    #[test]
    fn test_fieldless_second_parent_allowed() {
        let a = class("A", ContainerKind::Mapping, vec![Field::new("x")]);
        let b = class("B", ContainerKind::Mapping, vec![]);
        let set = FieldSet::aggregate("C", ContainerKind::Mapping, &[b, a], vec![]).unwrap();
        assert_eq!(set.names(), vec!["x"]);
    }

    #[test]
    fn test_parent_kind_mismatch_rejected() {
        let a = class("A", ContainerKind::Sequence, vec![Field::new("x")]);
        assert!(FieldSet::aggregate("C", ContainerKind::Mapping, &[a], vec![]).is_err());
    }

    #[test]
    fn test_address_override_rules() {
        let set = FieldSet::aggregate(
            "Foo",
            ContainerKind::Mapping,
            &[],
            vec![Field::new("foo").key("foo-in-bar")],
        )
        .unwrap();
        assert_eq!(
            set.get("foo").unwrap().address(),
            &Address::Key("foo-in-bar".to_string())
        );

        assert!(FieldSet::aggregate(
            "Foo",
            ContainerKind::Mapping,
            &[],
            vec![Field::new("foo").index(1)],
        )
        .is_err());
        assert!(FieldSet::aggregate(
            "Foo",
            ContainerKind::Sequence,
            &[],
            vec![Field::new("foo").key("k")],
        )
        .is_err());
    }

    #[test]
    fn test_duplicate_names_and_addresses_rejected() {
        assert!(FieldSet::aggregate(
            "Foo",
            ContainerKind::Mapping,
            &[],
            vec![Field::new("a"), Field::new("a")],
        )
        .is_err());
        assert!(FieldSet::aggregate(
            "Foo",
            ContainerKind::Mapping,
            &[],
            vec![Field::new("a"), Field::new("b").key("a")],
        )
        .is_err());
        assert!(FieldSet::aggregate(
            "Foo",
            ContainerKind::Sequence,
            &[],
            vec![Field::new("a"), Field::new("b").index(0)],
        )
        .is_err());
    }
}
