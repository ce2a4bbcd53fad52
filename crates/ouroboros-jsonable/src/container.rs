//! Container-mode operations
//!
//! A class built in container mode makes its proxies behave as the mapping
//! or sequence they wrap: length, iteration, membership, item access and
//! (for sequences) slicing. Keys and items optionally pass through a key
//! format, an item format or an item proxy class.
//!
//! Every operation is dispatched through the class's [`ContainerOps`]. The
//! trait's default methods call the stock implementations in [`adapter`];
//! a class that supplies its own `ContainerOps` overrides exactly the
//! methods it implements.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::errors::{ProxyError, ProxyResult};
use crate::proxy::Proxy;
use crate::value::FieldValue;

/// Lazy iterator over decoded keys (mapping) or items (sequence)
pub type Items = Box<dyn Iterator<Item = ProxyResult<FieldValue>>>;

// ============================================================================
// ContainerOps
// ============================================================================

/// Container behaviour of a proxy class
///
/// # Example
///
/// ```
/// use ouroboros_jsonable::{ContainerKind, ContainerOps, Proxy, ProxyClass, ProxyResult, Value};
///
/// struct FixedLen;
///
/// impl ContainerOps for FixedLen {
///     fn len(&self, _proxy: &Proxy) -> ProxyResult<usize> {
///         Ok(42)
///     }
/// }
///
/// let class = ProxyClass::builder("Bag", ContainerKind::Mapping)
///     .as_container(true)
///     .container_ops(FixedLen)
///     .build()
///     .unwrap();
/// let bag = class.wrap(Value::object()).unwrap();
/// assert_eq!(bag.len().unwrap(), 42);
/// assert!(!bag.contains("missing").unwrap());
/// ```
pub trait ContainerOps {
    fn len(&self, proxy: &Proxy) -> ProxyResult<usize> {
        adapter::len(proxy)
    }

    /// Mapping: keys. Sequence: items.
    fn iter(&self, proxy: &Proxy) -> ProxyResult<Items> {
        adapter::iter(proxy)
    }

    /// Mapping: key membership. Sequence: item membership.
    fn contains(&self, proxy: &Proxy, probe: &FieldValue) -> ProxyResult<bool> {
        adapter::contains(proxy, probe)
    }

    fn item(&self, proxy: &Proxy, key: &FieldValue) -> ProxyResult<FieldValue> {
        adapter::item(proxy, key)
    }

    fn set_item(&self, proxy: &Proxy, key: &FieldValue, value: FieldValue) -> ProxyResult<()> {
        adapter::set_item(proxy, key, value)
    }

    fn del_item(&self, proxy: &Proxy, key: &FieldValue) -> ProxyResult<()> {
        adapter::del_item(proxy, key)
    }

    fn slice(&self, proxy: &Proxy, slice: Slice) -> ProxyResult<Vec<FieldValue>> {
        adapter::slice(proxy, slice)
    }

    fn set_slice(&self, proxy: &Proxy, slice: Slice, values: Vec<FieldValue>) -> ProxyResult<()> {
        adapter::set_slice(proxy, slice, values)
    }

    fn del_slice(&self, proxy: &Proxy, slice: Slice) -> ProxyResult<()> {
        adapter::del_slice(proxy, slice)
    }
}

/// Stock container behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContainerOps;

impl ContainerOps for DefaultContainerOps {}

// ============================================================================
// Slice
// ============================================================================

/// `start:stop:step` selection over a sequence
///
/// Bounds follow the usual slice rules: negative values count from the end,
/// out-of-range bounds are clamped and a missing step means 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// The whole sequence (`[:]`)
    pub fn full() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }

    /// Resolve against a sequence of `len` items
    ///
    /// Returns clamped `(start, stop, step)`; a zero step is an error.
    /// The step is clamped to `-i64::MAX` so it can always be negated.
    pub fn indices(&self, len: usize) -> ProxyResult<(i64, i64, i64)> {
        let len = i64::try_from(len).unwrap_or(i64::MAX);
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(ProxyError::invalid_value("slice step cannot be zero"));
        }
        let step = step.max(-i64::MAX);
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
        let clamp = |bound: i64| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };
        let start = self
            .start
            .map(clamp)
            .unwrap_or(if step > 0 { lower } else { upper });
        let stop = self
            .stop
            .map(clamp)
            .unwrap_or(if step > 0 { upper } else { lower });
        Ok((start, stop, step))
    }

    /// Positions selected in a sequence of `len` items, in slice order
    pub fn positions(&self, len: usize) -> ProxyResult<Vec<usize>> {
        let (start, stop, step) = self.indices(len)?;
        let count = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && stop < start {
            (start - stop - 1) / (-step) + 1
        } else {
            0
        };
        Ok((0..count)
            .map(|i| (start + i * step) as usize)
            .collect())
    }
}

impl From<Range<i64>> for Slice {
    fn from(range: Range<i64>) -> Self {
        Self::new(Some(range.start), Some(range.end), None)
    }
}

impl From<RangeFrom<i64>> for Slice {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None, None)
    }
}

impl From<RangeTo<i64>> for Slice {
    fn from(range: RangeTo<i64>) -> Self {
        Self::new(None, Some(range.end), None)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

// ============================================================================
// Adapter - stock implementations
// ============================================================================

/// Stock container-mode operations, callable from custom `ContainerOps`
pub mod adapter {
    use tracing::trace;

    use super::{Items, Slice};
    use crate::errors::{ProxyError, ProxyResult};
    use crate::proxy::{Jsonable, Proxy};
    use crate::types::{Container, Mapping, Sequence, Value};
    use crate::value::FieldValue;

    fn require_container(proxy: &Proxy, capability: &str) -> ProxyResult<()> {
        if proxy.class().is_container() {
            Ok(())
        } else {
            Err(ProxyError::no_such_capability(proxy.class().name(), capability))
        }
    }

    fn require_sequence<'a>(proxy: &'a Proxy, capability: &str) -> ProxyResult<&'a Sequence> {
        require_container(proxy, capability)?;
        match proxy.container() {
            Container::Sequence(s) => Ok(s),
            Container::Mapping(_) => {
                Err(ProxyError::no_such_capability(proxy.class().name(), capability))
            }
        }
    }

    // ------------------------------------------------------------------------
    // key / item conversion
    // ------------------------------------------------------------------------

    /// Mapping key to its stored string form
    fn encode_key(proxy: &Proxy, key: &FieldValue) -> ProxyResult<String> {
        let raw = match proxy.class().options().key_format_dyn() {
            Some(format) => format.format_dyn(key)?,
            None => match key {
                FieldValue::Value(v) => v.clone(),
                other => {
                    return Err(ProxyError::invalid_type(format!(
                        "mapping keys must be strings, got {}",
                        other.type_name()
                    )))
                }
            },
        };
        match raw {
            Value::String(s) => Ok(s),
            other => Err(ProxyError::invalid_type(format!(
                "mapping keys must be strings, got {}",
                other.type_name()
            ))),
        }
    }

    fn decode_key(proxy: &Proxy, key: String) -> ProxyResult<FieldValue> {
        match proxy.class().options().key_format_dyn() {
            Some(format) => format.parse_dyn(&Value::String(key)),
            None => Ok(FieldValue::Value(Value::String(key))),
        }
    }

    /// Item to the raw value stored in the container
    fn encode_item(proxy: &Proxy, item: &FieldValue) -> ProxyResult<Value> {
        let options = proxy.class().options();
        if let Some(format) = options.item_format_dyn() {
            return format.format_dyn(item);
        }
        if let Some(class) = options.item_proxy_class() {
            return match item {
                FieldValue::Proxy(p) if p.class().is_a(class) => Ok(p.jsonable()),
                other => Err(ProxyError::invalid_type(format!(
                    "expected {} proxy, got {}",
                    class.name(),
                    other.type_name()
                ))),
            };
        }
        match item {
            FieldValue::Value(v) => Ok(v.clone()),
            FieldValue::Proxy(p) => Ok(p.jsonable()),
            FieldValue::Native(n) => Err(ProxyError::invalid_type(format!(
                "{} has no JSON form without an item format",
                n.type_name()
            ))),
        }
    }

    fn decode_item(proxy: &Proxy, raw: Value) -> ProxyResult<FieldValue> {
        let options = proxy.class().options();
        if let Some(format) = options.item_format_dyn() {
            return format.parse_dyn(&raw);
        }
        if let Some(class) = options.item_proxy_class() {
            return class.wrap(raw).map(FieldValue::Proxy);
        }
        Ok(FieldValue::Value(raw))
    }

    /// Sequence index, negative counting from the end
    fn resolve_index(key: &FieldValue, len: usize) -> ProxyResult<usize> {
        let index = key.as_i64().ok_or_else(|| {
            ProxyError::invalid_type(format!(
                "sequence indices must be integers, got {}",
                key.type_name()
            ))
        })?;
        let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
        let resolved = if index < 0 { index + signed_len } else { index };
        if (0..signed_len).contains(&resolved) {
            Ok(resolved as usize)
        } else {
            Err(ProxyError::IndexOutOfRange { index, len })
        }
    }

    // ------------------------------------------------------------------------
    // operations
    // ------------------------------------------------------------------------

    pub fn len(proxy: &Proxy) -> ProxyResult<usize> {
        require_container(proxy, "length")?;
        Ok(proxy.container().len())
    }

    /// Lazy, live iteration; every step reads the current container
    pub fn iter(proxy: &Proxy) -> ProxyResult<Items> {
        require_container(proxy, "iteration")?;
        let owner = proxy.clone();
        match proxy.container().clone() {
            Container::Mapping(m) => {
                let mut last: Option<String> = None;
                Ok(Box::new(std::iter::from_fn(move || {
                    let key = m.key_after(last.as_deref())?;
                    last = Some(key.clone());
                    Some(decode_key(&owner, key))
                })))
            }
            Container::Sequence(s) => {
                let mut cursor = 0;
                Ok(Box::new(std::iter::from_fn(move || {
                    let raw = s.get(cursor)?;
                    cursor += 1;
                    Some(decode_item(&owner, raw))
                })))
            }
        }
    }

    pub fn contains(proxy: &Proxy, probe: &FieldValue) -> ProxyResult<bool> {
        require_container(proxy, "membership")?;
        match proxy.container() {
            Container::Mapping(m) => {
                let key = encode_key(proxy, probe)?;
                Ok(m.contains_key(&key))
            }
            Container::Sequence(s) => {
                let raw = encode_item(proxy, probe)?;
                Ok(s.contains(&raw))
            }
        }
    }

    pub fn item(proxy: &Proxy, key: &FieldValue) -> ProxyResult<FieldValue> {
        require_container(proxy, "item access")?;
        let raw = match proxy.container() {
            Container::Mapping(m) => {
                let encoded = encode_key(proxy, key)?;
                m.get(&encoded)
                    .ok_or(ProxyError::KeyNotFound { key: encoded })?
            }
            Container::Sequence(s) => {
                let index = resolve_index(key, s.len())?;
                s.get(index).ok_or(ProxyError::IndexOutOfRange {
                    index: index as i64,
                    len: s.len(),
                })?
            }
        };
        decode_item(proxy, raw)
    }

    pub fn set_item(proxy: &Proxy, key: &FieldValue, value: FieldValue) -> ProxyResult<()> {
        require_container(proxy, "item assignment")?;
        match proxy.container() {
            Container::Mapping(m) => {
                let encoded = encode_key(proxy, key)?;
                let raw = encode_item(proxy, &value)?;
                trace!(class = %proxy.class().name(), key = %encoded, "item write");
                m.insert(encoded, raw);
                Ok(())
            }
            Container::Sequence(s) => {
                let index = resolve_index(key, s.len())?;
                let raw = encode_item(proxy, &value)?;
                trace!(class = %proxy.class().name(), index, "item write");
                store_at(s, index, raw)
            }
        }
    }

    pub fn del_item(proxy: &Proxy, key: &FieldValue) -> ProxyResult<()> {
        require_container(proxy, "item deletion")?;
        match proxy.container() {
            Container::Mapping(m) => {
                let encoded = encode_key(proxy, key)?;
                remove_key(m, encoded)
            }
            Container::Sequence(s) => {
                let index = resolve_index(key, s.len())?;
                s.remove(index)
                    .map(|_| ())
                    .ok_or(ProxyError::IndexOutOfRange {
                        index: index as i64,
                        len: s.len(),
                    })
            }
        }
    }

    pub fn slice(proxy: &Proxy, slice: Slice) -> ProxyResult<Vec<FieldValue>> {
        let s = require_sequence(proxy, "slicing")?;
        let items = s.to_vec();
        slice
            .positions(items.len())?
            .into_iter()
            .map(|i| decode_item(proxy, items[i].clone()))
            .collect()
    }

    /// Encode every value, then apply
    ///
    /// A unit step replaces the selected range and may change the length;
    /// any other step needs exactly one value per selected position.
    pub fn set_slice(proxy: &Proxy, slice: Slice, values: Vec<FieldValue>) -> ProxyResult<()> {
        let s = require_sequence(proxy, "slice assignment")?;
        let raw = values
            .iter()
            .map(|v| encode_item(proxy, v))
            .collect::<ProxyResult<Vec<_>>>()?;

        let (start, stop, step) = slice.indices(s.len())?;
        if step == 1 {
            let start = start as usize;
            let stop = (stop.max(start as i64)) as usize;
            trace!(class = %proxy.class().name(), start, stop, count = raw.len(), "slice write");
            s.splice(start, stop, raw);
            return Ok(());
        }

        let positions = slice.positions(s.len())?;
        if positions.len() != raw.len() {
            return Err(ProxyError::invalid_value(format!(
                "attempt to assign sequence of size {} to extended slice of size {}",
                raw.len(),
                positions.len()
            )));
        }
        for (index, value) in positions.into_iter().zip(raw) {
            store_at(s, index, value)?;
        }
        Ok(())
    }

    pub fn del_slice(proxy: &Proxy, slice: Slice) -> ProxyResult<()> {
        let s = require_sequence(proxy, "slice deletion")?;
        let mut positions = slice.positions(s.len())?;
        positions.sort_unstable_by(|a, b| b.cmp(a));
        for index in positions {
            s.remove(index);
        }
        Ok(())
    }

    fn store_at(s: &Sequence, index: usize, raw: Value) -> ProxyResult<()> {
        s.set(index, raw).map(|_| ()).ok_or(ProxyError::IndexOutOfRange {
            index: index as i64,
            len: s.len(),
        })
    }

    fn remove_key(m: &Mapping, key: String) -> ProxyResult<()> {
        match m.remove(&key) {
            Some(_) => Ok(()),
            None => Err(ProxyError::KeyNotFound { key }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_indices_follow_slice_rules() {
        assert_eq!(Slice::full().indices(5).unwrap(), (0, 5, 1));
        assert_eq!(Slice::from(1i64..3).indices(5).unwrap(), (1, 3, 1));
        assert_eq!(Slice::from(-2i64..).indices(5).unwrap(), (3, 5, 1));
        assert_eq!(Slice::from(..100i64).indices(5).unwrap(), (0, 5, 1));
        assert_eq!(Slice::full().with_step(-1).indices(5).unwrap(), (4, -1, -1));
        assert!(Slice::full().with_step(0).indices(5).is_err());
    }

    #[test]
    fn test_slice_positions() {
        assert_eq!(Slice::from(1i64..4).positions(5).unwrap(), vec![1, 2, 3]);
        assert_eq!(Slice::full().with_step(2).positions(5).unwrap(), vec![0, 2, 4]);
        assert_eq!(Slice::full().with_step(-2).positions(5).unwrap(), vec![4, 2, 0]);
        assert!(Slice::from(3i64..1).positions(5).unwrap().is_empty());
        assert!(Slice::full().positions(0).unwrap().is_empty());
    }

    #[test]
    fn test_slice_extreme_steps() {
        let reversed = Slice::full().with_step(i64::MIN);
        assert_eq!(reversed.indices(3).unwrap(), (2, -1, -i64::MAX));
        assert_eq!(reversed.positions(3).unwrap(), vec![2]);
        assert_eq!(Slice::full().with_step(i64::MAX).positions(3).unwrap(), vec![0]);
        assert!(Slice::full().with_step(i64::MIN).positions(0).unwrap().is_empty());
    }
}
