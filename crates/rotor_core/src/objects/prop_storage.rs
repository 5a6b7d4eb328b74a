//! Indirect property-slot storage.
//!
//! The first [`DIRECT_PROPERTY_SLOTS`][crate::objects::js_object::DIRECT_PROPERTY_SLOTS]
//! property values live inline in the object cell; everything past that
//! spills into a [`PropStorage`], a growable slot vector.  Slot `D + k` of
//! an object maps to index `k` here, uniformly across all operations.

use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::objects::value::JsValue;

/// Initial capacity of a freshly spilled indirect store.
pub const DEFAULT_PROPERTY_CAPACITY: usize = 4;

/// A growable indirect slot vector.
///
/// Slots between `size` and `capacity` are reserved but not yet live;
/// [`resize_within_capacity`][Self::resize_within_capacity] makes them live
/// without reallocating.
pub struct PropStorage {
    slots: Vec<JsValue>,
}

impl PropStorage {
    /// Create an empty store with room for `capacity` slots.
    pub fn create(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Number of live slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots available without reallocating.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Borrow the value in slot `i`.
    pub fn at(&self, i: usize) -> &JsValue {
        &self.slots[i]
    }

    /// Overwrite slot `i`.
    pub fn set_at(&mut self, i: usize, value: JsValue) {
        self.slots[i] = value;
    }

    /// Grow (or shrink) the live region to `n` slots, reallocating if
    /// needed.  New slots read as [`JsValue::Empty`].
    pub fn resize(&mut self, n: usize) {
        self.slots.resize(n, JsValue::Empty);
    }

    /// Grow the live region to `n` slots without reallocating.
    pub fn resize_within_capacity(&mut self, n: usize) {
        debug_assert!(n <= self.capacity(), "resize must fit existing capacity");
        self.slots.resize(n, JsValue::Empty);
    }
}

impl Trace for PropStorage {
    fn trace(&self, tracer: &mut Tracer) {
        for v in &self.slots {
            v.trace(tracer);
        }
    }
}

impl Relocate for PropStorage {
    fn relocate(&mut self, map: &ForwardingMap) {
        for v in &mut self.slots {
            v.relocate(map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_reserves_capacity_without_size() {
        let storage = PropStorage::create(4);
        assert_eq!(storage.size(), 0);
        assert!(storage.capacity() >= 4);
    }

    #[test]
    fn test_resize_fills_with_empty() {
        let mut storage = PropStorage::create(2);
        storage.resize(3);
        assert_eq!(storage.size(), 3);
        assert!(storage.at(0).is_empty());
        assert!(storage.at(2).is_empty());
    }

    #[test]
    fn test_set_and_read_back() {
        let mut storage = PropStorage::create(2);
        storage.resize(1);
        storage.set_at(0, JsValue::Smi(9));
        assert_eq!(*storage.at(0), JsValue::Smi(9));
    }

    #[test]
    fn test_resize_within_capacity_keeps_values() {
        let mut storage = PropStorage::create(4);
        storage.resize_within_capacity(1);
        storage.set_at(0, JsValue::Smi(1));
        storage.resize_within_capacity(3);
        assert_eq!(storage.size(), 3);
        assert_eq!(*storage.at(0), JsValue::Smi(1));
        assert!(storage.at(2).is_empty());
    }
}
