//! JavaScript arrays: the canonical indexed-storage subclass.
//!
//! An array is an ordinary object whose cell carries
//! [`IndexedStorage::Array`] and whose `length` is an own named property
//! with the `INTERNAL_SETTER` bit: writes to it dispatch to
//! [`JsArray::set_length`], which keeps the slot value, the stored length,
//! and the element vector in agreement.
//!
//! # Holes
//!
//! Elements are a dense vector where absent slots hold
//! [`JsValue::Empty`].  `length` may exceed the vector (trailing holes are
//! implicit); the vector never exceeds `length` because growing writes
//! update `length` first.

use crate::error::RotorResult;
use crate::gc::handle::Handle;
use crate::gc::heap::GcPtr;
use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::objects::indexed::{CheckAllOwnIndexedMode, IndexedStorage};
use crate::objects::js_object::{JsObject, ObjectFlags};
use crate::objects::property::{PropOpFlags, PropertyFlags};
use crate::objects::value::{JsValue, number_from_u32};
use crate::runtime::Runtime;

/// Dense element storage plus the array's `length`.
pub struct ArrayStorage {
    elements: Vec<JsValue>,
    length: u32,
}

impl ArrayStorage {
    /// Create storage for an array of `length` (all holes).
    pub fn new(length: u32) -> Self {
        Self {
            elements: Vec::new(),
            length,
        }
    }

    /// The array's `length` value.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub(crate) fn own_indexed_range(&self) -> (u32, u32) {
        (0, self.elements.len() as u32)
    }

    pub(crate) fn have_own_indexed(&self, i: u32) -> bool {
        self.elements
            .get(i as usize)
            .is_some_and(|v| !v.is_empty())
    }

    pub(crate) fn own_indexed_flags(&self, i: u32) -> Option<PropertyFlags> {
        if self.have_own_indexed(i) {
            // Array elements are plain data: enumerable, writable,
            // configurable.
            Some(
                PropertyFlags::ENUMERABLE
                    | PropertyFlags::WRITABLE
                    | PropertyFlags::CONFIGURABLE,
            )
        } else {
            None
        }
    }

    pub(crate) fn get_own_indexed(&self, i: u32) -> JsValue {
        self.elements
            .get(i as usize)
            .cloned()
            .unwrap_or(JsValue::Empty)
    }

    pub(crate) fn set_own_indexed(&mut self, i: u32, value: JsValue) -> bool {
        let i = i as usize;
        if i >= self.elements.len() {
            self.elements.resize(i + 1, JsValue::Empty);
        }
        self.elements[i] = value;
        true
    }

    pub(crate) fn delete_own_indexed(&mut self, i: u32) -> bool {
        if let Some(slot) = self.elements.get_mut(i as usize) {
            *slot = JsValue::Empty;
        }
        true
    }

    pub(crate) fn check_all_own_indexed(&self, _mode: CheckAllOwnIndexedMode) -> bool {
        // Every present element is configurable and writable, so it fails
        // both modes; the check passes only when no element is present.
        self.elements.iter().all(JsValue::is_empty)
    }

    /// Install a new length: trailing elements are dropped on shrink.
    fn set_length_raw(&mut self, new_length: u32) {
        if (new_length as usize) < self.elements.len() {
            self.elements.truncate(new_length as usize);
        }
        self.length = new_length;
    }
}

impl Trace for ArrayStorage {
    fn trace(&self, tracer: &mut Tracer) {
        for v in &self.elements {
            v.trace(tracer);
        }
    }
}

impl Relocate for ArrayStorage {
    fn relocate(&mut self, map: &ForwardingMap) {
        for v in &mut self.elements {
            v.relocate(map);
        }
    }
}

/// The array operations layered over [`JsObject`].
pub struct JsArray;

impl JsArray {
    /// Create an array of the given starting `length`.
    pub fn create(rt: &mut Runtime, parent: Option<Handle>, length: u32) -> Handle {
        let obj = JsObject::create_raw(
            rt,
            parent,
            IndexedStorage::Array(ArrayStorage::new(length)),
            ObjectFlags::INDEXED_STORAGE | ObjectFlags::FAST_INDEX_PROPERTIES,
        );
        let length_sym = rt.predefined.length;
        let value = rt.make_handle(number_from_u32(length));
        JsObject::define_new_own_property(
            rt,
            obj,
            length_sym,
            PropertyFlags::WRITABLE | PropertyFlags::INTERNAL_SETTER,
            value,
        );
        obj
    }

    /// The array's current `length`.
    pub fn get_length(rt: &Runtime, ptr: GcPtr) -> u32 {
        rt.heap()
            .object(ptr)
            .indexed()
            .as_array()
            .expect("receiver is an array")
            .length()
    }

    /// The `length` internal setter: validate the value, truncate element
    /// storage on shrink, and rewrite the `length` slot canonically.
    ///
    /// Writability of `length` is the caller's business (the put and define
    /// engines check it before dispatching here).
    pub fn set_length(
        rt: &mut Runtime,
        obj: Handle,
        value: &JsValue,
        _op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        let new_length = match value.as_number() {
            Some(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => n as u32,
            _ => return Err(rt.raise_type_error("Invalid array length")),
        };

        let ptr = rt.handle_object(obj);
        rt.heap
            .object_mut(ptr)
            .indexed_mut()
            .as_array_mut()
            .expect("receiver is an array")
            .set_length_raw(new_length);

        let desc = JsObject::lookup_own_property(rt, ptr, rt.predefined.length)
            .expect("arrays always carry length");
        JsObject::set_named_slot_value(rt, ptr, desc, number_from_u32(new_length));
        Ok(true)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RotorError;

    fn put_index(rt: &mut Runtime, arr: Handle, i: u32, value: JsValue) -> bool {
        let v = rt.make_handle(value);
        JsObject::put_computed(rt, arr, &number_from_u32(i), v, PropOpFlags::empty()).unwrap()
    }

    fn get_index(rt: &mut Runtime, arr: Handle, i: u32) -> JsValue {
        JsObject::get_computed(rt, arr, &number_from_u32(i)).unwrap()
    }

    fn length_of(rt: &mut Runtime, arr: Handle) -> JsValue {
        let length = rt.predefined().length;
        JsObject::get_named(rt, arr, length, PropOpFlags::empty(), None).unwrap()
    }

    // ── Creation ─────────────────────────────────────────────────────────────

    #[test]
    fn test_new_array_has_length_property() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 3);
        assert_eq!(length_of(&mut rt, arr), JsValue::Smi(3));
        assert_eq!(JsArray::get_length(&rt, rt.handle_object(arr)), 3);
        // All slots below length are holes.
        assert_eq!(get_index(&mut rt, arr, 0), JsValue::Undefined);
    }

    #[test]
    fn test_array_flags() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let flags = rt.heap().object(rt.handle_object(arr)).flags();
        assert!(flags.contains(ObjectFlags::INDEXED_STORAGE));
        assert!(flags.contains(ObjectFlags::FAST_INDEX_PROPERTIES));
    }

    // ── Element writes and length growth ─────────────────────────────────────

    #[test]
    fn test_put_beyond_length_grows_length_first() {
        // putComputed(A, 3, "v") then A.length == 4.
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        assert!(put_index(
            &mut rt,
            arr,
            3,
            JsValue::String("v".to_string())
        ));
        assert_eq!(length_of(&mut rt, arr), JsValue::Smi(4));
        assert_eq!(get_index(&mut rt, arr, 3), JsValue::String("v".to_string()));
        // The gap slots are holes, not stored undefineds.
        let ptr = rt.handle_object(arr);
        assert!(!JsObject::have_own_indexed(&rt, ptr, 0));
    }

    #[test]
    fn test_put_within_length_does_not_touch_length() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 10);
        assert!(put_index(&mut rt, arr, 2, JsValue::Smi(5)));
        assert_eq!(length_of(&mut rt, arr), JsValue::Smi(10));
    }

    // ── length writes ────────────────────────────────────────────────────────

    #[test]
    fn test_shrinking_length_drops_elements() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        for i in 0..4 {
            put_index(&mut rt, arr, i, JsValue::Smi(i as i32));
        }
        let length = rt.predefined().length;
        let v = rt.make_handle(JsValue::Smi(2));
        assert!(JsObject::put_named(&mut rt, arr, length, v, PropOpFlags::empty()).unwrap());

        assert_eq!(length_of(&mut rt, arr), JsValue::Smi(2));
        assert_eq!(get_index(&mut rt, arr, 0), JsValue::Smi(0));
        assert_eq!(get_index(&mut rt, arr, 1), JsValue::Smi(1));
        assert_eq!(get_index(&mut rt, arr, 2), JsValue::Undefined);
        let ptr = rt.handle_object(arr);
        assert!(!JsObject::have_own_indexed(&rt, ptr, 3));
    }

    #[test]
    fn test_growing_length_adds_holes() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        put_index(&mut rt, arr, 0, JsValue::Smi(1));
        let length = rt.predefined().length;
        let v = rt.make_handle(JsValue::Smi(100));
        assert!(JsObject::put_named(&mut rt, arr, length, v, PropOpFlags::empty()).unwrap());
        assert_eq!(length_of(&mut rt, arr), JsValue::Smi(100));
        assert_eq!(get_index(&mut rt, arr, 0), JsValue::Smi(1));
        assert_eq!(get_index(&mut rt, arr, 50), JsValue::Undefined);
    }

    #[test]
    fn test_non_numeric_length_is_a_type_error() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let length = rt.predefined().length;
        for bad in [
            JsValue::String("x".to_string()),
            JsValue::HeapNumber(1.5),
            JsValue::HeapNumber(-1.0),
            JsValue::Undefined,
        ] {
            let v = rt.make_handle(bad);
            let err = JsObject::put_named(&mut rt, arr, length, v, PropOpFlags::empty())
                .unwrap_err();
            assert!(matches!(err, RotorError::TypeError(_)));
        }
    }

    #[test]
    fn test_read_only_length_blocks_growth_via_put() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 1);
        put_index(&mut rt, arr, 0, JsValue::Smi(1));

        let length = rt.predefined().length;
        let v = rt.make_handle(JsValue::Undefined);
        let dpf = crate::objects::property::DefinePropertyFlags {
            writable: false,
            set_writable: true,
            ..Default::default()
        };
        assert!(
            JsObject::define_own_property(&mut rt, arr, length, dpf, v, PropOpFlags::empty())
                .unwrap()
        );

        // Writing past length must fail on the length update.
        assert!(!put_index(&mut rt, arr, 5, JsValue::Smi(9)));
        assert_eq!(length_of(&mut rt, arr), JsValue::Smi(1));
        // In-range writes still work: the element itself is writable.
        assert!(put_index(&mut rt, arr, 0, JsValue::Smi(2)));
        assert_eq!(get_index(&mut rt, arr, 0), JsValue::Smi(2));
    }

    // ── Storage-level behaviour ──────────────────────────────────────────────

    #[test]
    fn test_storage_delete_leaves_length() {
        let mut storage = ArrayStorage::new(0);
        storage.set_own_indexed(2, JsValue::Smi(1));
        assert!(storage.delete_own_indexed(2));
        assert!(!storage.have_own_indexed(2));
        assert_eq!(storage.get_own_indexed(2), JsValue::Empty);
        // The range may keep reporting the slot; it simply reads as a hole.
        assert_eq!(storage.own_indexed_range().0, 0);
    }

    #[test]
    fn test_storage_check_all_fails_with_any_element() {
        let mut storage = ArrayStorage::new(0);
        assert!(storage.check_all_own_indexed(CheckAllOwnIndexedMode::NonConfigurable));
        storage.set_own_indexed(0, JsValue::Smi(1));
        assert!(!storage.check_all_own_indexed(CheckAllOwnIndexedMode::NonConfigurable));
        assert!(!storage.check_all_own_indexed(CheckAllOwnIndexedMode::ReadOnly));
        storage.delete_own_indexed(0);
        assert!(storage.check_all_own_indexed(CheckAllOwnIndexedMode::ReadOnly));
    }

    #[test]
    fn test_length_slot_and_storage_agree_after_mixed_operations() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        put_index(&mut rt, arr, 0, JsValue::Smi(1));
        put_index(&mut rt, arr, 7, JsValue::Smi(2));
        let length = rt.predefined().length;
        let v = rt.make_handle(JsValue::Smi(3));
        JsObject::put_named(&mut rt, arr, length, v, PropOpFlags::empty()).unwrap();
        put_index(&mut rt, arr, 3, JsValue::Smi(4));

        let ptr = rt.handle_object(arr);
        let slot_value = length_of(&mut rt, arr);
        assert_eq!(slot_value, JsValue::Smi(4));
        assert_eq!(JsArray::get_length(&rt, ptr), 4);
    }
}
