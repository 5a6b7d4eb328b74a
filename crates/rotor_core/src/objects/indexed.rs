//! The integer-indexed storage interface.
//!
//! Subclasses that carry integer-indexed properties (arrays here; typed
//! arrays, arguments objects and string wrappers in a full engine) override
//! a small virtual table of indexed operations.  Per the allocation-time
//! discrimination model, the "vtable" is [`IndexedStorage`]: a tagged
//! variant chosen when the cell is allocated and immutable afterwards.
//! Plain objects use [`IndexedStorage::None`], whose defaults report no
//! indexed range, reject sets, and pass the seal/freeze checks vacuously.

use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::objects::js_array::ArrayStorage;
use crate::objects::property::PropertyFlags;
use crate::objects::value::JsValue;

/// Which whole-range check [`IndexedStorage::check_all_own_indexed`] runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CheckAllOwnIndexedMode {
    /// `isSealed`: every own indexed property must be non-configurable.
    NonConfigurable,
    /// `isFrozen`: every own indexed property must also be read-only.
    ReadOnly,
}

/// Integer-indexed backing store, discriminated at allocation time.
pub enum IndexedStorage {
    /// Plain object: no indexed range.
    None,
    /// Array: a dense element vector plus the `length` value.
    Array(ArrayStorage),
}

impl IndexedStorage {
    /// Returns `true` for the array variant.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Borrow the array storage, if this is an array.
    pub fn as_array(&self) -> Option<&ArrayStorage> {
        match self {
            Self::Array(a) => Some(a),
            Self::None => None,
        }
    }

    /// Mutably borrow the array storage, if this is an array.
    pub fn as_array_mut(&mut self) -> Option<&mut ArrayStorage> {
        match self {
            Self::Array(a) => Some(a),
            Self::None => None,
        }
    }

    /// The `[lo, hi)` range of indexes this store could own.
    pub fn own_indexed_range(&self) -> (u32, u32) {
        match self {
            Self::None => (0, 0),
            Self::Array(a) => a.own_indexed_range(),
        }
    }

    /// Returns `true` if index `i` is present.
    pub fn have_own_indexed(&self, i: u32) -> bool {
        match self {
            Self::None => false,
            Self::Array(a) => a.have_own_indexed(i),
        }
    }

    /// The property flags of index `i`, or `None` if absent.
    pub fn own_indexed_flags(&self, i: u32) -> Option<PropertyFlags> {
        match self {
            Self::None => None,
            Self::Array(a) => a.own_indexed_flags(i),
        }
    }

    /// The value at index `i`; [`JsValue::Empty`] if absent.
    pub fn get_own_indexed(&self, i: u32) -> JsValue {
        match self {
            Self::None => JsValue::Empty,
            Self::Array(a) => a.get_own_indexed(i),
        }
    }

    /// Store `value` at index `i`.  Returns `false` when the store rejects
    /// the write (plain objects always reject).
    pub fn set_own_indexed(&mut self, i: u32, value: JsValue) -> bool {
        match self {
            Self::None => false,
            Self::Array(a) => a.set_own_indexed(i, value),
        }
    }

    /// Remove index `i`.  Returns `false` when the store cannot delete.
    pub fn delete_own_indexed(&mut self, i: u32) -> bool {
        match self {
            Self::None => false,
            Self::Array(a) => a.delete_own_indexed(i),
        }
    }

    /// Whole-range attribute check used by `isSealed` / `isFrozen`.
    /// Vacuously `true` when no indexed property exists.
    pub fn check_all_own_indexed(&self, mode: CheckAllOwnIndexedMode) -> bool {
        match self {
            Self::None => true,
            Self::Array(a) => a.check_all_own_indexed(mode),
        }
    }
}

impl Trace for IndexedStorage {
    fn trace(&self, tracer: &mut Tracer) {
        if let Self::Array(a) = self {
            a.trace(tracer);
        }
    }
}

impl Relocate for IndexedStorage {
    fn relocate(&mut self, map: &ForwardingMap) {
        if let Self::Array(a) = self {
            a.relocate(map);
        }
    }
}
