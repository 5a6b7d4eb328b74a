//! The JavaScript object cell and the named/computed property engines.
//!
//! # Storage model
//!
//! Every object holds its first [`DIRECT_PROPERTY_SLOTS`] property values
//! inline; later slots spill into an indirect
//! [`PropStorage`].  Which name lives in
//! which slot is the hidden class's business: the object only stores values,
//! and slot `D + k` uniformly maps to `indirect_props[k]`.
//!
//! # Handle discipline
//!
//! Operations that may allocate (anything that can run a lazy initializer,
//! an accessor, or a host hook) take their object and value arguments as
//! [`Handle`]s.  Raw [`GcPtr`]s appear only in regions with no allocation
//! and are re-resolved from handles after every call out.

use std::rc::Rc;

use bitflags::bitflags;

use crate::error::RotorResult;
use crate::gc::handle::Handle;
use crate::gc::heap::{GcPtr, HeapCell};
use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::identifier::{SymbolId, to_array_index, to_array_index_fast_path};
use crate::objects::callable::call_function;
use crate::objects::hidden_class::ClassId;
use crate::objects::host::HostHooksRef;
use crate::objects::indexed::{CheckAllOwnIndexedMode, IndexedStorage};
use crate::objects::js_array::JsArray;
use crate::objects::prop_storage::{DEFAULT_PROPERTY_CAPACITY, PropStorage};
use crate::objects::property::{
    ComputedPropertyDescriptor, DefinePropertyFlags, NamedPropertyDescriptor, PropOpFlags,
    PropertyCacheEntry, PropertyFlags,
};
use crate::objects::value::{JsValue, number_from_u32};
use crate::runtime::Runtime;

/// Number of property values stored inline in the object cell.
pub const DIRECT_PROPERTY_SLOTS: usize = 4;

bitflags! {
    /// The object cell's flag byte.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct ObjectFlags: u8 {
        /// New properties cannot be added.
        const NO_EXTEND             = 0b0000_0001;
        /// Cached result of `isSealed`; implies `NO_EXTEND`.
        const SEALED                = 0b0000_0010;
        /// Cached result of `isFrozen`; implies `SEALED`.
        const FROZEN                = 0b0000_0100;
        /// Properties are installed by an initializer on first access.
        const LAZY_OBJECT           = 0b0000_1000;
        /// Named misses delegate to the host callback.
        const HOST_OBJECT           = 0b0001_0000;
        /// The cell carries integer-indexed storage.
        const INDEXED_STORAGE       = 0b0010_0000;
        /// No index-like *named* property exists, so integer keys may go
        /// straight to indexed storage without interning.
        const FAST_INDEX_PROPERTIES = 0b0100_0000;
    }
}

/// Installs the real properties of a lazy object on first access.
pub type LazyInitializer = fn(&mut Runtime, Handle) -> RotorResult<()>;

/// A JavaScript object heap cell.
pub struct JsObject {
    /// Prototype, or `None` at the end of the chain.
    parent: Option<GcPtr>,
    /// Current hidden class.
    class: ClassId,
    /// The first `DIRECT_PROPERTY_SLOTS` property values, inline.
    direct_props: [JsValue; DIRECT_PROPERTY_SLOTS],
    /// Spill storage for slots `DIRECT_PROPERTY_SLOTS..`.
    indirect_props: Option<PropStorage>,
    /// The flag byte.
    flags: ObjectFlags,
    /// Lazily assigned stable identity; 0 = unassigned.
    object_id: u32,
    /// Integer-indexed backing store; variant fixed at allocation.
    indexed: IndexedStorage,
    /// Host callbacks, present iff `HOST_OBJECT`.
    host: Option<HostHooksRef>,
    /// Lazy initializer, present until the first access.
    lazy_init: Option<LazyInitializer>,
}

impl JsObject {
    fn new_cell(
        parent: Option<GcPtr>,
        class: ClassId,
        flags: ObjectFlags,
        indexed: IndexedStorage,
    ) -> Self {
        Self {
            parent,
            class,
            direct_props: std::array::from_fn(|_| JsValue::Empty),
            indirect_props: None,
            flags,
            object_id: 0,
            indexed,
            host: None,
            lazy_init: None,
        }
    }

    // ── Cell accessors ────────────────────────────────────────────────────────

    /// The current hidden class.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// The flag byte.
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// The prototype cell, if any.
    pub fn parent(&self) -> Option<GcPtr> {
        self.parent
    }

    /// Returns `true` while new properties may be added.
    pub fn is_extensible(&self) -> bool {
        !self.flags.contains(ObjectFlags::NO_EXTEND)
    }

    /// The indexed backing store.
    pub fn indexed(&self) -> &IndexedStorage {
        &self.indexed
    }

    pub(crate) fn indexed_mut(&mut self) -> &mut IndexedStorage {
        &mut self.indexed
    }

    /// Install a new hidden class after a transition.
    pub(crate) fn set_class(&mut self, class: ClassId) {
        self.class = class;
    }

    /// Clear a flag bit.
    pub(crate) fn clear_flag(&mut self, flag: ObjectFlags) {
        self.flags.remove(flag);
    }

    /// Whether this object may participate in a for-in cache: not a host
    /// object, not lazy, and not in dictionary mode.
    pub(crate) fn should_cache_for_in(
        &self,
        classes: &crate::objects::hidden_class::ClassRegistry,
    ) -> bool {
        !self
            .flags
            .intersects(ObjectFlags::HOST_OBJECT | ObjectFlags::LAZY_OBJECT)
            && !classes.is_dictionary(self.class)
    }

    pub(crate) fn host_hooks(&self) -> HostHooksRef {
        Rc::clone(self.host.as_ref().expect("host object carries hooks"))
    }

    /// Read the value in a named slot.
    pub(crate) fn named_slot_value(&self, desc: NamedPropertyDescriptor) -> JsValue {
        let slot = desc.slot as usize;
        if slot < DIRECT_PROPERTY_SLOTS {
            self.direct_props[slot].clone()
        } else {
            self.indirect_props
                .as_ref()
                .expect("slot beyond direct range requires indirect storage")
                .at(slot - DIRECT_PROPERTY_SLOTS)
                .clone()
        }
    }

    // ── Factories ─────────────────────────────────────────────────────────────

    /// Create an ordinary object with the given prototype.
    pub fn create(rt: &mut Runtime, parent: Option<Handle>) -> Handle {
        Self::create_raw(rt, parent, IndexedStorage::None, ObjectFlags::empty())
    }

    /// Create an ordinary object, pre-allocating storage for
    /// `property_count_hint` properties.
    pub fn create_with_capacity(
        rt: &mut Runtime,
        parent: Option<Handle>,
        property_count_hint: u32,
    ) -> Handle {
        let obj = Self::create_raw(rt, parent, IndexedStorage::None, ObjectFlags::empty());
        let hint = property_count_hint as usize;
        if hint > DIRECT_PROPERTY_SLOTS {
            let ptr = rt.handle_object(obj);
            rt.heap.object_mut(ptr).indirect_props =
                Some(PropStorage::create(hint - DIRECT_PROPERTY_SLOTS));
        }
        obj
    }

    /// Create an object whose shape is `class` (its slots read as
    /// `undefined` until written).  The fast-index bit is cleared when the
    /// class already carries index-like names.
    pub fn create_with_class(rt: &mut Runtime, parent: Option<Handle>, class: ClassId) -> Handle {
        let count = rt.classes.next_slot(class);
        let obj = Self::create_with_capacity(rt, parent, count);
        let ptr = rt.handle_object(obj);
        let cell = rt.heap.object_mut(ptr);
        cell.class = class;
        for slot in 0..(count as usize).min(DIRECT_PROPERTY_SLOTS) {
            cell.direct_props[slot] = JsValue::Undefined;
        }
        if count as usize > DIRECT_PROPERTY_SLOTS {
            let storage = cell.indirect_props.as_mut().expect("capacity reserved");
            storage.resize_within_capacity(count as usize - DIRECT_PROPERTY_SLOTS);
            for k in 0..storage.size() {
                storage.set_at(k, JsValue::Undefined);
            }
        }
        if rt.classes.has_index_like_properties(class) {
            rt.heap
                .object_mut(ptr)
                .flags
                .remove(ObjectFlags::FAST_INDEX_PROPERTIES);
        }
        obj
    }

    /// Create a host object delegating named misses to `hooks`.
    pub fn create_host(rt: &mut Runtime, parent: Option<Handle>, hooks: HostHooksRef) -> Handle {
        let obj = Self::create_raw(rt, parent, IndexedStorage::None, ObjectFlags::HOST_OBJECT);
        let ptr = rt.handle_object(obj);
        rt.heap.object_mut(ptr).host = Some(hooks);
        obj
    }

    /// Create a lazy object whose properties `init` installs on first
    /// access.
    pub fn create_lazy(rt: &mut Runtime, parent: Option<Handle>, init: LazyInitializer) -> Handle {
        let obj = Self::create_raw(rt, parent, IndexedStorage::None, ObjectFlags::LAZY_OBJECT);
        let ptr = rt.handle_object(obj);
        rt.heap.object_mut(ptr).lazy_init = Some(init);
        obj
    }

    pub(crate) fn create_raw(
        rt: &mut Runtime,
        parent: Option<Handle>,
        indexed: IndexedStorage,
        extra_flags: ObjectFlags,
    ) -> Handle {
        rt.maybe_collect();
        let parent_ptr = parent.map(|h| rt.handle_object(h));
        let proto_key = parent_ptr.map(|p| Self::object_id_of(rt, p));
        let class = rt.classes.root_class_for_prototype(proto_key);
        let cell = Self::new_cell(parent_ptr, class, extra_flags, indexed);
        let ptr = rt.heap.allocate(HeapCell::Object(cell));
        rt.make_handle(JsValue::Object(ptr))
    }

    // ── Object identity ───────────────────────────────────────────────────────

    /// The stable nonzero identity of `obj`, assigned on first request.
    pub fn get_object_id(rt: &mut Runtime, obj: Handle) -> u32 {
        let ptr = rt.handle_object(obj);
        Self::object_id_of(rt, ptr)
    }

    fn object_id_of(rt: &mut Runtime, ptr: GcPtr) -> u32 {
        let existing = rt.heap.object(ptr).object_id;
        if existing != 0 {
            return existing;
        }
        let mut id = rt.generate_next_object_id();
        // Zero means "unassigned"; shift a wrapped counter down by one.
        if id == 0 {
            id = id.wrapping_sub(1);
        }
        rt.heap.object_mut(ptr).object_id = id;
        id
    }

    // ── Lazy objects ──────────────────────────────────────────────────────────

    /// Run the lazy initializer and clear the flag.  The flag is cleared
    /// *first* so definitions made by the initializer see a regular object.
    pub fn initialize_lazy_object(rt: &mut Runtime, obj: Handle) -> RotorResult<()> {
        let ptr = rt.handle_object(obj);
        let cell = rt.heap.object_mut(ptr);
        debug_assert!(cell.flags.contains(ObjectFlags::LAZY_OBJECT));
        cell.flags.remove(ObjectFlags::LAZY_OBJECT);
        let init = cell.lazy_init.take().expect("lazy object has an initializer");
        init(rt, obj)
    }

    // ── Slot writes ───────────────────────────────────────────────────────────

    /// Write a named slot through the barrier.
    pub(crate) fn set_named_slot_value(
        rt: &mut Runtime,
        ptr: GcPtr,
        desc: NamedPropertyDescriptor,
        value: JsValue,
    ) {
        rt.heap.record_write(ptr, &value);
        let cell = rt.heap.object_mut(ptr);
        let slot = desc.slot as usize;
        if slot < DIRECT_PROPERTY_SLOTS {
            cell.direct_props[slot] = value;
        } else {
            cell.indirect_props
                .as_mut()
                .expect("slot beyond direct range requires indirect storage")
                .set_at(slot - DIRECT_PROPERTY_SLOTS, value);
        }
    }

    /// Place the value of a freshly added property into its slot, growing
    /// the indirect storage when the slot falls past the direct range.
    pub(crate) fn allocate_new_slot_storage(
        rt: &mut Runtime,
        obj: Handle,
        new_slot: u32,
        value: JsValue,
    ) {
        let ptr = rt.handle_object(obj);
        rt.heap.record_write(ptr, &value);
        let cell = rt.heap.object_mut(ptr);
        let slot = new_slot as usize;
        if slot < DIRECT_PROPERTY_SLOTS {
            cell.direct_props[slot] = value;
            return;
        }

        let k = slot - DIRECT_PROPERTY_SLOTS;
        match &mut cell.indirect_props {
            None => {
                debug_assert_eq!(k, 0, "allocated slot must be at end");
                let mut storage = PropStorage::create(DEFAULT_PROPERTY_CAPACITY);
                storage.resize(1);
                storage.set_at(0, value);
                cell.indirect_props = Some(storage);
            }
            Some(storage) => {
                if k >= storage.capacity() {
                    debug_assert_eq!(k, storage.size(), "allocated slot must be at end");
                    storage.resize(k + 1);
                } else if k >= storage.size() {
                    debug_assert_eq!(k, storage.size(), "allocated slot must be at end");
                    storage.resize_within_capacity(k + 1);
                }
                storage.set_at(k, value);
            }
        }
    }

    // ── Indexed-storage wrappers ──────────────────────────────────────────────

    pub(crate) fn own_indexed_flags(rt: &Runtime, ptr: GcPtr, i: u32) -> Option<PropertyFlags> {
        rt.heap.object(ptr).indexed.own_indexed_flags(i)
    }

    pub(crate) fn have_own_indexed(rt: &Runtime, ptr: GcPtr, i: u32) -> bool {
        rt.heap.object(ptr).indexed.have_own_indexed(i)
    }

    pub(crate) fn get_own_indexed_raw(rt: &Runtime, ptr: GcPtr, i: u32) -> JsValue {
        rt.heap.object(ptr).indexed.get_own_indexed(i)
    }

    /// Store into indexed storage through the barrier.  Returns `false`
    /// when the store rejects the write.
    pub fn set_own_indexed(
        rt: &mut Runtime,
        obj: Handle,
        i: u32,
        value: &JsValue,
    ) -> RotorResult<bool> {
        let ptr = rt.handle_object(obj);
        rt.heap.record_write(ptr, value);
        Ok(rt
            .heap
            .object_mut(ptr)
            .indexed
            .set_own_indexed(i, value.clone()))
    }

    /// Remove an indexed slot.  Returns `false` when the store cannot
    /// delete.
    pub fn delete_own_indexed(rt: &mut Runtime, obj: Handle, i: u32) -> bool {
        let ptr = rt.handle_object(obj);
        rt.heap.object_mut(ptr).indexed.delete_own_indexed(i)
    }

    // ── Descriptor resolution ─────────────────────────────────────────────────

    /// Pure hidden-class lookup of an own named property.
    pub fn lookup_own_property(
        rt: &Runtime,
        ptr: GcPtr,
        name: SymbolId,
    ) -> Option<NamedPropertyDescriptor> {
        rt.classes.find_property(rt.heap.object(ptr).class, name)
    }

    /// Own-property lookup with the host synthesis and one lazy retry.
    ///
    /// When the class misses on a host object, a `{host_object, writable}`
    /// descriptor is synthesized, so class properties win over host
    /// properties without taxing the common case.
    pub fn find_own_property(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
    ) -> RotorResult<Option<NamedPropertyDescriptor>> {
        let ptr = rt.handle_object(obj);
        if let Some(desc) = Self::lookup_own_property(rt, ptr, name) {
            return Ok(Some(desc));
        }
        let flags = rt.heap.object(ptr).flags;
        if flags.contains(ObjectFlags::HOST_OBJECT) {
            return Ok(Some(NamedPropertyDescriptor {
                slot: 0,
                flags: PropertyFlags::HOST_OBJECT | PropertyFlags::WRITABLE,
            }));
        }
        if flags.contains(ObjectFlags::LAZY_OBJECT) {
            Self::initialize_lazy_object(rt, obj)?;
            let ptr = rt.handle_object(obj);
            return Ok(Self::lookup_own_property(rt, ptr, name));
        }
        Ok(None)
    }

    /// Walk the prototype chain resolving `name`; returns the owning cell
    /// and the descriptor.  The owner pointer is valid until the next
    /// allocation.
    pub fn get_named_descriptor(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
    ) -> RotorResult<Option<(GcPtr, NamedPropertyDescriptor)>> {
        let mark = rt.handle_mark();
        let start = rt.handle_value(obj);
        let cur = rt.make_handle(start);
        loop {
            if let Some(desc) = Self::find_own_property(rt, cur, name)? {
                let owner = rt.handle_object(cur);
                rt.flush_handles(mark);
                return Ok(Some((owner, desc)));
            }
            let parent = rt.heap.object(rt.handle_object(cur)).parent;
            match parent {
                None => {
                    rt.flush_handles(mark);
                    return Ok(None);
                }
                Some(p) => rt.handles.set(cur, JsValue::Object(p)),
            }
        }
    }

    /// Parse a computed key as an array index: the numeric fast path, then
    /// the string spelling.  Symbols never parse.
    pub(crate) fn computed_key_to_array_index(key: &JsValue) -> Option<u32> {
        to_array_index_fast_path(key).or_else(|| match key {
            JsValue::String(s) => to_array_index(s),
            _ => None,
        })
    }

    /// Own-property lookup for a primitive computed key.
    ///
    /// With `FAST_INDEX_PROPERTIES` and an already-numeric key, indexed
    /// storage answers directly — present or absent — without interning.
    /// Otherwise the key is interned, named storage is consulted, and the
    /// (possibly expensive) index parse only runs when the receiver carries
    /// indexed storage.
    pub fn get_own_computed_primitive_descriptor(
        rt: &mut Runtime,
        obj: Handle,
        key: &JsValue,
    ) -> RotorResult<Option<ComputedPropertyDescriptor>> {
        debug_assert!(key.is_primitive(), "computed keys must be primitive");
        let ptr = rt.handle_object(obj);
        let flags = rt.heap.object(ptr).flags;

        if flags.contains(ObjectFlags::FAST_INDEX_PROPERTIES) {
            if let Some(i) = to_array_index_fast_path(key) {
                if let Some(f) = Self::own_indexed_flags(rt, ptr, i) {
                    return Ok(Some(ComputedPropertyDescriptor {
                        slot: i,
                        flags: f | PropertyFlags::INDEXED,
                    }));
                }
                // A valid index, not in indexed storage, and no index-like
                // named properties exist: definitively absent.
                return Ok(None);
            }
        }

        let id = rt.to_property_key(key);
        if let Some(desc) = Self::lookup_own_property(rt, ptr, id) {
            return Ok(Some(desc.into()));
        }

        if flags.contains(ObjectFlags::INDEXED_STORAGE) {
            if let Some(i) = Self::computed_key_to_array_index(key) {
                if let Some(f) = Self::own_indexed_flags(rt, ptr, i) {
                    return Ok(Some(ComputedPropertyDescriptor {
                        slot: i,
                        flags: f | PropertyFlags::INDEXED,
                    }));
                }
            }
        }

        if flags.contains(ObjectFlags::LAZY_OBJECT) {
            Self::initialize_lazy_object(rt, obj)?;
            return Self::get_own_computed_primitive_descriptor(rt, obj, key);
        }
        Ok(None)
    }

    /// Walk the prototype chain resolving a primitive computed key.
    pub fn get_computed_descriptor(
        rt: &mut Runtime,
        obj: Handle,
        key: &JsValue,
    ) -> RotorResult<Option<(GcPtr, ComputedPropertyDescriptor)>> {
        let mark = rt.handle_mark();
        let start = rt.handle_value(obj);
        let cur = rt.make_handle(start);
        loop {
            if let Some(desc) = Self::get_own_computed_primitive_descriptor(rt, cur, key)? {
                let owner = rt.handle_object(cur);
                rt.flush_handles(mark);
                return Ok(Some((owner, desc)));
            }
            let ptr = rt.handle_object(cur);
            if rt.heap.object(ptr).flags.contains(ObjectFlags::HOST_OBJECT) {
                rt.flush_handles(mark);
                return Ok(Some((
                    ptr,
                    ComputedPropertyDescriptor {
                        slot: 0,
                        flags: PropertyFlags::HOST_OBJECT | PropertyFlags::WRITABLE,
                    },
                )));
            }
            match rt.heap.object(ptr).parent {
                None => {
                    rt.flush_handles(mark);
                    return Ok(None);
                }
                Some(p) => rt.handles.set(cur, JsValue::Object(p)),
            }
        }
    }

    fn computed_slot_value(rt: &Runtime, owner: GcPtr, desc: ComputedPropertyDescriptor) -> JsValue {
        if desc.flags.contains(PropertyFlags::INDEXED) {
            Self::get_own_indexed_raw(rt, owner, desc.slot)
        } else {
            rt.heap.object(owner).named_slot_value(desc.as_named())
        }
    }

    // ── Get engine ────────────────────────────────────────────────────────────

    /// ECMAScript `[[Get]]` for a named property.
    ///
    /// On a plain-data hit whose owner class is in class mode, `cache` (if
    /// supplied) is stamped with the `(class, slot)` pair for the call
    /// site's inline cache.
    pub fn get_named(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        op_flags: PropOpFlags,
        cache: Option<&mut PropertyCacheEntry>,
    ) -> RotorResult<JsValue> {
        let Some((owner, desc)) = Self::get_named_descriptor(rt, obj, name)? else {
            if op_flags.must_exist() {
                let msg = format!("Property '{}' doesn't exist", rt.symbol_display(name));
                return Err(rt.raise_reference_error(msg));
            }
            return Ok(JsValue::Undefined);
        };

        if !desc
            .flags
            .intersects(PropertyFlags::ACCESSOR | PropertyFlags::HOST_OBJECT)
        {
            let value = rt.heap.object(owner).named_slot_value(desc);
            if let Some(entry) = cache {
                let owner_class = rt.heap.object(owner).class;
                if !rt.classes.is_dictionary(owner_class) {
                    *entry = PropertyCacheEntry {
                        class: owner_class,
                        slot: desc.slot,
                    };
                }
            }
            return Ok(value);
        }

        if desc.flags.contains(PropertyFlags::ACCESSOR) {
            let accessor = rt
                .heap
                .object(owner)
                .named_slot_value(desc)
                .as_object()
                .expect("accessor slot holds an accessor cell");
            let Some(getter) = rt.heap.accessor(accessor).getter else {
                return Ok(JsValue::Undefined);
            };
            let this = rt.handle_value(obj);
            return call_function(rt, getter, this, &[]);
        }

        debug_assert!(desc.flags.contains(PropertyFlags::HOST_OBJECT));
        let hooks = rt.heap.object(owner).host_hooks();
        hooks.get(rt, name)
    }

    /// Named get that reroutes index-like spellings to the computed path,
    /// so `"0"` and `0` name the same slot on indexed-storage objects.
    pub fn get_named_or_indexed(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        op_flags: PropOpFlags,
    ) -> RotorResult<JsValue> {
        let ptr = rt.handle_object(obj);
        if rt
            .heap
            .object(ptr)
            .flags
            .contains(ObjectFlags::INDEXED_STORAGE)
        {
            if let Some(i) = rt.identifiers.to_array_index_of(name) {
                return Self::get_computed(rt, obj, &number_from_u32(i));
            }
        }
        Self::get_named(rt, obj, name, op_flags, None)
    }

    /// ECMAScript `[[Get]]` for a primitive computed key.
    pub fn get_computed(rt: &mut Runtime, obj: Handle, key: &JsValue) -> RotorResult<JsValue> {
        debug_assert!(key.is_primitive(), "computed keys must be primitive");
        let ptr = rt.handle_object(obj);
        if rt
            .heap
            .object(ptr)
            .flags
            .contains(ObjectFlags::FAST_INDEX_PROPERTIES)
        {
            if let Some(i) = to_array_index_fast_path(key) {
                let value = Self::get_own_indexed_raw(rt, ptr, i);
                if !value.is_empty() {
                    return Ok(value);
                }
            }
        }

        let Some((owner, desc)) = Self::get_computed_descriptor(rt, obj, key)? else {
            return Ok(JsValue::Undefined);
        };

        if !desc
            .flags
            .intersects(PropertyFlags::ACCESSOR | PropertyFlags::HOST_OBJECT)
        {
            return Ok(Self::computed_slot_value(rt, owner, desc));
        }

        if desc.flags.contains(PropertyFlags::ACCESSOR) {
            let accessor = Self::computed_slot_value(rt, owner, desc)
                .as_object()
                .expect("accessor slot holds an accessor cell");
            let Some(getter) = rt.heap.accessor(accessor).getter else {
                return Ok(JsValue::Undefined);
            };
            let this = rt.handle_value(obj);
            return call_function(rt, getter, this, &[]);
        }

        debug_assert!(desc.flags.contains(PropertyFlags::HOST_OBJECT));
        let id = rt.to_property_key(key);
        let hooks = rt.heap.object(owner).host_hooks();
        hooks.get(rt, id)
    }

    // ── Has engine ────────────────────────────────────────────────────────────

    /// ECMAScript `[[HasProperty]]` for a named key.
    pub fn has_named(rt: &mut Runtime, obj: Handle, name: SymbolId) -> RotorResult<bool> {
        Ok(Self::get_named_descriptor(rt, obj, name)?.is_some())
    }

    /// Named has with index rerouting.  With `FAST_INDEX_PROPERTIES` an
    /// absent index answers `false` without a prototype walk.
    pub fn has_named_or_indexed(rt: &mut Runtime, obj: Handle, name: SymbolId) -> RotorResult<bool> {
        let ptr = rt.handle_object(obj);
        let flags = rt.heap.object(ptr).flags;
        if flags.contains(ObjectFlags::INDEXED_STORAGE) {
            if let Some(i) = rt.identifiers.to_array_index_of(name) {
                if Self::have_own_indexed(rt, ptr, i) {
                    return Ok(true);
                }
                if flags.contains(ObjectFlags::FAST_INDEX_PROPERTIES) {
                    return Ok(false);
                }
            }
        }
        Self::has_named(rt, obj, name)
    }

    /// ECMAScript `[[HasProperty]]` for a primitive computed key.
    pub fn has_computed(rt: &mut Runtime, obj: Handle, key: &JsValue) -> RotorResult<bool> {
        debug_assert!(key.is_primitive(), "computed keys must be primitive");
        let ptr = rt.handle_object(obj);
        if rt
            .heap
            .object(ptr)
            .flags
            .contains(ObjectFlags::FAST_INDEX_PROPERTIES)
        {
            if let Some(i) = to_array_index_fast_path(key) {
                if Self::have_own_indexed(rt, ptr, i) {
                    return Ok(true);
                }
            }
        }
        Ok(Self::get_computed_descriptor(rt, obj, key)?.is_some())
    }

    // ── Put engine ────────────────────────────────────────────────────────────

    fn raise_read_only(rt: &mut Runtime, op_flags: PropOpFlags, what: &str) -> RotorResult<bool> {
        if op_flags.throw_on_error() {
            let msg = format!("Cannot assign to read-only property '{what}'");
            return Err(rt.raise_type_error(msg));
        }
        Ok(false)
    }

    fn raise_indexed_read_only(rt: &mut Runtime, op_flags: PropOpFlags, i: u32) -> RotorResult<bool> {
        Self::raise_read_only(rt, op_flags, &i.to_string())
    }

    fn raise_static_builtin(rt: &mut Runtime, name: SymbolId) -> RotorResult<bool> {
        let display = rt.symbol_display(name);
        if rt.config.freeze_builtins_fatal_on_override {
            panic!("Attempting to override a static builtin: '{display}'");
        }
        let msg = format!("Attempting to override read-only builtin method '{display}'");
        Err(rt.raise_type_error(msg))
    }

    /// ECMAScript `[[Set]]` for a named property.
    pub fn put_named(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        value: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        if let Some((owner, desc)) = Self::get_named_descriptor(rt, obj, name)? {
            if desc.flags.contains(PropertyFlags::ACCESSOR) {
                let accessor = rt
                    .heap
                    .object(owner)
                    .named_slot_value(desc)
                    .as_object()
                    .expect("accessor slot holds an accessor cell");
                let Some(setter) = rt.heap.accessor(accessor).setter else {
                    let display = rt.symbol_display(name);
                    return Self::raise_read_only(rt, op_flags, &display);
                };
                let this = rt.handle_value(obj);
                let v = rt.handle_value(value);
                call_function(rt, setter, this, &[v])?;
                return Ok(true);
            }

            if !desc.flags.contains(PropertyFlags::WRITABLE) {
                if desc.flags.contains(PropertyFlags::STATIC_BUILTIN) {
                    return Self::raise_static_builtin(rt, name);
                }
                let display = rt.symbol_display(name);
                return Self::raise_read_only(rt, op_flags, &display);
            }

            if owner == rt.handle_object(obj) {
                if !desc
                    .flags
                    .intersects(PropertyFlags::INTERNAL_SETTER | PropertyFlags::HOST_OBJECT)
                {
                    let v = rt.handle_value(value);
                    Self::set_named_slot_value(rt, owner, desc, v);
                    return Ok(true);
                }
                if desc.flags.contains(PropertyFlags::INTERNAL_SETTER) {
                    let v = rt.handle_value(value);
                    return Self::internal_setter(rt, obj, name, desc, &v, op_flags);
                }
                debug_assert!(desc.flags.contains(PropertyFlags::HOST_OBJECT));
                let hooks = rt.heap.object(owner).host_hooks();
                let v = rt.handle_value(value);
                return hooks.set(rt, name, v);
            }
        }

        // The property doesn't exist on this object (it may be inherited
        // data, which does not block the add).
        if op_flags.must_exist() {
            let msg = format!("Property '{}' doesn't exist", rt.symbol_display(name));
            return Err(rt.raise_reference_error(msg));
        }

        Self::add_own_property(
            rt,
            obj,
            name,
            DefinePropertyFlags::default_new_property_flags(),
            value,
            op_flags,
        )
    }

    /// Named put with index rerouting, the mirror of
    /// [`get_named_or_indexed`][Self::get_named_or_indexed].
    pub fn put_named_or_indexed(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        value: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        let ptr = rt.handle_object(obj);
        if rt
            .heap
            .object(ptr)
            .flags
            .contains(ObjectFlags::INDEXED_STORAGE)
        {
            if let Some(i) = rt.identifiers.to_array_index_of(name) {
                return Self::put_computed(rt, obj, &number_from_u32(i), value, op_flags);
            }
        }
        Self::put_named(rt, obj, name, value, op_flags)
    }

    /// ECMAScript `[[Set]]` for a primitive computed key.
    ///
    /// For arrays, growing writes update `length` *before* element storage
    /// so `[[DefineOwnProperty]]("length")` ordering is preserved.
    pub fn put_computed(
        rt: &mut Runtime,
        obj: Handle,
        key: &JsValue,
        value: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        debug_assert!(key.is_primitive(), "computed keys must be primitive");
        debug_assert!(
            !op_flags.must_exist(),
            "mustExist cannot be used with computed properties"
        );

        // Fast path: integer key already present in indexed storage.
        let ptr = rt.handle_object(obj);
        if rt
            .heap
            .object(ptr)
            .flags
            .contains(ObjectFlags::FAST_INDEX_PROPERTIES)
        {
            if let Some(i) = to_array_index_fast_path(key) {
                if Self::have_own_indexed(rt, ptr, i) {
                    let v = rt.handle_value(value);
                    if Self::set_own_indexed(rt, obj, i, &v)? {
                        return Ok(true);
                    }
                    return Self::raise_indexed_read_only(rt, op_flags, i);
                }
            }
        }

        if let Some((owner, desc)) = Self::get_computed_descriptor(rt, obj, key)? {
            if desc.flags.contains(PropertyFlags::ACCESSOR) {
                let accessor = Self::computed_slot_value(rt, owner, desc)
                    .as_object()
                    .expect("accessor slot holds an accessor cell");
                let Some(setter) = rt.heap.accessor(accessor).setter else {
                    let id = rt.to_property_key(key);
                    let display = rt.symbol_display(id);
                    return Self::raise_read_only(rt, op_flags, &display);
                };
                let this = rt.handle_value(obj);
                let v = rt.handle_value(value);
                call_function(rt, setter, this, &[v])?;
                return Ok(true);
            }

            if !desc.flags.contains(PropertyFlags::WRITABLE) {
                if desc.flags.contains(PropertyFlags::STATIC_BUILTIN) {
                    let id = rt.to_property_key(key);
                    return Self::raise_static_builtin(rt, id);
                }
                let id = rt.to_property_key(key);
                let display = rt.symbol_display(id);
                return Self::raise_read_only(rt, op_flags, &display);
            }

            if owner == rt.handle_object(obj) {
                if desc.flags.contains(PropertyFlags::HOST_OBJECT) {
                    let id = rt.to_property_key(key);
                    let hooks = rt.heap.object(owner).host_hooks();
                    let v = rt.handle_value(value);
                    return hooks.set(rt, id, v);
                }
                if desc.flags.contains(PropertyFlags::INDEXED) {
                    let v = rt.handle_value(value);
                    if Self::set_own_indexed(rt, obj, desc.slot, &v)? {
                        return Ok(true);
                    }
                    return Self::raise_indexed_read_only(rt, op_flags, desc.slot);
                }
                let v = rt.handle_value(value);
                Self::set_named_slot_value(rt, owner, desc.as_named(), v);
                return Ok(true);
            }
        }

        // No own property: we are adding.
        let ptr = rt.handle_object(obj);
        if !rt.heap.object(ptr).is_extensible() {
            if op_flags.throw_on_error() {
                return Err(rt.raise_type_error("Cannot add a new property"));
            }
            return Ok(false);
        }

        // Integer keys on indexed-storage receivers go to element storage.
        if rt
            .heap
            .object(ptr)
            .flags
            .contains(ObjectFlags::INDEXED_STORAGE)
        {
            if let Some(i) = Self::computed_key_to_array_index(key) {
                if rt.heap.object(ptr).indexed.is_array()
                    && i >= JsArray::get_length(rt, ptr)
                {
                    let len_value = rt.make_handle(number_from_u32(i + 1));
                    let length = rt.predefined.length;
                    let grew = Self::put_named(rt, obj, length, len_value, op_flags)?;
                    if !grew {
                        return Ok(false);
                    }
                }
                let v = rt.handle_value(value);
                if Self::set_own_indexed(rt, obj, i, &v)? {
                    return Ok(true);
                }
                return Self::raise_indexed_read_only(rt, op_flags, i);
            }
        }

        let id = rt.to_property_key(key);
        Self::add_own_property(
            rt,
            obj,
            id,
            DefinePropertyFlags::default_new_property_flags(),
            value,
            op_flags,
        )
    }

    /// Dispatch a write to the subclass hook.  Only `Array.length` exists
    /// in this core.
    pub(crate) fn internal_setter(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        _desc: NamedPropertyDescriptor,
        value: &JsValue,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        let ptr = rt.handle_object(obj);
        if rt.heap.object(ptr).indexed.is_array() && name == rt.predefined.length {
            return JsArray::set_length(rt, obj, value, op_flags);
        }
        unreachable!("unhandled internal setter")
    }

    // ── Delete engine ─────────────────────────────────────────────────────────

    /// ECMAScript `[[Delete]]` for a named own property.
    pub fn delete_named(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        debug_assert!(
            !op_flags.must_exist(),
            "mustExist cannot be specified when deleting"
        );
        let mut ptr = rt.handle_object(obj);
        let mut desc = Self::lookup_own_property(rt, ptr, name);
        if desc.is_none() {
            if rt.heap.object(ptr).flags.contains(ObjectFlags::LAZY_OBJECT) {
                Self::initialize_lazy_object(rt, obj)?;
                ptr = rt.handle_object(obj);
                desc = Self::lookup_own_property(rt, ptr, name);
            }
            if desc.is_none() {
                return Ok(true);
            }
        }
        let desc = desc.expect("presence checked above");

        if !desc.flags.contains(PropertyFlags::CONFIGURABLE) {
            if op_flags.throw_on_error() {
                let msg = format!(
                    "Property '{}' is not configurable",
                    rt.symbol_display(name)
                );
                return Err(rt.raise_type_error(msg));
            }
            return Ok(false);
        }

        // Release the reference before the class transition.
        Self::set_named_slot_value(rt, ptr, desc, JsValue::Empty);
        let class = rt.heap.object(ptr).class;
        let new_class = rt.classes.delete_property(class, name, desc.slot);
        rt.heap.object_mut(ptr).class = new_class;
        Ok(true)
    }

    /// ECMAScript `[[Delete]]` for a primitive computed key.  Index-like
    /// names also delete the shadow indexed slot.
    pub fn delete_computed(
        rt: &mut Runtime,
        obj: Handle,
        key: &JsValue,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        debug_assert!(key.is_primitive(), "computed keys must be primitive");
        debug_assert!(
            !op_flags.must_exist(),
            "mustExist cannot be specified when deleting"
        );

        let ptr = rt.handle_object(obj);
        let flags = rt.heap.object(ptr).flags;

        let array_index = if flags.contains(ObjectFlags::INDEXED_STORAGE) {
            Self::computed_key_to_array_index(key)
        } else {
            None
        };

        // Fast path: a plain index with no index-like named shadows.
        if let Some(i) = array_index {
            if flags.contains(ObjectFlags::FAST_INDEX_PROPERTIES) {
                if Self::delete_own_indexed(rt, obj, i) {
                    return Ok(true);
                }
                if op_flags.throw_on_error() {
                    return Err(rt.raise_type_error("Cannot delete property"));
                }
                return Ok(false);
            }
        }

        if flags.contains(ObjectFlags::LAZY_OBJECT) {
            Self::initialize_lazy_object(rt, obj)?;
            return Self::delete_computed(rt, obj, key, op_flags);
        }

        let id = rt.to_property_key(key);
        let ptr = rt.handle_object(obj);
        let desc = Self::lookup_own_property(rt, ptr, id);

        if let Some(desc) = &desc {
            if !desc.flags.contains(PropertyFlags::CONFIGURABLE) {
                if op_flags.throw_on_error() {
                    return Err(rt.raise_type_error("Property is not configurable"));
                }
                return Ok(false);
            }
        }

        // Delete the shadow indexed slot to keep array length accounting
        // correct.
        if let Some(i) = array_index {
            if !Self::delete_own_indexed(rt, obj, i) {
                if op_flags.throw_on_error() {
                    return Err(rt.raise_type_error("Cannot delete property"));
                }
                return Ok(false);
            }
        }

        if let Some(desc) = desc {
            Self::set_named_slot_value(rt, ptr, desc, JsValue::Empty);
            let class = rt.heap.object(ptr).class;
            let new_class = rt.classes.delete_property(class, id, desc.slot);
            rt.heap.object_mut(ptr).class = new_class;
        }
        Ok(true)
    }

    // ── Prototype manipulation ────────────────────────────────────────────────

    /// ECMAScript `[[SetPrototypeOf]]`: no-op on the same parent, requires
    /// extensibility otherwise, and rejects prototype cycles.
    pub fn set_parent(
        rt: &mut Runtime,
        obj: Handle,
        new_parent: Option<Handle>,
    ) -> RotorResult<()> {
        let ptr = rt.handle_object(obj);
        let new_ptr = new_parent.map(|h| rt.handle_object(h));
        if rt.heap.object(ptr).parent == new_ptr {
            return Ok(());
        }
        if !rt.heap.object(ptr).is_extensible() {
            return Err(rt.raise_type_error("Object is not extensible"));
        }
        let mut cursor = new_ptr;
        while let Some(c) = cursor {
            if c == ptr {
                return Err(rt.raise_type_error("Prototype cycle detected"));
            }
            cursor = rt.heap.object(c).parent;
        }
        if let Some(np) = new_ptr {
            rt.heap.record_write(ptr, &JsValue::Object(np));
        }
        rt.heap.object_mut(ptr).parent = new_ptr;
        Ok(())
    }

    // ── Extensibility, seal, freeze ───────────────────────────────────────────

    /// Forbid adding new properties.
    pub fn prevent_extensions(rt: &mut Runtime, obj: Handle) {
        let ptr = rt.handle_object(obj);
        rt.heap.object_mut(ptr).flags.insert(ObjectFlags::NO_EXTEND);
    }

    /// Make every own property non-configurable and forbid additions.
    /// Idempotent.
    ///
    /// Indexed slots carry no per-property attributes, so present elements
    /// are first demoted into named storage where the class transition can
    /// pin them down.
    pub fn seal(rt: &mut Runtime, obj: Handle) {
        let ptr = rt.handle_object(obj);
        if rt.heap.object(ptr).flags.contains(ObjectFlags::SEALED) {
            return;
        }
        Self::demote_own_indexed_properties(rt, obj);
        let ptr = rt.handle_object(obj);
        let class = rt.heap.object(ptr).class;
        let new_class = rt.classes.make_all_non_configurable(class);
        let cell = rt.heap.object_mut(ptr);
        cell.class = new_class;
        cell.flags.insert(ObjectFlags::SEALED | ObjectFlags::NO_EXTEND);
    }

    /// Additionally make every own data property read-only.  Idempotent.
    ///
    /// Like [`seal`][Self::seal], present elements are demoted to named
    /// storage first so the read-only transition covers them.
    pub fn freeze(rt: &mut Runtime, obj: Handle) {
        let ptr = rt.handle_object(obj);
        if rt.heap.object(ptr).flags.contains(ObjectFlags::FROZEN) {
            return;
        }
        Self::demote_own_indexed_properties(rt, obj);
        let ptr = rt.handle_object(obj);
        let class = rt.heap.object(ptr).class;
        let new_class = rt.classes.make_all_read_only(class);
        let cell = rt.heap.object_mut(ptr);
        cell.class = new_class;
        cell.flags
            .insert(ObjectFlags::FROZEN | ObjectFlags::SEALED | ObjectFlags::NO_EXTEND);
    }

    /// Sealed test; promotes the cached flag on success.
    pub fn is_sealed(rt: &mut Runtime, obj: Handle) -> bool {
        let ptr = rt.handle_object(obj);
        let cell = rt.heap.object(ptr);
        if cell.flags.contains(ObjectFlags::SEALED) {
            return true;
        }
        if !cell.flags.contains(ObjectFlags::NO_EXTEND) {
            return false;
        }
        if !rt.classes.are_all_non_configurable(cell.class) {
            return false;
        }
        if !cell
            .indexed
            .check_all_own_indexed(CheckAllOwnIndexedMode::NonConfigurable)
        {
            return false;
        }
        rt.heap.object_mut(ptr).flags.insert(ObjectFlags::SEALED);
        true
    }

    /// Frozen test; promotes the cached flags on success.
    pub fn is_frozen(rt: &mut Runtime, obj: Handle) -> bool {
        let ptr = rt.handle_object(obj);
        let cell = rt.heap.object(ptr);
        if cell.flags.contains(ObjectFlags::FROZEN) {
            return true;
        }
        if !cell.flags.contains(ObjectFlags::NO_EXTEND) {
            return false;
        }
        if !rt.classes.are_all_read_only(cell.class) {
            return false;
        }
        if !cell
            .indexed
            .check_all_own_indexed(CheckAllOwnIndexedMode::ReadOnly)
        {
            return false;
        }
        rt.heap
            .object_mut(ptr)
            .flags
            .insert(ObjectFlags::FROZEN | ObjectFlags::SEALED);
        true
    }
}

impl Trace for JsObject {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(p) = self.parent {
            tracer.mark(p);
        }
        for v in &self.direct_props {
            v.trace(tracer);
        }
        if let Some(storage) = &self.indirect_props {
            storage.trace(tracer);
        }
        self.indexed.trace(tracer);
    }
}

impl Relocate for JsObject {
    fn relocate(&mut self, map: &ForwardingMap) {
        if let Some(p) = &mut self.parent {
            *p = map.forward(*p);
        }
        for v in &mut self.direct_props {
            v.relocate(map);
        }
        if let Some(storage) = &mut self.indirect_props {
            storage.relocate(map);
        }
        self.indexed.relocate(map);
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RotorError;
    use crate::objects::define_property::tests_support as define;

    fn put(rt: &mut Runtime, obj: Handle, name: &str, value: JsValue) -> bool {
        let name = rt.intern(name);
        let v = rt.make_handle(value);
        JsObject::put_named(rt, obj, name, v, PropOpFlags::empty()).unwrap()
    }

    fn get(rt: &mut Runtime, obj: Handle, name: &str) -> JsValue {
        let name = rt.intern(name);
        JsObject::get_named(rt, obj, name, PropOpFlags::empty(), None).unwrap()
    }

    // ── Basic put / get ──────────────────────────────────────────────────────

    #[test]
    fn test_put_then_get_round_trips() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        assert!(put(&mut rt, obj, "x", JsValue::Smi(42)));
        assert_eq!(get(&mut rt, obj, "x"), JsValue::Smi(42));
    }

    #[test]
    fn test_get_missing_returns_undefined() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        assert_eq!(get(&mut rt, obj, "missing"), JsValue::Undefined);
    }

    #[test]
    fn test_get_missing_with_must_exist_is_reference_error() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let name = rt.intern("ghost");
        let err = JsObject::get_named(&mut rt, obj, name, PropOpFlags::MUST_EXIST, None)
            .unwrap_err();
        assert!(matches!(err, RotorError::ReferenceError(_)));
        assert!(rt.thrown_value().is_some());
    }

    #[test]
    fn test_overwrite_keeps_single_slot() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        put(&mut rt, obj, "a", JsValue::Smi(1));
        put(&mut rt, obj, "b", JsValue::Smi(2));
        put(&mut rt, obj, "a", JsValue::Smi(3));
        assert_eq!(get(&mut rt, obj, "a"), JsValue::Smi(3));
        assert_eq!(get(&mut rt, obj, "b"), JsValue::Smi(2));
        let ptr = rt.handle_object(obj);
        assert_eq!(rt.classes().num_properties(rt.heap().object(ptr).class()), 2);
    }

    #[test]
    fn test_properties_spill_into_indirect_storage() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        for i in 0..(DIRECT_PROPERTY_SLOTS + 3) {
            put(&mut rt, obj, &format!("p{i}"), JsValue::Smi(i as i32));
        }
        for i in 0..(DIRECT_PROPERTY_SLOTS + 3) {
            assert_eq!(
                get(&mut rt, obj, &format!("p{i}")),
                JsValue::Smi(i as i32),
                "property p{i} must survive the spill"
            );
        }
    }

    #[test]
    fn test_shape_sharing_between_objects() {
        let mut rt = Runtime::new();
        let a = JsObject::create(&mut rt, None);
        let b = JsObject::create(&mut rt, None);
        put(&mut rt, a, "x", JsValue::Smi(1));
        put(&mut rt, a, "y", JsValue::Smi(2));
        put(&mut rt, b, "x", JsValue::Smi(3));
        put(&mut rt, b, "y", JsValue::Smi(4));
        let (pa, pb) = (rt.handle_object(a), rt.handle_object(b));
        assert_eq!(
            rt.heap().object(pa).class(),
            rt.heap().object(pb).class(),
            "same insertion order must share a hidden class"
        );
    }

    // ── Inline-cache stamping ────────────────────────────────────────────────

    #[test]
    fn test_get_named_stamps_cache_on_class_mode_hit() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        put(&mut rt, obj, "x", JsValue::Smi(1));
        let name = rt.intern("x");
        let mut entry = PropertyCacheEntry {
            class: rt.heap().object(rt.handle_object(obj)).class(),
            slot: u32::MAX,
        };
        JsObject::get_named(&mut rt, obj, name, PropOpFlags::empty(), Some(&mut entry)).unwrap();
        assert_eq!(entry.slot, 0);
        assert_eq!(entry.class, rt.heap().object(rt.handle_object(obj)).class());
    }

    #[test]
    fn test_get_named_skips_cache_for_dictionary_owner() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        put(&mut rt, obj, "x", JsValue::Smi(1));
        put(&mut rt, obj, "gone", JsValue::Smi(2));
        let gone = rt.intern("gone");
        JsObject::delete_named(&mut rt, obj, gone, PropOpFlags::empty()).unwrap();
        assert!(rt.classes().is_dictionary(rt.heap().object(rt.handle_object(obj)).class()));

        let name = rt.intern("x");
        let mut entry = PropertyCacheEntry {
            class: rt.heap().object(rt.handle_object(obj)).class(),
            slot: u32::MAX,
        };
        JsObject::get_named(&mut rt, obj, name, PropOpFlags::empty(), Some(&mut entry)).unwrap();
        assert_eq!(entry.slot, u32::MAX, "dictionary hits must not stamp");
    }

    // ── Prototype chain ──────────────────────────────────────────────────────

    #[test]
    fn test_get_walks_the_prototype_chain() {
        let mut rt = Runtime::new();
        let proto = JsObject::create(&mut rt, None);
        put(&mut rt, proto, "inherited", JsValue::Smi(7));
        let child = JsObject::create(&mut rt, Some(proto));
        assert_eq!(get(&mut rt, child, "inherited"), JsValue::Smi(7));
    }

    #[test]
    fn test_own_property_shadows_prototype() {
        let mut rt = Runtime::new();
        let proto = JsObject::create(&mut rt, None);
        put(&mut rt, proto, "x", JsValue::Smi(1));
        let child = JsObject::create(&mut rt, Some(proto));
        put(&mut rt, child, "x", JsValue::Smi(99));
        assert_eq!(get(&mut rt, child, "x"), JsValue::Smi(99));
        assert_eq!(get(&mut rt, proto, "x"), JsValue::Smi(1));
    }

    #[test]
    fn test_delete_is_own_only() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        put(&mut rt, obj, "a", JsValue::Smi(1));
        let proto = JsObject::create(&mut rt, None);
        JsObject::set_parent(&mut rt, obj, Some(proto)).unwrap();
        put(&mut rt, proto, "b", JsValue::Smi(2));
        assert_eq!(get(&mut rt, obj, "b"), JsValue::Smi(2));

        let b = rt.intern("b");
        assert!(JsObject::delete_named(&mut rt, obj, b, PropOpFlags::empty()).unwrap());
        // No effect on the prototype.
        assert_eq!(get(&mut rt, obj, "b"), JsValue::Smi(2));
        assert_eq!(get(&mut rt, proto, "b"), JsValue::Smi(2));
    }

    #[test]
    fn test_inherited_read_only_blocks_put() {
        let mut rt = Runtime::new();
        let proto = JsObject::create(&mut rt, None);
        define::define_data(&mut rt, proto, "ro", JsValue::Smi(1), false, true, true);
        let child = JsObject::create(&mut rt, Some(proto));
        let name = rt.intern("ro");
        let v = rt.make_handle(JsValue::Smi(2));
        assert!(!JsObject::put_named(&mut rt, child, name, v, PropOpFlags::empty()).unwrap());
        let v = rt.make_handle(JsValue::Smi(2));
        let err = JsObject::put_named(&mut rt, child, name, v, PropOpFlags::THROW_ON_ERROR)
            .unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));
        assert_eq!(get(&mut rt, child, "ro"), JsValue::Smi(1));
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let mut rt = Runtime::new();
        let a = JsObject::create(&mut rt, None);
        let b = JsObject::create(&mut rt, Some(a));
        let c = JsObject::create(&mut rt, Some(b));
        let err = JsObject::set_parent(&mut rt, a, Some(c)).unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));
        // Parent unchanged.
        assert_eq!(rt.heap().object(rt.handle_object(a)).parent(), None);
    }

    #[test]
    fn test_set_parent_same_value_ignores_extensibility() {
        let mut rt = Runtime::new();
        let proto = JsObject::create(&mut rt, None);
        let obj = JsObject::create(&mut rt, Some(proto));
        JsObject::prevent_extensions(&mut rt, obj);
        // Same parent: fine.
        JsObject::set_parent(&mut rt, obj, Some(proto)).unwrap();
        // Different parent: rejected.
        let other = JsObject::create(&mut rt, None);
        let err = JsObject::set_parent(&mut rt, obj, Some(other)).unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    #[test]
    fn test_accessor_getter_runs_with_receiver_as_this() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let getter = rt.alloc_function("get_x", |_rt, this, _args| {
            assert!(this.is_object(), "getter must receive the receiver");
            Ok(JsValue::Smi(11))
        });
        define::define_accessor(&mut rt, obj, "x", Some(getter), None);
        assert_eq!(get(&mut rt, obj, "x"), JsValue::Smi(11));
    }

    #[test]
    fn test_accessor_without_getter_reads_undefined() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let setter = rt.alloc_function("set_x", |_rt, _this, _args| Ok(JsValue::Undefined));
        define::define_accessor(&mut rt, obj, "x", None, Some(setter));
        assert_eq!(get(&mut rt, obj, "x"), JsValue::Undefined);
    }

    #[test]
    fn test_accessor_without_setter_fails_put() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let getter = rt.alloc_function("get_x", |_rt, _this, _args| Ok(JsValue::Smi(1)));
        define::define_accessor(&mut rt, obj, "x", Some(getter), None);
        let name = rt.intern("x");
        let v = rt.make_handle(JsValue::Smi(5));
        assert!(!JsObject::put_named(&mut rt, obj, name, v, PropOpFlags::empty()).unwrap());
        let v = rt.make_handle(JsValue::Smi(5));
        let err =
            JsObject::put_named(&mut rt, obj, name, v, PropOpFlags::THROW_ON_ERROR).unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));
    }

    #[test]
    fn test_accessor_setter_observes_consistent_object() {
        // The setter runs after descriptor resolution; writes it performs
        // land on the same object the caller targeted.
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let setter = rt.alloc_function("set_x", |rt, this, args| {
            let this = rt.make_handle(this);
            let backing = rt.intern("backing");
            let v = rt.make_handle(args[0].clone());
            JsObject::put_named(rt, this, backing, v, PropOpFlags::empty())?;
            Ok(JsValue::Undefined)
        });
        define::define_accessor(&mut rt, obj, "x", None, Some(setter));
        let name = rt.intern("x");
        let v = rt.make_handle(JsValue::Smi(9));
        assert!(JsObject::put_named(&mut rt, obj, name, v, PropOpFlags::empty()).unwrap());
        assert_eq!(get(&mut rt, obj, "backing"), JsValue::Smi(9));
    }

    // ── Lazy objects ─────────────────────────────────────────────────────────

    fn install_lazy_prop(rt: &mut Runtime, obj: Handle) -> RotorResult<()> {
        let name = rt.intern("lazy_prop");
        let v = rt.make_handle(JsValue::Smi(123));
        JsObject::put_named(rt, obj, name, v, PropOpFlags::empty())?;
        Ok(())
    }

    #[test]
    fn test_lazy_object_initializes_on_first_lookup() {
        let mut rt = Runtime::new();
        let obj = JsObject::create_lazy(&mut rt, None, install_lazy_prop);
        assert_eq!(get(&mut rt, obj, "lazy_prop"), JsValue::Smi(123));
        let ptr = rt.handle_object(obj);
        assert!(
            !rt.heap().object(ptr).flags().contains(ObjectFlags::LAZY_OBJECT),
            "initialization must clear the lazy flag"
        );
        // Second lookup takes the plain path.
        assert_eq!(get(&mut rt, obj, "lazy_prop"), JsValue::Smi(123));
    }

    #[test]
    fn test_lazy_object_misses_after_initialization() {
        let mut rt = Runtime::new();
        let obj = JsObject::create_lazy(&mut rt, None, install_lazy_prop);
        assert_eq!(get(&mut rt, obj, "other"), JsValue::Undefined);
        assert_eq!(get(&mut rt, obj, "lazy_prop"), JsValue::Smi(123));
    }

    // ── Host objects ─────────────────────────────────────────────────────────

    struct TestHost {
        values: std::cell::RefCell<std::collections::HashMap<SymbolId, JsValue>>,
    }

    impl crate::objects::host::HostHooks for TestHost {
        fn get(&self, _rt: &mut Runtime, name: SymbolId) -> RotorResult<JsValue> {
            Ok(self
                .values
                .borrow()
                .get(&name)
                .cloned()
                .unwrap_or(JsValue::Undefined))
        }
        fn set(&self, _rt: &mut Runtime, name: SymbolId, value: JsValue) -> RotorResult<bool> {
            self.values.borrow_mut().insert(name, value);
            Ok(true)
        }
        fn own_property_names(&self, _rt: &mut Runtime) -> RotorResult<Vec<SymbolId>> {
            let mut names: Vec<SymbolId> = self.values.borrow().keys().copied().collect();
            names.sort_by_key(|s| s.raw());
            Ok(names)
        }
    }

    fn make_host(rt: &mut Runtime) -> (Handle, Rc<TestHost>) {
        let host = Rc::new(TestHost {
            values: std::cell::RefCell::new(std::collections::HashMap::new()),
        });
        let obj = JsObject::create_host(rt, None, host.clone());
        (obj, host)
    }

    #[test]
    fn test_host_object_routes_misses_to_hooks() {
        let mut rt = Runtime::new();
        let (obj, host) = make_host(&mut rt);
        let name = rt.intern("remote");
        host.values
            .borrow_mut()
            .insert(name, JsValue::String("from host".to_string()));
        assert_eq!(
            get(&mut rt, obj, "remote"),
            JsValue::String("from host".to_string())
        );
    }

    #[test]
    fn test_host_object_put_goes_through_hook() {
        let mut rt = Runtime::new();
        let (obj, host) = make_host(&mut rt);
        assert!(put(&mut rt, obj, "w", JsValue::Smi(5)));
        let name = rt.intern("w");
        assert_eq!(host.values.borrow().get(&name), Some(&JsValue::Smi(5)));
        // The class gained nothing: the write was host-routed.
        let ptr = rt.handle_object(obj);
        assert_eq!(rt.classes().num_properties(rt.heap().object(ptr).class()), 0);
    }

    #[test]
    fn test_host_object_class_properties_win() {
        let mut rt = Runtime::new();
        let (obj, host) = make_host(&mut rt);
        let name = rt.intern("x");
        host.values.borrow_mut().insert(name, JsValue::Smi(1));
        // A real class property with the same name shadows the host value.
        define::define_data(&mut rt, obj, "x", JsValue::Smi(2), true, true, true);
        assert_eq!(get(&mut rt, obj, "x"), JsValue::Smi(2));
    }

    #[test]
    fn test_has_on_host_object_is_true() {
        let mut rt = Runtime::new();
        let (obj, _host) = make_host(&mut rt);
        let name = rt.intern("anything");
        assert!(JsObject::has_named(&mut rt, obj, name).unwrap());
    }

    // ── Static builtins ──────────────────────────────────────────────────────

    #[test]
    fn test_static_builtin_override_raises_descriptive_error() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        define::define_static_builtin(&mut rt, obj, "toString", JsValue::Smi(1));
        let name = rt.intern("toString");
        let v = rt.make_handle(JsValue::Smi(2));
        let err = JsObject::put_named(&mut rt, obj, name, v, PropOpFlags::empty()).unwrap_err();
        match err {
            RotorError::TypeError(msg) => assert!(
                msg.contains("toString"),
                "error must name the builtin: {msg}"
            ),
            other => panic!("expected TypeError, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "static builtin")]
    fn test_static_builtin_override_fatal_under_config() {
        let mut rt = Runtime::with_config(crate::runtime::RuntimeConfig {
            freeze_builtins_fatal_on_override: true,
        });
        let obj = JsObject::create(&mut rt, None);
        define::define_static_builtin(&mut rt, obj, "toString", JsValue::Smi(1));
        let name = rt.intern("toString");
        let v = rt.make_handle(JsValue::Smi(2));
        let _ = JsObject::put_named(&mut rt, obj, name, v, PropOpFlags::empty());
    }

    // ── mustExist puts ───────────────────────────────────────────────────────

    #[test]
    fn test_put_must_exist_fails_on_missing_property() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let name = rt.intern("nope");
        let v = rt.make_handle(JsValue::Smi(1));
        let err = JsObject::put_named(&mut rt, obj, name, v, PropOpFlags::MUST_EXIST).unwrap_err();
        assert!(matches!(err, RotorError::ReferenceError(_)));
    }

    // ── Computed access ──────────────────────────────────────────────────────

    #[test]
    fn test_computed_string_and_number_name_the_same_slot() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let v = rt.make_handle(JsValue::Smi(7));
        JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::empty()).unwrap();
        assert_eq!(
            JsObject::get_computed(&mut rt, arr, &JsValue::String("0".to_string())).unwrap(),
            JsValue::Smi(7)
        );
        assert_eq!(
            JsObject::get_computed(&mut rt, arr, &JsValue::Smi(0)).unwrap(),
            JsValue::Smi(7)
        );
    }

    #[test]
    fn test_named_or_indexed_reroutes_index_spellings() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let zero = rt.intern("0");
        let v = rt.make_handle(JsValue::Smi(3));
        JsObject::put_named_or_indexed(&mut rt, arr, zero, v, PropOpFlags::empty()).unwrap();
        assert_eq!(
            JsObject::get_named_or_indexed(&mut rt, arr, zero, PropOpFlags::empty()).unwrap(),
            JsValue::Smi(3)
        );
        assert!(JsObject::has_named_or_indexed(&mut rt, arr, zero).unwrap());
        // A plain named lookup of "0" misses: the value lives in indexed
        // storage, not the class.
        assert!(!JsObject::has_named(&mut rt, arr, zero).unwrap());
    }

    #[test]
    fn test_computed_put_on_plain_object_interns_the_index() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let v = rt.make_handle(JsValue::Smi(5));
        JsObject::put_computed(&mut rt, obj, &JsValue::Smi(3), v, PropOpFlags::empty()).unwrap();
        // Plain objects have no indexed storage: "3" is a named property.
        assert_eq!(get(&mut rt, obj, "3"), JsValue::Smi(5));
        assert!(
            JsObject::has_computed(&mut rt, obj, &JsValue::Smi(3)).unwrap()
        );
    }

    #[test]
    fn test_has_named_or_indexed_fast_absence() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let five = rt.intern("5");
        assert!(!JsObject::has_named_or_indexed(&mut rt, arr, five).unwrap());
    }

    // ── Delete ───────────────────────────────────────────────────────────────

    #[test]
    fn test_delete_missing_succeeds() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let name = rt.intern("ghost");
        assert!(JsObject::delete_named(&mut rt, obj, name, PropOpFlags::empty()).unwrap());
    }

    #[test]
    fn test_delete_non_configurable_fails() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        define::define_data(&mut rt, obj, "nc", JsValue::Smi(1), true, true, false);
        let name = rt.intern("nc");
        assert!(!JsObject::delete_named(&mut rt, obj, name, PropOpFlags::empty()).unwrap());
        let err = JsObject::delete_named(&mut rt, obj, name, PropOpFlags::THROW_ON_ERROR)
            .unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));
        assert_eq!(get(&mut rt, obj, "nc"), JsValue::Smi(1));
    }

    #[test]
    fn test_delete_then_get_misses() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        put(&mut rt, obj, "x", JsValue::Smi(1));
        let name = rt.intern("x");
        assert!(JsObject::delete_named(&mut rt, obj, name, PropOpFlags::empty()).unwrap());
        assert_eq!(get(&mut rt, obj, "x"), JsValue::Undefined);
        assert!(!JsObject::has_named(&mut rt, obj, name).unwrap());
    }

    #[test]
    fn test_delete_computed_element() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let v = rt.make_handle(JsValue::Smi(9));
        JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::empty()).unwrap();
        assert!(
            JsObject::delete_computed(&mut rt, arr, &JsValue::Smi(0), PropOpFlags::empty())
                .unwrap()
        );
        assert!(!JsObject::has_computed(&mut rt, arr, &JsValue::Smi(0)).unwrap());
        // Length is untouched by deletion.
        assert_eq!(JsArray::get_length(&rt, rt.handle_object(arr)), 1);
    }

    // ── Seal / freeze ────────────────────────────────────────────────────────

    #[test]
    fn test_seal_blocks_adds_but_not_writes() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        put(&mut rt, obj, "x", JsValue::Smi(1));
        JsObject::seal(&mut rt, obj);
        assert!(JsObject::is_sealed(&mut rt, obj));
        assert!(!JsObject::is_frozen(&mut rt, obj));

        // preventExtensions on a sealed object is a no-op.
        JsObject::prevent_extensions(&mut rt, obj);
        assert!(JsObject::is_sealed(&mut rt, obj));

        // New properties fail.
        let new_name = rt.intern("new");
        let v = rt.make_handle(JsValue::Smi(2));
        let err = JsObject::put_named(&mut rt, obj, new_name, v, PropOpFlags::THROW_ON_ERROR)
            .unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));

        // Existing writable properties still write.
        assert!(put(&mut rt, obj, "x", JsValue::Smi(5)));
        assert_eq!(get(&mut rt, obj, "x"), JsValue::Smi(5));

        // Deletes fail: everything is non-configurable now.
        let x = rt.intern("x");
        assert!(!JsObject::delete_named(&mut rt, obj, x, PropOpFlags::empty()).unwrap());
    }

    #[test]
    fn test_freeze_blocks_writes_too() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        put(&mut rt, obj, "x", JsValue::Smi(1));
        JsObject::freeze(&mut rt, obj);
        assert!(JsObject::is_frozen(&mut rt, obj));
        assert!(JsObject::is_sealed(&mut rt, obj));

        let x = rt.intern("x");
        let v = rt.make_handle(JsValue::Smi(2));
        assert!(!JsObject::put_named(&mut rt, obj, x, v, PropOpFlags::empty()).unwrap());
        assert_eq!(get(&mut rt, obj, "x"), JsValue::Smi(1));
    }

    #[test]
    fn test_is_sealed_promotes_flag_from_first_principles() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        define::define_data(&mut rt, obj, "x", JsValue::Smi(1), true, true, false);
        // Not sealed yet: still extensible.
        assert!(!JsObject::is_sealed(&mut rt, obj));
        JsObject::prevent_extensions(&mut rt, obj);
        // Every property is non-configurable and extension is prevented, so
        // the scan succeeds and the flag is promoted.
        assert!(JsObject::is_sealed(&mut rt, obj));
        let ptr = rt.handle_object(obj);
        assert!(rt.heap().object(ptr).flags().contains(ObjectFlags::SEALED));
    }

    #[test]
    fn test_empty_inextensible_object_is_frozen() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        JsObject::prevent_extensions(&mut rt, obj);
        assert!(JsObject::is_frozen(&mut rt, obj));
    }

    #[test]
    fn test_array_with_elements_is_not_sealed_by_flag_promotion() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let v = rt.make_handle(JsValue::Smi(1));
        JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::empty()).unwrap();
        JsObject::prevent_extensions(&mut rt, arr);
        // "length" is non-configurable, but the element is configurable.
        assert!(!JsObject::is_sealed(&mut rt, arr));
    }

    #[test]
    fn test_freeze_makes_array_elements_read_only() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let v = rt.make_handle(JsValue::Smi(1));
        JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::empty()).unwrap();

        JsObject::freeze(&mut rt, arr);
        assert!(JsObject::is_frozen(&mut rt, arr));

        // Writes fail under every spelling of the index.
        let v = rt.make_handle(JsValue::Smi(2));
        assert!(
            !JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::empty())
                .unwrap()
        );
        let v = rt.make_handle(JsValue::Smi(2));
        let err =
            JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::THROW_ON_ERROR)
                .unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));
        let zero = rt.intern("0");
        let v = rt.make_handle(JsValue::Smi(2));
        assert!(
            !JsObject::put_named_or_indexed(&mut rt, arr, zero, v, PropOpFlags::empty()).unwrap()
        );

        // The element is unchanged and still reachable through both paths.
        assert_eq!(
            JsObject::get_computed(&mut rt, arr, &JsValue::Smi(0)).unwrap(),
            JsValue::Smi(1)
        );
        assert_eq!(
            JsObject::get_named_or_indexed(&mut rt, arr, zero, PropOpFlags::empty()).unwrap(),
            JsValue::Smi(1)
        );
    }

    #[test]
    fn test_seal_array_elements_stay_writable_but_not_deletable() {
        let mut rt = Runtime::new();
        let arr = JsArray::create(&mut rt, None, 0);
        let v = rt.make_handle(JsValue::Smi(1));
        JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::empty()).unwrap();

        JsObject::seal(&mut rt, arr);
        assert!(JsObject::is_sealed(&mut rt, arr));
        assert!(!JsObject::is_frozen(&mut rt, arr));

        // Existing elements still write (sealed, not frozen).
        let v = rt.make_handle(JsValue::Smi(5));
        assert!(
            JsObject::put_computed(&mut rt, arr, &JsValue::Smi(0), v, PropOpFlags::empty())
                .unwrap()
        );
        assert_eq!(
            JsObject::get_computed(&mut rt, arr, &JsValue::Smi(0)).unwrap(),
            JsValue::Smi(5)
        );

        // But they cannot be deleted or joined by new indexes.
        assert!(
            !JsObject::delete_computed(&mut rt, arr, &JsValue::Smi(0), PropOpFlags::empty())
                .unwrap()
        );
        let v = rt.make_handle(JsValue::Smi(7));
        assert!(
            !JsObject::put_computed(&mut rt, arr, &JsValue::Smi(3), v, PropOpFlags::empty())
                .unwrap()
        );
        assert_eq!(JsArray::get_length(&rt, rt.handle_object(arr)), 1);

        // Demotion keeps the enumeration order: the index run, then names.
        let names = JsObject::get_own_property_names(&mut rt, arr, false).unwrap();
        assert_eq!(
            names,
            vec![JsValue::Smi(0), JsValue::String("length".to_string())]
        );
    }

    // ── Object identity ──────────────────────────────────────────────────────

    #[test]
    fn test_object_id_is_stable_and_nonzero() {
        let mut rt = Runtime::new();
        let a = JsObject::create(&mut rt, None);
        let b = JsObject::create(&mut rt, None);
        let id_a = JsObject::get_object_id(&mut rt, a);
        let id_b = JsObject::get_object_id(&mut rt, b);
        assert_ne!(id_a, 0);
        assert_ne!(id_a, id_b);
        assert_eq!(JsObject::get_object_id(&mut rt, a), id_a);
    }

    #[test]
    fn test_object_id_survives_collection() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let id = JsObject::get_object_id(&mut rt, obj);
        // Create garbage and collect; the id sticks to the moved cell.
        let mark = rt.handle_mark();
        for _ in 0..10 {
            JsObject::create(&mut rt, None);
        }
        rt.flush_handles(mark);
        rt.collect();
        assert_eq!(JsObject::get_object_id(&mut rt, obj), id);
    }

    // ── GC interaction ───────────────────────────────────────────────────────

    #[test]
    fn test_property_values_survive_collection() {
        let mut rt = Runtime::new();
        let obj = JsObject::create(&mut rt, None);
        let child = JsObject::create(&mut rt, None);
        put(&mut rt, child, "tag", JsValue::Smi(77));
        let child_value = rt.handle_value(child);
        let name = rt.intern("child");
        let v = rt.make_handle(child_value);
        JsObject::put_named(&mut rt, obj, name, v, PropOpFlags::empty()).unwrap();

        rt.collect();

        // Read the child back through the property and check its own state.
        let fetched = get(&mut rt, obj, "child");
        assert!(fetched.is_object());
        let fetched = rt.make_handle(fetched);
        assert_eq!(get(&mut rt, fetched, "tag"), JsValue::Smi(77));
    }
}
