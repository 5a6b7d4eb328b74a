//! The `[[DefineOwnProperty]]` engine: the ECMAScript §8.12.9 attribute
//! update state machine, property addition, and the computed define path
//! that moves properties between indexed and named storage.

use crate::error::RotorResult;
use crate::gc::handle::Handle;
use crate::identifier::SymbolId;
use crate::objects::js_array::JsArray;
use crate::objects::js_object::{JsObject, ObjectFlags};
use crate::objects::property::{
    DefinePropertyFlags, NamedPropertyDescriptor, PropOpFlags, PropertyFlags,
};
use crate::objects::value::{JsValue, number_from_u32, same_value};
use crate::runtime::Runtime;

/// Outcome of [`check_property_update`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropertyUpdateStatus {
    /// The update was rejected.
    Failed,
    /// Nothing further to do; no slot write.
    Done,
    /// Flags (possibly) updated; the value/accessor must also be written.
    NeedSet,
}

/// `true` if a *new* property with these define-flags can live in indexed
/// storage: all three attributes mentioned and `true`, and no accessor
/// halves.
fn can_new_property_be_indexed(dpf: DefinePropertyFlags) -> bool {
    dpf.set_enumerable
        && dpf.enumerable
        && dpf.set_writable
        && dpf.writable
        && dpf.set_configurable
        && dpf.configurable
        && !dpf.set_getter
        && !dpf.set_setter
}

impl JsObject {
    /// The §8.12.9 update rule: decide whether `dp_flags` may be applied to
    /// a property whose current state is `(current_flags, cur_value)`.
    ///
    /// On success the returned flags are the property's new flags.  When
    /// both sides are accessors, unmentioned halves of the *new* accessor
    /// cell are filled in from the current one (the cell is mutated in
    /// place) so a subsequent slot write installs a complete pair.
    pub fn check_property_update(
        rt: &mut Runtime,
        current_flags: PropertyFlags,
        dp_flags: DefinePropertyFlags,
        cur_value: &JsValue,
        new_value: &JsValue,
        op_flags: PropOpFlags,
    ) -> RotorResult<(PropertyUpdateStatus, PropertyFlags)> {
        // [5] Every field absent: done.
        if dp_flags.is_empty() {
            return Ok((PropertyUpdateStatus::Done, current_flags));
        }
        debug_assert!(
            !dp_flags.is_accessor() || (!dp_flags.set_writable && !dp_flags.writable),
            "writable cannot be set with accessors"
        );
        debug_assert!(
            !dp_flags.enable_internal_setter,
            "the internal-setter bit cannot be changed by an update"
        );

        let fail = |rt: &mut Runtime, message: &str| -> RotorResult<(PropertyUpdateStatus, PropertyFlags)> {
            if op_flags.throw_on_error() {
                return Err(rt.raise_type_error(message));
            }
            Ok((PropertyUpdateStatus::Failed, PropertyFlags::empty()))
        };

        // [6] Every mentioned field equals the current state: done.
        if (!dp_flags.set_enumerable
            || dp_flags.enumerable == current_flags.contains(PropertyFlags::ENUMERABLE))
            && (!dp_flags.set_writable
                || dp_flags.writable == current_flags.contains(PropertyFlags::WRITABLE))
            && (!dp_flags.set_configurable
                || dp_flags.configurable == current_flags.contains(PropertyFlags::CONFIGURABLE))
        {
            if dp_flags.is_accessor() {
                if current_flags.contains(PropertyFlags::ACCESSOR) {
                    let cur = rt
                        .heap()
                        .accessor(cur_value.as_object().expect("accessor slot holds a cell"));
                    let (cur_getter, cur_setter) = (cur.getter, cur.setter);
                    let new = rt
                        .heap()
                        .accessor(new_value.as_object().expect("accessor define carries a cell"));
                    if (!dp_flags.set_getter || cur_getter == new.getter)
                        && (!dp_flags.set_setter || cur_setter == new.setter)
                    {
                        return Ok((PropertyUpdateStatus::Done, current_flags));
                    }
                }
            } else if dp_flags.set_value {
                if same_value(cur_value, new_value) {
                    return Ok((PropertyUpdateStatus::Done, current_flags));
                }
            } else {
                return Ok((PropertyUpdateStatus::Done, current_flags));
            }
        }

        // [7] Non-configurable properties restrict what may change.
        if !current_flags.contains(PropertyFlags::CONFIGURABLE) {
            if dp_flags.configurable {
                return fail(rt, "property is not configurable");
            }
            if dp_flags.set_enumerable
                && dp_flags.enumerable != current_flags.contains(PropertyFlags::ENUMERABLE)
            {
                return fail(rt, "property is not configurable");
            }
        }

        let mut new_flags = current_flags;

        if !(dp_flags.set_value || dp_flags.set_writable || dp_flags.set_getter || dp_flags.set_setter)
        {
            // [8] A generic descriptor: no further validation.
        } else if current_flags.contains(PropertyFlags::ACCESSOR) != dp_flags.is_accessor() {
            // [9] Converting between data and accessor.
            if !current_flags.contains(PropertyFlags::CONFIGURABLE) {
                return fail(rt, "property is not configurable");
            }
            // Accessor→data resets writable unless mentioned below;
            // data→accessor simply drops it.
            new_flags.remove(PropertyFlags::WRITABLE);
        } else if !current_flags.contains(PropertyFlags::ACCESSOR) {
            // [10] Two data descriptors.
            if !current_flags.contains(PropertyFlags::CONFIGURABLE)
                && !current_flags.contains(PropertyFlags::WRITABLE)
            {
                if dp_flags.writable {
                    return fail(rt, "property is not configurable");
                }
                if dp_flags.set_value && !same_value(cur_value, new_value) {
                    return fail(rt, "property is not writable");
                }
            }
        } else {
            // [11] Two accessors.
            let cur_ptr = cur_value.as_object().expect("accessor slot holds a cell");
            let new_ptr = new_value.as_object().expect("accessor define carries a cell");
            let cur = rt.heap().accessor(cur_ptr);
            let (cur_getter, cur_setter) = (cur.getter, cur.setter);
            let new = rt.heap().accessor(new_ptr);
            if !current_flags.contains(PropertyFlags::CONFIGURABLE)
                && ((dp_flags.set_getter && new.getter != cur_getter)
                    || (dp_flags.set_setter && new.setter != cur_setter))
            {
                return fail(rt, "property is not configurable");
            }
            // Unmentioned halves inherit from the current accessor; the new
            // cell is completed in place.
            if !dp_flags.set_getter {
                if let Some(g) = cur_getter {
                    rt.heap.record_write(new_ptr, &JsValue::Object(g));
                }
                rt.heap.accessor_mut(new_ptr).getter = cur_getter;
            }
            if !dp_flags.set_setter {
                if let Some(s) = cur_setter {
                    rt.heap.record_write(new_ptr, &JsValue::Object(s));
                }
                rt.heap.accessor_mut(new_ptr).setter = cur_setter;
            }
        }

        // [12] Apply every mentioned attribute.
        if dp_flags.set_enumerable {
            new_flags.set(PropertyFlags::ENUMERABLE, dp_flags.enumerable);
        }
        if dp_flags.set_writable {
            new_flags.set(PropertyFlags::WRITABLE, dp_flags.writable);
        }
        if dp_flags.set_configurable {
            new_flags.set(PropertyFlags::CONFIGURABLE, dp_flags.configurable);
        }

        if dp_flags.set_value {
            new_flags.remove(PropertyFlags::ACCESSOR);
        } else if dp_flags.is_accessor() {
            new_flags.insert(PropertyFlags::ACCESSOR);
        } else {
            return Ok((PropertyUpdateStatus::Done, new_flags));
        }
        Ok((PropertyUpdateStatus::NeedSet, new_flags))
    }

    /// Apply the update rule to an existing own property and perform the
    /// class transition and slot write it calls for.
    pub(crate) fn update_own_property(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        desc: NamedPropertyDescriptor,
        dp_flags: DefinePropertyFlags,
        value_or_accessor: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        let ptr = rt.handle_object(obj);
        let cur_value = rt.heap.object(ptr).named_slot_value(desc);
        let new_value = rt.handle_value(value_or_accessor);
        let (status, new_flags) =
            Self::check_property_update(rt, desc.flags, dp_flags, &cur_value, &new_value, op_flags)?;
        if status == PropertyUpdateStatus::Failed {
            return Ok(false);
        }

        let mut desc = desc;
        if new_flags != desc.flags {
            desc.flags = new_flags;
            let class = rt.heap.object(ptr).class();
            let new_class = rt.classes.update_property(class, desc.slot, new_flags);
            rt.heap.object_mut(ptr).set_class(new_class);
        }

        if status == PropertyUpdateStatus::Done {
            return Ok(true);
        }
        debug_assert_eq!(status, PropertyUpdateStatus::NeedSet);

        if dp_flags.set_value {
            if !desc.flags.contains(PropertyFlags::INTERNAL_SETTER) {
                Self::set_named_slot_value(rt, ptr, desc, new_value);
            } else {
                return Self::internal_setter(rt, obj, name, desc, &new_value, op_flags);
            }
        } else if dp_flags.is_accessor() {
            Self::set_named_slot_value(rt, ptr, desc, new_value);
        }
        Ok(true)
    }

    /// Add a fresh own property, translating define-flags into stored
    /// flags.  Fails when the object is not extensible (unless forced).
    pub(crate) fn add_own_property(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        dp_flags: DefinePropertyFlags,
        value_or_accessor: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        let ptr = rt.handle_object(obj);
        if !rt.heap.object(ptr).is_extensible() && !op_flags.internal_force() {
            if op_flags.throw_on_error() {
                let msg = format!("Cannot add new property '{}'", rt.symbol_display(name));
                return Err(rt.raise_type_error(msg));
            }
            return Ok(false);
        }

        let mut dp_flags = dp_flags;
        let mut flags = PropertyFlags::empty();
        if dp_flags.is_accessor() {
            // Accessors don't carry writable.
            dp_flags.set_writable = false;
            dp_flags.writable = false;
            flags.insert(PropertyFlags::ACCESSOR);
        }
        if dp_flags.set_enumerable && dp_flags.enumerable {
            flags.insert(PropertyFlags::ENUMERABLE);
        }
        if dp_flags.set_writable && dp_flags.writable {
            flags.insert(PropertyFlags::WRITABLE);
        }
        if dp_flags.set_configurable && dp_flags.configurable {
            flags.insert(PropertyFlags::CONFIGURABLE);
        }
        if dp_flags.enable_internal_setter {
            flags.insert(PropertyFlags::INTERNAL_SETTER);
        }

        Self::add_own_property_impl(rt, obj, name, flags, value_or_accessor);
        Ok(true)
    }

    fn add_own_property_impl(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        flags: PropertyFlags,
        value_or_accessor: Handle,
    ) {
        let ptr = rt.handle_object(obj);
        let class = rt.heap.object(ptr).class();
        let (new_class, slot) = rt.classes.add_property(class, name, flags, &rt.identifiers);
        rt.heap.object_mut(ptr).set_class(new_class);

        let value = rt.handle_value(value_or_accessor);
        Self::allocate_new_slot_storage(rt, obj, slot, value);

        // An index-like name disables the integer fast paths.
        if rt.classes.has_index_like_properties(new_class) {
            rt.heap
                .object_mut(ptr)
                .clear_flag(ObjectFlags::FAST_INDEX_PROPERTIES);
        }
    }

    /// Move the indexed slot `i` out of indexed storage into a named
    /// property defined by `dp_flags`, carrying `value` as its payload.
    ///
    /// Used when a single index stops being "indexable" (a computed define
    /// with non-default attributes) and by seal/freeze, whose class-wide
    /// attribute transitions only cover named properties.
    pub(crate) fn demote_indexed_to_named(
        rt: &mut Runtime,
        obj: Handle,
        i: u32,
        dp_flags: DefinePropertyFlags,
        value: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        if !Self::delete_own_indexed(rt, obj, i) {
            if op_flags.throw_on_error() {
                return Err(rt.raise_type_error("Cannot define property"));
            }
            return Ok(false);
        }
        let id = rt.intern(&i.to_string());
        Self::add_own_property(rt, obj, id, dp_flags, value, op_flags)
    }

    /// Demote every present indexed property into named storage, preserving
    /// its value and current attributes.
    ///
    /// Runs under `INTERNAL_FORCE` so it also works on objects that are
    /// already inextensible (`preventExtensions` followed by `seal`).
    pub(crate) fn demote_own_indexed_properties(rt: &mut Runtime, obj: Handle) {
        let ptr = rt.handle_object(obj);
        let (lo, hi) = rt.heap.object(ptr).indexed().own_indexed_range();
        let mark = rt.handle_mark();
        for i in lo..hi {
            let ptr = rt.handle_object(obj);
            let Some(flags) = Self::own_indexed_flags(rt, ptr, i) else {
                continue;
            };
            let value = rt.make_handle(Self::get_own_indexed_raw(rt, ptr, i));
            let dpf = DefinePropertyFlags {
                set_value: true,
                enumerable: flags.contains(PropertyFlags::ENUMERABLE),
                set_enumerable: true,
                writable: flags.contains(PropertyFlags::WRITABLE),
                set_writable: true,
                configurable: flags.contains(PropertyFlags::CONFIGURABLE),
                set_configurable: true,
                ..DefinePropertyFlags::default()
            };
            let demoted =
                Self::demote_indexed_to_named(rt, obj, i, dpf, value, PropOpFlags::INTERNAL_FORCE)
                    .expect("forced demotion cannot raise");
            debug_assert!(demoted, "indexed slots of sealable objects are deletable");
            rt.flush_handles(mark);
        }
    }

    /// ECMAScript `[[DefineOwnProperty]]` for a named key.
    pub fn define_own_property(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        dp_flags: DefinePropertyFlags,
        value_or_accessor: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        debug_assert!(
            !op_flags.must_exist(),
            "mustExist cannot be used with defineOwnProperty"
        );
        debug_assert!(
            !(dp_flags.set_value && dp_flags.is_accessor()),
            "cannot set both value and accessor"
        );

        let ptr = rt.handle_object(obj);
        if let Some(desc) = Self::lookup_own_property(rt, ptr, name) {
            return Self::update_own_property(
                rt,
                obj,
                name,
                desc,
                dp_flags,
                value_or_accessor,
                op_flags,
            );
        }

        if rt.heap.object(ptr).flags().contains(ObjectFlags::LAZY_OBJECT) {
            Self::initialize_lazy_object(rt, obj)?;
            return Self::define_own_property(rt, obj, name, dp_flags, value_or_accessor, op_flags);
        }

        Self::add_own_property(rt, obj, name, dp_flags, value_or_accessor, op_flags)
    }

    /// Fast definition of a property known not to exist yet, with the
    /// stored flags given directly.  Used when populating fresh objects.
    pub fn define_new_own_property(
        rt: &mut Runtime,
        obj: Handle,
        name: SymbolId,
        flags: PropertyFlags,
        value_or_accessor: Handle,
    ) {
        debug_assert!(
            !(flags.contains(PropertyFlags::ACCESSOR) && flags.contains(PropertyFlags::WRITABLE)),
            "writable cannot be set with accessors"
        );
        debug_assert!(
            Self::lookup_own_property(rt, rt.handle_object(obj), name).is_none(),
            "new property is already defined"
        );
        Self::add_own_property_impl(rt, obj, name, flags, value_or_accessor);
    }

    /// ECMAScript `[[DefineOwnProperty]]` for a primitive computed key.
    ///
    /// Index-like keys on indexed-storage receivers take the hard path:
    /// update a named shadow if one exists, else update the indexed slot in
    /// place when the result stays indexable, else *demote* the index to a
    /// named property; fresh indexes honour `length` writability on arrays.
    pub fn define_own_computed(
        rt: &mut Runtime,
        obj: Handle,
        key: &JsValue,
        dp_flags: DefinePropertyFlags,
        value_or_accessor: Handle,
        op_flags: PropOpFlags,
    ) -> RotorResult<bool> {
        debug_assert!(key.is_primitive(), "computed keys must be primitive");
        debug_assert!(
            !op_flags.must_exist(),
            "mustExist cannot be used with defineOwnProperty"
        );
        debug_assert!(
            !dp_flags.enable_internal_setter,
            "cannot set internalSetter on a computed property"
        );

        let ptr = rt.handle_object(obj);
        let flags = rt.heap.object(ptr).flags();

        let array_index = if flags.contains(ObjectFlags::INDEXED_STORAGE) {
            Self::computed_key_to_array_index(key)
        } else {
            None
        };

        // Not index-like (or no indexed storage): the named machinery
        // handles everything.
        let Some(i) = array_index else {
            let id = rt.to_property_key(key);
            return Self::define_own_property(rt, obj, id, dp_flags, value_or_accessor, op_flags);
        };

        // A named property may shadow the index ("demoted" earlier).
        if rt
            .classes
            .has_index_like_properties(rt.heap.object(ptr).class())
        {
            let id = rt.to_property_key(key);
            if let Some(desc) = Self::lookup_own_property(rt, ptr, id) {
                return Self::update_own_property(
                    rt,
                    obj,
                    id,
                    desc,
                    dp_flags,
                    value_or_accessor,
                    op_flags,
                );
            }
        }

        // An indexed slot exists: update it, in place when possible.
        if let Some(indexed_flags) = Self::own_indexed_flags(rt, ptr, i) {
            let cur_value = Self::get_own_indexed_raw(rt, ptr, i);
            let new_value = rt.handle_value(value_or_accessor);
            let (status, new_flags) = Self::check_property_update(
                rt,
                indexed_flags,
                dp_flags,
                &cur_value,
                &new_value,
                op_flags,
            )?;
            if status == PropertyUpdateStatus::Failed {
                return Ok(false);
            }

            if new_flags == indexed_flags {
                // Still fully indexable.
                if status == PropertyUpdateStatus::Done {
                    return Ok(true);
                }
                if Self::set_own_indexed(rt, obj, i, &new_value)? {
                    return Ok(true);
                }
                if op_flags.throw_on_error() {
                    return Err(rt.raise_type_error("Cannot change read-only property value"));
                }
                return Ok(false);
            }

            // The flags changed: move the property out of indexed storage.
            let preserved = if dp_flags.set_value || dp_flags.is_accessor() {
                new_value
            } else {
                cur_value
            };
            let mut named_dpf = dp_flags;
            named_dpf.set_enumerable = true;
            named_dpf.set_writable = true;
            named_dpf.set_configurable = true;
            named_dpf.enumerable = new_flags.contains(PropertyFlags::ENUMERABLE);
            named_dpf.writable = new_flags.contains(PropertyFlags::WRITABLE);
            named_dpf.configurable = new_flags.contains(PropertyFlags::CONFIGURABLE);

            let preserved = rt.make_handle(preserved);
            return Self::demote_indexed_to_named(rt, obj, i, named_dpf, preserved, op_flags);
        }

        // A fresh property with an index-like name.
        if !rt.heap.object(ptr).is_extensible() {
            if op_flags.throw_on_error() {
                return Err(rt.raise_type_error("Cannot add a new property"));
            }
            return Ok(false);
        }

        let mut update_length = false;
        if rt.heap.object(ptr).indexed().is_array() && i >= JsArray::get_length(rt, ptr) {
            let length_desc = Self::lookup_own_property(rt, ptr, rt.predefined.length)
                .expect("arrays always carry length");
            if !length_desc.flags.contains(PropertyFlags::WRITABLE) {
                if op_flags.throw_on_error() {
                    return Err(
                        rt.raise_type_error("Cannot assign to read-only 'length' property of array")
                    );
                }
                return Ok(false);
            }
            update_length = true;
        }

        let new_is_indexed = can_new_property_be_indexed(dp_flags);
        if new_is_indexed {
            let v = if dp_flags.set_value {
                rt.handle_value(value_or_accessor)
            } else {
                JsValue::Undefined
            };
            if !Self::set_own_indexed(rt, obj, i, &v)? {
                if op_flags.throw_on_error() {
                    return Err(rt.raise_type_error("Cannot define property"));
                }
                return Ok(false);
            }
        }

        if update_length {
            let grew =
                JsArray::set_length(rt, obj, &number_from_u32(i + 1), op_flags)?;
            debug_assert!(grew, "enlarging a writable length cannot fail");
        }

        if new_is_indexed {
            return Ok(true);
        }

        let id = rt.to_property_key(key);
        Self::add_own_property(rt, obj, id, dp_flags, value_or_accessor, op_flags)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Test support shared by the object-model test modules
// ──────────────────────────────────────────────────────────────────────────────


// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
