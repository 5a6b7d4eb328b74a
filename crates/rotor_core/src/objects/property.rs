//! Property attribute records, descriptors, and the accessor cell.
//!
//! Three bit records drive the property machinery:
//!
//! * [`PropertyFlags`] — the stored per-property attributes.  The `INDEXED`
//!   bit is synthesized by computed lookups and never stored in a hidden
//!   class.
//! * [`DefinePropertyFlags`] — one `defineProperty` call's worth of
//!   attributes, where each of enumerable/writable/configurable is paired
//!   with a "mentioned" bit so absent attributes can be told apart from
//!   `false` ones.
//! * [`PropOpFlags`] — per-call options on the mutating operations.

use bitflags::bitflags;

use crate::gc::heap::GcPtr;
use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::objects::hidden_class::ClassId;

bitflags! {
    /// Attribute flags stored for a single property.
    ///
    /// The first three correspond directly to the ECMAScript attribute
    /// fields `[[Writable]]`, `[[Enumerable]]`, and `[[Configurable]]`;
    /// the rest are engine-internal routing bits.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u8 {
        /// The property value may be changed with an assignment.
        const WRITABLE        = 0b0000_0001;
        /// The property key shows up during enumeration.
        const ENUMERABLE      = 0b0000_0010;
        /// The property may be reconfigured or deleted.
        const CONFIGURABLE    = 0b0000_0100;
        /// The slot stores a [`PropertyAccessor`] cell instead of a value.
        const ACCESSOR        = 0b0000_1000;
        /// Writes dispatch to the subclass hook (e.g. `Array.length`).
        const INTERNAL_SETTER = 0b0001_0000;
        /// Synthesized: reads and writes delegate to the host callback.
        const HOST_OBJECT     = 0b0010_0000;
        /// A frozen builtin method; overriding raises a descriptive error.
        const STATIC_BUILTIN  = 0b0100_0000;
        /// Synthesized by computed lookups: the descriptor's slot is an
        /// integer index into indexed storage.  Never stored in a class.
        const INDEXED         = 0b1000_0000;
    }
}

impl PropertyFlags {
    /// The flags a plain `obj.p = v` assignment creates:
    /// writable, enumerable, configurable.
    pub fn default_new_named() -> Self {
        Self::WRITABLE | Self::ENUMERABLE | Self::CONFIGURABLE
    }
}

bitflags! {
    /// Per-call options accepted by the mutating property operations.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct PropOpFlags: u8 {
        /// Failures raise a `TypeError` instead of returning `false`.
        const THROW_ON_ERROR = 0b001;
        /// Named reads/puts fail with `ReferenceError` when the property is
        /// missing.  Only meaningful for named operations.
        const MUST_EXIST     = 0b010;
        /// Bypass the extensibility check when adding (engine-internal).
        const INTERNAL_FORCE = 0b100;
    }
}

impl PropOpFlags {
    /// Returns `true` if failures should raise instead of returning `false`.
    #[inline]
    pub fn throw_on_error(self) -> bool {
        self.contains(Self::THROW_ON_ERROR)
    }

    /// Returns `true` if a missing property is a `ReferenceError`.
    #[inline]
    pub fn must_exist(self) -> bool {
        self.contains(Self::MUST_EXIST)
    }

    /// Returns `true` if the extensibility check is bypassed.
    #[inline]
    pub fn internal_force(self) -> bool {
        self.contains(Self::INTERNAL_FORCE)
    }
}

/// The attribute set of one `defineProperty` call.
///
/// For each of enumerable/writable/configurable there is a paired `set_*`
/// bit recording whether the attribute was mentioned at all; `set_getter`,
/// `set_setter` and `set_value` record which payload halves were supplied.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DefinePropertyFlags {
    pub enumerable: bool,
    pub set_enumerable: bool,
    pub writable: bool,
    pub set_writable: bool,
    pub configurable: bool,
    pub set_configurable: bool,
    pub set_getter: bool,
    pub set_setter: bool,
    pub set_value: bool,
    /// Route writes through the subclass hook.  Engine-internal; only legal
    /// on named definitions.
    pub enable_internal_setter: bool,
}

impl DefinePropertyFlags {
    /// The flags a plain assignment-created property uses: value set, all
    /// three attributes mentioned and `true`.
    pub fn default_new_property_flags() -> Self {
        Self {
            enumerable: true,
            set_enumerable: true,
            writable: true,
            set_writable: true,
            configurable: true,
            set_configurable: true,
            set_value: true,
            ..Self::default()
        }
    }

    /// Returns `true` if no attribute and no payload is mentioned.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` if either accessor half is mentioned.
    pub fn is_accessor(&self) -> bool {
        self.set_getter || self.set_setter
    }
}

/// Descriptor of a named own property: its storage slot and flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NamedPropertyDescriptor {
    /// Slot index (direct slots first, then indirect storage).
    pub slot: u32,
    /// The stored attribute flags.
    pub flags: PropertyFlags,
}

/// Descriptor returned by computed lookups.
///
/// When `flags` carries [`PropertyFlags::INDEXED`], `slot` is the integer
/// index into the receiver's indexed storage rather than a named slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ComputedPropertyDescriptor {
    /// Named slot index, or the array index when `INDEXED` is set.
    pub slot: u32,
    /// The stored attribute flags plus the synthesized `INDEXED` bit.
    pub flags: PropertyFlags,
}

impl ComputedPropertyDescriptor {
    /// Reinterpret as a named descriptor.  Only valid when `INDEXED` is
    /// clear.
    pub fn as_named(&self) -> NamedPropertyDescriptor {
        debug_assert!(!self.flags.contains(PropertyFlags::INDEXED));
        NamedPropertyDescriptor {
            slot: self.slot,
            flags: self.flags,
        }
    }
}

impl From<NamedPropertyDescriptor> for ComputedPropertyDescriptor {
    fn from(desc: NamedPropertyDescriptor) -> Self {
        Self {
            slot: desc.slot,
            flags: desc.flags,
        }
    }
}

/// Inline-cache entry exported to call sites.
///
/// Stamped by [`JsObject::get_named`][crate::objects::js_object::JsObject::get_named]
/// on plain-data hits whose owner class is in class mode (never for
/// dictionary classes), so a call site can skip the lookup while the
/// receiver's class pointer still matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PropertyCacheEntry {
    /// The owner's hidden class at stamp time.
    pub class: ClassId,
    /// The named slot holding the value.
    pub slot: u32,
}

/// Heap cell holding a (getter, setter) callable pair.
///
/// Accessor property slots store a reference to one of these.  Either half
/// may be absent: a missing getter reads as `undefined`, a missing setter
/// makes writes fail.
#[derive(Debug)]
pub struct PropertyAccessor {
    /// The getter callable, if any.
    pub getter: Option<GcPtr>,
    /// The setter callable, if any.
    pub setter: Option<GcPtr>,
}

impl PropertyAccessor {
    /// Create an accessor pair.  Both halves are optional.
    pub fn new(getter: Option<GcPtr>, setter: Option<GcPtr>) -> Self {
        Self { getter, setter }
    }
}

impl Trace for PropertyAccessor {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(g) = self.getter {
            tracer.mark(g);
        }
        if let Some(s) = self.setter {
            tracer.mark(s);
        }
    }
}

impl Relocate for PropertyAccessor {
    fn relocate(&mut self, map: &ForwardingMap) {
        if let Some(g) = &mut self.getter {
            *g = map.forward(*g);
        }
        if let Some(s) = &mut self.setter {
            *s = map.forward(*s);
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
