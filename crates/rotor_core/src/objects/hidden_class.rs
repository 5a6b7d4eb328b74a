//! Hidden classes (shapes) and the process-wide transition registry.
//!
//! A hidden class maps property names to `(slot, flags)` and is immutable in
//! *class mode*: adding a property produces a child class, and the edge is
//! cached in the parent's transition table so objects built with the same
//! insertion order share a class.  Updating or deleting a property converts
//! the object to *dictionary mode* — an object-private class mutated in
//! place — as does exceeding [`DICTIONARY_PROPERTY_THRESHOLD`].  Only
//! class-mode `(class, slot)` pairs may be stamped into property caches.
//!
//! The registry owns every class (the transition graph is a DAG rooted at
//! per-prototype empty classes); objects hold plain [`ClassId`]s, so no
//! reference cycles exist and the collector never traces classes.
//!
//! # Slot allocation
//!
//! Slots are append-only: a deleted property leaves a permanent hole and
//! later adds claim fresh indices.  Enumeration order is therefore exactly
//! slot order, including for re-added properties, which move to the end.

use std::collections::HashMap;
use std::rc::Rc;

use crate::identifier::{IdentifierTable, SymbolId};
use crate::objects::property::{NamedPropertyDescriptor, PropertyFlags};
use crate::objects::value::JsValue;

/// Property count at which a class-mode chain gives up on shape sharing and
/// converts to a dictionary.
pub const DICTIONARY_PROPERTY_THRESHOLD: usize = 64;

/// A reference to a hidden class in the [`ClassRegistry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

impl ClassId {
    /// The raw registry index.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// One named property: its key and stored flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct PropertyEntry {
    name: SymbolId,
    flags: PropertyFlags,
}

/// One word of a for-in cache array.
///
/// Layout of a cached array: `[Class(proto₁), Class(proto₂), …, Fence,
/// Name(prop₀), Name(prop₁), …]` — the prefix records the prototype chain's
/// shapes at build time and is verified on every lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum ForInWord {
    /// The hidden class of one prototype, outermost first.
    Class(ClassId),
    /// Terminates the prototype-class prefix.
    Fence,
    /// One enumerable property name (a string, or a number for an index).
    Name(JsValue),
}

/// A hidden class: the shape record for some set of objects.
struct HiddenClass {
    /// Slot-indexed entries; `None` marks a slot freed by a deletion.
    properties: Vec<Option<PropertyEntry>>,
    /// Name → slot lookup.
    index: HashMap<SymbolId, u32>,
    /// Count of live (`Some`) entries.
    num_properties: u32,
    /// Cached add-edges, class mode only.
    transitions: HashMap<(SymbolId, PropertyFlags), ClassId>,
    /// Dictionary mode: object-private, mutated in place, never cached.
    dictionary: bool,
    /// Sticky: some property name parses as an array index.
    has_index_like: bool,
    /// Shared for-in name array (see [`ForInWord`]).
    for_in_cache: Option<Rc<Vec<ForInWord>>>,
}

impl HiddenClass {
    fn empty() -> Self {
        Self {
            properties: Vec::new(),
            index: HashMap::new(),
            num_properties: 0,
            transitions: HashMap::new(),
            dictionary: false,
            has_index_like: false,
            for_in_cache: None,
        }
    }
}

/// Process-wide owner of every hidden class and of the transition DAG.
pub struct ClassRegistry {
    classes: Vec<HiddenClass>,
    /// Empty root classes keyed by prototype object id (`None` = no
    /// prototype).  Object ids are stable across heap motion, unlike cell
    /// addresses.
    root_classes: HashMap<Option<u32>, ClassId>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            root_classes: HashMap::new(),
        }
    }

    fn alloc(&mut self, class: HiddenClass) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    /// The empty root class for objects created with the given prototype.
    pub fn root_class_for_prototype(&mut self, proto_object_id: Option<u32>) -> ClassId {
        if let Some(&id) = self.root_classes.get(&proto_object_id) {
            return id;
        }
        let id = self.alloc(HiddenClass::empty());
        self.root_classes.insert(proto_object_id, id);
        id
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Count of live properties.
    pub fn num_properties(&self, class: ClassId) -> u32 {
        self.classes[class.0 as usize].num_properties
    }

    /// The slot index the next added property will receive.
    pub fn next_slot(&self, class: ClassId) -> u32 {
        self.classes[class.0 as usize].properties.len() as u32
    }

    /// Returns `true` if `class` is object-private dictionary mode.
    pub fn is_dictionary(&self, class: ClassId) -> bool {
        self.classes[class.0 as usize].dictionary
    }

    /// Returns `true` if any property name (ever) parsed as an array index.
    pub fn has_index_like_properties(&self, class: ClassId) -> bool {
        self.classes[class.0 as usize].has_index_like
    }

    /// Look up a named property.
    pub fn find_property(&self, class: ClassId, name: SymbolId) -> Option<NamedPropertyDescriptor> {
        let c = &self.classes[class.0 as usize];
        c.index.get(&name).map(|&slot| {
            let entry = c.properties[slot as usize].expect("indexed entry is live");
            NamedPropertyDescriptor {
                slot,
                flags: entry.flags,
            }
        })
    }

    /// Visit every live property in slot (= insertion) order.
    pub fn for_each_property(
        &self,
        class: ClassId,
        mut visit: impl FnMut(SymbolId, NamedPropertyDescriptor),
    ) {
        let c = &self.classes[class.0 as usize];
        for (slot, entry) in c.properties.iter().enumerate() {
            if let Some(entry) = entry {
                visit(
                    entry.name,
                    NamedPropertyDescriptor {
                        slot: slot as u32,
                        flags: entry.flags,
                    },
                );
            }
        }
    }

    /// Returns `true` if every property is non-configurable.
    pub fn are_all_non_configurable(&self, class: ClassId) -> bool {
        self.classes[class.0 as usize]
            .properties
            .iter()
            .flatten()
            .all(|e| !e.flags.contains(PropertyFlags::CONFIGURABLE))
    }

    /// Returns `true` if every property is non-configurable and non-writable.
    /// (Accessor properties never carry `WRITABLE`, so they pass.)
    pub fn are_all_read_only(&self, class: ClassId) -> bool {
        self.classes[class.0 as usize]
            .properties
            .iter()
            .flatten()
            .all(|e| {
                !e.flags.contains(PropertyFlags::CONFIGURABLE)
                    && !e.flags.contains(PropertyFlags::WRITABLE)
            })
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    /// Add a property, returning the class to install and the new slot.
    ///
    /// In class mode this follows (or creates) a shared transition; in
    /// dictionary mode the class mutates in place and is returned unchanged.
    /// Adding a name that already exists is an engine bug.
    pub fn add_property(
        &mut self,
        class: ClassId,
        name: SymbolId,
        flags: PropertyFlags,
        identifiers: &IdentifierTable,
    ) -> (ClassId, u32) {
        debug_assert!(
            self.find_property(class, name).is_none(),
            "new property is already defined"
        );
        debug_assert!(
            !flags.contains(PropertyFlags::INDEXED),
            "the INDEXED bit is synthesized, never stored"
        );

        let index_like = identifiers.to_array_index_of(name).is_some();

        if self.classes[class.0 as usize].dictionary {
            let c = &mut self.classes[class.0 as usize];
            let slot = c.properties.len() as u32;
            c.properties.push(Some(PropertyEntry { name, flags }));
            c.index.insert(name, slot);
            c.num_properties += 1;
            c.has_index_like |= index_like;
            c.for_in_cache = None;
            return (class, slot);
        }

        // Shared transition already taken by another object?
        if let Some(&child) = self.classes[class.0 as usize].transitions.get(&(name, flags)) {
            let slot = self.classes[child.0 as usize].index[&name];
            return (child, slot);
        }

        // Build the child class.
        let parent = &self.classes[class.0 as usize];
        let slot = parent.properties.len() as u32;
        let mut properties = parent.properties.clone();
        let mut index = parent.index.clone();
        properties.push(Some(PropertyEntry { name, flags }));
        index.insert(name, slot);
        let child = HiddenClass {
            num_properties: parent.num_properties + 1,
            has_index_like: parent.has_index_like || index_like,
            dictionary: properties.len() > DICTIONARY_PROPERTY_THRESHOLD,
            properties,
            index,
            transitions: HashMap::new(),
            for_in_cache: None,
        };
        let cacheable = !child.dictionary;
        let child_id = self.alloc(child);
        if cacheable {
            self.classes[class.0 as usize]
                .transitions
                .insert((name, flags), child_id);
        }
        (child_id, slot)
    }

    /// Change the flags of an existing property, returning the class to
    /// install (a dictionary fork when the current class is shared).
    pub fn update_property(
        &mut self,
        class: ClassId,
        slot: u32,
        new_flags: PropertyFlags,
    ) -> ClassId {
        debug_assert!(
            !new_flags.contains(PropertyFlags::INDEXED),
            "the INDEXED bit is synthesized, never stored"
        );
        let target = self.dictionary_for(class);
        let c = &mut self.classes[target.0 as usize];
        let entry = c.properties[slot as usize]
            .as_mut()
            .expect("updated slot is live");
        entry.flags = new_flags;
        c.for_in_cache = None;
        target
    }

    /// Remove a property, returning the class to install.  The slot becomes
    /// a permanent hole; storage for it is never reused.
    pub fn delete_property(&mut self, class: ClassId, name: SymbolId, slot: u32) -> ClassId {
        let target = self.dictionary_for(class);
        let c = &mut self.classes[target.0 as usize];
        debug_assert_eq!(c.index.get(&name), Some(&slot), "deleting a live slot");
        c.properties[slot as usize] = None;
        c.index.remove(&name);
        c.num_properties -= 1;
        c.for_in_cache = None;
        target
    }

    /// Clear `CONFIGURABLE` on every property (the seal transition).
    pub fn make_all_non_configurable(&mut self, class: ClassId) -> ClassId {
        self.strip_flags(class, PropertyFlags::CONFIGURABLE)
    }

    /// Clear `CONFIGURABLE` and `WRITABLE` on every property (the freeze
    /// transition).
    pub fn make_all_read_only(&mut self, class: ClassId) -> ClassId {
        self.strip_flags(class, PropertyFlags::CONFIGURABLE | PropertyFlags::WRITABLE)
    }

    fn strip_flags(&mut self, class: ClassId, to_clear: PropertyFlags) -> ClassId {
        let target = self.dictionary_for(class);
        let c = &mut self.classes[target.0 as usize];
        for entry in c.properties.iter_mut().flatten() {
            entry.flags.remove(to_clear);
        }
        target
    }

    /// Returns `class` itself when it is already a dictionary, else an
    /// object-private dictionary copy.
    fn dictionary_for(&mut self, class: ClassId) -> ClassId {
        if self.classes[class.0 as usize].dictionary {
            return class;
        }
        let src = &self.classes[class.0 as usize];
        let copy = HiddenClass {
            properties: src.properties.clone(),
            index: src.index.clone(),
            num_properties: src.num_properties,
            transitions: HashMap::new(),
            dictionary: true,
            has_index_like: src.has_index_like,
            for_in_cache: None,
        };
        self.alloc(copy)
    }

    // ── For-in cache ──────────────────────────────────────────────────────────

    /// The cached for-in array attached to `class`, if any.
    pub fn for_in_cache(&self, class: ClassId) -> Option<Rc<Vec<ForInWord>>> {
        self.classes[class.0 as usize].for_in_cache.clone()
    }

    /// Attach a for-in array to `class`.
    pub fn set_for_in_cache(&mut self, class: ClassId, words: Rc<Vec<ForInWord>>) {
        self.classes[class.0 as usize].for_in_cache = Some(words);
    }

    /// Drop the cached for-in array, if any.
    pub fn clear_for_in_cache(&mut self, class: ClassId) {
        self.classes[class.0 as usize].for_in_cache = None;
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ClassRegistry, IdentifierTable) {
        (ClassRegistry::new(), IdentifierTable::new())
    }

    // ── Shape sharing ─────────────────────────────────────────────────────────

    #[test]
    fn test_same_insertion_order_shares_classes() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let b = ids.intern("b");
        let root = reg.root_class_for_prototype(None);
        let flags = PropertyFlags::default_new_named();

        let (c1, s1) = reg.add_property(root, a, flags, &ids);
        let (c2, s2) = reg.add_property(c1, b, flags, &ids);

        // A second object following the same path lands on the same classes.
        let (c1_again, s1_again) = reg.add_property(root, a, flags, &ids);
        let (c2_again, s2_again) = reg.add_property(c1_again, b, flags, &ids);
        assert_eq!(c1, c1_again);
        assert_eq!(c2, c2_again);
        assert_eq!((s1, s2), (s1_again, s2_again));
        assert_eq!((s1, s2), (0, 1));
    }

    #[test]
    fn test_different_flags_fork_the_transition() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let root = reg.root_class_for_prototype(None);

        let (c1, _) = reg.add_property(root, a, PropertyFlags::default_new_named(), &ids);
        let (c2, _) = reg.add_property(root, a, PropertyFlags::WRITABLE, &ids);
        assert_ne!(c1, c2, "attribute flags are part of the transition key");
    }

    #[test]
    fn test_root_classes_keyed_by_prototype() {
        let (mut reg, _ids) = setup();
        let no_proto = reg.root_class_for_prototype(None);
        let proto_7 = reg.root_class_for_prototype(Some(7));
        assert_ne!(no_proto, proto_7);
        assert_eq!(proto_7, reg.root_class_for_prototype(Some(7)));
    }

    // ── Lookup & iteration ────────────────────────────────────────────────────

    #[test]
    fn test_find_property_returns_slot_and_flags() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let root = reg.root_class_for_prototype(None);
        let (c, slot) = reg.add_property(root, a, PropertyFlags::WRITABLE, &ids);

        let desc = reg.find_property(c, a).expect("property exists");
        assert_eq!(desc.slot, slot);
        assert_eq!(desc.flags, PropertyFlags::WRITABLE);
        assert_eq!(reg.find_property(root, a), None, "parent class unchanged");
    }

    #[test]
    fn test_for_each_visits_in_insertion_order() {
        let (mut reg, mut ids) = setup();
        let names = ["x", "y", "z"].map(|n| ids.intern(n));
        let mut class = reg.root_class_for_prototype(None);
        for n in names {
            class = reg
                .add_property(class, n, PropertyFlags::default_new_named(), &ids)
                .0;
        }
        let mut seen = Vec::new();
        reg.for_each_property(class, |name, desc| seen.push((name, desc.slot)));
        assert_eq!(
            seen,
            vec![(names[0], 0), (names[1], 1), (names[2], 2)],
            "iteration must follow slot order"
        );
    }

    // ── Dictionary conversion ─────────────────────────────────────────────────

    #[test]
    fn test_delete_forks_into_private_dictionary() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let b = ids.intern("b");
        let flags = PropertyFlags::default_new_named();
        let root = reg.root_class_for_prototype(None);
        let (c1, slot_a) = reg.add_property(root, a, flags, &ids);
        let (c2, _) = reg.add_property(c1, b, flags, &ids);

        let dict = reg.delete_property(c2, a, slot_a);
        assert_ne!(dict, c2, "shared class must fork before mutating");
        assert!(reg.is_dictionary(dict));
        assert!(!reg.is_dictionary(c2), "the shared class is untouched");
        assert_eq!(reg.find_property(c2, a).map(|d| d.slot), Some(slot_a));
        assert_eq!(reg.find_property(dict, a), None);

        // Remaining slots are stable across the delete.
        assert_eq!(reg.find_property(dict, b).map(|d| d.slot), Some(1));
        assert_eq!(reg.num_properties(dict), 1);
    }

    #[test]
    fn test_deleted_slot_is_not_reused() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let b = ids.intern("b");
        let flags = PropertyFlags::default_new_named();
        let root = reg.root_class_for_prototype(None);
        let (c, slot_a) = reg.add_property(root, a, flags, &ids);
        let dict = reg.delete_property(c, a, slot_a);

        let (same, slot_b) = reg.add_property(dict, b, flags, &ids);
        assert_eq!(same, dict, "dictionary classes mutate in place");
        assert_eq!(slot_b, 1, "freed slot 0 must not be reused");
        assert_eq!(reg.next_slot(dict), 2);
    }

    #[test]
    fn test_readded_property_moves_to_end_of_iteration() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let b = ids.intern("b");
        let flags = PropertyFlags::default_new_named();
        let root = reg.root_class_for_prototype(None);
        let (c1, slot_a) = reg.add_property(root, a, flags, &ids);
        let (c2, _) = reg.add_property(c1, b, flags, &ids);
        let dict = reg.delete_property(c2, a, slot_a);
        reg.add_property(dict, a, flags, &ids);

        let mut order = Vec::new();
        reg.for_each_property(dict, |name, _| order.push(name));
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn test_update_forks_then_mutates_in_place() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let root = reg.root_class_for_prototype(None);
        let (c, slot) = reg.add_property(root, a, PropertyFlags::default_new_named(), &ids);

        let dict = reg.update_property(c, slot, PropertyFlags::ENUMERABLE);
        assert_ne!(dict, c);
        assert_eq!(
            reg.find_property(dict, a).map(|d| d.flags),
            Some(PropertyFlags::ENUMERABLE)
        );

        let again = reg.update_property(dict, slot, PropertyFlags::WRITABLE);
        assert_eq!(again, dict, "dictionary updates do not fork again");
    }

    #[test]
    fn test_threshold_overflow_converts_to_dictionary() {
        let (mut reg, mut ids) = setup();
        let flags = PropertyFlags::default_new_named();
        let mut class = reg.root_class_for_prototype(None);
        for i in 0..=DICTIONARY_PROPERTY_THRESHOLD {
            let name = ids.intern(&format!("p{i}"));
            class = reg.add_property(class, name, flags, &ids).0;
        }
        assert!(reg.is_dictionary(class));
        assert_eq!(
            reg.num_properties(class) as usize,
            DICTIONARY_PROPERTY_THRESHOLD + 1
        );
    }

    // ── Index-like tracking ───────────────────────────────────────────────────

    #[test]
    fn test_index_like_names_are_detected_and_sticky() {
        let (mut reg, mut ids) = setup();
        let zero = ids.intern("0");
        let x = ids.intern("x");
        let flags = PropertyFlags::default_new_named();
        let root = reg.root_class_for_prototype(None);

        let (c1, _) = reg.add_property(root, x, flags, &ids);
        assert!(!reg.has_index_like_properties(c1));
        let (c2, slot) = reg.add_property(c1, zero, flags, &ids);
        assert!(reg.has_index_like_properties(c2));

        // Sticky across delete.
        let dict = reg.delete_property(c2, zero, slot);
        assert!(reg.has_index_like_properties(dict));
    }

    // ── Seal / freeze transitions ─────────────────────────────────────────────

    #[test]
    fn test_make_all_non_configurable() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let root = reg.root_class_for_prototype(None);
        let (c, _) = reg.add_property(root, a, PropertyFlags::default_new_named(), &ids);
        assert!(!reg.are_all_non_configurable(c));

        let sealed = reg.make_all_non_configurable(c);
        assert!(reg.are_all_non_configurable(sealed));
        // Writable survives sealing.
        assert!(!reg.are_all_read_only(sealed));
        assert!(
            reg.find_property(sealed, a)
                .unwrap()
                .flags
                .contains(PropertyFlags::WRITABLE)
        );
    }

    #[test]
    fn test_make_all_read_only() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let root = reg.root_class_for_prototype(None);
        let (c, _) = reg.add_property(root, a, PropertyFlags::default_new_named(), &ids);

        let frozen = reg.make_all_read_only(c);
        assert!(reg.are_all_non_configurable(frozen));
        assert!(reg.are_all_read_only(frozen));
        let flags = reg.find_property(frozen, a).unwrap().flags;
        assert!(!flags.contains(PropertyFlags::WRITABLE));
        assert!(flags.contains(PropertyFlags::ENUMERABLE), "enumerable kept");
    }

    #[test]
    fn test_empty_class_is_vacuously_sealed_and_frozen() {
        let (mut reg, _ids) = setup();
        let root = reg.root_class_for_prototype(None);
        assert!(reg.are_all_non_configurable(root));
        assert!(reg.are_all_read_only(root));
    }

    // ── For-in cache plumbing ─────────────────────────────────────────────────

    #[test]
    fn test_for_in_cache_set_get_clear() {
        let (mut reg, _ids) = setup();
        let root = reg.root_class_for_prototype(None);
        assert!(reg.for_in_cache(root).is_none());

        let words = Rc::new(vec![
            ForInWord::Fence,
            ForInWord::Name(JsValue::String("a".to_string())),
        ]);
        reg.set_for_in_cache(root, Rc::clone(&words));
        assert_eq!(reg.for_in_cache(root).as_deref(), Some(&*words));

        reg.clear_for_in_cache(root);
        assert!(reg.for_in_cache(root).is_none());
    }

    #[test]
    fn test_mutation_drops_the_for_in_cache() {
        let (mut reg, mut ids) = setup();
        let a = ids.intern("a");
        let flags = PropertyFlags::default_new_named();
        let root = reg.root_class_for_prototype(None);
        let (c, slot) = reg.add_property(root, a, flags, &ids);
        let dict = reg.update_property(c, slot, PropertyFlags::ENUMERABLE);

        reg.set_for_in_cache(dict, Rc::new(vec![ForInWord::Fence]));
        reg.delete_property(dict, a, slot);
        assert!(
            reg.for_in_cache(dict).is_none(),
            "in-place mutation must invalidate the attached cache"
        );
    }
}
