//! Property-name enumeration: own names, own symbols, and the cached
//! for-in name list.
//!
//! # Ordering
//!
//! `get_own_property_names` produces a single ordered sequence: integer
//! indexes first (ascending), then string-keyed names in insertion order,
//! then host names not already reported by the class.  A *named* property
//! whose spelling is itself an integer index is extracted, sorted together
//! with the real indexes, and merged into the leading run.
//!
//! # The for-in cache
//!
//! `get_for_in_property_names` returns a shared array in the layout
//! `[Class(proto₁), …, Fence, Name…]` (see [`ForInWord`]).  The prefix pins
//! the prototype chain's shapes: a later lookup replays it against the live
//! chain and reuses the array only on a full match.  The cache is installed
//! only when the receiver and every prototype are cacheable and the array
//! stays within 4× the receiver's own property count.

use std::collections::HashSet;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::RotorResult;
use crate::gc::handle::Handle;
use crate::gc::heap::GcPtr;
use crate::identifier::{SymbolId, to_array_index};
use crate::objects::hidden_class::ForInWord;
use crate::objects::js_object::{JsObject, ObjectFlags};
use crate::objects::property::PropertyFlags;
use crate::objects::value::{JsValue, number_from_u32};
use crate::runtime::Runtime;

impl JsObject {
    /// Ordered own property names (numbers for indexes, strings for named
    /// properties; symbols excluded).
    pub fn get_own_property_names(
        rt: &mut Runtime,
        obj: Handle,
        only_enumerable: bool,
    ) -> RotorResult<Vec<JsValue>> {
        let ptr = rt.handle_object(obj);
        if rt.heap.object(ptr).flags().contains(ObjectFlags::LAZY_OBJECT) {
            Self::initialize_lazy_object(rt, obj)?;
        }
        let ptr = rt.handle_object(obj);

        // Host names are fetched up front (the hook is user code).
        let host_symbols: Vec<SymbolId> =
            if rt.heap.object(ptr).flags().contains(ObjectFlags::HOST_OBJECT) {
                let (lo, hi) = rt.heap.object(ptr).indexed().own_indexed_range();
                debug_assert_eq!(lo, hi, "host objects cannot own an indexed range");
                let hooks = rt.heap.object(ptr).host_hooks();
                hooks.own_property_names(rt)?
            } else {
                Vec::new()
            };
        let ptr = rt.handle_object(obj);

        let class = rt.heap.object(ptr).class();
        let (lo, hi) = rt.heap.object(ptr).indexed().own_indexed_range();

        let mut names: Vec<JsValue> =
            Vec::with_capacity(rt.classes.num_properties(class) as usize + (hi - lo) as usize);

        // The indexed run.
        for i in lo..hi {
            let Some(flags) = rt.heap.object(ptr).indexed().own_indexed_flags(i) else {
                continue;
            };
            if only_enumerable && !flags.contains(PropertyFlags::ENUMERABLE) {
                continue;
            }
            names.push(number_from_u32(i));
        }
        let num_indexed = names.len();

        // Named properties whose spelling is an index are stashed here and
        // merged below.
        let mut index_names: SmallVec<[u32; 8]> = SmallVec::new();
        // Class names seen, for host deduplication.
        let mut dedup: HashSet<SymbolId> = HashSet::new();

        {
            let ids = &rt.identifiers;
            rt.classes.for_each_property(class, |sym, desc| {
                if !ids.is_identifier(sym) {
                    return;
                }
                if only_enumerable && !desc.flags.contains(PropertyFlags::ENUMERABLE) {
                    return;
                }
                if !host_symbols.is_empty() {
                    dedup.insert(sym);
                }
                let name = ids.name(sym).expect("identifier has a spelling");
                if let Some(i) = to_array_index(name) {
                    index_names.push(i);
                    return;
                }
                names.push(JsValue::String(name.to_string()));
            });
        }

        // Host names, minus those the class already reported.
        for sym in host_symbols {
            if dedup.insert(sym) {
                if let Some(i) = rt.identifiers.to_array_index_of(sym) {
                    index_names.push(i);
                } else if let Some(name) = rt.identifiers.name(sym) {
                    names.push(JsValue::String(name.to_string()));
                }
            }
        }

        // Merge stashed index spellings into the leading index run.  No
        // duplicates can arise: an index lives in indexed storage or as a
        // named property, never both.
        if !index_names.is_empty() {
            index_names.sort_unstable();
            let named_tail = names.split_off(num_indexed);
            let lead: Vec<u32> = names
                .iter()
                .map(|v| v.as_number().expect("index run holds numbers") as u32)
                .collect();

            let mut merged: Vec<JsValue> = Vec::with_capacity(lead.len() + index_names.len());
            let (mut a, mut b) = (0, 0);
            while a < lead.len() || b < index_names.len() {
                let take_lead = match (lead.get(a), index_names.get(b)) {
                    (Some(x), Some(y)) => x < y,
                    (Some(_), None) => true,
                    _ => false,
                };
                if take_lead {
                    merged.push(number_from_u32(lead[a]));
                    a += 1;
                } else {
                    merged.push(number_from_u32(index_names[b]));
                    b += 1;
                }
            }
            merged.extend(named_tail);
            names = merged;
        }

        Ok(names)
    }

    /// Own property keys that are JS `Symbol` primitives, in insertion
    /// order.
    pub fn get_own_property_symbols(rt: &mut Runtime, obj: Handle) -> RotorResult<Vec<SymbolId>> {
        let ptr = rt.handle_object(obj);
        if rt.heap.object(ptr).flags().contains(ObjectFlags::LAZY_OBJECT) {
            Self::initialize_lazy_object(rt, obj)?;
        }
        let ptr = rt.handle_object(obj);
        let class = rt.heap.object(ptr).class();
        let mut symbols = Vec::new();
        {
            let ids = &rt.identifiers;
            rt.classes.for_each_property(class, |sym, _desc| {
                if ids.is_symbol_primitive(sym) {
                    symbols.push(sym);
                }
            });
        }
        Ok(symbols)
    }

    /// The for-in name list for `obj`: a shared array plus the `[begin,
    /// end)` range of its name words.
    pub fn get_for_in_property_names(
        rt: &mut Runtime,
        obj: Handle,
    ) -> RotorResult<(Rc<Vec<ForInWord>>, u32, u32)> {
        let ptr = rt.handle_object(obj);
        let class = rt.heap.object(ptr).class();

        // Fast case: replay the cached prototype-shape prefix.
        if let Some(cached) = rt.classes.for_in_cache(class) {
            let begin = matches_proto_classes(rt, ptr, &cached);
            if begin > 0 {
                let end = cached.len() as u32;
                return Ok((cached, begin, end));
            }
            // The chain changed; the stale cache likely misleads other
            // objects of this shape too.
            rt.classes.clear_for_in_cache(class);
        }

        // Slow case: build the array.
        let mut words: Vec<ForInWord> = Vec::new();
        set_proto_classes(rt, ptr, &mut words);
        let begin = words.len() as u32;
        let can_cache = begin > 0;

        append_all_property_names(rt, obj, &mut words)?;
        let end = words.len() as u32;

        // Avoid degenerate growth: skip caching when more than 75% of the
        // array is prototype classes or prototype names.
        let own_estimate = rt.classes.num_properties(class);
        let too_much_proto = end / 4 > own_estimate;

        let words = Rc::new(words);
        if can_cache && !too_much_proto {
            rt.classes.set_for_in_cache(class, Rc::clone(&words));
        }
        Ok((words, begin, end))
    }
}

/// Append the prototype chain's classes to `words`, terminated by a fence;
/// clears `words` when the receiver or any prototype is uncacheable.
fn set_proto_classes(rt: &Runtime, ptr: GcPtr, words: &mut Vec<ForInWord>) {
    if !rt.heap().object(ptr).should_cache_for_in(rt.classes()) {
        words.clear();
        return;
    }
    let mut chain: SmallVec<[ForInWord; 4]> = SmallVec::new();
    let mut head = rt.heap().object(ptr).parent();
    while let Some(p) = head {
        let cell = rt.heap().object(p);
        if !cell.should_cache_for_in(rt.classes()) {
            words.clear();
            return;
        }
        chain.push(ForInWord::Class(cell.class()));
        head = cell.parent();
    }
    words.extend(chain);
    words.push(ForInWord::Fence);
}

/// Verify that the prototype chain of `ptr` still matches the class prefix
/// of `words`.  Returns the index after the fence on success, 0 on any
/// mismatch.
fn matches_proto_classes(rt: &Runtime, ptr: GcPtr, words: &[ForInWord]) -> u32 {
    let mut i = 0usize;
    let mut head = rt.heap().object(ptr).parent();
    while let Some(p) = head {
        match words.get(i) {
            Some(ForInWord::Class(c)) if *c == rt.heap().object(p).class() => {
                i += 1;
                head = rt.heap().object(p).parent();
            }
            _ => return 0,
        }
    }
    // Both the chain and the prefix must end together.
    match words.get(i) {
        Some(ForInWord::Fence) => (i + 1) as u32,
        _ => 0,
    }
}

/// `true` when two for-in names denote the same property, treating a
/// number and its canonical string spelling as equal.
fn for_in_name_equal(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::String(s), num) | (num, JsValue::String(s)) => {
            match (to_array_index(s), num.as_number()) {
                (Some(i), Some(n)) => f64::from(i) == n,
                _ => false,
            }
        }
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Walk the prototype chain collecting every enumerable own name,
/// deduplicating names shadowed further down the chain.
fn append_all_property_names(
    rt: &mut Runtime,
    obj: Handle,
    words: &mut Vec<ForInWord>,
) -> RotorResult<()> {
    let begin = words.len();
    let outer = rt.handle_mark();
    let start = rt.handle_value(obj);
    let head = rt.make_handle(start);
    // Shadowing duplicates only exist across chain levels, so the first
    // object needs no deduplication.
    let mut need_dedup = false;
    loop {
        let mark = rt.handle_mark();
        let own = JsObject::get_own_property_names(rt, head, true)?;
        for prop in own {
            let duplicate = need_dedup
                && words[begin..].iter().any(|w| match w {
                    ForInWord::Name(existing) => for_in_name_equal(existing, &prop),
                    _ => false,
                });
            if !duplicate {
                words.push(ForInWord::Name(prop));
            }
        }
        rt.flush_handles(mark);

        let parent = rt.heap.object(rt.handle_object(head)).parent();
        match parent {
            None => break,
            Some(p) => rt.handles.set(head, JsValue::Object(p)),
        }
        need_dedup = true;
    }
    rt.flush_handles(outer);
    Ok(())
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
