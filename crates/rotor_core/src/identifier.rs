//! The identifier table: interned property keys and `Symbol` primitives.
//!
//! Every named property is keyed by a [`SymbolId`].  Two flavours exist:
//!
//! * **Identifiers** — interned strings.  Interning the same spelling twice
//!   yields the same id, so key comparison is an integer compare.
//! * **Symbol primitives** — JS `Symbol` values.  Each mint is unique, has an
//!   optional description, and has no string spelling (it never parses as an
//!   array index and is excluded from string-keyed enumeration).
//!
//! The table is process-wide state owned by the runtime; this core only
//! interns and reads.

use std::collections::HashMap;

use crate::objects::value::JsValue;

/// An interned property key or minted `Symbol` primitive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Build a `SymbolId` from its raw table index.  Test helper; real ids
    /// come from [`IdentifierTable`].
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw table index.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// One table entry: either an interned identifier or a `Symbol` primitive.
enum KeyEntry {
    /// An interned string key.
    Identifier(String),
    /// A unique `Symbol` primitive with an optional description.
    SymbolPrimitive(Option<String>),
}

/// Process-wide intern table mapping spellings to [`SymbolId`]s.
pub struct IdentifierTable {
    entries: Vec<KeyEntry>,
    index: HashMap<String, SymbolId>,
}

impl IdentifierTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Intern `name`, returning the existing id when the spelling is known.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = SymbolId(self.entries.len() as u32);
        self.entries.push(KeyEntry::Identifier(name.to_string()));
        self.index.insert(name.to_string(), id);
        id
    }

    /// Mint a fresh `Symbol` primitive.  Every call returns a distinct id.
    pub fn create_symbol(&mut self, description: Option<&str>) -> SymbolId {
        let id = SymbolId(self.entries.len() as u32);
        self.entries
            .push(KeyEntry::SymbolPrimitive(description.map(str::to_string)));
        id
    }

    /// Returns the spelling of an identifier, or `None` for a `Symbol`
    /// primitive (symbols have descriptions, not spellings).
    pub fn name(&self, id: SymbolId) -> Option<&str> {
        match &self.entries[id.0 as usize] {
            KeyEntry::Identifier(s) => Some(s),
            KeyEntry::SymbolPrimitive(_) => None,
        }
    }

    /// Returns the description of a `Symbol` primitive, if any.
    pub fn symbol_description(&self, id: SymbolId) -> Option<&str> {
        match &self.entries[id.0 as usize] {
            KeyEntry::SymbolPrimitive(d) => d.as_deref(),
            KeyEntry::Identifier(_) => None,
        }
    }

    /// Returns `true` if `id` names an interned string key.
    pub fn is_identifier(&self, id: SymbolId) -> bool {
        matches!(&self.entries[id.0 as usize], KeyEntry::Identifier(_))
    }

    /// Returns `true` if `id` is a JS `Symbol` primitive.
    pub fn is_symbol_primitive(&self, id: SymbolId) -> bool {
        matches!(&self.entries[id.0 as usize], KeyEntry::SymbolPrimitive(_))
    }

    /// Returns the array index `id` spells, if its spelling is a canonical
    /// uint32 index.  `Symbol` primitives never are.
    pub fn to_array_index_of(&self, id: SymbolId) -> Option<u32> {
        self.name(id).and_then(to_array_index)
    }
}

impl Default for IdentifierTable {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Array-index parsing
// ──────────────────────────────────────────────────────────────────────────────

/// The largest valid array index, 2^32 − 2 (ECMAScript array indices are
/// integers in `[0, 2^32 − 1)`).
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Parses `s` as an ECMAScript array index.
///
/// The spelling must be canonical: digits only, no sign, no leading zero
/// (except `"0"` itself), and the value must not exceed [`MAX_ARRAY_INDEX`].
/// `"4294967295"` is therefore *not* an index even though it fits a `u32`.
pub fn to_array_index(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    let mut value: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u64::from(b - b'0');
    }
    if value > u64::from(MAX_ARRAY_INDEX) {
        return None;
    }
    Some(value as u32)
}

/// The numeric fast path of [`to_array_index`]: accepts a key that is
/// *already* a number, avoiding any string conversion.
///
/// String keys deliberately miss here; the slow path interns them and falls
/// back to [`to_array_index`] only when the receiver carries indexed storage.
pub fn to_array_index_fast_path(key: &JsValue) -> Option<u32> {
    match key {
        JsValue::Smi(n) if *n >= 0 => Some(*n as u32),
        JsValue::HeapNumber(n) => {
            if n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(MAX_ARRAY_INDEX) {
                // Exclude -0.0: "-0" is not a canonical index spelling.
                if *n == 0.0 && n.is_sign_negative() {
                    return None;
                }
                Some(*n as u32)
            } else {
                None
            }
        }
        _ => None,
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Interning ────────────────────────────────────────────────────────────

    #[test]
    fn test_intern_same_spelling_returns_same_id() {
        let mut table = IdentifierTable::new();
        let a = table.intern("foo");
        let b = table.intern("foo");
        assert_eq!(a, b);
        assert_eq!(table.name(a), Some("foo"));
    }

    #[test]
    fn test_intern_different_spellings_differ() {
        let mut table = IdentifierTable::new();
        let a = table.intern("foo");
        let b = table.intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn test_symbols_are_unique_even_with_same_description() {
        let mut table = IdentifierTable::new();
        let a = table.create_symbol(Some("desc"));
        let b = table.create_symbol(Some("desc"));
        assert_ne!(a, b);
        assert_eq!(table.symbol_description(a), Some("desc"));
        assert!(table.is_symbol_primitive(a));
        assert!(!table.is_identifier(a));
    }

    #[test]
    fn test_symbol_has_no_spelling() {
        let mut table = IdentifierTable::new();
        let sym = table.create_symbol(None);
        assert_eq!(table.name(sym), None);
        assert_eq!(table.to_array_index_of(sym), None);
    }

    #[test]
    fn test_identifier_index_spelling_round_trip() {
        let mut table = IdentifierTable::new();
        let id = table.intern("42");
        assert!(table.is_identifier(id));
        assert_eq!(table.to_array_index_of(id), Some(42));
        let named = table.intern("x");
        assert_eq!(table.to_array_index_of(named), None);
    }

    // ── to_array_index ───────────────────────────────────────────────────────

    #[test]
    fn test_to_array_index_accepts_canonical_spellings() {
        assert_eq!(to_array_index("0"), Some(0));
        assert_eq!(to_array_index("1"), Some(1));
        assert_eq!(to_array_index("4294967294"), Some(4_294_967_294));
    }

    #[test]
    fn test_to_array_index_rejects_max_u32() {
        // 2^32 - 1 is a valid u32 but not a valid array index.
        assert_eq!(to_array_index("4294967295"), None);
        assert_eq!(to_array_index("99999999999"), None);
    }

    #[test]
    fn test_to_array_index_rejects_non_canonical_spellings() {
        assert_eq!(to_array_index(""), None);
        assert_eq!(to_array_index("01"), None);
        assert_eq!(to_array_index("00"), None);
        assert_eq!(to_array_index("-1"), None);
        assert_eq!(to_array_index("1e3"), None);
        assert_eq!(to_array_index("1.0"), None);
        assert_eq!(to_array_index("x"), None);
    }

    // ── to_array_index_fast_path ─────────────────────────────────────────────

    #[test]
    fn test_fast_path_accepts_integral_numbers() {
        assert_eq!(to_array_index_fast_path(&JsValue::Smi(7)), Some(7));
        assert_eq!(
            to_array_index_fast_path(&JsValue::HeapNumber(4_294_967_294.0)),
            Some(4_294_967_294)
        );
        assert_eq!(to_array_index_fast_path(&JsValue::HeapNumber(0.0)), Some(0));
    }

    #[test]
    fn test_fast_path_rejects_non_indices() {
        assert_eq!(to_array_index_fast_path(&JsValue::Smi(-1)), None);
        assert_eq!(to_array_index_fast_path(&JsValue::HeapNumber(1.5)), None);
        assert_eq!(to_array_index_fast_path(&JsValue::HeapNumber(-0.0)), None);
        assert_eq!(
            to_array_index_fast_path(&JsValue::HeapNumber(4_294_967_295.0)),
            None
        );
        // Strings go through the slow path.
        assert_eq!(
            to_array_index_fast_path(&JsValue::String("0".to_string())),
            None
        );
    }
}
