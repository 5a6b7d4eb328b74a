//! JavaScript value representation.
//!
//! This module provides [`JsValue`], the enum that can hold any ECMAScript
//! value the object-model core traffics in, together with type-checking
//! predicates and the [`same_value`] comparison (ECMAScript SameValue, the
//! equality used by property-descriptor updates).
//!
//! # The `Empty` sentinel
//!
//! [`JsValue::Empty`] is an engine-internal hole marker: it is what a deleted
//! property slot is overwritten with before the class transition releases it,
//! and what absent indexed elements read as.  It is never stored in a live
//! data-property slot and never escapes to an embedder.

use crate::gc::heap::GcPtr;
use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::identifier::SymbolId;

/// Any ECMAScript value.
///
/// Primitive variants carry their data inline; `Object` holds a [`GcPtr`]
/// into the engine heap.
///
/// # Validity of the `Object` variant
///
/// A `GcPtr` is only valid between allocations: a moving collection rewrites
/// every rooted copy, so a `JsValue::Object` held across a possible
/// allocation must live in the runtime's handle stack, not in a local.
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    /// Internal hole sentinel.  Never user-visible.
    Empty,
    /// The ECMAScript `undefined` primitive.
    Undefined,
    /// The ECMAScript `null` primitive.
    Null,
    /// A JavaScript boolean (`true` or `false`).
    Boolean(bool),
    /// A small (31-bit range) integer, stored inline without heap allocation.
    Smi(i32),
    /// A double-precision floating-point number stored inline.
    HeapNumber(f64),
    /// A JavaScript string value.
    String(String),
    /// A property key or JS `Symbol`, identified by an interned [`SymbolId`].
    Symbol(SymbolId),
    /// A reference to a GC-managed heap cell.
    Object(GcPtr),
}

// ──────────────────────────────────────────────────────────────────────────────
// Type-checking predicates
// ──────────────────────────────────────────────────────────────────────────────

impl JsValue {
    /// Returns `true` if this value is the internal hole sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if this value is `undefined`.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` if this value is `null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if this value is a boolean.
    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    /// Returns `true` if this value is any numeric type (`Smi` or `HeapNumber`).
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Smi(_) | Self::HeapNumber(_))
    }

    /// Returns `true` if this value is a string.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns `true` if this value is a symbol.
    #[inline]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }

    /// Returns `true` if this value is a heap reference.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns `true` if this value is a primitive (not a heap reference and
    /// not the hole sentinel).
    #[inline]
    pub fn is_primitive(&self) -> bool {
        !self.is_object() && !self.is_empty()
    }

    /// Returns the numeric value as an `f64` when this is a number.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Smi(n) => Some(f64::from(*n)),
            Self::HeapNumber(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the heap reference when this is an `Object`.
    #[inline]
    pub fn as_object(&self) -> Option<GcPtr> {
        match self {
            Self::Object(p) => Some(*p),
            _ => None,
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Constructors
// ──────────────────────────────────────────────────────────────────────────────

/// Encodes `n` as the narrowest numeric [`JsValue`].
///
/// Values that fit a 32-bit signed integer become [`JsValue::Smi`]; larger
/// ones (array indices can reach 2^32 − 2) become [`JsValue::HeapNumber`].
pub fn number_from_u32(n: u32) -> JsValue {
    match i32::try_from(n) {
        Ok(smi) => JsValue::Smi(smi),
        Err(_) => JsValue::HeapNumber(f64::from(n)),
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// SameValue (ECMAScript §9.12)
// ──────────────────────────────────────────────────────────────────────────────

/// ECMAScript **SameValue**.
///
/// This is the equality used by `[[DefineOwnProperty]]` when deciding whether
/// a redefinition actually changes anything:
///
/// * `NaN` is equal to `NaN`;
/// * `+0` and `-0` are *different*;
/// * `Smi` and `HeapNumber` encodings of the same number are equal;
/// * strings compare by content, objects by heap identity.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        if x.is_nan() && y.is_nan() {
            return true;
        }
        // Bit comparison distinguishes +0.0 from -0.0.
        return x.to_bits() == y.to_bits();
    }
    match (a, b) {
        (JsValue::Empty, JsValue::Empty) => true,
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::Symbol(x), JsValue::Symbol(y)) => x == y,
        (JsValue::Object(x), JsValue::Object(y)) => x == y,
        _ => false,
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────────────────────────────────────

/// Formats an `f64` as a JavaScript number string (ECMAScript §7.1.12.1).
///
/// Special cases: `NaN → "NaN"`, `+∞ → "Infinity"`, `-∞ → "-Infinity"`,
/// and both `+0.0` and `-0.0` → `"0"`.  All other values use Rust's default
/// `f64` `Display` formatting, which provides a minimal decimal
/// representation compatible with the common cases this core converts
/// (property keys are integral).
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // Both +0.0 and -0.0 produce "0".
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_992.0 {
        // Integral and exactly representable (|n| ≤ 2^53): print without a
        // fraction.  Property keys (array indices) always land here.
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// GC integration
// ──────────────────────────────────────────────────────────────────────────────

impl Trace for JsValue {
    /// Mark the heap cell this value references, if any.
    ///
    /// Primitive values carry no heap reference and are silently ignored.
    fn trace(&self, tracer: &mut Tracer) {
        if let JsValue::Object(p) = self {
            tracer.mark(*p);
        }
    }
}

impl Relocate for JsValue {
    /// Rewrite the embedded heap reference after a moving collection.
    fn relocate(&mut self, map: &ForwardingMap) {
        if let JsValue::Object(p) = self {
            *p = map.forward(*p);
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
