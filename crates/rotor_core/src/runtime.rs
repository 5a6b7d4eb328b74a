//! The runtime: heap, handle stack, identifier table, class registry, and
//! the error/ID services the object core consumes.
//!
//! All property operations run on the single VM thread with the runtime
//! borrowed mutably, so no synchronisation exists anywhere in the core.
//! The only re-entrancy is the calls *out* to user getters/setters/host
//! hooks, which receive the same `&mut Runtime`.

use crate::error::{RotorError, RotorResult};
use crate::gc::handle::{Handle, HandleMark, HandleStack};
use crate::gc::heap::{GcPtr, Heap, HeapCell};
use crate::gc::trace::{Relocate, Trace, Tracer};
use crate::identifier::{IdentifierTable, SymbolId};
use crate::objects::callable::NativeFunction;
use crate::objects::hidden_class::ClassRegistry;
use crate::objects::property::PropertyAccessor;
use crate::objects::value::{JsValue, number_to_string};

/// Build-time switches hoisted into one runtime record.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    /// When set, overriding a read-only static builtin is fatal instead of
    /// raising a `TypeError`.
    pub freeze_builtins_fatal_on_override: bool,
}

/// Symbols the engine itself needs to name.
pub struct Predefined {
    /// `"length"`, the array internal-setter property.
    pub length: SymbolId,
}

/// The single-threaded VM runtime.
pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) handles: HandleStack,
    pub(crate) identifiers: IdentifierTable,
    pub(crate) classes: ClassRegistry,
    pub(crate) predefined: Predefined,
    pub(crate) config: RuntimeConfig,
    next_object_id: u32,
    thrown_value: Option<JsValue>,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with an explicit configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut identifiers = IdentifierTable::new();
        let predefined = Predefined {
            length: identifiers.intern("length"),
        };
        Self {
            heap: Heap::new(),
            handles: HandleStack::new(),
            identifiers,
            classes: ClassRegistry::new(),
            predefined,
            config,
            next_object_id: 1,
            thrown_value: None,
        }
    }

    // ── Component access ──────────────────────────────────────────────────────

    /// The cell heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The identifier table.
    pub fn identifiers(&self) -> &IdentifierTable {
        &self.identifiers
    }

    /// The hidden-class registry.
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// The engine-predefined symbols.
    pub fn predefined(&self) -> &Predefined {
        &self.predefined
    }

    /// The runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // ── Identifiers ───────────────────────────────────────────────────────────

    /// Intern a property-name spelling.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.identifiers.intern(name)
    }

    /// Mint a fresh JS `Symbol` primitive.
    pub fn create_symbol(&mut self, description: Option<&str>) -> SymbolId {
        self.identifiers.create_symbol(description)
    }

    /// Convert a primitive key to a property symbol: symbols pass through,
    /// everything else is converted to its string spelling and interned.
    pub fn to_property_key(&mut self, key: &JsValue) -> SymbolId {
        match key {
            JsValue::Symbol(id) => *id,
            JsValue::String(s) => {
                let s = s.clone();
                self.identifiers.intern(&s)
            }
            JsValue::Smi(n) => {
                let s = n.to_string();
                self.identifiers.intern(&s)
            }
            JsValue::HeapNumber(n) => {
                let s = number_to_string(*n);
                self.identifiers.intern(&s)
            }
            JsValue::Boolean(b) => self.identifiers.intern(if *b { "true" } else { "false" }),
            JsValue::Null => self.identifiers.intern("null"),
            JsValue::Undefined => self.identifiers.intern("undefined"),
            JsValue::Empty | JsValue::Object(_) => {
                unreachable!("property keys must be primitives")
            }
        }
    }

    /// A human-readable rendering of a property key for error messages.
    pub fn symbol_display(&self, id: SymbolId) -> String {
        match self.identifiers.name(id) {
            Some(name) => name.to_string(),
            None => match self.identifiers.symbol_description(id) {
                Some(desc) => format!("Symbol({desc})"),
                None => "Symbol()".to_string(),
            },
        }
    }

    // ── Handles ───────────────────────────────────────────────────────────────

    /// Root `value` in the handle stack.
    pub fn make_handle(&mut self, value: JsValue) -> Handle {
        self.handles.push(value)
    }

    /// Copy the rooted value out.
    pub fn handle_value(&self, handle: Handle) -> JsValue {
        self.handles.value(handle)
    }

    /// Record the current handle-stack depth.
    pub fn handle_mark(&self) -> HandleMark {
        self.handles.mark()
    }

    /// Drop every handle created after `mark`.
    pub fn flush_handles(&mut self, mark: HandleMark) {
        self.handles.flush_to(mark);
    }

    /// Resolve an object handle to its current cell address.
    ///
    /// # Panics
    /// Panics if the handle does not hold an object; operations that take
    /// object handles document that requirement.
    pub(crate) fn handle_object(&self, handle: Handle) -> GcPtr {
        match self.handles.get(handle) {
            JsValue::Object(p) => *p,
            other => panic!("handle does not hold an object: {other:?}"),
        }
    }

    // ── Allocation & collection ───────────────────────────────────────────────

    /// Run a collection now if the heap has grown past its threshold.
    ///
    /// Factories call this *before* building a cell, so the `GcPtr`s they
    /// are about to embed are resolved from handles afterwards.
    pub fn maybe_collect(&mut self) {
        if self.heap.should_collect() {
            self.collect();
        }
    }

    /// Run a full collection: mark from the handle stack and thrown-value
    /// slot, compact, and fix up every root.
    pub fn collect(&mut self) {
        let mut roots = Tracer::new();
        self.handles.trace(&mut roots);
        if let Some(v) = &self.thrown_value {
            v.trace(&mut roots);
        }
        let map = self.heap.collect(roots);
        self.handles.relocate(&map);
        if let Some(v) = &mut self.thrown_value {
            v.relocate(&map);
        }
    }

    /// Allocate a native function cell and return a rooted handle to it.
    pub fn alloc_function(
        &mut self,
        name: &str,
        callback: impl Fn(&mut Runtime, JsValue, &[JsValue]) -> RotorResult<JsValue> + 'static,
    ) -> Handle {
        self.maybe_collect();
        let ptr = self
            .heap
            .allocate(HeapCell::Function(NativeFunction::new(name, callback)));
        self.make_handle(JsValue::Object(ptr))
    }

    /// Allocate an accessor cell for the given callable handles and return
    /// a rooted handle to it.  Either half may be absent.
    pub fn alloc_accessor(&mut self, getter: Option<Handle>, setter: Option<Handle>) -> Handle {
        self.maybe_collect();
        let g = getter.map(|h| self.handle_object(h));
        let s = setter.map(|h| self.handle_object(h));
        let ptr = self
            .heap
            .allocate(HeapCell::Accessor(PropertyAccessor::new(g, s)));
        self.make_handle(JsValue::Object(ptr))
    }

    // ── Object identity ───────────────────────────────────────────────────────

    /// The next value of the monotonic object-id counter.
    pub(crate) fn generate_next_object_id(&mut self) -> u32 {
        let id = self.next_object_id;
        self.next_object_id = self.next_object_id.wrapping_add(1);
        id
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    /// The thrown value materialised by the most recent raise, if any.
    pub fn thrown_value(&self) -> Option<&JsValue> {
        self.thrown_value.as_ref()
    }

    /// Take and clear the thrown value.
    pub fn take_thrown_value(&mut self) -> Option<JsValue> {
        self.thrown_value.take()
    }

    /// Raise a `TypeError`: materialise the thrown value and return the
    /// error for the caller to propagate.
    pub fn raise_type_error(&mut self, message: impl Into<String>) -> RotorError {
        let message = message.into();
        self.thrown_value = Some(JsValue::String(message.clone()));
        RotorError::TypeError(message)
    }

    /// Raise a `ReferenceError`.
    pub fn raise_reference_error(&mut self, message: impl Into<String>) -> RotorError {
        let message = message.into();
        self.thrown_value = Some(JsValue::String(message.clone()));
        RotorError::ReferenceError(message)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
