//! The handle stack: rooted values that survive heap motion.
//!
//! A [`Handle`] is an index into the runtime's [`HandleStack`], a vector of
//! rooted [`JsValue`]s.  Handles replace raw [`GcPtr`]s across allocations:
//! the collector traces the whole stack as a root set and rewrites every
//! entry after compaction, so a handle remains valid no matter how many
//! cells move — a raw `GcPtr` does not.
//!
//! # Scope markers
//!
//! Iterative operations that create handles in a loop take a
//! [`HandleMark`] first and flush back to it each iteration, bounding stack
//! growth.  Flushing invalidates every handle created after the mark; using
//! one afterwards is a bug (and panics on out-of-range access).

use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::objects::value::JsValue;

/// An index into the [`HandleStack`].  Valid until the stack is flushed past
/// it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Handle(u32);

/// A saved stack depth to flush back to.
#[derive(Copy, Clone, Debug)]
pub struct HandleMark(u32);

/// The rooted-value stack owned by the runtime.
pub struct HandleStack {
    values: Vec<JsValue>,
}

impl HandleStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Root `value` and return its handle.
    pub fn push(&mut self, value: JsValue) -> Handle {
        let h = Handle(self.values.len() as u32);
        self.values.push(value);
        h
    }

    /// Borrow the rooted value.
    pub fn get(&self, handle: Handle) -> &JsValue {
        &self.values[handle.0 as usize]
    }

    /// Copy the rooted value out.
    pub fn value(&self, handle: Handle) -> JsValue {
        self.values[handle.0 as usize].clone()
    }

    /// Overwrite the rooted value (the mutable-handle pattern used by
    /// prototype-chain walks).
    pub fn set(&mut self, handle: Handle, value: JsValue) {
        self.values[handle.0 as usize] = value;
    }

    /// Record the current depth.
    pub fn mark(&self) -> HandleMark {
        HandleMark(self.values.len() as u32)
    }

    /// Drop every handle created after `mark`.
    pub fn flush_to(&mut self, mark: HandleMark) {
        debug_assert!(mark.0 as usize <= self.values.len());
        self.values.truncate(mark.0 as usize);
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no handles are live.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for HandleStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace for HandleStack {
    /// Every rooted value is a GC root.
    fn trace(&self, tracer: &mut Tracer) {
        for v in &self.values {
            v.trace(tracer);
        }
    }
}

impl Relocate for HandleStack {
    fn relocate(&mut self, map: &ForwardingMap) {
        for v in &mut self.values {
            v.relocate(map);
        }
    }
}
