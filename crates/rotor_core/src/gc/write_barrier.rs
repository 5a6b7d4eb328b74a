//! Write barrier for the moving garbage collector.
//!
//! Every store into an owning field of a heap cell (a named slot, an indexed
//! element, the parent pointer, an accessor half) goes through
//! [`Heap::record_write`].  Stores of heap references insert the *host* cell
//! into a store-buffer [`RememberedSet`]; the collector drains the buffer as
//! additional gray roots at the start of the next cycle.
//!
//! With a single-space full collection the buffer is conservative — every
//! live host is found from the roots anyway — but it keeps the mutator
//! honest about which stores create edges, which is the contract an
//! incremental or generational collector needs.

use std::collections::HashSet;

use crate::gc::heap::{GcPtr, Heap};
use crate::gc::trace::Tracer;
use crate::objects::value::JsValue;

/// Store buffer of host cells that had a heap reference written into them.
pub struct RememberedSet {
    hosts: HashSet<GcPtr>,
}

impl RememberedSet {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            hosts: HashSet::new(),
        }
    }

    /// Record `host`.  Duplicate inserts are idempotent.
    pub fn insert(&mut self, host: GcPtr) {
        self.hosts.insert(host);
    }

    /// Number of recorded hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns `true` if no host is recorded.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Move every recorded host into `tracer` as a gray root and clear the
    /// buffer.
    pub fn drain_into(&mut self, tracer: &mut Tracer) {
        for host in self.hosts.drain() {
            tracer.mark(host);
        }
    }
}

impl Default for RememberedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Record a store of `value` into an owning field of `host`.
    ///
    /// Must be called for **every** owning-field store.  Primitive values
    /// cannot create heap edges and are skipped cheaply.
    pub fn record_write(&mut self, host: GcPtr, value: &JsValue) {
        if value.is_object() {
            self.remembered_mut().insert(host);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
