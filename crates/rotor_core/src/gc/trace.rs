//! Marking and pointer fix-up traversal for the garbage collector.

use crate::gc::heap::GcPtr;

/// Drives the mark traversal during a GC cycle.
///
/// The tracer maintains a gray queue of cell references that have been
/// discovered as reachable but whose outgoing references have not yet been
/// visited.  The collector pops entries from the queue and calls
/// [`Trace::trace`] on them, which in turn pushes their referents.
pub struct Tracer {
    gray: Vec<GcPtr>,
}

impl Tracer {
    /// Create a new, empty `Tracer`.
    pub fn new() -> Self {
        Self { gray: Vec::new() }
    }

    /// Mark a cell reference as reachable and enqueue it for tracing.
    pub fn mark(&mut self, ptr: GcPtr) {
        self.gray.push(ptr);
    }

    /// Pop the next gray entry, if any.
    pub fn pop(&mut self) -> Option<GcPtr> {
        self.gray.pop()
    }

    /// Returns `true` if no gray entries remain.
    pub fn is_empty(&self) -> bool {
        self.gray.is_empty()
    }

    /// Drain all queued entries.  Test helper.
    pub fn drain(&mut self) -> Vec<GcPtr> {
        std::mem::take(&mut self.gray)
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

/// All GC-managed types must implement `Trace` to expose their outgoing
/// heap references to the garbage collector.
///
/// # Contract
/// An implementation **must** call [`Tracer::mark`] for *every* heap
/// reference it owns.  Any reference that is not reported will be considered
/// unreachable and may be freed or moved without fix-up.
pub trait Trace {
    /// Visit all outgoing heap references, marking each via the tracer.
    fn trace(&self, tracer: &mut Tracer);
}

/// Maps pre-compaction cell indices to their post-compaction locations.
///
/// Built by the collector after marking; applied to every surviving cell and
/// to every root (handle stack, thrown-value slot) before the cycle ends.
pub struct ForwardingMap {
    new_index: Vec<Option<u32>>,
}

impl ForwardingMap {
    /// Build a map from the per-cell relocation table.  `None` entries are
    /// dead cells; forwarding one is an engine bug.
    pub fn new(new_index: Vec<Option<u32>>) -> Self {
        Self { new_index }
    }

    /// Returns the post-compaction location of `ptr`.
    ///
    /// # Panics
    /// Panics if `ptr` refers to a dead cell: every live reference must have
    /// been reported during marking, so forwarding a dead cell means a
    /// `Trace` implementation under-reported.
    pub fn forward(&self, ptr: GcPtr) -> GcPtr {
        let slot = self.new_index[ptr.raw() as usize];
        GcPtr::from_raw(slot.expect("forwarded reference to a dead cell"))
    }
}

/// GC-managed types whose stored references must be rewritten after a
/// moving collection.
pub trait Relocate {
    /// Rewrite every owned heap reference through `map`.
    fn relocate(&mut self, map: &ForwardingMap);
}
