//! The cell heap and its moving (slide-compacting) collector.
//!
//! # Model
//!
//! The heap owns a slab of [`HeapCell`]s addressed by [`GcPtr`], an index
//! newtype.  A collection marks from the roots the runtime supplies, then
//! *slides* the surviving cells down over the dead ones and rewrites every
//! stored reference through a [`ForwardingMap`].  Because cells move, a raw
//! `GcPtr` is valid only between allocations; references that must survive
//! an allocation live in the runtime's handle stack, which the collector
//! fixes up as an additional root set.
//!
//! The write-barrier store buffer (see
//! [`write_barrier`][crate::gc::write_barrier]) is drained at the start of
//! every cycle as extra gray roots.

use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::gc::write_barrier::RememberedSet;
use crate::objects::callable::NativeFunction;
use crate::objects::js_object::JsObject;
use crate::objects::property::PropertyAccessor;

/// A reference to a heap cell: an index into the heap's slab.
///
/// Valid only between allocations.  A moving collection rewrites every
/// rooted copy; an unrooted copy held across an allocation is a bug.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GcPtr(u32);

impl GcPtr {
    /// Build a `GcPtr` from its raw slab index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw slab index.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Every kind of cell the object-model core allocates.
///
/// The kind is fixed at allocation time; a cell never changes variant.
pub enum HeapCell {
    /// A JavaScript object (or array: the indexed variant is inside).
    Object(JsObject),
    /// A (getter, setter) accessor pair.
    Accessor(PropertyAccessor),
    /// A callable invoked as an accessor getter/setter.
    Function(NativeFunction),
}

impl Trace for HeapCell {
    fn trace(&self, tracer: &mut Tracer) {
        match self {
            HeapCell::Object(o) => o.trace(tracer),
            HeapCell::Accessor(a) => a.trace(tracer),
            HeapCell::Function(f) => f.trace(tracer),
        }
    }
}

impl Relocate for HeapCell {
    fn relocate(&mut self, map: &ForwardingMap) {
        match self {
            HeapCell::Object(o) => o.relocate(map),
            HeapCell::Accessor(a) => a.relocate(map),
            HeapCell::Function(f) => f.relocate(map),
        }
    }
}

/// Cell count that triggers the first collection; doubles with the live set.
const INITIAL_GC_THRESHOLD: usize = 1024;

/// The cell heap: slab storage plus the collection machinery.
pub struct Heap {
    cells: Vec<HeapCell>,
    gc_threshold: usize,
    remembered: RememberedSet,
    collections: u64,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            gc_threshold: INITIAL_GC_THRESHOLD,
            remembered: RememberedSet::new(),
            collections: 0,
        }
    }

    /// Allocate `cell`, returning its reference.
    ///
    /// Allocation itself never collects; the runtime checks
    /// [`should_collect`][Self::should_collect] *before* allocating so that
    /// callers holding raw `GcPtr`s across this call stay valid.
    pub fn allocate(&mut self, cell: HeapCell) -> GcPtr {
        let ptr = GcPtr(self.cells.len() as u32);
        self.cells.push(cell);
        ptr
    }

    /// Returns `true` once enough cells exist that the next allocation
    /// boundary should run a collection.
    pub fn should_collect(&self) -> bool {
        self.cells.len() >= self.gc_threshold
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no cells are allocated.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of completed collection cycles.
    pub fn collections(&self) -> u64 {
        self.collections
    }

    /// The write-barrier store buffer.
    pub fn remembered(&self) -> &RememberedSet {
        &self.remembered
    }

    pub(crate) fn remembered_mut(&mut self) -> &mut RememberedSet {
        &mut self.remembered
    }

    // ── Typed cell access ─────────────────────────────────────────────────────
    //
    // Kind mismatches are engine bugs, not user-visible errors; they panic.

    /// Borrow the object cell at `ptr`.
    #[inline]
    pub fn object(&self, ptr: GcPtr) -> &JsObject {
        match &self.cells[ptr.0 as usize] {
            HeapCell::Object(o) => o,
            _ => panic!("heap cell {} is not an object", ptr.0),
        }
    }

    /// Mutably borrow the object cell at `ptr`.
    #[inline]
    pub fn object_mut(&mut self, ptr: GcPtr) -> &mut JsObject {
        match &mut self.cells[ptr.0 as usize] {
            HeapCell::Object(o) => o,
            _ => panic!("heap cell {} is not an object", ptr.0),
        }
    }

    /// Borrow the accessor cell at `ptr`.
    #[inline]
    pub fn accessor(&self, ptr: GcPtr) -> &PropertyAccessor {
        match &self.cells[ptr.0 as usize] {
            HeapCell::Accessor(a) => a,
            _ => panic!("heap cell {} is not an accessor", ptr.0),
        }
    }

    /// Mutably borrow the accessor cell at `ptr`.
    #[inline]
    pub fn accessor_mut(&mut self, ptr: GcPtr) -> &mut PropertyAccessor {
        match &mut self.cells[ptr.0 as usize] {
            HeapCell::Accessor(a) => a,
            _ => panic!("heap cell {} is not an accessor", ptr.0),
        }
    }

    /// Borrow the function cell at `ptr`.
    #[inline]
    pub fn function(&self, ptr: GcPtr) -> &NativeFunction {
        match &self.cells[ptr.0 as usize] {
            HeapCell::Function(f) => f,
            _ => panic!("heap cell {} is not a function", ptr.0),
        }
    }

    /// Returns `true` if `ptr` refers to an object cell.
    #[inline]
    pub fn is_object_cell(&self, ptr: GcPtr) -> bool {
        matches!(&self.cells[ptr.0 as usize], HeapCell::Object(_))
    }

    // ── Collection ────────────────────────────────────────────────────────────

    /// Run a full mark-and-slide collection.
    ///
    /// `roots` must already contain every root reference (handle stack,
    /// thrown-value slot).  The remembered set is drained as additional gray
    /// roots and cleared.  Returns the [`ForwardingMap`] so the caller can
    /// fix up the roots it owns.
    pub fn collect(&mut self, mut roots: Tracer) -> ForwardingMap {
        self.remembered.drain_into(&mut roots);

        // Mark.
        let mut marked = vec![false; self.cells.len()];
        while let Some(ptr) = roots.pop() {
            let i = ptr.0 as usize;
            if !marked[i] {
                marked[i] = true;
                self.cells[i].trace(&mut roots);
            }
        }

        // Plan the slide: live cells keep their relative order.
        let mut new_index = vec![None; self.cells.len()];
        let mut next: u32 = 0;
        for (i, live) in marked.iter().enumerate() {
            if *live {
                new_index[i] = Some(next);
                next += 1;
            }
        }
        let map = ForwardingMap::new(new_index);

        // Move survivors and rewrite their stored references.
        let old = std::mem::take(&mut self.cells);
        self.cells = Vec::with_capacity(next as usize);
        for (i, mut cell) in old.into_iter().enumerate() {
            if marked[i] {
                cell.relocate(&map);
                self.cells.push(cell);
            }
        }

        self.gc_threshold = INITIAL_GC_THRESHOLD.max(self.cells.len() * 2);
        self.collections += 1;
        map
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
