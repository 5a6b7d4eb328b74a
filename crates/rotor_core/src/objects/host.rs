//! Host-object delegation.
//!
//! A host object routes named property reads and writes that miss its
//! hidden class to an embedder callback.  Own class properties always win
//! over host properties; the synthesis of the `{host_object, writable}`
//! descriptor happens in descriptor resolution, so the common non-host
//! lookup pays nothing.

use std::rc::Rc;

use crate::error::RotorResult;
use crate::identifier::SymbolId;
use crate::objects::value::JsValue;
use crate::runtime::Runtime;

/// The embedder callbacks backing a host object.
///
/// Methods take `&self`; implementations that need state use interior
/// mutability.  Like native callbacks, hooks must not cache raw `GcPtr`s
/// across calls.
pub trait HostHooks {
    /// Read the host property `name`.
    fn get(&self, rt: &mut Runtime, name: SymbolId) -> RotorResult<JsValue>;

    /// Write the host property `name`.  Returns `false` to reject.
    fn set(&self, rt: &mut Runtime, name: SymbolId, value: JsValue) -> RotorResult<bool>;

    /// The property names the host wishes to report for enumeration.
    ///
    /// Callers treat the result as an unordered set: names are
    /// deduplicated against the hidden class and against each other.
    fn own_property_names(&self, rt: &mut Runtime) -> RotorResult<Vec<SymbolId>>;
}

/// Shared handle to a host implementation, as stored on the object cell.
pub type HostHooksRef = Rc<dyn HostHooks>;
