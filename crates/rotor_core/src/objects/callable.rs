//! Callables the property core can invoke.
//!
//! This core never *creates* user functions; it only invokes accessor
//! getters and setters.  A [`NativeFunction`] is therefore the whole
//! callable story here: a named host-side Rust callback.
//!
//! A callback must not capture raw [`GcPtr`]s: it runs with the runtime
//! borrowed mutably and may allocate, so anything it holds across calls
//! must be rooted through the handle stack like all other engine code.

use std::fmt;
use std::rc::Rc;

use crate::error::RotorResult;
use crate::gc::heap::GcPtr;
use crate::gc::trace::{ForwardingMap, Relocate, Trace, Tracer};
use crate::objects::value::JsValue;
use crate::runtime::Runtime;

/// The Rust signature of a native callback: `(runtime, this, args)`.
pub type NativeCallback = Rc<dyn Fn(&mut Runtime, JsValue, &[JsValue]) -> RotorResult<JsValue>>;

/// A heap cell wrapping a native Rust callback.
pub struct NativeFunction {
    name: String,
    callback: NativeCallback,
}

impl NativeFunction {
    /// Wrap `callback` under `name` (used in diagnostics).
    pub fn new(
        name: &str,
        callback: impl Fn(&mut Runtime, JsValue, &[JsValue]) -> RotorResult<JsValue> + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            callback: Rc::new(callback),
        }
    }

    /// The function's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clone out the callback so it can be invoked after the cell borrow
    /// ends.
    pub fn callback(&self) -> NativeCallback {
        Rc::clone(&self.callback)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Trace for NativeFunction {
    /// Native callbacks own no heap references (see the module contract).
    fn trace(&self, _tracer: &mut Tracer) {}
}

impl Relocate for NativeFunction {
    fn relocate(&mut self, _map: &ForwardingMap) {}
}

/// Invoke the function cell at `func` with `this` and `args`.
///
/// The callback is cloned out of the cell first, so heap motion during the
/// call cannot touch the code being run; any `GcPtr` inside `this`/`args`
/// is only valid until the callee allocates, exactly as for engine code.
pub fn call_function(
    rt: &mut Runtime,
    func: GcPtr,
    this: JsValue,
    args: &[JsValue],
) -> RotorResult<JsValue> {
    let callback = rt.heap().function(func).callback();
    callback(rt, this, args)
}
