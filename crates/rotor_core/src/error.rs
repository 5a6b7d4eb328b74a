//! Error types for the Rotor object-model core.

use thiserror::Error;

/// All errors that can be produced by the Rotor core.
///
/// An error return always has a matching thrown value materialised in the
/// runtime's thrown-value slot (see
/// [`Runtime::thrown_value`][crate::runtime::Runtime::thrown_value]).
#[derive(Debug, Error)]
pub enum RotorError {
    /// The engine ran out of heap memory.
    #[error("out of memory")]
    OutOfMemory,

    /// A JavaScript TypeError was raised.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// A JavaScript ReferenceError was raised.
    #[error("ReferenceError: {0}")]
    ReferenceError(String),

    /// An internal engine error that should not occur in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenient `Result` alias for fallible engine operations.
pub type RotorResult<T> = Result<T, RotorError>;
