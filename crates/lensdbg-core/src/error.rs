//! # Error Types
//!
//! Error handling for the introspection layer.
//!
//! Nothing in this crate is fatal. Each category below has a local recovery
//! policy, applied by the component that hits it:
//!
//! 1. **Type resolution**: the offending type becomes the degenerate empty type
//! 2. **Value building**: the single value or field is skipped
//! 3. **Evaluation**: the operation reports "no result"
//! 4. **Resources**: scratch release failures are logged and otherwise ignored

use thiserror::Error;

use crate::types::Address;

/// Error reported by a native debugger backend.
///
/// Backends only need to describe what went wrong; the core decides how to
/// recover based on which operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct NativeError(pub String);

impl NativeError
{
    /// Build an error from anything printable.
    pub fn new(message: impl Into<String>) -> Self
    {
        Self(message.into())
    }
}

/// Result type used by [`NativeDebugger`](crate::native::NativeDebugger) implementations.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Reasons a native type cannot be turned into an internal type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeResolutionError
{
    /// The backend flagged the type as erroneous or returned a code we do not handle.
    #[error("unrecognized native type code for '{0}'")]
    UnknownTypeCode(String),

    /// Pointer, reference, array or typedef without a target type.
    #[error("'{0}' has no target type")]
    MissingTarget(String),

    /// Array element type has no size, so the element count is undefined.
    #[error("array '{0}' has a zero-sized element type")]
    ZeroSizedElement(String),

    /// A template argument that is neither a type nor a value.
    #[error("template argument {position} of '{owner}' is neither a type nor a value")]
    UnknownTemplateArgument
    {
        /// Type whose argument list was being read
        owner: String,
        /// Zero-based argument position
        position: usize,
    },
}

/// Main error type for introspection operations
#[derive(Error, Debug)]
pub enum LensError
{
    /// A native type could not be resolved.
    #[error("Type resolution failed: {0}")]
    TypeResolution(#[from] TypeResolutionError),

    /// A value could not be built (cast failure, missing debug info, optimized out).
    #[error("Cannot build value: {0}")]
    ValueBuild(String),

    /// The native debugger failed to evaluate an expression.
    #[error("Cannot evaluate '{expression}': {reason}")]
    Evaluation
    {
        /// Expression text handed to the backend
        expression: String,
        /// Backend diagnostic
        reason: String,
    },

    /// Scratch memory in the inferior could not be allocated or released.
    #[error("Scratch memory error at {address:?}: {reason}")]
    Resource
    {
        /// Address of the buffer, if one was obtained
        address: Option<Address>,
        /// Backend diagnostic
        reason: String,
    },

    /// Any other backend failure.
    #[error("Native debugger error: {0}")]
    Native(#[from] NativeError),

    /// Invalid argument passed to an introspection function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for `Result<T, LensError>`
///
/// ```rust
/// use lensdbg_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, LensError>;
