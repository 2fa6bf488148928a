//! # Scratch Memory Guard
//!
//! Some operations need a value to have an address even though it has none:
//! member access on a detached aggregate, or calling a method on a temporary.
//! The value is then copied into memory allocated in the inferior.
//!
//! [`ScratchBuffer`] owns one such allocation and frees it when dropped, so the
//! buffer is released on every exit path, including early returns on error and
//! iterators abandoned half way.
//!
//! ## Example
//!
//! ```rust,ignore
//! let scratch = ScratchBuffer::new(&native, &bytes)?;
//! let expr = format!("((Foo*){})->size()", scratch.address());
//! let result = native.evaluate(&expr);
//! // scratch memory is freed here, whether or not evaluation succeeded
//! ```

use tracing::{debug, warn};

use crate::error::{LensError, Result};
use crate::native::NativeDebugger;
use crate::types::Address;

/// RAII guard that releases an inferior scratch allocation when dropped.
pub struct ScratchBuffer<'a, N: NativeDebugger>
{
    native: &'a N,
    address: Address,
    active: bool,
}

impl<'a, N: NativeDebugger> ScratchBuffer<'a, N>
{
    /// Allocate inferior memory holding a copy of `contents`.
    ///
    /// ## Errors
    ///
    /// - `Resource`: the inferior could not allocate the buffer
    pub fn new(native: &'a N, contents: &[u8]) -> Result<Self>
    {
        let address = native.allocate_scratch(contents).map_err(|err| LensError::Resource {
            address: None,
            reason: err.to_string(),
        })?;
        debug!("Allocated {} scratch bytes at {address}", contents.len());

        Ok(Self {
            native,
            address,
            active: true,
        })
    }

    /// Address of the copy in the inferior.
    pub fn address(&self) -> Address
    {
        self.address
    }

    /// Release the buffer now instead of on drop.
    ///
    /// After calling this method, dropping the guard is a no-op.
    ///
    /// ## Errors
    ///
    /// - `Resource`: the inferior rejected the release
    pub fn release(mut self) -> Result<()>
    {
        self.active = false;
        self.native.release_scratch(self.address).map_err(|err| LensError::Resource {
            address: Some(self.address),
            reason: err.to_string(),
        })
    }
}

impl<N: NativeDebugger> Drop for ScratchBuffer<'_, N>
{
    fn drop(&mut self)
    {
        if self.active {
            // Best effort release
            if let Err(err) = self.native.release_scratch(self.address) {
                warn!("Failed to release scratch memory at {}: {err}", self.address);
            }
        }
    }
}
