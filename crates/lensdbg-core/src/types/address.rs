//! Inferior memory address type.

use std::fmt;
use std::ops::Add;

use serde::{Serialize, Serializer};

/// Strongly typed address in the inferior process
///
/// Values, fields and scratch buffers are all located by address. Keeping the
/// address in a newtype stops it from being mixed up with sizes, bit offsets or
/// integer payloads, which all travel as `u64` too.
///
/// ## Example
///
/// ```rust
/// use lensdbg_core::types::Address;
///
/// let base = Address::from(0x1000);
/// assert_eq!((base + 8).value(), 0x1008);
/// assert_eq!(base.to_string(), "0x1000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address
    pub const NULL: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Raw numeric value
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// `true` for the null address
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Byte offset from this address, `None` on overflow
    ///
    /// ```rust
    /// use lensdbg_core::types::Address;
    ///
    /// assert_eq!(Address::from(0x10).checked_add(4), Some(Address::from(0x14)));
    /// assert_eq!(Address::from(u64::MAX).checked_add(1), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Decode a pointer value stored in target byte order (little endian)
    ///
    /// Shorter inputs are zero-extended, longer ones are truncated to 8 bytes.
    pub fn from_le_bytes(bytes: &[u8]) -> Self
    {
        let mut raw = [0u8; 8];
        let len = bytes.len().min(8);
        raw[..len].copy_from_slice(&bytes[..len]);
        Address(u64::from_le_bytes(raw))
    }

    /// Encode as a pointer of `size` bytes in target byte order
    pub fn to_le_bytes(self, size: usize) -> Vec<u8>
    {
        let raw = self.0.to_le_bytes();
        let mut out = vec![0u8; size];
        let len = size.min(8);
        out[..len].copy_from_slice(&raw[..len]);
        out
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Serialize for Address
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_pointer_bytes_round_trip()
    {
        let addr = Address::from(0x1234_5678);
        assert_eq!(Address::from_le_bytes(&addr.to_le_bytes(8)), addr);
        assert_eq!(addr.to_le_bytes(4), vec![0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_short_pointer_is_zero_extended()
    {
        assert_eq!(Address::from_le_bytes(&[0xff, 0x01]), Address::from(0x01ff));
    }

    #[test]
    fn test_null()
    {
        assert!(Address::NULL.is_null());
        assert!(!Address::from(1).is_null());
    }
}
