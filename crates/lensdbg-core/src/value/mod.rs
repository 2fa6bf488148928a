//! # Values
//!
//! Typed data read from the inferior.
//!
//! A [`Value`] is address based: building one copies no memory when the datum
//! lives at an address, the bytes are read only when something is displayed.
//! Values without an address (register values, results of calls, optimized
//! temporaries) are *detached* and carry their bytes, captured at build time.

mod builder;
mod members;
mod scratch;

use std::fmt;

use serde::Serialize;

pub use builder::ValueBuilder;
pub(crate) use builder::enum_display;
pub use members::{Members, correct_bitfield};
pub use scratch::ScratchBuffer;

use crate::error::{LensError, Result};
use crate::native::NativeDebugger;
use crate::types::{Address, Scalar, TypeHandle, TypeKind, TypeRegistry};

/// Dotted path from a root variable to a value (`local.list.head.*`).
///
/// Paths key on-demand expansion: the frontend sends back the paths it wants
/// expanded, and results such as the last function return value are tagged
/// with a `return.` root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct InternalPath(String);

impl InternalPath
{
    pub fn new(path: impl Into<String>) -> Self
    {
        Self(path.into())
    }

    /// `local.<name>`
    pub fn local(name: &str) -> Self
    {
        Self(format!("local.{name}"))
    }

    /// `return.<name>`
    pub fn result(name: &str) -> Self
    {
        Self(format!("return.{name}"))
    }

    /// `watch.<index>`
    pub fn watch(index: usize) -> Self
    {
        Self(format!("watch.{index}"))
    }

    /// Path of a child of this value.
    #[must_use]
    pub fn child(&self, name: &str) -> Self
    {
        Self(format!("{}.{name}", self.0))
    }

    pub fn as_str(&self) -> &str
    {
        &self.0
    }

    /// Last path segment.
    pub fn leaf(&self) -> &str
    {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for InternalPath
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

impl From<&str> for InternalPath
{
    fn from(path: &str) -> Self
    {
        Self::new(path)
    }
}

/// Where the bytes of a value are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location
{
    /// Lives in inferior memory.
    Memory(Address),
    /// No address; content captured when the value was built.
    Detached(Vec<u8>),
}

/// A typed datum.
#[derive(Debug, Clone, PartialEq)]
pub struct Value
{
    pub(crate) ty: TypeHandle,
    pub(crate) location: Location,
    pub(crate) pointer_target: Option<Address>,
    pub(crate) display: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) iname: Option<InternalPath>,
    pub(crate) in_scope: bool,
    pub(crate) bit_offset: Option<u64>,
    pub(crate) bit_size: Option<u64>,
    pub(crate) is_base_class: bool,
}

impl Value
{
    /// A value of type `ty` living at `address`.
    pub fn at(ty: TypeHandle, address: Address) -> Self
    {
        Self::with_location(ty, Location::Memory(address))
    }

    /// A value of type `ty` with no address.
    pub fn detached(ty: TypeHandle, bytes: Vec<u8>) -> Self
    {
        Self::with_location(ty, Location::Detached(bytes))
    }

    fn with_location(ty: TypeHandle, location: Location) -> Self
    {
        Self {
            ty,
            location,
            pointer_target: None,
            display: None,
            name: None,
            iname: None,
            in_scope: true,
            bit_offset: None,
            bit_size: None,
            is_base_class: false,
        }
    }

    /// Attach the name used when the value is listed under a parent.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self
    {
        self.name = Some(name.into());
        self
    }

    /// Attach the path used for expansion and result tagging.
    #[must_use]
    pub fn with_iname(mut self, iname: InternalPath) -> Self
    {
        self.iname = Some(iname);
        self
    }

    /// Same storage seen through another type.
    pub(crate) fn retyped(&self, ty: TypeHandle) -> Self
    {
        let mut value = self.clone();
        value.ty = ty;
        value
    }

    pub fn ty(&self) -> TypeHandle
    {
        self.ty
    }

    pub fn location(&self) -> &Location
    {
        &self.location
    }

    /// Address, `None` for detached values.
    pub fn address(&self) -> Option<Address>
    {
        match self.location {
            Location::Memory(address) => Some(address),
            Location::Detached(_) => None,
        }
    }

    /// Captured bytes, `None` for values in memory.
    pub fn raw_bytes(&self) -> Option<&[u8]>
    {
        match &self.location {
            Location::Memory(_) => None,
            Location::Detached(bytes) => Some(bytes),
        }
    }

    /// Numeric target of a pointer value.
    pub fn pointer_target(&self) -> Option<Address>
    {
        self.pointer_target
    }

    /// Precomputed display string (enums, complex numbers).
    pub fn display(&self) -> Option<&str>
    {
        self.display.as_deref()
    }

    pub fn name(&self) -> Option<&str>
    {
        self.name.as_deref()
    }

    pub fn iname(&self) -> Option<&InternalPath>
    {
        self.iname.as_ref()
    }

    /// `false` when the compiler optimized the value out.
    pub fn in_scope(&self) -> bool
    {
        self.in_scope
    }

    pub fn bit_offset(&self) -> Option<u64>
    {
        self.bit_offset
    }

    pub fn bit_size(&self) -> Option<u64>
    {
        self.bit_size
    }

    pub fn is_base_class(&self) -> bool
    {
        self.is_base_class
    }

    /// Content bytes, read from memory when the value has an address.
    ///
    /// ## Errors
    ///
    /// Fails when the memory cannot be read.
    pub fn read_bytes<N: NativeDebugger>(&self, native: &N, types: &TypeRegistry<N>) -> Result<Vec<u8>>
    {
        match &self.location {
            Location::Detached(bytes) => Ok(bytes.clone()),
            Location::Memory(address) => {
                let size = usize::try_from(types.byte_size(self.ty))
                    .map_err(|_| LensError::InvalidArgument(format!("value at {address} is too large")))?;
                Ok(native.read_memory(*address, size)?)
            }
        }
    }

    /// Scalar interpretation of integral, enum, float and pointer values.
    ///
    /// ## Errors
    ///
    /// - `ValueBuild`: the type has no scalar interpretation, or is wider than 64 bits
    /// - `Native`: the bytes cannot be read
    pub fn scalar<N: NativeDebugger>(&self, native: &N, types: &TypeRegistry<N>) -> Result<Scalar>
    {
        let handle = types.strip_typedefs(self.ty);
        let ty = types.get(handle);
        match ty.kind() {
            TypeKind::Pointer(_) => {
                let target = match self.pointer_target {
                    Some(target) => target,
                    None => Address::from_le_bytes(&self.read_bytes(native, types)?),
                };
                let raw = i64::from_ne_bytes(target.value().to_ne_bytes());
                Ok(Scalar::Int(raw))
            }
            TypeKind::Integral | TypeKind::Enum => {
                let bytes = self.read_bytes(native, types)?;
                if bytes.len() > 8 {
                    return Err(LensError::ValueBuild(format!(
                        "'{}' is {} bytes wide and has no 64-bit scalar value",
                        ty.name(),
                        bytes.len()
                    )));
                }
                Ok(Scalar::Int(decode_integer(&bytes, !is_unsigned_name(ty.name()))))
            }
            TypeKind::Float => {
                let bytes = self.read_bytes(native, types)?;
                decode_float(&bytes)
                    .map(Scalar::Float)
                    .ok_or_else(|| LensError::ValueBuild(format!("unsupported float width {}", bytes.len())))
            }
            _ => Err(LensError::ValueBuild(format!("'{}' has no scalar value", ty.name()))),
        }
    }
}

/// Heuristic signedness of an integral type from its name.
pub(crate) fn is_unsigned_name(name: &str) -> bool
{
    let base = name.rsplit("::").next().unwrap_or(name);
    base.contains("unsigned")
        || base == "bool"
        || base == "_Bool"
        || base == "size_t"
        || base == "char16_t"
        || base == "char32_t"
        || base.starts_with("uint")
        || base.starts_with("uchar")
        || base.starts_with("ushort")
        || base.starts_with("ulong")
        || base.starts_with("quint")
}

/// Little-endian integer of up to 8 bytes, sign-extended when `signed`.
///
/// Wider buffers must be rejected by the caller.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn decode_integer(bytes: &[u8], signed: bool) -> i64
{
    let len = bytes.len().min(8);
    if len == 0 {
        return 0;
    }
    let mut raw = [0u8; 8];
    raw[..len].copy_from_slice(&bytes[..len]);
    let value = u64::from_le_bytes(raw);
    let bits = len * 8;
    if signed && bits < 64 {
        let shift = 64 - bits;
        ((value << shift) as i64) >> shift
    } else {
        value as i64
    }
}

/// IEEE float of 4 or 8 bytes.
pub(crate) fn decode_float(bytes: &[u8]) -> Option<f64>
{
    match bytes.len() {
        4 => Some(f64::from(f32::from_le_bytes(bytes.try_into().ok()?))),
        8 => Some(f64::from_le_bytes(bytes.try_into().ok()?)),
        _ => None,
    }
}

/// `size` bits starting at bit `offset` of a little-endian byte buffer.
pub(crate) fn extract_bits(bytes: &[u8], offset: u64, size: u64) -> u64
{
    let mut result = 0u64;
    for i in 0..size.min(64) {
        let bit = offset + i;
        let Ok(byte_index) = usize::try_from(bit / 8) else {
            break;
        };
        let Some(byte) = bytes.get(byte_index) else {
            break;
        };
        if (byte >> (bit % 8)) & 1 == 1 {
            result |= 1 << i;
        }
    }
    result
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_path_children()
    {
        let root = InternalPath::local("list");
        let next = root.child("head").child("*");
        assert_eq!(next.as_str(), "local.list.head.*");
        assert_eq!(next.leaf(), "*");
        assert_eq!(InternalPath::result("foo").as_str(), "return.foo");
    }

    #[test]
    fn test_decode_signed_integers()
    {
        assert_eq!(decode_integer(&[0xff], true), -1);
        assert_eq!(decode_integer(&[0xff], false), 255);
        assert_eq!(decode_integer(&[0xfe, 0xff, 0xff, 0xff], true), -2);
        assert_eq!(decode_integer(&[], true), 0);
    }

    #[test]
    fn test_unsigned_names()
    {
        assert!(is_unsigned_name("unsigned int"));
        assert!(is_unsigned_name("uint32_t"));
        assert!(is_unsigned_name("std::size_t"));
        assert!(!is_unsigned_name("int"));
        assert!(!is_unsigned_name("long long"));
    }

    #[test]
    fn test_extract_bits()
    {
        // 0b1010_1100: bits 2..=4 hold 0b011
        assert_eq!(extract_bits(&[0b1010_1100], 2, 3), 0b011);
        assert_eq!(extract_bits(&[0x00, 0xff], 8, 4), 0xf);
        assert_eq!(extract_bits(&[0x01], 9, 4), 0);
    }

    #[test]
    fn test_decode_float_widths()
    {
        assert_eq!(decode_float(&1.5f32.to_le_bytes()), Some(1.5));
        assert_eq!(decode_float(&(-2.25f64).to_le_bytes()), Some(-2.25));
        assert_eq!(decode_float(&[0; 2]), None);
    }
}
