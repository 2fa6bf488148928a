//! # Member Enumeration
//!
//! Lazy listing of the members of a struct, union or class value.
//!
//! Members are produced in declaration order, base classes first. Each member is
//! an ordinary [`Value`] carrying its name plus either the base-class marker or
//! the bit placement inside its container.
//!
//! ## Bitfields
//!
//! Some hosts report the bit position of a bitfield relative to the enclosing
//! word rather than to the field itself. The position is therefore reduced
//! modulo the bit width of the field's declared type (see [`correct_bitfield`]).
//! This is a heuristic tuned for little-endian layouts.
//!
//! ## Detached aggregates
//!
//! A value without an address is copied into scratch memory first, since the
//! host can only address fields of values that live in memory. The scratch
//! buffer belongs to the iterator and is released when the iterator is
//! exhausted or dropped. Members of such an aggregate are detached as well:
//! their bytes are captured before the buffer goes away.

use std::vec;

use tracing::{debug, trace, warn};

use super::{Location, ScratchBuffer, Value, ValueBuilder};
use crate::error::Result;
use crate::native::{NativeDebugger, NativeField};
use crate::types::{TypeHandle, TypeKind, TypeRegistry};

/// Iterator over the members of an aggregate value.
///
/// Fields that cannot be read or built are skipped.
pub struct Members<'a, N: NativeDebugger>
{
    native: &'a N,
    types: &'a mut TypeRegistry<N>,
    state: Option<State<'a, N>>,
}

struct State<'a, N: NativeDebugger>
{
    aggregate: N::Value,
    fields: vec::IntoIter<NativeField<N::Type>>,
    // Keeps a detached aggregate addressable until enumeration ends
    scratch: Option<ScratchBuffer<'a, N>>,
}

impl<'a, N: NativeDebugger> Members<'a, N>
{
    /// Start enumerating the members of `value`, viewed as type `handle`.
    ///
    /// Non-aggregate types and null aggregates yield no members.
    ///
    /// ## Errors
    ///
    /// - `Resource`: a detached aggregate could not be copied into scratch
    ///   memory
    /// - `Native`: the host could not create the aggregate at its address
    pub fn new(native: &'a N, types: &'a mut TypeRegistry<N>, handle: TypeHandle, value: &Value) -> Result<Self>
    {
        let handle = types.strip_typedefs(handle);
        let native_type = match (types.get(handle).kind(), types.native_type(handle)) {
            (TypeKind::Struct, Some(native_type)) => native_type.clone(),
            _ => return Ok(Self::empty(native, types)),
        };

        let (address, scratch) = match value.location() {
            Location::Memory(address) if address.is_null() => {
                warn!("Cannot list members of null value of {}", types.get(handle).name());
                return Ok(Self::empty(native, types));
            }
            Location::Memory(address) => (*address, None),
            Location::Detached(bytes) => {
                let scratch = ScratchBuffer::new(native, bytes)?;
                (scratch.address(), Some(scratch))
            }
        };

        let aggregate = native.value_at(address, &native.unqualified(&native_type))?;
        let fields = match native.type_fields(&native_type) {
            Ok(fields) => fields,
            Err(err) => {
                debug!("No fields for {}: {err}", types.get(handle).name());
                Vec::new()
            }
        };

        Ok(Self {
            native,
            types,
            state: Some(State {
                aggregate,
                fields: fields.into_iter(),
                scratch,
            }),
        })
    }

    fn empty(native: &'a N, types: &'a mut TypeRegistry<N>) -> Self
    {
        Self {
            native,
            types,
            state: None,
        }
    }

    fn member(&mut self, aggregate: &N::Value, field: &NativeField<N::Type>, detached: bool) -> Result<Value>
    {
        let native = self.native;
        let raw = native.value_field(aggregate, field)?;
        // Dropping const fails for some members; keep the qualified value then
        let raw = native.value_cast(&raw, &native.unqualified(&field.ty)).unwrap_or(raw);

        let mut member = ValueBuilder::new(native).build(self.types, &raw, false)?;
        member.name = Some(field.name.clone().unwrap_or_else(|| native.type_name(&field.ty)));

        if field.is_base_class {
            member.is_base_class = true;
        } else {
            let (offset, size) = correct_bitfield(field.bit_position, field.bit_size, native.type_size(&field.ty));
            member.bit_offset = offset;
            member.bit_size = Some(size);
        }

        // Scratch memory is gone once enumeration ends; keep a copy instead
        if detached && member.address().is_some() {
            member.location = Location::Detached(member.read_bytes(native, self.types)?);
        }
        Ok(member)
    }
}

impl<N: NativeDebugger> Iterator for Members<'_, N>
{
    type Item = Value;

    fn next(&mut self) -> Option<Value>
    {
        loop {
            let state = self.state.as_mut()?;
            let Some(field) = state.fields.next() else {
                // Exhausted: drop the state so scratch memory goes back now
                self.state = None;
                return None;
            };
            let aggregate = state.aggregate.clone();
            let detached = state.scratch.is_some();

            match self.member(&aggregate, &field, detached) {
                Ok(member) => {
                    trace!("Member {:?}", member.name());
                    return Some(member);
                }
                Err(err) => debug!("Skipping field {:?}: {err}", field.name),
            }
        }
    }
}

/// Corrected `(bit offset, bit size)` of a member.
///
/// `bit_position` is reduced modulo the bit width of the field's type when
/// that width is known. The size is the declared bit width for bitfields and the
/// whole field otherwise.
///
/// ```rust
/// use lensdbg_core::value::correct_bitfield;
///
/// // `int b:5` reported at bit 35 of a two-word struct
/// assert_eq!(correct_bitfield(Some(35), 5, 4), (Some(3), 5));
/// // plain `short` member
/// assert_eq!(correct_bitfield(Some(16), 0, 2), (Some(0), 16));
/// ```
pub fn correct_bitfield(bit_position: Option<u64>, declared_bits: u64, byte_size: u64) -> (Option<u64>, u64)
{
    let container = byte_size * 8;
    let offset = bit_position.map(|position| if container > 0 { position % container } else { position });
    let size = if declared_bits != 0 { declared_bits } else { container };
    (offset, size)
}
