//! # Value Rendering
//!
//! Turns [`Value`]s into nested [`Record`]s for the frontend.
//!
//! Rendering is lazy in depth: a value lists its children only when its path
//! was requested for expansion and the depth budget is not used up. Every other
//! value reports just its child count, and the frontend asks for the path later.
//! All rendered values are remembered by path so that such a later request can
//! be served without rebuilding the tree from the root.
//!
//! ## Display rules
//!
//! | kind | display |
//! |------|---------|
//! | enum, complex | string captured when the value was built |
//! | integral | decoded from memory; bitfields extracted by bit offset/size; `bool` as `true`/`false` |
//! | float | 4 or 8 byte IEEE |
//! | pointer | `0x…`, followed by ` <symbol>` when the host knows one |
//! | reference, typedef | rendered through the referent / aliased type |
//! | Fortran string | quoted text |
//! | struct, array, function | none |
//!
//! Optimized-out values display `<optimized out>`; unreadable memory displays
//! `<not accessible>`.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::DumperConfig;
use crate::error::{LensError, Result};
use crate::native::NativeDebugger;
use crate::types::{Address, Scalar, TypeHandle, TypeKind, TypeRegistry};
use crate::value::{
    InternalPath, Location, Members, ScratchBuffer, Value, decode_float, decode_integer, extract_bits, is_unsigned_name,
};

/// Display used for values the compiler optimized away.
pub const OPTIMIZED_OUT: &str = "<optimized out>";

/// Display used when memory of a value cannot be read.
pub const NOT_ACCESSIBLE: &str = "<not accessible>";

/// One rendered value, with its children when it was expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record
{
    pub iname: InternalPath,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub numchild: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Record>>,
}

impl Record
{
    /// Placeholder for a value that could not be produced at all.
    pub fn unavailable(iname: InternalPath, name: impl Into<String>) -> Self
    {
        Self {
            iname,
            name: name.into(),
            type_name: String::new(),
            value: Some(NOT_ACCESSIBLE.to_owned()),
            numchild: 0,
            address: None,
            children: None,
        }
    }
}

/// Renders values of one request.
pub struct Formatter<'a, N: NativeDebugger>
{
    native: &'a N,
    types: &'a mut TypeRegistry<N>,
    config: &'a DumperConfig,
    rendered: HashMap<InternalPath, Value>,
}

impl<'a, N: NativeDebugger> Formatter<'a, N>
{
    pub fn new(native: &'a N, types: &'a mut TypeRegistry<N>, config: &'a DumperConfig) -> Self
    {
        Self {
            native,
            types,
            config,
            rendered: HashMap::new(),
        }
    }

    /// Values rendered so far, keyed by path.
    pub fn take_rendered(&mut self) -> HashMap<InternalPath, Value>
    {
        std::mem::take(&mut self.rendered)
    }

    /// Render `value`, listing children of the paths in `expanded` down to
    /// `depth` levels.
    pub fn render(&mut self, value: &Value, expanded: &HashSet<InternalPath>, depth: usize) -> Record
    {
        let name = value
            .name()
            .map(str::to_owned)
            .or_else(|| value.iname().map(|iname| iname.leaf().to_owned()))
            .unwrap_or_default();
        let iname = value.iname().cloned().unwrap_or_else(|| InternalPath::new(name.clone()));
        self.rendered.insert(iname.clone(), value.clone());

        let mut record = Record {
            iname: iname.clone(),
            name,
            type_name: self.types.get(value.ty()).name().to_owned(),
            value: None,
            numchild: 0,
            address: value.address(),
            children: None,
        };

        if !value.in_scope() {
            record.value = Some(OPTIMIZED_OUT.to_owned());
            return record;
        }

        let view = match self.view(value) {
            Ok(view) => view,
            Err(err) => {
                debug!("Cannot dereference {iname}: {err}");
                record.value = Some(NOT_ACCESSIBLE.to_owned());
                return record;
            }
        };

        record.value = match self.display(&view) {
            Ok(display) => display,
            Err(err) => {
                trace!("No display for {iname}: {err}");
                Some(NOT_ACCESSIBLE.to_owned())
            }
        };
        record.numchild = self.child_count(&view);

        if record.numchild > 0 && depth > 0 && expanded.contains(&iname) {
            let children = self
                .children(&view, &iname)
                .iter()
                .map(|child| self.render(child, expanded, depth - 1))
                .collect::<Vec<_>>();
            record.numchild = children.len() as u64;
            record.children = Some(children);
        }
        record
    }

    /// The value seen through typedefs and references.
    fn view(&self, value: &Value) -> Result<Value>
    {
        let mut view = value.retyped(self.types.strip_typedefs(value.ty()));
        if let TypeKind::Reference(referent) = self.types.get(view.ty()).kind() {
            let target = Address::from_le_bytes(&view.read_bytes(self.native, self.types)?);
            let referent = self.types.strip_typedefs(referent);
            let mut deref = Value::at(referent, target);
            deref.name = view.name.take();
            deref.iname = view.iname.take();
            view = deref;
        }
        Ok(view)
    }

    fn display(&self, view: &Value) -> Result<Option<String>>
    {
        if let Some(display) = view.display() {
            return Ok(Some(display.to_owned()));
        }

        let ty = self.types.get(view.ty());
        let display = match ty.kind() {
            TypeKind::Integral => Some(self.integral_display(view, ty.name(), ty.bit_size())?),
            TypeKind::Enum => match view.scalar(self.native, self.types)? {
                Scalar::Int(number) => Some(self.types.enum_display(self.native, view.ty(), number)),
                Scalar::Float(number) => Some(number.to_string()),
            },
            TypeKind::Float => Some(self.native_text(view)?),
            TypeKind::Pointer(_) => Some(self.pointer_display(self.pointer_target(view)?)),
            TypeKind::FortranString => {
                let bytes = view.read_bytes(self.native, self.types)?;
                Some(format!("\"{}\"", String::from_utf8_lossy(&bytes).trim_end()))
            }
            TypeKind::Void
            | TypeKind::Reference(_)
            | TypeKind::Typedef(_)
            | TypeKind::Array { .. }
            | TypeKind::Struct
            | TypeKind::Function
            | TypeKind::Complex => None,
        };
        Ok(display)
    }

    fn integral_display(&self, view: &Value, type_name: &str, type_bits: u64) -> Result<String>
    {
        let signed = !is_unsigned_name(type_name);

        match (view.bit_offset(), view.bit_size()) {
            (offset, Some(bits)) if bits > 0 && bits < type_bits => {
                let bytes = view.read_bytes(self.native, self.types)?;
                let raw = extract_bits(&bytes, offset.unwrap_or(0), bits);
                return Ok(sign_extend(raw, bits, signed).to_string());
            }
            _ => {}
        }

        match type_name {
            "bool" | "_Bool" => {
                let bytes = view.read_bytes(self.native, self.types)?;
                Ok(bytes.iter().any(|byte| *byte != 0).to_string())
            }
            _ => self.native_text(view),
        }
    }

    /// The debugger's own rendering of an integral or float value.
    ///
    /// Detached values of a common width are decoded in place; any other
    /// width is copied into scratch memory so the debugger can read it back.
    fn native_text(&self, view: &Value) -> Result<String>
    {
        let ty = self.types.get(view.ty());
        let native_type = self.types.native_type(view.ty()).ok_or_else(|| {
            LensError::ValueBuild(format!("'{}' has no debugger type to render with", ty.name()))
        })?;

        match view.location() {
            Location::Memory(address) => {
                let raw = self.native.value_at(*address, native_type)?;
                Ok(self.native.value_to_string(&raw)?)
            }
            Location::Detached(bytes) => match (ty.kind(), bytes.len()) {
                (TypeKind::Integral, 1 | 2 | 4 | 8) => {
                    Ok(decode_integer(bytes, !is_unsigned_name(ty.name())).to_string())
                }
                (TypeKind::Float, 4 | 8) => match decode_float(bytes) {
                    Some(number) => Ok(number.to_string()),
                    None => Err(LensError::ValueBuild(format!("cannot decode '{}'", ty.name()))),
                },
                _ => {
                    let scratch = ScratchBuffer::new(self.native, bytes)?;
                    let raw = self.native.value_at(scratch.address(), native_type)?;
                    let text = self.native.value_to_string(&raw)?;
                    scratch.release()?;
                    Ok(text)
                }
            },
        }
    }

    fn pointer_target(&self, view: &Value) -> Result<Address>
    {
        match view.pointer_target() {
            Some(target) => Ok(target),
            None => Ok(Address::from_le_bytes(&view.read_bytes(self.native, self.types)?)),
        }
    }

    fn pointer_display(&self, target: Address) -> String
    {
        if target.is_null() {
            return target.to_string();
        }
        match self.native.symbol_at(target) {
            Some(symbol) => format!("{target} <{symbol}>"),
            None => target.to_string(),
        }
    }

    fn child_count(&mut self, view: &Value) -> u64
    {
        let ty = self.types.get(view.ty());
        match ty.kind() {
            TypeKind::Struct => match Members::new(self.native, self.types, view.ty(), view) {
                Ok(members) => members.count() as u64,
                Err(err) => {
                    debug!("Cannot count members: {err}");
                    0
                }
            },
            TypeKind::Array { count, .. } => count.min(self.config.max_array_children),
            TypeKind::Pointer(target) => {
                let pointee = self.types.get(self.types.strip_typedefs(target)).kind();
                let dereferenceable = !matches!(pointee, TypeKind::Void | TypeKind::Function);
                match self.pointer_target(view) {
                    Ok(address) if dereferenceable && !address.is_null() => 1,
                    _ => 0,
                }
            }
            _ => 0,
        }
    }

    fn children(&mut self, view: &Value, iname: &InternalPath) -> Vec<Value>
    {
        match self.types.get(view.ty()).kind() {
            TypeKind::Struct => match Members::new(self.native, self.types, view.ty(), view) {
                Ok(members) => members
                    .map(|member| {
                        let path = iname.child(member.name().unwrap_or_default());
                        member.with_iname(path)
                    })
                    .collect(),
                Err(err) => {
                    debug!("Cannot list members of {iname}: {err}");
                    Vec::new()
                }
            },
            TypeKind::Array { element, count } => self.elements(view, iname, element, count),
            TypeKind::Pointer(target) => match self.pointer_target(view) {
                Ok(address) => vec![
                    Value::at(target, address)
                        .with_name("*")
                        .with_iname(iname.child("*")),
                ],
                Err(err) => {
                    debug!("Cannot dereference {iname}: {err}");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        }
    }

    fn elements(&self, view: &Value, iname: &InternalPath, element: TypeHandle, count: u64) -> Vec<Value>
    {
        let stride = self.types.byte_size(element);
        let shown = count.min(self.config.max_array_children);
        (0..shown)
            .filter_map(|index| {
                let item = match view.location() {
                    Location::Memory(base) => Value::at(element, base.checked_add(index * stride)?),
                    Location::Detached(bytes) => {
                        let start = usize::try_from(index * stride).ok()?;
                        let end = usize::try_from((index + 1) * stride).ok()?;
                        Value::detached(element, bytes.get(start..end)?.to_vec())
                    }
                };
                Some(
                    item.with_name(format!("[{index}]"))
                        .with_iname(iname.child(&index.to_string())),
                )
            })
            .collect()
    }
}

/// Sign-extend the low `bits` bits of `raw`.
#[allow(clippy::cast_possible_wrap)]
fn sign_extend(raw: u64, bits: u64, signed: bool) -> i64
{
    if !signed || bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}
