//! Conversion of native values into [`Value`]s.

use tracing::trace;

use super::Value;
use crate::error::{LensError, NativeError, Result};
use crate::native::{NativeDebugger, NativeTypeCode};
use crate::types::{Address, TypeRegistry};

/// Upper bound on typedef layers stripped from a value's type.
const MAX_TYPEDEF_DEPTH: usize = 64;

/// Builds internal values from native ones.
///
/// Memory-resident values keep only their address. Values without an address
/// are copied byte for byte, since their content cannot be read later.
pub struct ValueBuilder<'a, N: NativeDebugger>
{
    native: &'a N,
}

impl<'a, N: NativeDebugger> ValueBuilder<'a, N>
{
    pub fn new(native: &'a N) -> Self
    {
        Self { native }
    }

    /// Build a value, optionally reclassified to its most-derived runtime type.
    ///
    /// The dynamic type lookup is best effort; when it fails the static type is
    /// kept.
    ///
    /// ## Errors
    ///
    /// - `ValueBuild`: a cast failed or the content of a detached value could
    ///   not be captured
    pub fn build(&self, types: &mut TypeRegistry<N>, value: &N::Value, use_dynamic_type: bool) -> Result<Value>
    {
        if use_dynamic_type {
            let dynamic = self.with_dynamic_type(value);
            return self.build_static(types, &dynamic);
        }
        self.build_static(types, value)
    }

    fn with_dynamic_type(&self, value: &N::Value) -> N::Value
    {
        let native = self.native;
        match native
            .value_dynamic_type(value)
            .and_then(|dynamic| native.value_cast(value, &dynamic))
        {
            Ok(dynamic) => dynamic,
            Err(err) => {
                trace!("Keeping static type: {err}");
                value.clone()
            }
        }
    }

    fn build_static(&self, types: &mut TypeRegistry<N>, value: &N::Value) -> Result<Value>
    {
        let native = self.native;
        let native_type = native.value_type(value);

        match native.type_code(&native_type) {
            NativeTypeCode::Reference => {
                let handle = types.resolve(native, &native_type);
                let address = native
                    .value_address(value)
                    .ok_or_else(|| LensError::ValueBuild("reference without an address".to_owned()))?;
                let mut built = Value::at(handle, address);
                built.in_scope = !native.value_is_optimized_out(value);
                Ok(built)
            }
            NativeTypeCode::Pointer => {
                let handle = types.resolve(native, &native_type);
                let target = native.value_as_integer(value).map_err(build_error("pointer value"))?;
                let target = Address::from(u64::from_ne_bytes(target.to_ne_bytes()));
                let mut built = match native.value_address(value) {
                    Some(slot) => Value::at(handle, slot),
                    None => Value::detached(handle, target.to_le_bytes(pointer_width(native))),
                };
                built.pointer_target = Some(target);
                built.in_scope = !native.value_is_optimized_out(value);
                Ok(built)
            }
            NativeTypeCode::Typedef => {
                let handle = types.resolve(native, &native_type);
                let underlying = strip_native_typedefs(native, &native_type);
                if native.type_code(&underlying) == NativeTypeCode::Array {
                    let address = native
                        .value_address(value)
                        .ok_or_else(|| LensError::ValueBuild("array typedef without an address".to_owned()))?;
                    return Ok(Value::at(handle, address));
                }
                let cast = native.value_cast(value, &underlying).map_err(build_error("typedef cast"))?;
                let mut built = self.build_static(types, &cast)?;
                built.ty = handle;
                Ok(built)
            }
            code => self.build_leaf(types, value, &native_type, code),
        }
    }

    fn build_leaf(&self, types: &mut TypeRegistry<N>, value: &N::Value, native_type: &N::Type, code: NativeTypeCode) -> Result<Value>
    {
        let native = self.native;
        let handle = types.resolve(native, native_type);
        let optimized_out = native.value_is_optimized_out(value);

        let mut built = match native.value_address(value) {
            Some(address) => Value::at(handle, address),
            None if optimized_out => Value::detached(handle, Vec::new()),
            None => {
                let size = usize::try_from(native.type_size(native_type))
                    .map_err(|_| LensError::ValueBuild("value too large to capture".to_owned()))?;
                let mut bytes = native.value_bytes(value).map_err(build_error("value content"))?;
                bytes.resize(size, 0);
                Value::detached(handle, bytes)
            }
        };
        built.in_scope = !optimized_out;
        if optimized_out {
            return Ok(built);
        }

        match code {
            NativeTypeCode::Enum => {
                let symbolic = native.value_to_string(value).map_err(build_error("enum text"))?;
                let numeric = native.value_as_integer(value).map_err(build_error("enum value"))?;
                built.display = Some(enum_display(&symbolic, numeric));
            }
            NativeTypeCode::Complex => {
                built.display = Some(native.value_to_string(value).map_err(build_error("complex text"))?);
            }
            _ => {}
        }
        Ok(built)
    }
}

/// `"<symbolic> (<value>)"` when the forms differ, otherwise the number alone.
pub(crate) fn enum_display(symbolic: &str, value: i64) -> String
{
    let numeric = value.to_string();
    if symbolic == numeric {
        numeric
    } else {
        format!("{symbolic} ({numeric})")
    }
}

fn strip_native_typedefs<N: NativeDebugger>(native: &N, ty: &N::Type) -> N::Type
{
    let mut underlying = native.unqualified(ty);
    let mut depth = 0;
    while native.type_code(&underlying) == NativeTypeCode::Typedef && depth < MAX_TYPEDEF_DEPTH {
        underlying = native.unqualified(&native.strip_typedefs(&underlying));
        depth += 1;
    }
    underlying
}

fn pointer_width<N: NativeDebugger>(native: &N) -> usize
{
    usize::try_from(native.pointer_size()).unwrap_or(8)
}

fn build_error(what: &'static str) -> impl Fn(NativeError) -> LensError
{
    move |err| LensError::ValueBuild(format!("{what}: {err}"))
}
