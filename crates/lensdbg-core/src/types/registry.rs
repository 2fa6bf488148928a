//! # Type Registry
//!
//! Interns native types into canonical [`Type`] records.
//!
//! The registry is an arena: every record lives at a stable [`TypeHandle`] and
//! is found again through its structural [`TypeKey`]. Two native types with the
//! same key always resolve to the same handle, for the lifetime of the session.
//!
//! ## Resolution order
//!
//! 1. Pointer → resolve the unqualified pointee, wrap as pointer
//! 2. Reference → same, wrap as reference
//! 3. Array → resolve the element, `count = size / element size`
//! 4. Typedef → strip every typedef layer, resolve the underlying type, wrap
//!    with the spelled name
//! 5. Anything else → structural key, cache lookup, record creation
//!
//! Struct fields, struct alignment and enum display strings are not computed
//! when a record is created. The registry keeps the native type next to the
//! record and derives them on demand, which keeps self-referential types (a
//! list node pointing at its own type) finite.
//!
//! ## Lifetime
//!
//! One registry per debugger session. Call [`TypeRegistry::clear`] when the
//! target restarts and native type identities are no longer valid.
//!
//! ## Thread Safety
//!
//! The registry is not thread-safe. A consumer that resolves types from several
//! threads must put the registry behind a `Mutex`, otherwise two threads could
//! create duplicate records for the same key.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use super::model::{TemplateArgument, Type, TypeHandle, TypeKey, TypeKind};
use crate::error::TypeResolutionError;
use crate::native::{NativeDebugger, NativeTemplateArgument, NativeTypeCode};
use crate::value::{Members, Value, ValueBuilder, enum_display};

/// Upper bound on typedef layers stripped before giving up.
const MAX_TYPEDEF_DEPTH: usize = 64;

/// Session-wide cache of interned types.
pub struct TypeRegistry<N: NativeDebugger>
{
    types: Vec<Type>,
    natives: Vec<Option<N::Type>>,
    by_key: HashMap<TypeKey, TypeHandle>,
    lookups: HashMap<String, N::Type>,
    to_report: BTreeMap<String, TypeHandle>,
    degenerate: TypeHandle,
}

impl<N: NativeDebugger> Default for TypeRegistry<N>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<N: NativeDebugger> TypeRegistry<N>
{
    /// Create an empty registry holding only the degenerate type.
    #[must_use]
    pub fn new() -> Self
    {
        let mut registry = Self {
            types: Vec::new(),
            natives: Vec::new(),
            by_key: HashMap::new(),
            lookups: HashMap::new(),
            to_report: BTreeMap::new(),
            degenerate: TypeHandle::from_index(0),
        };
        registry.degenerate = registry.insert(Type::new(TypeKey::new(""), String::new(), TypeKind::Void, 0), None);
        registry
    }

    /// Forget every type. Handles issued before this call become invalid.
    pub fn clear(&mut self)
    {
        debug!("Clearing type registry ({} records)", self.types.len());
        *self = Self::new();
    }

    /// Number of records, including the degenerate type.
    pub fn len(&self) -> usize
    {
        self.types.len()
    }

    /// `true` when only the degenerate type is registered.
    pub fn is_empty(&self) -> bool
    {
        self.types.len() <= 1
    }

    /// Empty-named stand-in for types that failed to resolve.
    pub fn degenerate(&self) -> TypeHandle
    {
        self.degenerate
    }

    /// Record behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by another registry or before the last
    /// [`TypeRegistry::clear`].
    pub fn get(&self, handle: TypeHandle) -> &Type
    {
        &self.types[handle.index()]
    }

    /// Handle registered under a structural key.
    pub fn find(&self, key: &TypeKey) -> Option<TypeHandle>
    {
        self.by_key.get(key).copied()
    }

    /// Native type kept for a leaf record; wrappers have none.
    pub fn native_type(&self, handle: TypeHandle) -> Option<&N::Type>
    {
        self.natives.get(handle.index()).and_then(Option::as_ref)
    }

    /// Follow typedef records down to the aliased type.
    pub fn strip_typedefs(&self, mut handle: TypeHandle) -> TypeHandle
    {
        while let TypeKind::Typedef(target) = self.get(handle).kind() {
            handle = target;
        }
        handle
    }

    /// Size of a type in bytes.
    pub fn byte_size(&self, handle: TypeHandle) -> u64
    {
        self.get(handle).byte_size()
    }

    /// Drain the types first seen since the previous call, keyed by name.
    pub fn take_types_to_report(&mut self) -> BTreeMap<String, TypeHandle>
    {
        std::mem::take(&mut self.to_report)
    }

    /// Resolve a native type, substituting the degenerate type on failure.
    pub fn resolve(&mut self, native: &N, ty: &N::Type) -> TypeHandle
    {
        match self.try_resolve(native, ty) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Type error: {err}");
                self.degenerate
            }
        }
    }

    /// Resolve a native type, reporting why it could not be interned.
    ///
    /// ## Errors
    ///
    /// - `UnknownTypeCode`: the native type is flagged as erroneous
    /// - `MissingTarget`: a pointer, reference or array has no target type
    /// - `ZeroSizedElement`: an array element type reports size zero
    pub fn try_resolve(&mut self, native: &N, ty: &N::Type) -> Result<TypeHandle, TypeResolutionError>
    {
        let code = native.type_code(ty);
        let ty = native.unqualified(ty);

        match code {
            NativeTypeCode::Pointer => {
                let target = self.resolve_target(native, &ty)?;
                Ok(self.pointer_to(native, target))
            }
            NativeTypeCode::Reference => {
                let target = self.resolve_target(native, &ty)?;
                Ok(self.reference_to(native, target))
            }
            NativeTypeCode::Array => {
                let element_type = native
                    .type_target(&ty)
                    .map(|target| native.unqualified(&target))
                    .map_err(|_| TypeResolutionError::MissingTarget(native.type_name(&ty)))?;
                let element_size = native.type_size(&element_type);
                if element_size == 0 {
                    return Err(TypeResolutionError::ZeroSizedElement(native.type_name(&ty)));
                }
                let count = native.type_size(&ty) / element_size;
                let element = self.resolve(native, &element_type);
                Ok(self.array_of(element, count))
            }
            NativeTypeCode::Typedef => {
                let mut underlying = ty.clone();
                let mut depth = 0;
                while native.type_code(&underlying) == NativeTypeCode::Typedef && depth < MAX_TYPEDEF_DEPTH {
                    underlying = native.unqualified(&native.strip_typedefs(&underlying));
                    depth += 1;
                }
                let target = self.resolve(native, &underlying);
                Ok(self.typedef_of(target, native.type_name(&ty)))
            }
            NativeTypeCode::Error => Err(TypeResolutionError::UnknownTypeCode(native.type_name(&ty))),
            _ => self.resolve_leaf(native, &ty, code),
        }
    }

    /// Pointer-to-`target`, interned under `"<target key> *"`.
    pub fn pointer_to(&mut self, native: &N, target: TypeHandle) -> TypeHandle
    {
        let (key, name) = self.derived_names(target, |base| format!("{base} *"));
        self.intern(key, name, TypeKind::Pointer(target), native.pointer_size() * 8)
    }

    /// Reference-to-`target`, interned under `"<target key> &"`.
    pub fn reference_to(&mut self, native: &N, target: TypeHandle) -> TypeHandle
    {
        let (key, name) = self.derived_names(target, |base| format!("{base} &"));
        self.intern(key, name, TypeKind::Reference(target), native.pointer_size() * 8)
    }

    /// `count` consecutive `element`s, interned under `"<element key>[count]"`.
    pub fn array_of(&mut self, element: TypeHandle, count: u64) -> TypeHandle
    {
        let (key, name) = self.derived_names(element, |base| format!("{base}[{count}]"));
        let bit_size = self.get(element).bit_size().saturating_mul(count);
        self.intern(key, name, TypeKind::Array { element, count }, bit_size)
    }

    /// Alias `name` for `target`.
    pub fn typedef_of(&mut self, target: TypeHandle, name: String) -> TypeHandle
    {
        let key = TypeKey::new(format!("typedef {name} = {}", self.get(target).key()));
        let bit_size = self.get(target).bit_size();
        self.intern(key, name, TypeKind::Typedef(target), bit_size)
    }

    /// Alignment in bytes.
    ///
    /// Struct alignment is the largest alignment among the field types
    /// (1 for empty structs) and is computed the first time it is asked for.
    pub fn alignment(&mut self, native: &N, handle: TypeHandle) -> u64
    {
        let ty = self.get(handle);
        match ty.kind() {
            TypeKind::Typedef(target) | TypeKind::Array { element: target, .. } => self.alignment(native, target),
            TypeKind::Pointer(_) | TypeKind::Reference(_) => native.pointer_size().max(1),
            TypeKind::Struct => {
                if let Some(alignment) = ty.alignment {
                    return alignment;
                }
                // Provisional entry; cyclic layouts resolve to 1.
                self.types[handle.index()].alignment = Some(1);

                let fields = self
                    .native_type(handle)
                    .and_then(|nt| native.type_fields(nt).ok())
                    .unwrap_or_default();
                let mut alignment = 1;
                for field in fields {
                    let field_type = self.resolve(native, &field.ty);
                    alignment = alignment.max(self.alignment(native, field_type));
                }
                self.types[handle.index()].alignment = Some(alignment);
                alignment
            }
            _ => ty.byte_size().max(1),
        }
    }

    /// Display string for an enum value: `"<enumerator> (<value>)"`, or just
    /// the number when the host cannot name it.
    ///
    /// The host renders `(<enum type>)<value>` for us, so values that were never
    /// read from memory (enum template arguments, user input) can be shown.
    pub fn enum_display(&self, native: &N, handle: TypeHandle, value: i64) -> String
    {
        let handle = self.strip_typedefs(handle);
        let expression = format!("({}){value}", self.get(handle).name());
        match native.evaluate(&expression).and_then(|v| native.value_to_string(&v)) {
            Ok(symbolic) => enum_display(&symbolic, value),
            Err(err) => {
                trace!("Enum display for '{expression}' failed: {err}");
                value.to_string()
            }
        }
    }

    /// Lazily enumerate the members of an aggregate value of type `handle`.
    ///
    /// ## Errors
    ///
    /// See [`Members::new`].
    pub fn members<'a>(&'a mut self, native: &'a N, handle: TypeHandle, value: &Value) -> crate::error::Result<Members<'a, N>>
    {
        Members::new(native, self, handle, value)
    }

    /// Find a type by spelled name and intern it.
    ///
    /// Every hit is queued for reporting under the spelled name, whether or
    /// not the type was already known.
    pub fn lookup(&mut self, native: &N, name: &str) -> Option<TypeHandle>
    {
        let ty = self.lookup_native(native, name)?;
        let handle = self.resolve(native, &ty);
        self.to_report.insert(name.to_owned(), handle);
        Some(handle)
    }

    /// Find a native type by spelled name, caching the answer.
    ///
    /// Handles spellings the host may not accept directly: `{anonymous}` is
    /// retried as `(anonymous namespace)`, elaborated-type and cv keywords are
    /// dropped, and a trailing `*` is looked up as a pointer to the pointee.
    /// Names the host rejects are retried by evaluating a null pointer of
    /// the class type and taking its target.
    pub fn lookup_native(&mut self, native: &N, name: &str) -> Option<N::Type>
    {
        if let Some(found) = self.lookups.get(name) {
            return Some(found.clone());
        }

        if name == "void" {
            let found = native.lookup_type(name)?;
            self.lookups.insert(name.to_owned(), found.clone());
            return Some(found);
        }

        if name.contains("{anonymous}") {
            let respelled = name.replace("{anonymous}", "(anonymous namespace)");
            if let Some(found) = self.lookup_native(native, &respelled) {
                self.lookups.insert(name.to_owned(), found.clone());
                return Some(found);
            }
        }

        let stripped = strip_type_qualifiers(name);
        if let Some(pointee) = stripped.strip_suffix('*') {
            if let Some(found) = self.lookup_native(native, pointee.trim_end()) {
                let pointer = native.pointer_type(&found);
                self.lookups.insert(name.to_owned(), pointer.clone());
                return Some(pointer);
            }
        }

        let found = match native.lookup_type(stripped) {
            Some(found) => found,
            None => lookup_through_cast(native, stripped)?,
        };
        self.lookups.insert(name.to_owned(), found.clone());
        Some(found)
    }

    fn resolve_target(&mut self, native: &N, ty: &N::Type) -> Result<TypeHandle, TypeResolutionError>
    {
        let target = native
            .type_target(ty)
            .map_err(|_| TypeResolutionError::MissingTarget(native.type_name(ty)))?;
        Ok(self.resolve(native, &native.unqualified(&target)))
    }

    fn resolve_leaf(&mut self, native: &N, ty: &N::Type, code: NativeTypeCode) -> Result<TypeHandle, TypeResolutionError>
    {
        let key = structural_key(native, ty);
        if let Some(handle) = self.find(&key) {
            trace!("Reusing type {key}");
            return Ok(handle);
        }

        let name = native.type_name(ty);
        let kind = match code {
            NativeTypeCode::Void => TypeKind::Void,
            NativeTypeCode::Int | NativeTypeCode::Bool | NativeTypeCode::Char => TypeKind::Integral,
            NativeTypeCode::Float => TypeKind::Float,
            NativeTypeCode::Enum => TypeKind::Enum,
            NativeTypeCode::Struct | NativeTypeCode::Union => TypeKind::Struct,
            NativeTypeCode::Function
            | NativeTypeCode::Method
            | NativeTypeCode::MethodPointer
            | NativeTypeCode::MemberPointer => TypeKind::Function,
            NativeTypeCode::Complex => TypeKind::Complex,
            NativeTypeCode::String => TypeKind::FortranString,
            NativeTypeCode::Pointer
            | NativeTypeCode::Reference
            | NativeTypeCode::Array
            | NativeTypeCode::Typedef
            | NativeTypeCode::Error => return Err(TypeResolutionError::UnknownTypeCode(name)),
        };

        debug!("Creating type {key}");
        let record = Type::new(key, name.clone(), kind, native.type_size(ty) * 8);
        let handle = self.insert(record, Some(ty.clone()));
        self.to_report.insert(name.clone(), handle);

        // Registered first so arguments naming this type hit the cache.
        let arguments = self.template_arguments(native, ty, &name);
        self.types[handle.index()].template_arguments = arguments;
        Ok(handle)
    }

    fn template_arguments(&mut self, native: &N, ty: &N::Type, owner: &str) -> SmallVec<[TemplateArgument; 2]>
    {
        let mut arguments = SmallVec::new();
        let mut position = 0;
        while let Some(argument) = native.template_argument(ty, position) {
            match argument {
                NativeTemplateArgument::Type(arg_type) => {
                    let handle = self.resolve(native, &native.unqualified(&arg_type));
                    arguments.push(TemplateArgument::Type(handle));
                }
                NativeTemplateArgument::Value(arg_value) => {
                    let scalar = ValueBuilder::new(native)
                        .build(self, &arg_value, false)
                        .and_then(|value| value.scalar(native, self));
                    match scalar {
                        Ok(scalar) => arguments.push(TemplateArgument::Value(scalar)),
                        Err(err) => trace!("Skipping template argument {position} of '{owner}': {err}"),
                    }
                }
                NativeTemplateArgument::Other(description) => {
                    let err = TypeResolutionError::UnknownTemplateArgument {
                        owner: owner.to_owned(),
                        position,
                    };
                    error!("{err} ({description})");
                    arguments.push(TemplateArgument::Type(self.degenerate));
                }
            }
            position += 1;
        }
        arguments
    }

    fn derived_names(&self, base: TypeHandle, decorate: impl Fn(&str) -> String) -> (TypeKey, String)
    {
        let base = self.get(base);
        (TypeKey::new(decorate(base.key().as_str())), decorate(base.name()))
    }

    fn intern(&mut self, key: TypeKey, name: String, kind: TypeKind, bit_size: u64) -> TypeHandle
    {
        if let Some(handle) = self.find(&key) {
            return handle;
        }
        self.insert(Type::new(key, name, kind, bit_size), None)
    }

    fn insert(&mut self, record: Type, native: Option<N::Type>) -> TypeHandle
    {
        let handle = TypeHandle::from_index(self.types.len());
        self.by_key.insert(record.key().clone(), handle);
        self.types.push(record);
        self.natives.push(native);
        handle
    }
}

/// Structural identity of a leaf native type.
///
/// Named types are identified by name. Anonymous ones are identified by their
/// field composition, so identical anonymous layouts share one record.
pub fn structural_key<N: NativeDebugger>(native: &N, ty: &N::Type) -> TypeKey
{
    TypeKey::new(structural_id(native, ty))
}

fn structural_id<N: NativeDebugger>(native: &N, ty: &N::Type) -> String
{
    let name = native.type_name(ty);
    let prefix = if name.is_empty() {
        '0'
    } else if name == "union {...}" {
        'u'
    } else if name.ends_with("{...}") {
        's'
    } else {
        return name;
    };

    let mut id = String::from(prefix);
    for field in native.type_fields(ty).unwrap_or_default() {
        let child = structural_id(native, &field.ty);
        let _ = write!(id, "{{{}:{child}}}", field.name.as_deref().unwrap_or(""));
    }
    id
}

/// Resolve `name` as the target of `(class 'name'*)0`, which the host
/// accepts for some class names its type lookup rejects.
fn lookup_through_cast<N: NativeDebugger>(native: &N, name: &str) -> Option<N::Type>
{
    let expression = format!("(class '{name}'*)0");
    match native.evaluate(&expression) {
        Ok(pointer) => {
            let ty = native.value_type(&pointer);
            match native.type_code(&ty) {
                NativeTypeCode::Pointer => native.type_target(&ty).ok(),
                _ => None,
            }
        }
        Err(err) => {
            trace!("No type named '{name}': {err}");
            None
        }
    }
}

/// Drop elaborated-type keywords and cv-qualifiers from a spelled type name.
///
/// ```rust
/// use lensdbg_core::types::strip_type_qualifiers;
///
/// assert_eq!(strip_type_qualifiers("const struct Foo"), "Foo");
/// assert_eq!(strip_type_qualifiers("char *const"), "char *");
/// ```
pub fn strip_type_qualifiers(name: &str) -> &str
{
    const PREFIXES: [&str; 5] = ["class ", "struct ", "const ", "volatile ", "enum "];
    const SUFFIXES: [&str; 2] = [" const", " volatile"];
    const POINTER_SUFFIXES: [&str; 2] = ["const", "volatile"];

    let mut stripped = name;
    loop {
        if let Some(rest) = PREFIXES.iter().find_map(|prefix| stripped.strip_prefix(prefix)) {
            stripped = rest;
        } else if let Some(rest) = SUFFIXES.iter().find_map(|suffix| stripped.strip_suffix(suffix)) {
            stripped = rest;
        } else if let Some(rest) = POINTER_SUFFIXES
            .iter()
            .find_map(|suffix| stripped.strip_suffix(suffix).filter(|rest| rest.ends_with('*')))
        {
            stripped = rest;
        } else {
            return stripped;
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_strip_leading_keywords()
    {
        assert_eq!(strip_type_qualifiers("class QObject"), "QObject");
        assert_eq!(strip_type_qualifiers("const volatile enum Color"), "Color");
    }

    #[test]
    fn test_strip_trailing_qualifiers()
    {
        assert_eq!(strip_type_qualifiers("int const"), "int");
        assert_eq!(strip_type_qualifiers("Foo *volatile"), "Foo *");
        assert_eq!(strip_type_qualifiers("Foo*const"), "Foo*");
    }

    #[test]
    fn test_plain_names_untouched()
    {
        assert_eq!(strip_type_qualifiers("constant_t"), "constant_t");
        assert_eq!(strip_type_qualifiers("std::vector<int>"), "std::vector<int>");
    }
}
