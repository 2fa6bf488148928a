//! Internal type records.

use std::fmt;

use smallvec::SmallVec;

/// Stable index of a [`Type`] in the registry arena.
///
/// Handles are only meaningful for the registry that produced them and become
/// stale after [`TypeRegistry::clear`](super::TypeRegistry::clear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeHandle(u32);

impl TypeHandle
{
    pub(crate) fn from_index(index: usize) -> Self
    {
        // The arena never grows near u32::MAX entries in a single session.
        #[allow(clippy::cast_possible_truncation)]
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize
    {
        self.0 as usize
    }
}

/// Structural identity used to deduplicate types.
///
/// Named types use their spelled name. Anonymous aggregates use a prefix
/// (`0` nameless, `u` anonymous union, `s` anonymous struct) followed by
/// `{field:childKey}` for each field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey(String);

impl TypeKey
{
    pub fn new(key: impl Into<String>) -> Self
    {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str
    {
        &self.0
    }
}

impl fmt::Display for TypeKey
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

/// Coarse classification of a type, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode
{
    Void,
    Integral,
    Float,
    Enum,
    Pointer,
    Reference,
    Array,
    Typedef,
    Struct,
    Function,
    Complex,
    FortranString,
}

/// Kind of an internal type, with the data that kind needs.
///
/// `bool` and character types are [`TypeKind::Integral`]; unions are
/// [`TypeKind::Struct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind
{
    Void,
    Integral,
    Float,
    Enum,
    Pointer(TypeHandle),
    Reference(TypeHandle),
    Array
    {
        element: TypeHandle,
        count: u64,
    },
    /// Alias of the underlying (fully stripped) type.
    Typedef(TypeHandle),
    Struct,
    Function,
    Complex,
    FortranString,
}

impl TypeKind
{
    pub fn code(self) -> TypeCode
    {
        match self {
            TypeKind::Void => TypeCode::Void,
            TypeKind::Integral => TypeCode::Integral,
            TypeKind::Float => TypeCode::Float,
            TypeKind::Enum => TypeCode::Enum,
            TypeKind::Pointer(_) => TypeCode::Pointer,
            TypeKind::Reference(_) => TypeCode::Reference,
            TypeKind::Array { .. } => TypeCode::Array,
            TypeKind::Typedef(_) => TypeCode::Typedef,
            TypeKind::Struct => TypeCode::Struct,
            TypeKind::Function => TypeCode::Function,
            TypeKind::Complex => TypeCode::Complex,
            TypeKind::FortranString => TypeCode::FortranString,
        }
    }

    /// Pointee, referent, element or aliased type.
    pub fn target(self) -> Option<TypeHandle>
    {
        match self {
            TypeKind::Pointer(target) | TypeKind::Reference(target) | TypeKind::Typedef(target) => Some(target),
            TypeKind::Array { element, .. } => Some(element),
            _ => None,
        }
    }
}

/// Scalar value of a non-type template parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar
{
    Int(i64),
    Float(f64),
}

impl fmt::Display for Scalar
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value}"),
        }
    }
}

/// One template argument of a type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateArgument
{
    Type(TypeHandle),
    Value(Scalar),
}

/// Canonical description of a type.
///
/// Records are immutable once registered, apart from the lazily computed
/// alignment. Fields and enum display are not stored here: they are produced
/// on demand by the registry from the native type it kept for this record.
#[derive(Debug, Clone)]
pub struct Type
{
    pub(crate) key: TypeKey,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) bit_size: u64,
    pub(crate) alignment: Option<u64>,
    pub(crate) template_arguments: SmallVec<[TemplateArgument; 2]>,
}

impl Type
{
    pub(crate) fn new(key: TypeKey, name: String, kind: TypeKind, bit_size: u64) -> Self
    {
        Self {
            key,
            name,
            kind,
            bit_size,
            alignment: None,
            template_arguments: SmallVec::new(),
        }
    }

    /// Structural identity.
    pub fn key(&self) -> &TypeKey
    {
        &self.key
    }

    /// User-facing name (the spelled typedef name for typedefs).
    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn kind(&self) -> TypeKind
    {
        self.kind
    }

    pub fn code(&self) -> TypeCode
    {
        self.kind.code()
    }

    /// Pointee, referent, element or aliased type.
    pub fn target(&self) -> Option<TypeHandle>
    {
        self.kind.target()
    }

    pub fn bit_size(&self) -> u64
    {
        self.bit_size
    }

    pub fn byte_size(&self) -> u64
    {
        self.bit_size / 8
    }

    /// Element count for arrays, `None` otherwise.
    pub fn array_count(&self) -> Option<u64>
    {
        match self.kind {
            TypeKind::Array { count, .. } => Some(count),
            _ => None,
        }
    }

    pub fn template_arguments(&self) -> &[TemplateArgument]
    {
        &self.template_arguments
    }

    /// Degenerate records stand in for types that failed to resolve.
    pub fn is_degenerate(&self) -> bool
    {
        self.name.is_empty() && self.key.as_str().is_empty()
    }
}
