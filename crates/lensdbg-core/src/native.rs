//! # Native Debugger Boundary
//!
//! The interface the introspection core needs from the host debugger.
//!
//! The host (gdb, lldb, a DWARF reader over a core dump, ...) owns the real type
//! and value system. This trait exposes only what the core consumes:
//!
//! - **Types**: kind code, name, size, target, fields, template arguments
//! - **Values**: type, address, content bytes, optimized-out flag, casts
//! - **Memory & evaluation**: raw reads, expression evaluation, scratch buffers,
//!   writes
//! - **Frames**: the scopes of the selected frame and variable reads
//!
//! Type and value handles are opaque associated types. They must be cheap to
//! clone, since the registry keeps a native type handle for every interned type
//! so that fields, alignment and enum display can be computed on demand.
//!
//! ## Thread Safety
//!
//! Every method takes `&self`. A backend that needs mutation (scratch allocation,
//! evaluation caches) uses interior mutability. The core never calls a backend
//! from more than one thread.

use std::fmt;

use crate::error::NativeResult;
use crate::types::Address;

/// Kind of a native type, as reported by the host debugger.
///
/// This is deliberately wider than the internal [`TypeKind`](crate::types::TypeKind):
/// the registry folds several native codes into one internal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeTypeCode
{
    Void,
    Int,
    Bool,
    Char,
    Float,
    Enum,
    Pointer,
    Reference,
    Array,
    Typedef,
    Struct,
    Union,
    Function,
    Method,
    MethodPointer,
    MemberPointer,
    Complex,
    String,
    /// The host could not make sense of the debug information.
    Error,
}

/// One declared field of a native struct, union or class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeField<T>
{
    /// Field name; anonymous members have none
    pub name: Option<String>,
    /// Declared type of the field
    pub ty: T,
    /// Bit position relative to the start of the aggregate, when known
    pub bit_position: Option<u64>,
    /// Declared bit width; zero for non-bitfields
    pub bit_size: u64,
    /// Field is a base-class subobject rather than a data member
    pub is_base_class: bool,
}

/// A template parameter as the host reports it.
#[derive(Debug, Clone)]
pub enum NativeTemplateArgument<T, V>
{
    /// Type parameter (`T` in `vector<T>`)
    Type(T),
    /// Non-type parameter (`N` in `array<T, N>`)
    Value(V),
    /// Something the host could not classify; carries its description
    Other(String),
}

/// A symbol visible in one lexical scope of the selected frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSymbol
{
    /// Printable symbol name
    pub name: String,
    /// Symbol is a variable
    pub is_variable: bool,
    /// Symbol is a function argument
    pub is_argument: bool,
}

/// One lexical block of the selected frame, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeScope
{
    /// Symbols declared directly in this block
    pub symbols: Vec<NativeSymbol>,
    /// This is the outermost block of the function
    pub is_function: bool,
}

/// Host debugger operations consumed by the introspection core
///
/// All fallible operations return [`NativeResult`]. The core decides how to
/// recover: a failed field is skipped, a failed type is replaced by the
/// degenerate type, a failed evaluation yields no result.
pub trait NativeDebugger
{
    /// Native type handle
    type Type: Clone + fmt::Debug;
    /// Native value handle
    type Value: Clone + fmt::Debug;

    /// Kind code of a type.
    fn type_code(&self, ty: &Self::Type) -> NativeTypeCode;

    /// Spelled name of a type (`str(type)` in most debuggers).
    ///
    /// Anonymous aggregates may report an empty string, `union {...}` or a name
    /// ending in `{...}`.
    fn type_name(&self, ty: &Self::Type) -> String;

    /// Size in bytes; zero when the debug information does not say.
    fn type_size(&self, ty: &Self::Type) -> u64;

    /// Type with `const`/`volatile` removed.
    fn unqualified(&self, ty: &Self::Type) -> Self::Type;

    /// Pointee, referent, element or aliased type.
    ///
    /// ## Errors
    ///
    /// Fails for types that have no target.
    fn type_target(&self, ty: &Self::Type) -> NativeResult<Self::Type>;

    /// Strip one or more typedef layers.
    ///
    /// Hosts may strip only a single layer; the core loops until the result is
    /// no longer a typedef.
    fn strip_typedefs(&self, ty: &Self::Type) -> Self::Type;

    /// Declared fields, base classes first.
    ///
    /// ## Errors
    ///
    /// Fails for types without field information.
    fn type_fields(&self, ty: &Self::Type) -> NativeResult<Vec<NativeField<Self::Type>>>;

    /// Template argument at `position`, `None` once past the last one.
    fn template_argument(&self, ty: &Self::Type, position: usize) -> Option<NativeTemplateArgument<Self::Type, Self::Value>>;

    /// Pointer-to-`ty`.
    fn pointer_type(&self, ty: &Self::Type) -> Self::Type;

    /// Look a type up by its spelled name.
    fn lookup_type(&self, name: &str) -> Option<Self::Type>;

    /// Size of a data pointer in the inferior.
    fn pointer_size(&self) -> u64;

    /// Static type of a value.
    fn value_type(&self, value: &Self::Value) -> Self::Type;

    /// Address of a value, if it lives in inferior memory.
    fn value_address(&self, value: &Self::Value) -> Option<Address>;

    /// Whether the compiler optimized the value away.
    fn value_is_optimized_out(&self, value: &Self::Value) -> bool;

    /// Most-derived runtime type of a value.
    ///
    /// ## Errors
    ///
    /// Fails when the host cannot determine the dynamic type.
    fn value_dynamic_type(&self, value: &Self::Value) -> NativeResult<Self::Type>;

    /// Reinterpret a value as another type.
    ///
    /// ## Errors
    ///
    /// Fails when the host refuses the cast.
    fn value_cast(&self, value: &Self::Value, ty: &Self::Type) -> NativeResult<Self::Value>;

    /// Full byte content of a value (`sizeof(type)` bytes).
    ///
    /// ## Errors
    ///
    /// Fails for unavailable or unreadable values.
    fn value_bytes(&self, value: &Self::Value) -> NativeResult<Vec<u8>>;

    /// Value converted to an integer (enums, pointers, integral types).
    ///
    /// ## Errors
    ///
    /// Fails for values that have no integer interpretation.
    fn value_as_integer(&self, value: &Self::Value) -> NativeResult<i64>;

    /// The host's own textual rendering of a value.
    ///
    /// ## Errors
    ///
    /// Fails when the value cannot be formatted.
    fn value_to_string(&self, value: &Self::Value) -> NativeResult<String>;

    /// A value of type `ty` located at `address`.
    ///
    /// ## Errors
    ///
    /// Fails when the host cannot create the value.
    fn value_at(&self, address: Address, ty: &Self::Type) -> NativeResult<Self::Value>;

    /// Member `field` of an aggregate value.
    ///
    /// ## Errors
    ///
    /// Fails when the member cannot be accessed (e.g. its type lacks debug info).
    fn value_field(&self, aggregate: &Self::Value, field: &NativeField<Self::Type>) -> NativeResult<Self::Value>;

    /// Read `len` bytes of inferior memory.
    ///
    /// ## Errors
    ///
    /// Fails for unmapped or unreadable memory.
    fn read_memory(&self, address: Address, len: usize) -> NativeResult<Vec<u8>>;

    /// Evaluate an expression in the context of the selected frame.
    ///
    /// ## Errors
    ///
    /// Fails when the expression does not parse or evaluation throws.
    fn evaluate(&self, expression: &str) -> NativeResult<Self::Value>;

    /// Allocate scratch memory in the inferior and copy `contents` into it.
    ///
    /// ## Errors
    ///
    /// Fails when the inferior cannot allocate.
    fn allocate_scratch(&self, contents: &[u8]) -> NativeResult<Address>;

    /// Free a buffer obtained from [`NativeDebugger::allocate_scratch`].
    ///
    /// ## Errors
    ///
    /// Fails when the inferior rejects the release.
    fn release_scratch(&self, address: Address) -> NativeResult<()>;

    /// Store a textual value of type `type_name` at `address`.
    ///
    /// ## Errors
    ///
    /// Fails when the host cannot parse or write the value.
    fn write_value(&self, address: Address, type_name: &str, value: &str) -> NativeResult<()>;

    /// Assign `value` to the lvalue denoted by `expression`.
    ///
    /// ## Errors
    ///
    /// Fails when the assignment is rejected.
    fn assign(&self, expression: &str, value: &str) -> NativeResult<()>;

    /// Symbol description for an address (`vtable for Foo + 16`, `main + 4`, ...).
    fn symbol_at(&self, address: Address) -> Option<String>;

    /// Lexical scopes of the selected frame, innermost first.
    ///
    /// ## Errors
    ///
    /// Fails when no frame is selected or its block is inaccessible.
    fn frame_scopes(&self) -> NativeResult<Vec<NativeScope>>;

    /// Read a variable, optionally restricted to the scope at `scope` (an index
    /// into [`NativeDebugger::frame_scopes`]).
    ///
    /// ## Errors
    ///
    /// Fails when the variable cannot be read in that scope.
    fn read_variable(&self, name: &str, scope: Option<usize>) -> NativeResult<Self::Value>;
}
