//! In-memory [`NativeDebugger`] for tests.
//!
//! [`MockDebugger`] models just enough of a host debugger to drive the core:
//! a type table, a sparse byte-addressed memory, a scratch allocator that
//! counts allocations and releases, canned expression results, symbols and the
//! scopes of one selected frame.
//!
//! ```rust
//! use lensdbg_core::types::Address;
//! use lensdbg_testkit::{MockDebugger, MockField};
//!
//! let mock = MockDebugger::new();
//! let int = mock.int_type("int", 4);
//! let point = mock.struct_type("Point", 8);
//! mock.add_field(point, MockField::new("x", int, 0));
//! mock.add_field(point, MockField::new("y", int, 4));
//! mock.write_int(Address::new(0x1000), 3, 4);
//! let value = mock.value_in_memory(point, Address::new(0x1000));
//! # let _ = value;
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use lensdbg_core::error::{NativeError, NativeResult};
use lensdbg_core::native::{NativeDebugger, NativeField, NativeScope, NativeSymbol, NativeTemplateArgument, NativeTypeCode};
use lensdbg_core::types::Address;

/// First address handed out by the scratch allocator.
pub const SCRATCH_BASE: u64 = 0x7f00_0000;

const POINTER_SIZE: u64 = 8;

/// Handle of a type in the mock type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockType(usize);

/// A value of the mock debugger.
#[derive(Debug, Clone, PartialEq)]
pub struct MockValue
{
    ty: MockType,
    storage: Storage,
    optimized_out: bool,
    text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Storage
{
    Memory(Address),
    Bytes(Vec<u8>),
}

impl MockValue
{
    pub fn ty(&self) -> MockType
    {
        self.ty
    }

    /// Override what the host prints for this value (complex numbers, ...).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self
    {
        self.text = Some(text.into());
        self
    }
}

/// Field declaration for [`MockDebugger::add_field`].
#[derive(Debug, Clone)]
pub struct MockField
{
    name: Option<String>,
    ty: MockType,
    bit_position: u64,
    bit_size: u64,
    is_base_class: bool,
    broken: bool,
}

impl MockField
{
    /// Plain member at `byte_offset`.
    pub fn new(name: &str, ty: MockType, byte_offset: u64) -> Self
    {
        Self {
            name: Some(name.to_owned()),
            ty,
            bit_position: byte_offset * 8,
            bit_size: 0,
            is_base_class: false,
            broken: false,
        }
    }

    /// Member without a name (anonymous union or struct member).
    pub fn anonymous(ty: MockType, byte_offset: u64) -> Self
    {
        Self {
            name: None,
            ..Self::new("", ty, byte_offset)
        }
    }

    /// Base-class subobject at `byte_offset`.
    pub fn base(ty: MockType, byte_offset: u64) -> Self
    {
        Self {
            name: None,
            is_base_class: true,
            ..Self::new("", ty, byte_offset)
        }
    }

    /// Bitfield reported at native bit `position` with width `size`.
    #[must_use]
    pub fn bits(mut self, position: u64, size: u64) -> Self
    {
        self.bit_position = position;
        self.bit_size = size;
        self
    }

    /// Member whose value the host refuses to produce.
    #[must_use]
    pub fn broken(mut self) -> Self
    {
        self.broken = true;
        self
    }
}

#[derive(Debug, Clone)]
struct TypeDef
{
    code: NativeTypeCode,
    name: String,
    size: u64,
    target: Option<MockType>,
    unqualified: Option<MockType>,
    fields: Vec<MockField>,
    template_arguments: Vec<NativeTemplateArgument<MockType, MockValue>>,
    enumerators: Vec<(String, i64)>,
}

impl TypeDef
{
    fn new(code: NativeTypeCode, name: impl Into<String>, size: u64) -> Self
    {
        Self {
            code,
            name: name.into(),
            size,
            target: None,
            unqualified: None,
            fields: Vec::new(),
            template_arguments: Vec::new(),
            enumerators: Vec::new(),
        }
    }
}

/// Scriptable stand-in for a host debugger.
#[derive(Debug, Default)]
pub struct MockDebugger
{
    types: RefCell<Vec<TypeDef>>,
    memory: RefCell<BTreeMap<u64, u8>>,
    expressions: HashMap<String, MockValue>,
    methods: HashMap<String, MockValue>,
    dynamic_types: HashMap<MockType, MockType>,
    symbols: HashMap<u64, String>,
    scopes: Option<Vec<NativeScope>>,
    variables: HashMap<(String, Option<usize>), MockValue>,
    fail_allocations: bool,
    next_scratch: Cell<u64>,
    live_scratch: RefCell<BTreeSet<u64>>,
    allocations: Cell<usize>,
    releases: Cell<usize>,
    lookups: Cell<usize>,
    evaluated: RefCell<Vec<String>>,
    writes: RefCell<Vec<(Address, String, String)>>,
    assignments: RefCell<Vec<(String, String)>>,
}

impl MockDebugger
{
    pub fn new() -> Self
    {
        Self {
            next_scratch: Cell::new(SCRATCH_BASE),
            scopes: Some(Vec::new()),
            ..Self::default()
        }
    }

    // Types

    fn add_type(&self, def: TypeDef) -> MockType
    {
        let mut types = self.types.borrow_mut();
        types.push(def);
        MockType(types.len() - 1)
    }

    fn def(&self, ty: MockType) -> TypeDef
    {
        self.types.borrow()[ty.0].clone()
    }

    fn update(&self, ty: MockType, change: impl FnOnce(&mut TypeDef))
    {
        change(&mut self.types.borrow_mut()[ty.0]);
    }

    pub fn void_type(&self) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Void, "void", 1))
    }

    pub fn int_type(&self, name: &str, size: u64) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Int, name, size))
    }

    pub fn bool_type(&self) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Bool, "bool", 1))
    }

    pub fn float_type(&self, name: &str, size: u64) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Float, name, size))
    }

    pub fn complex_type(&self, name: &str, size: u64) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Complex, name, size))
    }

    /// Fortran `character(len=size)`.
    pub fn string_type(&self, size: u64) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::String, format!("character*{size}"), size))
    }

    /// A type the host cannot make sense of.
    pub fn error_type(&self, name: &str) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Error, name, 0))
    }

    pub fn enum_type(&self, name: &str, size: u64, enumerators: &[(&str, i64)]) -> MockType
    {
        let mut def = TypeDef::new(NativeTypeCode::Enum, name, size);
        def.enumerators = enumerators.iter().map(|(n, v)| ((*n).to_owned(), *v)).collect();
        self.add_type(def)
    }

    /// Struct without fields; add them with [`MockDebugger::add_field`].
    pub fn struct_type(&self, name: &str, size: u64) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Struct, name, size))
    }

    pub fn union_type(&self, name: &str, size: u64) -> MockType
    {
        self.add_type(TypeDef::new(NativeTypeCode::Union, name, size))
    }

    pub fn add_field(&self, owner: MockType, field: MockField)
    {
        self.update(owner, |def| def.fields.push(field));
    }

    pub fn add_template_argument(&self, owner: MockType, argument: NativeTemplateArgument<MockType, MockValue>)
    {
        self.update(owner, |def| def.template_arguments.push(argument));
    }

    /// Pointer-to-`target`, reusing an existing pointer type.
    pub fn pointer_to(&self, target: MockType) -> MockType
    {
        self.derived(NativeTypeCode::Pointer, target, |name| format!("{name} *"), POINTER_SIZE)
    }

    pub fn reference_to(&self, target: MockType) -> MockType
    {
        self.derived(NativeTypeCode::Reference, target, |name| format!("{name} &"), POINTER_SIZE)
    }

    pub fn array_of(&self, element: MockType, count: u64) -> MockType
    {
        let size = self.def(element).size * count;
        self.derived(NativeTypeCode::Array, element, |name| format!("{name} [{count}]"), size)
    }

    pub fn typedef(&self, name: &str, target: MockType) -> MockType
    {
        let size = self.def(target).size;
        let mut def = TypeDef::new(NativeTypeCode::Typedef, name, size);
        def.target = Some(target);
        self.add_type(def)
    }

    /// `const` qualified variant of `ty`.
    pub fn const_of(&self, ty: MockType) -> MockType
    {
        let mut def = self.def(ty);
        def.name = format!("const {}", def.name);
        def.unqualified = Some(ty);
        self.add_type(def)
    }

    fn derived(&self, code: NativeTypeCode, target: MockType, name: impl Fn(&str) -> String, size: u64) -> MockType
    {
        let existing = self
            .types
            .borrow()
            .iter()
            .position(|def| def.code == code && def.target == Some(target) && def.size == size && def.unqualified.is_none());
        if let Some(index) = existing {
            return MockType(index);
        }
        let mut def = TypeDef::new(code, name(&self.def(target).name), size);
        def.target = Some(target);
        self.add_type(def)
    }

    // Memory

    pub fn write_bytes(&self, address: Address, bytes: &[u8])
    {
        let mut memory = self.memory.borrow_mut();
        for (offset, byte) in bytes.iter().enumerate() {
            memory.insert(address.value() + offset as u64, *byte);
        }
    }

    /// Store the low `size` bytes of `value`, little-endian.
    pub fn write_int(&self, address: Address, value: i64, size: usize)
    {
        self.write_bytes(address, &value.to_le_bytes()[..size.min(8)]);
    }

    // Values

    pub fn value_in_memory(&self, ty: MockType, address: Address) -> MockValue
    {
        MockValue {
            ty,
            storage: Storage::Memory(address),
            optimized_out: false,
            text: None,
        }
    }

    /// A value with no address, e.g. held in registers.
    pub fn detached_value(&self, ty: MockType, bytes: Vec<u8>) -> MockValue
    {
        MockValue {
            ty,
            storage: Storage::Bytes(bytes),
            optimized_out: false,
            text: None,
        }
    }

    pub fn optimized_out_value(&self, ty: MockType) -> MockValue
    {
        MockValue {
            ty,
            storage: Storage::Bytes(Vec::new()),
            optimized_out: true,
            text: None,
        }
    }

    // Scripted answers

    pub fn define_expression(&mut self, expression: &str, value: MockValue)
    {
        self.expressions.insert(expression.to_owned(), value);
    }

    /// Result of any `(...)->method(...)` call expression.
    pub fn define_method(&mut self, method: &str, result: MockValue)
    {
        self.methods.insert(method.to_owned(), result);
    }

    pub fn define_dynamic_type(&mut self, static_type: MockType, dynamic_type: MockType)
    {
        self.dynamic_types.insert(static_type, dynamic_type);
    }

    pub fn add_symbol(&mut self, address: Address, symbol: &str)
    {
        self.symbols.insert(address.value(), symbol.to_owned());
    }

    /// Append a scope to the selected frame; the first one pushed is innermost.
    ///
    /// Symbols are `(name, is_argument)` pairs. Returns the scope index.
    pub fn push_scope(&mut self, symbols: &[(&str, bool)], is_function: bool) -> usize
    {
        let scopes = self.scopes.get_or_insert_with(Vec::new);
        scopes.push(NativeScope {
            symbols: symbols
                .iter()
                .map(|(name, is_argument)| NativeSymbol {
                    name: (*name).to_owned(),
                    is_variable: !is_argument,
                    is_argument: *is_argument,
                })
                .collect(),
            is_function,
        });
        scopes.len() - 1
    }

    /// Add a non-variable symbol (a label) to a scope.
    pub fn push_label(&mut self, scope: usize, name: &str)
    {
        if let Some(scope) = self.scopes.as_mut().and_then(|scopes| scopes.get_mut(scope)) {
            scope.symbols.push(NativeSymbol {
                name: name.to_owned(),
                is_variable: false,
                is_argument: false,
            });
        }
    }

    /// Make the frame block inaccessible.
    pub fn drop_frame(&mut self)
    {
        self.scopes = None;
    }

    /// Value read by `read_variable(name, scope)`.
    pub fn define_variable(&mut self, name: &str, scope: Option<usize>, value: MockValue)
    {
        self.variables.insert((name.to_owned(), scope), value);
    }

    pub fn fail_allocations(&mut self)
    {
        self.fail_allocations = true;
    }

    // Observations

    /// Scratch buffers handed out so far.
    pub fn allocations(&self) -> usize
    {
        self.allocations.get()
    }

    /// Scratch buffers released so far.
    pub fn releases(&self) -> usize
    {
        self.releases.get()
    }

    /// Scratch buffers currently held.
    pub fn live_scratch(&self) -> usize
    {
        self.live_scratch.borrow().len()
    }

    /// Number of `lookup_type` calls that reached the host.
    pub fn lookups(&self) -> usize
    {
        self.lookups.get()
    }

    /// Expressions passed to `evaluate`, in order.
    pub fn evaluated(&self) -> Vec<String>
    {
        self.evaluated.borrow().clone()
    }

    /// `(address, type, value)` of every `write_value` call.
    pub fn writes(&self) -> Vec<(Address, String, String)>
    {
        self.writes.borrow().clone()
    }

    /// `(expression, value)` of every `assign` call.
    pub fn assignments(&self) -> Vec<(String, String)>
    {
        self.assignments.borrow().clone()
    }

    fn base(&self, ty: MockType) -> MockType
    {
        self.def(ty).unqualified.unwrap_or(ty)
    }

    fn integer_of(&self, ty: MockType, bytes: &[u8]) -> i64
    {
        let def = self.def(self.base(ty));
        let len = bytes.len().min(8);
        let mut raw = [0u8; 8];
        raw[..len].copy_from_slice(&bytes[..len]);
        let value = i64::from_le_bytes(raw);
        let unsigned = matches!(def.code, NativeTypeCode::Pointer | NativeTypeCode::Bool) || def.name.starts_with("unsigned");
        if unsigned || len == 0 || len >= 8 {
            return value;
        }
        let shift = 64 - 8 * len;
        (value << shift) >> shift
    }

    /// Integers up to 128 bits, the way the debugger prints them.
    fn wide_integer_text(&self, ty: MockType, bytes: &[u8]) -> String
    {
        let def = self.def(self.base(ty));
        let len = bytes.len().min(16);
        if len == 0 {
            return "0".to_owned();
        }
        let mut raw = [0u8; 16];
        raw[..len].copy_from_slice(&bytes[..len]);
        let unsigned = matches!(def.code, NativeTypeCode::Pointer | NativeTypeCode::Bool) || def.name.starts_with("unsigned");
        if unsigned {
            return u128::from_le_bytes(raw).to_string();
        }
        let shift = 128 - 8 * len;
        ((i128::from_le_bytes(raw) << shift) >> shift).to_string()
    }

    fn call_result(&self, expression: &str) -> Option<MockValue>
    {
        let (_, call) = expression.split_once("->")?;
        let (method, _) = call.split_once('(')?;
        self.methods.get(method).cloned()
    }

    /// `(TypeName)123` for enum display.
    fn cast_literal(&self, expression: &str) -> Option<MockValue>
    {
        let rest = expression.strip_prefix('(')?;
        let (type_name, number) = rest.split_once(')')?;
        let number: i64 = number.trim().parse().ok()?;
        let ty = self.find_type(type_name)?;
        let size = usize::try_from(self.def(ty).size).ok()?;
        Some(self.detached_value(ty, number.to_le_bytes()[..size.min(8)].to_vec()))
    }

    fn find_type(&self, name: &str) -> Option<MockType>
    {
        self.types
            .borrow()
            .iter()
            .position(|def| def.name == name && def.unqualified.is_none())
            .map(MockType)
    }
}

fn error(message: impl Into<String>) -> NativeError
{
    NativeError::new(message)
}

/// Floats by width. The mock stores a 16-byte `long double` as an `f64`
/// in its low eight bytes.
fn float_text(bytes: &[u8]) -> NativeResult<String>
{
    match bytes.len() {
        4 => Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]).to_string()),
        8 | 16 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            Ok(f64::from_le_bytes(raw).to_string())
        }
        width => Err(error(format!("no float of {width} bytes"))),
    }
}

impl NativeDebugger for MockDebugger
{
    type Type = MockType;
    type Value = MockValue;

    fn type_code(&self, ty: &MockType) -> NativeTypeCode
    {
        self.def(*ty).code
    }

    fn type_name(&self, ty: &MockType) -> String
    {
        self.def(*ty).name
    }

    fn type_size(&self, ty: &MockType) -> u64
    {
        self.def(*ty).size
    }

    fn unqualified(&self, ty: &MockType) -> MockType
    {
        self.base(*ty)
    }

    fn type_target(&self, ty: &MockType) -> NativeResult<MockType>
    {
        let def = self.def(*ty);
        def.target.ok_or_else(|| error(format!("'{}' has no target", def.name)))
    }

    fn strip_typedefs(&self, ty: &MockType) -> MockType
    {
        let def = self.def(*ty);
        match (def.code, def.target) {
            (NativeTypeCode::Typedef, Some(target)) => target,
            _ => *ty,
        }
    }

    fn type_fields(&self, ty: &MockType) -> NativeResult<Vec<NativeField<MockType>>>
    {
        let def = self.def(self.base(*ty));
        if !matches!(def.code, NativeTypeCode::Struct | NativeTypeCode::Union) {
            return Err(error(format!("'{}' has no fields", def.name)));
        }
        Ok(def
            .fields
            .iter()
            .map(|field| NativeField {
                name: field.name.clone(),
                ty: field.ty,
                bit_position: Some(field.bit_position),
                bit_size: field.bit_size,
                is_base_class: field.is_base_class,
            })
            .collect())
    }

    fn template_argument(&self, ty: &MockType, position: usize) -> Option<NativeTemplateArgument<MockType, MockValue>>
    {
        self.def(self.base(*ty)).template_arguments.get(position).cloned()
    }

    fn pointer_type(&self, ty: &MockType) -> MockType
    {
        self.pointer_to(*ty)
    }

    fn lookup_type(&self, name: &str) -> Option<MockType>
    {
        self.lookups.set(self.lookups.get() + 1);
        self.find_type(name)
    }

    fn pointer_size(&self) -> u64
    {
        POINTER_SIZE
    }

    fn value_type(&self, value: &MockValue) -> MockType
    {
        value.ty
    }

    fn value_address(&self, value: &MockValue) -> Option<Address>
    {
        match value.storage {
            Storage::Memory(address) => Some(address),
            Storage::Bytes(_) => None,
        }
    }

    fn value_is_optimized_out(&self, value: &MockValue) -> bool
    {
        value.optimized_out
    }

    fn value_dynamic_type(&self, value: &MockValue) -> NativeResult<MockType>
    {
        self.dynamic_types
            .get(&value.ty)
            .copied()
            .ok_or_else(|| error("no dynamic type"))
    }

    fn value_cast(&self, value: &MockValue, ty: &MockType) -> NativeResult<MockValue>
    {
        if self.def(*ty).code == NativeTypeCode::Error {
            return Err(error("cannot cast to an erroneous type"));
        }
        Ok(MockValue {
            ty: *ty,
            ..value.clone()
        })
    }

    fn value_bytes(&self, value: &MockValue) -> NativeResult<Vec<u8>>
    {
        if value.optimized_out {
            return Err(error("value has been optimized out"));
        }
        match &value.storage {
            Storage::Bytes(bytes) => Ok(bytes.clone()),
            Storage::Memory(address) => {
                let size = usize::try_from(self.def(value.ty).size).map_err(|err| error(err.to_string()))?;
                self.read_memory(*address, size)
            }
        }
    }

    fn value_as_integer(&self, value: &MockValue) -> NativeResult<i64>
    {
        let bytes = self.value_bytes(value)?;
        Ok(self.integer_of(value.ty, &bytes))
    }

    fn value_to_string(&self, value: &MockValue) -> NativeResult<String>
    {
        if let Some(text) = &value.text {
            return Ok(text.clone());
        }
        let def = self.def(self.base(value.ty));
        match def.code {
            NativeTypeCode::Float => float_text(&self.value_bytes(value)?),
            NativeTypeCode::Enum => {
                let number = self.value_as_integer(value)?;
                Ok(def
                    .enumerators
                    .iter()
                    .find(|(_, v)| *v == number)
                    .map_or_else(|| number.to_string(), |(name, _)| name.clone()))
            }
            _ => Ok(self.wide_integer_text(value.ty, &self.value_bytes(value)?)),
        }
    }

    fn value_at(&self, address: Address, ty: &MockType) -> NativeResult<MockValue>
    {
        Ok(self.value_in_memory(*ty, address))
    }

    fn value_field(&self, aggregate: &MockValue, field: &NativeField<MockType>) -> NativeResult<MockValue>
    {
        let Storage::Memory(base) = aggregate.storage else {
            return Err(error("aggregate is not addressable"));
        };
        let owner = self.def(self.base(aggregate.ty));
        let declared = owner
            .fields
            .iter()
            .find(|candidate| candidate.name == field.name && candidate.bit_position == field.bit_position.unwrap_or(0))
            .ok_or_else(|| error(format!("no field {:?} in '{}'", field.name, owner.name)))?;
        if declared.broken {
            return Err(error(format!("field {:?} has no debug info", field.name)));
        }

        let size = self.def(field.ty).size;
        // Bitfields live in the word that holds them
        let offset = if field.bit_size != 0 && size > 0 {
            declared.bit_position / (8 * size) * size
        } else {
            declared.bit_position / 8
        };
        Ok(self.value_in_memory(field.ty, base + offset))
    }

    fn read_memory(&self, address: Address, len: usize) -> NativeResult<Vec<u8>>
    {
        let memory = self.memory.borrow();
        (0..len as u64)
            .map(|offset| {
                memory
                    .get(&(address.value() + offset))
                    .copied()
                    .ok_or_else(|| error(format!("cannot access memory at {}", address + offset)))
            })
            .collect()
    }

    fn evaluate(&self, expression: &str) -> NativeResult<MockValue>
    {
        self.evaluated.borrow_mut().push(expression.to_owned());
        self.expressions
            .get(expression)
            .cloned()
            .or_else(|| self.call_result(expression))
            .or_else(|| self.cast_literal(expression))
            .ok_or_else(|| error(format!("No symbol \"{expression}\" in current context.")))
    }

    fn allocate_scratch(&self, contents: &[u8]) -> NativeResult<Address>
    {
        if self.fail_allocations {
            return Err(error("calloc failed"));
        }
        let address = Address::new(self.next_scratch.get());
        self.next_scratch.set(address.value() + (contents.len() as u64).max(1).next_multiple_of(16));
        self.write_bytes(address, contents);
        self.live_scratch.borrow_mut().insert(address.value());
        self.allocations.set(self.allocations.get() + 1);
        Ok(address)
    }

    fn release_scratch(&self, address: Address) -> NativeResult<()>
    {
        self.releases.set(self.releases.get() + 1);
        if self.live_scratch.borrow_mut().remove(&address.value()) {
            Ok(())
        } else {
            Err(error(format!("{address} was not allocated")))
        }
    }

    fn write_value(&self, address: Address, type_name: &str, value: &str) -> NativeResult<()>
    {
        self.writes
            .borrow_mut()
            .push((address, type_name.to_owned(), value.to_owned()));
        Ok(())
    }

    fn assign(&self, expression: &str, value: &str) -> NativeResult<()>
    {
        self.assignments.borrow_mut().push((expression.to_owned(), value.to_owned()));
        Ok(())
    }

    fn symbol_at(&self, address: Address) -> Option<String>
    {
        self.symbols.get(&address.value()).cloned()
    }

    fn frame_scopes(&self) -> NativeResult<Vec<NativeScope>>
    {
        self.scopes.clone().ok_or_else(|| error("No frame selected."))
    }

    fn read_variable(&self, name: &str, scope: Option<usize>) -> NativeResult<MockValue>
    {
        self.variables
            .get(&(name.to_owned(), scope))
            .cloned()
            .ok_or_else(|| error(format!("cannot read {name}")))
    }
}

/// Install the test log subscriber once per test binary.
pub fn init_tracing()
{
    lensdbg_utils::init_logging_for_tests();
}
