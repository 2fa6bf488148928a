//! Tests for type interning and lookup

use lensdbg_core::error::TypeResolutionError;
use lensdbg_core::native::{NativeDebugger, NativeTemplateArgument};
use lensdbg_core::types::{Address, Scalar, TemplateArgument, TypeCode, TypeKind, TypeRegistry};
use lensdbg_core::value::{Value, ValueBuilder};
use lensdbg_testkit::{MockDebugger, MockField, init_tracing};

fn point_struct(mock: &MockDebugger, name: &str, second: &str) -> lensdbg_testkit::MockType
{
    let int = mock.int_type("int", 4);
    let ty = mock.struct_type(name, 8);
    mock.add_field(ty, MockField::new("x", int, 0));
    mock.add_field(ty, MockField::new(second, int, 4));
    ty
}

#[test]
fn test_resolving_twice_returns_same_handle()
{
    init_tracing();
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let mut types = TypeRegistry::new();

    let first = types.resolve(&mock, &int);
    let records = types.len();
    let second = types.resolve(&mock, &int);

    assert_eq!(first, second);
    assert_eq!(types.len(), records);
    assert_eq!(types.get(first).name(), "int");
    assert_eq!(types.get(first).kind(), TypeKind::Integral);
    assert_eq!(types.get(first).bit_size(), 32);
}

#[test]
fn test_bool_and_char_are_integral_union_is_struct()
{
    let mock = MockDebugger::new();
    let boolean = mock.bool_type();
    let union = mock.union_type("Number", 8);
    let mut types = TypeRegistry::new();

    let boolean = types.resolve(&mock, &boolean);
    let union = types.resolve(&mock, &union);

    assert_eq!(types.get(boolean).code(), TypeCode::Integral);
    assert_eq!(types.get(union).code(), TypeCode::Struct);
}

#[test]
fn test_pointer_values_share_the_pointee_record()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let pointer = mock.pointer_to(int);
    mock.write_int(Address::new(0x1000), 0x2000, 8);
    mock.write_int(Address::new(0x1008), 0x3000, 8);
    let mut types = TypeRegistry::new();
    let builder = ValueBuilder::new(&mock);

    let first = builder
        .build(&mut types, &mock.value_in_memory(pointer, Address::new(0x1000)), false)
        .unwrap();
    let second = builder
        .build(&mut types, &mock.value_in_memory(pointer, Address::new(0x1008)), false)
        .unwrap();

    let first_target = types.get(first.ty()).target().unwrap();
    let second_target = types.get(second.ty()).target().unwrap();
    assert_eq!(first_target, second_target);
    assert_eq!(first_target, types.resolve(&mock, &int));
    assert_eq!(first.pointer_target(), Some(Address::new(0x2000)));
    assert_eq!(second.pointer_target(), Some(Address::new(0x3000)));
}

#[test]
fn test_anonymous_structs_with_same_layout_share_a_record()
{
    let mock = MockDebugger::new();
    let first = point_struct(&mock, "struct {...}", "y");
    let second = point_struct(&mock, "struct {...}", "y");
    let different = point_struct(&mock, "struct {...}", "z");
    let mut types = TypeRegistry::new();

    let first = types.resolve(&mock, &first);
    let second = types.resolve(&mock, &second);
    let different = types.resolve(&mock, &different);

    assert_eq!(first, second);
    assert_ne!(first, different);
    assert_eq!(types.get(first).key().as_str(), "s{x:int}{y:int}");
}

#[test]
fn test_anonymous_structs_differing_in_field_type_are_distinct()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let short = mock.int_type("short", 2);
    let wide = mock.struct_type("struct {...}", 4);
    mock.add_field(wide, MockField::new("v", int, 0));
    let narrow = mock.struct_type("struct {...}", 4);
    mock.add_field(narrow, MockField::new("v", short, 0));
    let mut types = TypeRegistry::new();

    let wide = types.resolve(&mock, &wide);
    let narrow = types.resolve(&mock, &narrow);

    assert_ne!(wide, narrow);
    assert_eq!(types.get(wide).key().as_str(), "s{v:int}");
    assert_eq!(types.get(narrow).key().as_str(), "s{v:short}");
}

#[test]
fn test_anonymous_union_and_nameless_prefixes()
{
    let mock = MockDebugger::new();
    let union = point_struct(&mock, "union {...}", "y");
    let nameless = point_struct(&mock, "", "y");
    let mut types = TypeRegistry::new();

    let union = types.resolve(&mock, &union);
    let nameless = types.resolve(&mock, &nameless);

    assert!(types.get(union).key().as_str().starts_with('u'));
    assert!(types.get(nameless).key().as_str().starts_with('0'));
    assert_ne!(union, nameless);
}

#[test]
fn test_typedef_chain_wraps_fully_stripped_type()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let inner = mock.typedef("int32_t", int);
    let outer = mock.typedef("qint32", inner);
    let mut types = TypeRegistry::new();

    let handle = types.resolve(&mock, &outer);
    let int = types.resolve(&mock, &int);

    assert_eq!(types.get(handle).name(), "qint32");
    assert_eq!(types.get(handle).kind(), TypeKind::Typedef(int));
    assert_eq!(types.strip_typedefs(handle), int);
    assert_eq!(types.byte_size(handle), 4);
}

#[test]
fn test_array_element_count()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let array = mock.array_of(mock.const_of(int), 4);
    let mut types = TypeRegistry::new();

    let handle = types.resolve(&mock, &array);
    let int = types.resolve(&mock, &int);
    let record = types.get(handle);

    assert_eq!(record.array_count(), Some(4));
    assert_eq!(record.byte_size(), 16);
    assert_eq!(record.target(), Some(int));
}

#[test]
fn test_zero_sized_array_element_is_degenerate()
{
    let mock = MockDebugger::new();
    let empty = mock.struct_type("Empty", 0);
    let array = mock.array_of(empty, 3);
    let mut types = TypeRegistry::new();

    assert!(matches!(
        types.try_resolve(&mock, &array),
        Err(TypeResolutionError::ZeroSizedElement(_))
    ));
    let handle = types.resolve(&mock, &array);
    assert_eq!(handle, types.degenerate());
    assert!(types.get(handle).is_degenerate());
}

#[test]
fn test_error_type_is_degenerate()
{
    let mock = MockDebugger::new();
    let broken = mock.error_type("<unknown>");
    let mut types = TypeRegistry::new();

    assert!(matches!(
        types.try_resolve(&mock, &broken),
        Err(TypeResolutionError::UnknownTypeCode(_))
    ));
    assert_eq!(types.resolve(&mock, &broken), types.degenerate());
}

#[test]
fn test_template_arguments_in_order()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let array = mock.struct_type("std::array<int, 4>", 16);
    mock.add_template_argument(array, NativeTemplateArgument::Type(int));
    mock.add_template_argument(
        array,
        NativeTemplateArgument::Value(mock.detached_value(int, 4i32.to_le_bytes().to_vec())),
    );
    mock.add_template_argument(array, NativeTemplateArgument::Other("template template parameter".into()));
    let mut types = TypeRegistry::new();

    let handle = types.resolve(&mock, &array);
    let int = types.resolve(&mock, &int);

    assert_eq!(
        types.get(handle).template_arguments(),
        &[
            TemplateArgument::Type(int),
            TemplateArgument::Value(Scalar::Int(4)),
            TemplateArgument::Type(types.degenerate()),
        ]
    );
}

#[test]
fn test_types_to_report_drained_per_request()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let pointer = mock.pointer_to(int);
    let mut types = TypeRegistry::new();

    types.resolve(&mock, &pointer);
    let reported = types.take_types_to_report();

    assert_eq!(reported.keys().collect::<Vec<_>>(), ["int"]);
    types.resolve(&mock, &int);
    assert!(types.take_types_to_report().is_empty());
}

#[test]
fn test_struct_alignment_is_computed_lazily()
{
    let mock = MockDebugger::new();
    let char_type = mock.int_type("char", 1);
    let double = mock.float_type("double", 8);
    let mixed = mock.struct_type("Mixed", 16);
    mock.add_field(mixed, MockField::new("c", char_type, 0));
    mock.add_field(mixed, MockField::new("d", double, 8));
    let empty = mock.struct_type("Empty", 1);
    let node = mock.struct_type("Node", 16);
    mock.add_field(node, MockField::new("next", mock.pointer_to(node), 0));
    mock.add_field(node, MockField::new("value", char_type, 8));
    let mut types = TypeRegistry::new();

    let mixed = types.resolve(&mock, &mixed);
    let empty = types.resolve(&mock, &empty);
    let node = types.resolve(&mock, &node);

    assert_eq!(types.alignment(&mock, mixed), 8);
    assert_eq!(types.alignment(&mock, empty), 1);
    assert_eq!(types.alignment(&mock, node), 8);
}

#[test]
fn test_enum_display_through_host()
{
    let mock = MockDebugger::new();
    let color = mock.enum_type("Color", 4, &[("Red", 0), ("Green", 1)]);
    let mut types = TypeRegistry::new();
    let handle = types.resolve(&mock, &color);

    assert_eq!(types.enum_display(&mock, handle, 0), "Red (0)");
    assert_eq!(types.enum_display(&mock, handle, 1), "Green (1)");
    assert_eq!(types.enum_display(&mock, handle, 7), "7");
}

#[test]
fn test_lookup_rewrites_spellings()
{
    let mock = MockDebugger::new();
    let point = point_struct(&mock, "Point", "y");
    mock.struct_type("(anonymous namespace)::Hidden", 4);
    let mut types = TypeRegistry::new();
    let point = types.resolve(&mock, &point);

    assert_eq!(types.lookup(&mock, "const struct Point"), Some(point));
    assert_eq!(types.lookup(&mock, "Point const"), Some(point));

    let pointer = types.lookup(&mock, "Point *").unwrap();
    assert_eq!(types.get(pointer).kind(), TypeKind::Pointer(point));

    let hidden = types.lookup(&mock, "{anonymous}::Hidden").unwrap();
    assert_eq!(types.get(hidden).name(), "(anonymous namespace)::Hidden");

    assert_eq!(types.lookup(&mock, "Missing"), None);
}

#[test]
fn test_lookup_is_cached()
{
    let mock = MockDebugger::new();
    point_struct(&mock, "Point", "y");
    let mut types = TypeRegistry::new();

    types.lookup(&mock, "Point").unwrap();
    let calls = mock.lookups();
    types.lookup(&mock, "Point").unwrap();

    assert_eq!(mock.lookups(), calls);
}

#[test]
fn test_every_lookup_hit_is_reported()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let mut types = TypeRegistry::new();
    let int = types.resolve(&mock, &int);
    types.take_types_to_report();

    let constant = types.lookup(&mock, "const int").unwrap();
    let pointer = types.lookup(&mock, "int *").unwrap();
    let reported = types.take_types_to_report();

    assert_eq!(constant, int);
    assert_eq!(reported.get("const int"), Some(&int));
    assert_eq!(reported.get("int *"), Some(&pointer));

    types.lookup(&mock, "const int").unwrap();
    assert_eq!(types.take_types_to_report().keys().collect::<Vec<_>>(), ["const int"]);
}

#[test]
fn test_lookup_falls_back_to_class_cast()
{
    let mut mock = MockDebugger::new();
    let widget = point_struct(&mock, "ns::Widget", "y");
    let null = mock.detached_value(mock.pointer_to(widget), vec![0; 8]);
    mock.define_expression("(class 'Widget'*)0", null);
    let mut types = TypeRegistry::new();

    let found = types.lookup(&mock, "class Widget").unwrap();

    assert_eq!(types.get(found).name(), "ns::Widget");
    assert_eq!(types.lookup(&mock, "Gadget"), None);
}

#[test]
fn test_clear_forgets_everything()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let mut types = TypeRegistry::new();
    types.resolve(&mock, &int);

    types.clear();

    assert!(types.is_empty());
    let again = types.resolve(&mock, &int);
    assert_eq!(types.get(again).name(), "int");
    assert_eq!(types.take_types_to_report().len(), 1);
}

#[test]
fn test_detached_value_keeps_bytes()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let mut types = TypeRegistry::new();

    let value = ValueBuilder::new(&mock)
        .build(&mut types, &mock.detached_value(int, vec![7, 0]), false)
        .unwrap();

    assert_eq!(value.address(), None);
    assert_eq!(value.raw_bytes(), Some(&[7, 0, 0, 0][..]));
    assert_eq!(value.scalar(&mock, &types).unwrap(), Scalar::Int(7));
    assert_eq!(value, Value::detached(value.ty(), vec![7, 0, 0, 0]));
}

#[test]
fn test_value_address_reads_back_its_bytes()
{
    let mock = MockDebugger::new();
    let point = point_struct(&mock, "Point", "y");
    let contents = [1, 0, 0, 0, 2, 0, 0, 0];
    mock.write_bytes(Address::new(0x4000), &contents);
    let mut types = TypeRegistry::new();

    let value = ValueBuilder::new(&mock)
        .build(&mut types, &mock.value_in_memory(point, Address::new(0x4000)), false)
        .unwrap();
    let address = value.address().unwrap();
    let size = usize::try_from(types.byte_size(value.ty())).unwrap();
    let bytes = mock.read_memory(address, size).unwrap();

    assert_eq!(address, Address::new(0x4000));
    assert_eq!(bytes.len(), 8);
    assert_eq!(bytes, contents);
}
