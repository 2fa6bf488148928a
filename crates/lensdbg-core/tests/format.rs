//! Tests for value rendering

use std::collections::HashSet;

use lensdbg_core::config::DumperConfig;
use lensdbg_core::format::{Formatter, NOT_ACCESSIBLE, OPTIMIZED_OUT, Record};
use lensdbg_core::types::{Address, TypeRegistry};
use lensdbg_core::value::{InternalPath, Value, ValueBuilder};
use lensdbg_testkit::{MockDebugger, MockField, MockValue, init_tracing};

const BASE: Address = Address::new(0x1000);

/// Render `value` as local `name`, expanding the paths in `expanded`.
fn render(mock: &MockDebugger, types: &mut TypeRegistry<MockDebugger>, value: Value, name: &str, expanded: &[&str]) -> Record
{
    render_with(mock, types, &DumperConfig::default(), value, name, expanded)
}

fn render_with(
    mock: &MockDebugger,
    types: &mut TypeRegistry<MockDebugger>,
    config: &DumperConfig,
    value: Value,
    name: &str,
    expanded: &[&str],
) -> Record
{
    let expanded = expanded.iter().copied().map(InternalPath::from).collect::<HashSet<_>>();
    let value = value.with_name(name).with_iname(InternalPath::local(name));
    Formatter::new(mock, types, config).render(&value, &expanded, config.max_depth)
}

fn build(mock: &MockDebugger, types: &mut TypeRegistry<MockDebugger>, raw: &MockValue) -> Value
{
    ValueBuilder::new(mock).build(types, raw, false).unwrap()
}

fn child_values(record: &Record) -> Vec<(&str, Option<&str>)>
{
    record
        .children
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|child| (child.name.as_str(), child.value.as_deref()))
        .collect()
}

#[test]
fn test_bitfields_are_extracted()
{
    init_tracing();
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let flags = mock.struct_type("Flags", 4);
    mock.add_field(flags, MockField::new("a", int, 0).bits(0, 3));
    mock.add_field(flags, MockField::new("b", int, 0).bits(3, 5));
    mock.write_bytes(BASE, &[0x53, 0, 0, 0]);
    let mut types = TypeRegistry::new();
    let handle = types.resolve(&mock, &flags);

    let record = render(&mock, &mut types, Value::at(handle, BASE), "flags", &["local.flags"]);

    assert_eq!(record.value, None);
    assert_eq!(record.numchild, 2);
    assert_eq!(child_values(&record), [("a", Some("3")), ("b", Some("10"))]);
    let children = record.children.unwrap();
    assert_eq!(children[1].iname.as_str(), "local.flags.b");
}

#[test]
fn test_collapsed_struct_reports_child_count_only()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let point = mock.struct_type("Point", 8);
    mock.add_field(point, MockField::new("x", int, 0));
    mock.add_field(point, MockField::new("y", int, 4));
    let mut types = TypeRegistry::new();
    let handle = types.resolve(&mock, &point);

    let record = render(&mock, &mut types, Value::at(handle, BASE), "p", &[]);

    assert_eq!(record.numchild, 2);
    assert!(record.children.is_none());
}

#[test]
fn test_pointer_shows_symbol_and_dereferences()
{
    let mock = {
        let mut mock = MockDebugger::new();
        mock.add_symbol(Address::new(0x2000), "global_counter");
        mock
    };
    let int = mock.int_type("int", 4);
    let pointer = mock.pointer_to(int);
    mock.write_int(BASE, 0x2000, 8);
    mock.write_int(Address::new(0x2000), 42, 4);
    let mut types = TypeRegistry::new();
    let value = build(&mock, &mut types, &mock.value_in_memory(pointer, BASE));

    let record = render(&mock, &mut types, value, "counter", &["local.counter"]);

    assert_eq!(record.value.as_deref(), Some("0x2000 <global_counter>"));
    assert_eq!(record.type_name, "int *");
    assert_eq!(record.numchild, 1);
    let children = record.children.unwrap();
    assert_eq!(children[0].iname.as_str(), "local.counter.*");
    assert_eq!(children[0].value.as_deref(), Some("42"));
    assert_eq!(children[0].address, Some(Address::new(0x2000)));
}

#[test]
fn test_null_and_void_pointers_have_no_children()
{
    let mock = MockDebugger::new();
    let void = mock.void_type();
    let int = mock.int_type("int", 4);
    mock.write_int(BASE, 0, 8);
    mock.write_int(BASE + 8, 0x2000, 8);
    let mut types = TypeRegistry::new();
    let null = build(&mock, &mut types, &mock.value_in_memory(mock.pointer_to(int), BASE));
    let opaque = build(&mock, &mut types, &mock.value_in_memory(mock.pointer_to(void), BASE + 8));

    let null = render(&mock, &mut types, null, "null", &["local.null"]);
    let opaque = render(&mock, &mut types, opaque, "opaque", &["local.opaque"]);

    assert_eq!(null.value.as_deref(), Some("0x0"));
    assert_eq!(null.numchild, 0);
    assert_eq!(opaque.value.as_deref(), Some("0x2000"));
    assert_eq!(opaque.numchild, 0);
    assert!(opaque.children.is_none());
}

#[test]
fn test_enum_shows_enumerator_and_number()
{
    let mock = MockDebugger::new();
    let color = mock.enum_type("Color", 4, &[("Red", 0), ("Green", 1)]);
    mock.write_int(BASE, 0, 4);
    mock.write_int(BASE + 4, 1, 4);
    mock.write_int(BASE + 8, 9, 4);
    let mut types = TypeRegistry::new();
    let built = build(&mock, &mut types, &mock.value_in_memory(color, BASE));
    let handle = built.ty();

    let red = render(&mock, &mut types, built, "red", &[]);
    let green = render(&mock, &mut types, Value::at(handle, BASE + 4), "green", &[]);
    let unnamed = render(&mock, &mut types, Value::at(handle, BASE + 8), "unnamed", &[]);

    assert_eq!(red.value.as_deref(), Some("Red (0)"));
    assert_eq!(green.value.as_deref(), Some("Green (1)"));
    assert_eq!(unnamed.value.as_deref(), Some("9"));
}

#[test]
fn test_scalar_displays()
{
    let mock = MockDebugger::new();
    let boolean = mock.bool_type();
    let double = mock.float_type("double", 8);
    let unsigned = mock.int_type("unsigned char", 1);
    let signed = mock.int_type("short", 2);
    let complex = mock.complex_type("complex double", 16);
    let text = mock.string_type(5);
    mock.write_bytes(BASE, &[1]);
    mock.write_bytes(BASE + 8, &1.5f64.to_le_bytes());
    mock.write_bytes(BASE + 16, &[0xff]);
    mock.write_bytes(BASE + 24, &(-3i16).to_le_bytes());
    mock.write_bytes(BASE + 32, b"ab   ");
    let mut types = TypeRegistry::new();
    let complex = build(&mock, &mut types, &mock.detached_value(complex, vec![0; 16]).with_text("1 + 2i"));
    let cases = [
        (build(&mock, &mut types, &mock.value_in_memory(boolean, BASE)), "true"),
        (build(&mock, &mut types, &mock.value_in_memory(double, BASE + 8)), "1.5"),
        (build(&mock, &mut types, &mock.value_in_memory(unsigned, BASE + 16)), "255"),
        (build(&mock, &mut types, &mock.value_in_memory(signed, BASE + 24)), "-3"),
        (build(&mock, &mut types, &mock.value_in_memory(text, BASE + 32)), "\"ab\""),
        (complex, "1 + 2i"),
    ];

    for (value, expected) in cases {
        let record = render(&mock, &mut types, value, "v", &[]);
        assert_eq!(record.value.as_deref(), Some(expected));
        assert_eq!(record.numchild, 0);
    }
}

#[test]
fn test_wide_scalars_use_debugger_text()
{
    let mock = MockDebugger::new();
    let long_double = mock.float_type("long double", 16);
    let int128 = mock.int_type("__int128", 16);
    let mut extended = 2.5f64.to_le_bytes().to_vec();
    extended.resize(16, 0);
    let big = (1u128 << 64).to_le_bytes();
    mock.write_bytes(BASE, &extended);
    mock.write_bytes(BASE + 16, &big);
    let mut types = TypeRegistry::new();

    let cases = [
        (build(&mock, &mut types, &mock.value_in_memory(long_double, BASE)), "2.5"),
        (build(&mock, &mut types, &mock.value_in_memory(int128, BASE + 16)), "18446744073709551616"),
        (build(&mock, &mut types, &mock.detached_value(long_double, extended.clone())), "2.5"),
        (build(&mock, &mut types, &mock.detached_value(int128, big.to_vec())), "18446744073709551616"),
    ];

    for (value, expected) in cases {
        let record = render(&mock, &mut types, value, "v", &[]);
        assert_eq!(record.value.as_deref(), Some(expected));
    }
    assert_eq!(mock.allocations(), 2);
    assert_eq!(mock.releases(), 2);
}

#[test]
fn test_wide_integer_has_no_scalar_value()
{
    let mock = MockDebugger::new();
    let int128 = mock.int_type("__int128", 16);
    mock.write_bytes(BASE, &(1u128 << 64).to_le_bytes());
    let mut types = TypeRegistry::new();
    let value = build(&mock, &mut types, &mock.value_in_memory(int128, BASE));

    assert!(value.scalar(&mock, &types).is_err());
}

#[test]
fn test_optimized_out_and_unreadable_values()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let mut types = TypeRegistry::new();
    let gone = build(&mock, &mut types, &mock.optimized_out_value(int));
    let handle = gone.ty();

    let gone = render(&mock, &mut types, gone, "gone", &[]);
    let wild = render(&mock, &mut types, Value::at(handle, Address::new(0xdead_0000)), "wild", &[]);

    assert_eq!(gone.value.as_deref(), Some(OPTIMIZED_OUT));
    assert_eq!(wild.value.as_deref(), Some(NOT_ACCESSIBLE));
    assert_eq!(wild.address, Some(Address::new(0xdead_0000)));
}

#[test]
fn test_array_children_are_capped()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let array = mock.array_of(int, 4);
    for index in 0..4u64 {
        mock.write_int(BASE + index * 4, i64::try_from(index * 10).unwrap(), 4);
    }
    let mut types = TypeRegistry::new();
    let handle = types.resolve(&mock, &array);
    let config = DumperConfig {
        max_array_children: 2,
        ..DumperConfig::default()
    };

    let collapsed = render_with(&mock, &mut types, &config, Value::at(handle, BASE), "arr", &[]);
    let expanded = render_with(&mock, &mut types, &config, Value::at(handle, BASE), "arr", &["local.arr"]);

    assert_eq!(collapsed.numchild, 2);
    assert_eq!(child_values(&expanded), [("[0]", Some("0")), ("[1]", Some("10"))]);
    assert_eq!(expanded.children.unwrap()[1].iname.as_str(), "local.arr.1");
}

#[test]
fn test_depth_limits_expansion()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let inner = mock.struct_type("Inner", 4);
    mock.add_field(inner, MockField::new("v", int, 0));
    let outer = mock.struct_type("Outer", 4);
    mock.add_field(outer, MockField::new("inner", inner, 0));
    mock.write_int(BASE, 7, 4);
    let mut types = TypeRegistry::new();
    let handle = types.resolve(&mock, &outer);
    let config = DumperConfig {
        max_depth: 1,
        ..DumperConfig::default()
    };

    let record = render_with(
        &mock,
        &mut types,
        &config,
        Value::at(handle, BASE),
        "o",
        &["local.o", "local.o.inner"],
    );

    let children = record.children.unwrap();
    assert_eq!(children[0].numchild, 1);
    assert!(children[0].children.is_none());
}

#[test]
fn test_typedef_and_reference_render_through_target()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let alias = mock.typedef("MyInt", int);
    let reference = mock.reference_to(int);
    mock.write_int(BASE, 5, 4);
    mock.write_int(BASE + 8, 0x2000, 8);
    mock.write_int(Address::new(0x2000), 42, 4);
    let mut types = TypeRegistry::new();
    let alias = build(&mock, &mut types, &mock.value_in_memory(alias, BASE));
    let reference = build(&mock, &mut types, &mock.value_in_memory(reference, BASE + 8));

    let alias = render(&mock, &mut types, alias, "alias", &[]);
    let reference = render(&mock, &mut types, reference, "reference", &[]);

    assert_eq!(alias.type_name, "MyInt");
    assert_eq!(alias.value.as_deref(), Some("5"));
    assert_eq!(reference.type_name, "int &");
    assert_eq!(reference.value.as_deref(), Some("42"));
}

#[test]
fn test_detached_struct_children_release_scratch()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let point = mock.struct_type("Point", 8);
    mock.add_field(point, MockField::new("x", int, 0));
    mock.add_field(point, MockField::new("y", int, 4));
    let mut types = TypeRegistry::new();
    let handle = types.resolve(&mock, &point);
    let bytes = [1i32, 2].iter().flat_map(|n| n.to_le_bytes()).collect::<Vec<_>>();

    let record = render(&mock, &mut types, Value::detached(handle, bytes), "tmp", &["local.tmp"]);

    assert_eq!(record.address, None);
    assert_eq!(child_values(&record), [("x", Some("1")), ("y", Some("2"))]);
    assert!(mock.allocations() > 0);
    assert_eq!(mock.allocations(), mock.releases());
    assert_eq!(mock.live_scratch(), 0);
}

#[test]
fn test_rendered_values_are_remembered_by_path()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    let pointer = mock.pointer_to(int);
    mock.write_int(BASE, 0x2000, 8);
    mock.write_int(Address::new(0x2000), 1, 4);
    let mut types = TypeRegistry::new();
    let value = build(&mock, &mut types, &mock.value_in_memory(pointer, BASE))
        .with_name("p")
        .with_iname(InternalPath::local("p"));
    let config = DumperConfig::default();
    let expanded = HashSet::from([InternalPath::local("p")]);

    let mut formatter = Formatter::new(&mock, &mut types, &config);
    formatter.render(&value, &expanded, 2);
    let rendered = formatter.take_rendered();

    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[&InternalPath::local("p")], value);
    assert_eq!(
        rendered[&InternalPath::new("local.p.*")].address(),
        Some(Address::new(0x2000))
    );
}

#[test]
fn test_record_serialization_shape()
{
    let mock = MockDebugger::new();
    let int = mock.int_type("int", 4);
    mock.write_int(BASE, 42, 4);
    let mut types = TypeRegistry::new();
    let value = build(&mock, &mut types, &mock.value_in_memory(int, BASE));

    let record = render(&mock, &mut types, value, "x", &[]);
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "iname": "local.x",
            "name": "x",
            "type": "int",
            "value": "42",
            "numchild": 0,
            "address": "0x1000",
        })
    );
}
