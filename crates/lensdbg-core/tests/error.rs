//! Tests for error handling

use lensdbg_core::error::{LensError, NativeError, Result, TypeResolutionError};
use lensdbg_core::types::Address;

#[test]
fn test_native_error_display()
{
    let error = NativeError::new("Cannot access memory at address 0x0");
    assert_eq!(error.to_string(), "Cannot access memory at address 0x0");
}

#[test]
fn test_native_error_to_lens_error()
{
    let native = NativeError::new("No frame selected.");
    let error: LensError = native.clone().into();

    match error {
        LensError::Native(inner) => assert_eq!(inner, native),
        _ => panic!("Expected Native variant"),
    }
}

#[test]
fn test_type_resolution_error_to_lens_error()
{
    let error: LensError = TypeResolutionError::ZeroSizedElement("Empty [3]".to_owned()).into();
    let message = error.to_string();
    assert!(message.contains("Type resolution failed"));
    assert!(message.contains("Empty [3]"));
}

#[test]
fn test_unknown_template_argument_display()
{
    let error = TypeResolutionError::UnknownTemplateArgument {
        owner: "Holder<Tmpl>".to_owned(),
        position: 1,
    };
    let message = error.to_string();
    assert!(message.contains("template argument 1"));
    assert!(message.contains("Holder<Tmpl>"));
}

#[test]
fn test_evaluation_error_display()
{
    let error = LensError::Evaluation {
        expression: "foo->bar()".to_owned(),
        reason: "No symbol \"foo\" in current context.".to_owned(),
    };
    let message = error.to_string();
    assert!(message.contains("foo->bar()"));
    assert!(message.contains("No symbol"));
}

#[test]
fn test_resource_error_display()
{
    let error = LensError::Resource {
        address: Some(Address::new(0x7f00_0000)),
        reason: "free failed".to_owned(),
    };
    let message = error.to_string();
    assert!(message.contains("Scratch memory"));
    assert!(message.contains("free failed"));
}

#[test]
fn test_result_type_alias()
{
    fn returns_result() -> Result<u64>
    {
        Ok(42)
    }

    fn returns_error() -> Result<u64>
    {
        Err(LensError::InvalidArgument("test".to_owned()))
    }

    assert_eq!(returns_result().unwrap(), 42);
    assert!(matches!(returns_error(), Err(LensError::InvalidArgument(_))));
}
