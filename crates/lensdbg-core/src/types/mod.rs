//! # Types
//!
//! The internal, debugger-independent type model and the registry that builds
//! it from native types.

pub mod address;
pub mod model;
pub mod registry;

pub use address::Address;
pub use model::{Scalar, TemplateArgument, Type, TypeCode, TypeHandle, TypeKey, TypeKind};
pub use registry::{TypeRegistry, strip_type_qualifiers, structural_key};
