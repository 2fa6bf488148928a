//! Common module for library exports

pub use crate::config::DumperConfig;
pub use crate::error::{LensError, NativeError, NativeResult, Result};
pub use crate::format::{Formatter, Record};
pub use crate::native::{NativeDebugger, NativeField, NativeScope, NativeSymbol, NativeTemplateArgument, NativeTypeCode};
pub use crate::session::{FetchRequest, FetchResponse, Session, TypeInfo};
pub use crate::types::{Address, Scalar, TemplateArgument, Type, TypeCode, TypeHandle, TypeKey, TypeKind, TypeRegistry};
pub use crate::value::{InternalPath, Location, Members, ScratchBuffer, Value, ValueBuilder};
