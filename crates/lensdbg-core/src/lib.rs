//! # lensdbg-core
//!
//! Value and type introspection for debugger frontends.
//!
//! Given a host debugger that can describe native types and read inferior
//! memory, this crate rebuilds a debugger-independent view of program data:
//!
//! - Interning native types into canonical, deduplicated records ([`types`])
//! - Building typed values, by address when possible ([`value`])
//! - Listing struct members with bitfield correction ([`value::Members`])
//! - Rendering value trees on demand into serializable records ([`format`])
//! - Serving variable, watch and expansion requests ([`Session`])
//!
//! ## Host Integration
//!
//! The host debugger is reached only through the [`NativeDebugger`] trait. A gdb
//! or lldb bridge implements it over the debugger's scripting API; tests use an
//! in-memory implementation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lensdbg_core::prelude::*;
//!
//! let mut session = Session::new(backend, DumperConfig::from_env());
//! let response = session.fetch_variables(&FetchRequest::default());
//! println!("{}", serde_json::to_string(&response.data)?);
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod native;
pub mod prelude;
pub mod session;
pub mod types;
pub mod value;

pub use config::DumperConfig;
pub use error::{LensError, NativeError, NativeResult, Result};
pub use format::{Formatter, Record};
pub use native::NativeDebugger;
pub use session::{FetchRequest, FetchResponse, Session, TypeInfo};
