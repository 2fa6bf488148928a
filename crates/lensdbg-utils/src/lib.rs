//! # lensdbg Utilities
//!
//! Shared logging setup for lensdbg.
//!
//! The introspection core only emits `tracing` events. Whoever embeds it (a
//! debugger bridge, a test suite) picks one of the initializers here to decide
//! where those events go.

pub mod logging;

pub use logging::{
    LogFormat, LogLevel, LoggingError, init_logging, init_logging_for_bridge, init_logging_for_tests,
    init_logging_with_level,
};
pub use tracing::{debug, error, info, trace, warn};
