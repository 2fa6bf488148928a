//! # Logging Utilities
//!
//! Logging infrastructure for lensdbg using `tracing`.
//!
//! A debugger bridge runs inside the host debugger, whose stdout carries the
//! protocol spoken with the IDE. Console output therefore goes to stderr, and
//! [`init_logging_for_bridge`] writes to a file only.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lensdbg_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Bridge loaded");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=lensdbg_core=trace`)
//! - `LENSDBG_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `LENSDBG_LOG_FILE`: Optional path to a log file, rotated daily
//!
//! ## Examples
//!
//! ```rust,no_run
//! use lensdbg_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! init_logging_with_level(LogLevel::Debug, LogFormat::Json).expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Keeps the background file writer alive for the rest of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable output (default)
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "text" => Ok(LogFormat::Pretty),
            "json" | "prod" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Initialize logging from the environment
///
/// Reads `RUST_LOG`, `LENSDBG_LOG_FORMAT` and `LENSDBG_LOG_FILE`. Events go to
/// stderr, and to the log file as well when one is configured.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `LENSDBG_LOG_FORMAT` holds an unknown format
/// - The log file directory cannot be created
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = match env::var("LENSDBG_LOG_FORMAT") {
        Ok(raw) => raw.parse()?,
        Err(_) => LogFormat::Pretty,
    };

    // A plain level in RUST_LOG doubles as the default; directives are left to EnvFilter
    let default_level = env::var("RUST_LOG")
        .ok()
        .and_then(|raw| raw.parse::<LogLevel>().ok())
        .map_or(Level::INFO, Into::into);

    init_with(format, default_level)
}

/// Initialize logging with explicit level and format
///
/// `RUST_LOG`, when set, still refines the filter. `LENSDBG_LOG_FILE` is
/// honored as in [`init_logging`].
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_with(format, level.into())
}

/// Initialize file-only logging for use inside a host debugger
///
/// Nothing is written to stdout or stderr, which belong to the host. The log
/// goes to `LENSDBG_LOG_FILE` when set, otherwise to
/// `~/.lensdbg/YYYY-MM-DD-lensdbg-bridge.log` (or the same name under the
/// system temp directory when there is no home directory).
///
/// ## Arguments
///
/// * `level` - Optional log level. If `None`, uses `RUST_LOG` or defaults to `INFO`.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// cannot be created.
pub fn init_logging_for_bridge(level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    let log_file = match env::var("LENSDBG_LOG_FILE") {
        Ok(path) => PathBuf::from(path),
        Err(_) => default_bridge_log_file()?,
    };

    let filter = match level {
        Some(level) => EnvFilter::new(Level::from(level).to_string()),
        None => env_filter(Level::INFO),
    };

    let (appender, guard) = non_blocking_file(&log_file, |dir, file| tracing_appender::rolling::never(dir, file))?;
    Registry::default()
        .with(layer_for(LogFormat::Pretty, appender, false, filter))
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    let _ = FILE_GUARD.set(guard);

    Ok(log_file)
}

/// Route events into the test harness output
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_logging_for_tests()
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(Level::DEBUG))
        .with_test_writer()
        .without_time()
        .try_init();
}

fn init_with(format: LogFormat, default_level: Level) -> Result<(), LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![layer_for(format, io::stderr, true, env_filter(default_level))];

    let mut guard = None;
    if let Some(log_file) = env::var("LENSDBG_LOG_FILE").ok().map(PathBuf::from) {
        let (appender, file_guard) = non_blocking_file(&log_file, |dir, file| tracing_appender::rolling::daily(dir, file))?;
        layers.push(layer_for(format, appender, false, env_filter(default_level)));
        guard = Some(file_guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    if let Some(guard) = guard {
        let _ = FILE_GUARD.set(guard);
    }
    Ok(())
}

/// `RUST_LOG` when it parses, `default_level` otherwise.
fn env_filter(default_level: Level) -> EnvFilter
{
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
}

fn layer_for<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => base.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn non_blocking_file(
    path: &Path,
    appender: fn(&Path, &Path) -> RollingFileAppender,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError>
{
    let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(directory)?;
    let file_name = path.file_name().map_or_else(|| Path::new("lensdbg.log"), Path::new);
    Ok(tracing_appender::non_blocking(appender(directory, file_name)))
}

fn default_bridge_log_file() -> Result<PathBuf, LoggingError>
{
    let name = format!("{}-lensdbg-bridge.log", Utc::now().format("%Y-%m-%d"));
    match env::var("HOME") {
        Ok(home) => {
            let dir = PathBuf::from(home).join(".lensdbg");
            std::fs::create_dir_all(&dir)?;
            Ok(dir.join(name))
        }
        Err(_) => Ok(env::temp_dir().join(name)),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber is already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Pretty);
        assert!(matches!(LogFormat::from_str("xml"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(matches!(LogLevel::from_str("loud"), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_tests_initializer_is_reentrant()
    {
        init_logging_for_tests();
        init_logging_for_tests();
        tracing::debug!("still logging");
    }
}
