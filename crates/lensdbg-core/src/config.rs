//! # Dumper Configuration
//!
//! Session-wide knobs for value introspection.
//!
//! ## Environment Variables
//!
//! - `LENSDBG_DYNAMIC_TYPE`: reclassify values to their runtime type
//!   (`true`/`false`, `1`/`0`, `on`/`off`; default `true`)
//! - `LENSDBG_ARRAY_LIMIT`: maximum number of array elements listed as children
//!   (default `100`)
//! - `LENSDBG_MAX_DEPTH`: maximum nesting rendered for expanded values
//!   (default `8`)
//!
//! Invalid values are reported with `warn!` and replaced by the default.

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Default number of array elements listed as children.
pub const DEFAULT_ARRAY_LIMIT: u64 = 100;

/// Default nesting depth for expanded values.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Introspection settings shared by every request of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumperConfig
{
    /// Build values with their most-derived runtime type
    pub use_dynamic_type: bool,
    /// Upper bound on listed array children
    pub max_array_children: u64,
    /// Upper bound on rendering depth
    pub max_depth: usize,
}

impl Default for DumperConfig
{
    fn default() -> Self
    {
        Self {
            use_dynamic_type: true,
            max_array_children: DEFAULT_ARRAY_LIMIT,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DumperConfig
{
    /// Read the configuration from `LENSDBG_*` environment variables.
    pub fn from_env() -> Self
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// ```rust
    /// use lensdbg_core::config::DumperConfig;
    ///
    /// let config = DumperConfig::from_lookup(|key| (key == "LENSDBG_MAX_DEPTH").then(|| "3".to_owned()));
    /// assert_eq!(config.max_depth, 3);
    /// assert!(config.use_dynamic_type);
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self
    {
        let defaults = Self::default();
        Self {
            use_dynamic_type: read_setting(&lookup, "LENSDBG_DYNAMIC_TYPE", defaults.use_dynamic_type, parse_flag),
            max_array_children: read_setting(&lookup, "LENSDBG_ARRAY_LIMIT", defaults.max_array_children, u64::from_str),
            max_depth: read_setting(&lookup, "LENSDBG_MAX_DEPTH", defaults.max_depth, usize::from_str),
        }
    }
}

fn read_setting<T, E: std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Result<T, E>,
) -> T
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match parse(raw.trim()) {
        Ok(value) => value,
        Err(err) => {
            warn!("Ignoring {key}={raw}: {err}");
            default
        }
    }
}

fn parse_flag(s: &str) -> Result<bool, String>
{
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("Unknown flag value: {s}. Use 'true' or 'false'")),
    }
}

#[cfg(test)]
mod tests
{
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> DumperConfig
    {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        DumperConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables()
    {
        assert_eq!(config_from(&[]), DumperConfig::default());
    }

    #[test]
    fn test_reads_every_variable()
    {
        let config = config_from(&[
            ("LENSDBG_DYNAMIC_TYPE", "off"),
            ("LENSDBG_ARRAY_LIMIT", "16"),
            ("LENSDBG_MAX_DEPTH", " 2 "),
        ]);
        assert!(!config.use_dynamic_type);
        assert_eq!(config.max_array_children, 16);
        assert_eq!(config.max_depth, 2);
    }

    #[test]
    fn test_invalid_values_fall_back()
    {
        let config = config_from(&[("LENSDBG_DYNAMIC_TYPE", "maybe"), ("LENSDBG_ARRAY_LIMIT", "-1")]);
        assert!(config.use_dynamic_type);
        assert_eq!(config.max_array_children, DEFAULT_ARRAY_LIMIT);
    }
}
