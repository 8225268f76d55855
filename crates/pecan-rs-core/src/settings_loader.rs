//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Deep-merge a TOML or JSON document over the defaults.
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `PECAN_DEBUG` | `debug` |
//! | `PECAN_LOG_LEVEL` | `log_level` |
//! | `PECAN_HOST` | `server.host` |
//! | `PECAN_PORT` | `server.port` |
//! | `PECAN_FORCE_CANONICAL` | `app.force_canonical` |
//! | `PECAN_STRICT_ARGUMENTS` | `app.strict_arguments` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use pecan_rs_core::settings_loader;
//!
//! let settings = settings_loader::from_file_with_env("config/app.toml").unwrap();
//! println!("serving on {}", settings.server.addr());
//! ```

use std::path::Path;

use crate::error::PecanError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Fields missing from the document keep their default values, including
/// fields of nested tables such as `[app]`.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, PecanError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| PecanError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, PecanError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| PecanError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a file, choosing the format from its extension.
///
/// `.json` files are parsed as JSON; everything else is parsed as TOML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content is malformed.
pub fn from_file(path: impl AsRef<Path>) -> Result<Settings, PecanError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        PecanError::ConfigurationError(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        from_json_str(&content)
    } else {
        from_toml_str(&content)
    }
}

/// Loads settings from a file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content is malformed.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, PecanError> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `PECAN_*` environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes" (case-insensitive) as true and
/// anything else as false. An unparsable `PECAN_PORT` is ignored with a warning.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

fn apply_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("PECAN_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Some(val) = var("PECAN_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = var("PECAN_HOST") {
        settings.server.host = val;
    }

    if let Some(val) = var("PECAN_PORT") {
        match val.parse::<u16>() {
            Ok(port) => settings.server.port = port,
            Err(e) => tracing::warn!(value = %val, "Ignoring invalid PECAN_PORT: {e}"),
        }
    }

    if let Some(val) = var("PECAN_FORCE_CANONICAL") {
        settings.app.force_canonical = parse_bool(&val);
    }

    if let Some(val) = var("PECAN_STRICT_ARGUMENTS") {
        settings.app.strict_arguments = parse_bool(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, PecanError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        PecanError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        PecanError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
