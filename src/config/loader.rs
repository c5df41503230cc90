use std::fs;
use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::config::types::Settings;
use crate::config::validation;
use crate::utils::error::{TocError, TocResult};

/// Load a settings file and merge it over the defaults.
///
/// The format is picked from the extension: YAML, TOML or JSON.
pub fn load_settings_file<P: AsRef<Path>>(path: P) -> TocResult<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TocError::Config(format!(
            "Settings file not found: {}", path.display()
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| TocError::Config(format!(
            "Failed to read settings file {}: {}", path.display(), e
        )))?;

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "yml".to_string());

    let value = match ext.as_str() {
        "yml" | "yaml" => parse_yaml(&content, path)?,
        "toml" => parse_toml(&content, path)?,
        "json" => parse_json(&content, path)?,
        other => {
            return Err(TocError::Config(format!(
                "Unsupported settings file format: {}", other
            )));
        }
    };

    debug!("Loading settings from {}", path.display());
    let settings = merge_over_defaults(&value)?;
    validation::validate_settings(&settings)?;

    Ok(settings)
}

/// Shallow merge of a loaded bundle over the built-in defaults.
///
/// Each top-level key present in `loaded` replaces the default for that
/// key; nested values are not merged. `null` or a non-object yields the defaults.
pub fn merge_over_defaults(loaded: &Value) -> TocResult<Settings> {
    let Value::Object(loaded) = loaded else {
        debug!("Settings bundle is not an object, using defaults");
        return Ok(Settings::default());
    };

    let mut merged = match serde_json::to_value(Settings::default())? {
        Value::Object(map) => map,
        _ => return Ok(Settings::default()),
    };

    for (key, value) in loaded {
        if merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        } else {
            debug!("Ignoring unknown settings key: {}", key);
        }
    }

    serde_json::from_value(Value::Object(merged))
        .map_err(|e| TocError::Config(format!("Invalid settings bundle: {}", e)))
}

fn parse_yaml(content: &str, path: &Path) -> TocResult<Value> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| TocError::Config(format!(
            "Failed to parse YAML settings ({}): {}", path.display(), e
        )))?;

    serde_json::to_value(yaml)
        .map_err(|e| TocError::Config(format!(
            "Unsupported YAML settings ({}): {}", path.display(), e
        )))
}

fn parse_toml(content: &str, path: &Path) -> TocResult<Value> {
    let table: toml::Value = toml::from_str(content)
        .map_err(|e| TocError::Config(format!(
            "Failed to parse TOML settings ({}): {}", path.display(), e
        )))?;

    serde_json::to_value(table).map_err(TocError::from)
}

fn parse_json(content: &str, path: &Path) -> TocResult<Value> {
    serde_json::from_str(content)
        .map_err(|e| TocError::Config(format!(
            "Failed to parse JSON settings ({}): {}", path.display(), e
        )))
}
