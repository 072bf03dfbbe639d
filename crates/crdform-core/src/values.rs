//! Raw configuration documents with deep merge and `--set` overrides
//!
//! Configuration files are loaded as untyped JSON, layered, and only then
//! decoded against a kind's schema.

use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// An untyped configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct Values(pub JsonValue);

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl Values {
    /// Create an empty document
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load a YAML (or JSON) document from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(match value {
            JsonValue::Null => JsonValue::Object(serde_json::Map::new()),
            other => other,
        }))
    }

    /// Merge another document on top of this one
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value by dotted path (e.g. "spec.health_check.enabled")
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(CoreError::InvalidSet {
                arg: path.to_string(),
            });
        }
        set_nested(&mut self.0, &parts, value, path)
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .try_fold(&self.0, |current, key| current.get(key))
    }

    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

fn set_nested(
    value: &mut JsonValue,
    path: &[&str],
    new_value: JsonValue,
    full: &str,
) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(());
    };

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }
    let JsonValue::Object(map) = value else {
        return Err(CoreError::InvalidSet {
            arg: full.to_string(),
        });
    };

    if rest.is_empty() {
        map.insert(first.to_string(), new_value);
        return Ok(());
    }

    let child = map
        .entry(first.to_string())
        .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
    set_nested(child, rest, new_value, full)
}

/// Parse `--set key=value` arguments into a document
///
/// Values are typed loosely: `true`/`false`/`null`, integers, floats and
/// JSON arrays or objects are recognized, anything else is a string.
pub fn parse_set_values(set_args: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for arg in set_args {
        let (key, val) = arg
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidSet { arg: arg.clone() })?;

        let json_value = if val == "true" {
            JsonValue::Bool(true)
        } else if val == "false" {
            JsonValue::Bool(false)
        } else if val == "null" {
            JsonValue::Null
        } else if let Ok(num) = val.parse::<i64>() {
            JsonValue::Number(num.into())
        } else if let Some(num) = val
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            JsonValue::Number(num)
        } else if val.starts_with('[') || val.starts_with('{') {
            serde_json::from_str(val).unwrap_or_else(|_| JsonValue::String(val.to_string()))
        } else {
            JsonValue::String(val.to_string())
        };

        values.set(key, json_value)?;
    }

    Ok(values)
}
