//! Recursive attribute value tree
//!
//! `AttrValue` holds configuration and state for any kind. Object keys are
//! attribute (snake_case) names; the JSON names only appear on the wire.

use serde::Serialize;
use std::collections::BTreeMap;

/// A dynamically shaped attribute value
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, String>),
    Object(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Build an object from `(name, value)` pairs
    pub fn object<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, AttrValue)>,
    {
        AttrValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Build a string map from `(key, value)` pairs
    pub fn map<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        AttrValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Field of an object value
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        match self {
            AttrValue::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Follow a path of object field names
    pub fn path(&self, segments: &[&str]) -> Option<&AttrValue> {
        segments
            .iter()
            .try_fold(self, |current, segment| current.get(segment))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short type name used in mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int64",
            AttrValue::Number(_) => "number",
            AttrValue::String(_) => "string",
            AttrValue::List(_) => "list",
            AttrValue::Map(_) => "map",
            AttrValue::Object(_) => "object",
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_lookup() {
        let value = AttrValue::object([(
            "health_check",
            AttrValue::object([("enabled", AttrValue::from(true))]),
        )]);

        assert_eq!(
            value.path(&["health_check", "enabled"]).and_then(AttrValue::as_bool),
            Some(true)
        );
        assert!(value.path(&["health_check", "missing"]).is_none());
        assert!(value.path(&["vip", "x"]).is_none());
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let value = AttrValue::object([
            ("vip", AttrValue::from("10.0.0.1")),
            ("selector", AttrValue::map([("app", "web")])),
            ("weight", AttrValue::Null),
            ("ports", AttrValue::List(vec![AttrValue::Int(80)])),
        ]);

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "vip": "10.0.0.1",
                "selector": {"app": "web"},
                "weight": null,
                "ports": [80]
            })
        );
    }

    #[test]
    fn test_option_conversion() {
        assert!(AttrValue::from(None::<String>).is_null());
        assert_eq!(AttrValue::from(Some("x")), AttrValue::from("x"));
    }
}
