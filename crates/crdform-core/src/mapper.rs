//! Bidirectional mapping between attribute values and Kubernetes JSON
//!
//! Three conversions share one schema descriptor:
//! - [`to_json`]: attribute tree -> wire JSON (camelCase keys, unset optionals omitted)
//! - [`from_json`]: wire JSON -> attribute tree (undeclared fields dropped)
//! - [`from_config`]: user configuration (snake_case keys) -> attribute tree (strict)

use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::schema::{AttrType, Attribute};
use crate::suggest;
use crate::value::AttrValue;

/// Encode an object value into wire JSON
///
/// Null optional attributes are omitted; a null required attribute is an error.
pub fn to_json(attrs: &[Attribute], value: &AttrValue, path: &str) -> Result<JsonValue> {
    let fields = match value {
        AttrValue::Object(fields) => fields,
        AttrValue::Null => return Ok(JsonValue::Object(JsonMap::new())),
        other => {
            return Err(CoreError::TypeMismatch {
                path: path.to_string(),
                expected: "object".to_string(),
                found: other.type_name().to_string(),
            });
        }
    };

    let mut out = JsonMap::new();
    for attr in attrs {
        let attr_path = format!("{}.{}", path, attr.name);
        let field = fields.get(&attr.name).unwrap_or(&AttrValue::Null);

        if field.is_null() {
            if attr.required {
                return Err(CoreError::MissingRequired { path: attr_path });
            }
            continue;
        }

        let encoded = encode(&attr.attr_type, field, &attr_path)?;
        out.insert(attr.json_name.clone(), encoded);
    }

    Ok(JsonValue::Object(out))
}

fn encode(attr_type: &AttrType, value: &AttrValue, path: &str) -> Result<JsonValue> {
    match (attr_type, value) {
        (_, AttrValue::Null) => Ok(JsonValue::Null),
        (AttrType::String, AttrValue::String(s)) => Ok(JsonValue::String(s.clone())),
        (AttrType::Bool, AttrValue::Bool(b)) => Ok(JsonValue::Bool(*b)),
        (AttrType::Int64, AttrValue::Int(i)) => Ok(JsonValue::from(*i)),
        (AttrType::Number, AttrValue::Int(i)) => Ok(JsonValue::from(*i)),
        (AttrType::Number, AttrValue::Number(n)) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .ok_or_else(|| CoreError::InvalidValue {
                path: path.to_string(),
                message: format!("{} is not a finite number", n),
            }),
        (AttrType::Map, AttrValue::Map(map)) => Ok(JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect(),
        )),
        (AttrType::List(inner), AttrValue::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| encode(inner, item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        (AttrType::Object(nested), AttrValue::Object(_)) => to_json(nested, value, path),
        (expected, found) => Err(mismatch(path, expected, found.type_name())),
    }
}

/// Decode wire JSON into an object value
///
/// Every declared attribute is present in the result (`Null` when absent);
/// keys the schema does not declare are dropped.
pub fn from_json(attrs: &[Attribute], json: &JsonValue, path: &str) -> Result<AttrValue> {
    let fields = match json {
        JsonValue::Object(fields) => fields,
        JsonValue::Null => return Ok(AttrValue::Null),
        other => return Err(mismatch(path, &AttrType::Object(Vec::new()), json_type(other))),
    };

    let mut out = BTreeMap::new();
    for attr in attrs {
        let attr_path = format!("{}.{}", path, attr.name);
        let decoded = match fields.get(&attr.json_name) {
            Some(v) => decode(&attr.attr_type, v, &attr_path)?,
            None => AttrValue::Null,
        };
        out.insert(attr.name.clone(), decoded);
    }

    Ok(AttrValue::Object(out))
}

/// Whole float that converts to i64 without saturating
fn is_whole_i64(f: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

fn decode(attr_type: &AttrType, json: &JsonValue, path: &str) -> Result<AttrValue> {
    match (attr_type, json) {
        (_, JsonValue::Null) => Ok(AttrValue::Null),
        (AttrType::String, JsonValue::String(s)) => Ok(AttrValue::String(s.clone())),
        // int-or-string fields are modelled as strings
        (AttrType::String, JsonValue::Number(n)) => Ok(AttrValue::String(n.to_string())),
        (AttrType::Bool, JsonValue::Bool(b)) => Ok(AttrValue::Bool(*b)),
        (AttrType::Int64, JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_whole_i64(*f)).map(|f| f as i64))
            .map(AttrValue::Int)
            .ok_or_else(|| mismatch(path, attr_type, "number")),
        (AttrType::Number, JsonValue::Number(n)) => n
            .as_f64()
            .map(AttrValue::Number)
            .ok_or_else(|| mismatch(path, attr_type, "number")),
        (AttrType::Map, JsonValue::Object(map)) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                let s = match v {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.insert(k.clone(), s);
            }
            Ok(AttrValue::Map(out))
        }
        (AttrType::List(inner), JsonValue::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode(inner, item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>>>()
            .map(AttrValue::List),
        (AttrType::Object(nested), JsonValue::Object(_)) => from_json(nested, json, path),
        (expected, found) => Err(mismatch(path, expected, json_type(found))),
    }
}

/// Decode user configuration (keyed by attribute names) into an object value
///
/// Unlike [`from_json`], unknown keys are rejected with a suggestion, and
/// scalars given as strings are coerced to the declared type.
pub fn from_config(attrs: &[Attribute], json: &JsonValue, path: &str) -> Result<AttrValue> {
    let fields = match json {
        JsonValue::Object(fields) => fields,
        JsonValue::Null => return Ok(AttrValue::Null),
        other => return Err(mismatch(path, &AttrType::Object(Vec::new()), json_type(other))),
    };

    for key in fields.keys() {
        if !attrs.iter().any(|a| &a.name == key) {
            let suggestions =
                suggest::closest_matches(key, attrs.iter().map(|a| a.name.as_str()), 1);
            return Err(CoreError::UnknownAttribute {
                path: path.to_string(),
                name: key.clone(),
                hint: suggest::hint(&suggestions),
            });
        }
    }

    let mut out = BTreeMap::new();
    for attr in attrs {
        let attr_path = format!("{}.{}", path, attr.name);
        let decoded = match fields.get(&attr.name) {
            Some(v) => decode_config(&attr.attr_type, v, &attr_path)?,
            None => AttrValue::Null,
        };
        out.insert(attr.name.clone(), decoded);
    }

    Ok(AttrValue::Object(out))
}

fn decode_config(attr_type: &AttrType, json: &JsonValue, path: &str) -> Result<AttrValue> {
    match (attr_type, json) {
        (AttrType::Object(nested), JsonValue::Object(_)) => from_config(nested, json, path),
        (AttrType::List(inner), JsonValue::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode_config(inner, item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>>>()
            .map(AttrValue::List),
        (AttrType::Bool, JsonValue::String(s)) => s
            .parse::<bool>()
            .map(AttrValue::Bool)
            .map_err(|_| mismatch(path, attr_type, "string")),
        (AttrType::Int64, JsonValue::String(s)) => s
            .parse::<i64>()
            .map(AttrValue::Int)
            .map_err(|_| mismatch(path, attr_type, "string")),
        (AttrType::Number, JsonValue::String(s)) => s
            .parse::<f64>()
            .map(AttrValue::Number)
            .map_err(|_| mismatch(path, attr_type, "string")),
        (AttrType::String, JsonValue::Bool(b)) => Ok(AttrValue::String(b.to_string())),
        (AttrType::Int64, JsonValue::Number(n)) if n.as_i64().is_none() => {
            Err(CoreError::InvalidValue {
                path: path.to_string(),
                message: format!("{} is not a whole number", n),
            })
        }
        _ => decode(attr_type, json, path),
    }
}

fn mismatch(path: &str, expected: &AttrType, found: &str) -> CoreError {
    CoreError::TypeMismatch {
        path: path.to_string(),
        expected: expected.name(),
        found: found.to_string(),
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}
