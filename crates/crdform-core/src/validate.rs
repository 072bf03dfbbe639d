//! Declarative attribute validators
//!
//! Validators are plain data attached to attributes, evaluated against
//! configured values before anything is sent to the cluster.

use regex::Regex;
use serde::Serialize;

use crate::schema::{AttrType, Attribute};
use crate::value::AttrValue;

/// A single declarative constraint on an attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Validator {
    /// String length (or list size) within `[min, max]`
    LengthBetween { min: u64, max: u64 },
    LengthAtLeast(u64),
    LengthAtMost(u64),
    /// String must be one of the listed values
    OneOf(Vec<String>),
    /// Integer within `[min, max]`
    IntBetween { min: i64, max: i64 },
    IntAtLeast(i64),
    IntAtMost(i64),
    /// Number within `[min, max]`
    NumberBetween { min: f64, max: f64 },
    NumberAtLeast(f64),
    NumberAtMost(f64),
    /// String must match the regular expression
    RegexMatches { pattern: String, message: String },
    /// Constraints applied to every element of a list
    Items(Vec<Validator>),
}

impl Validator {
    /// Check a non-null value, returning a message describing the violation
    pub fn check(&self, value: &AttrValue) -> Result<(), String> {
        match self {
            Validator::LengthBetween { min, max } => match length_of(value) {
                Some(len) if len < *min || len > *max => Err(format!(
                    "length must be between {} and {}, got {}",
                    min, max, len
                )),
                _ => Ok(()),
            },
            Validator::LengthAtLeast(min) => match length_of(value) {
                Some(len) if len < *min => {
                    Err(format!("length must be at least {}, got {}", min, len))
                }
                _ => Ok(()),
            },
            Validator::LengthAtMost(max) => match length_of(value) {
                Some(len) if len > *max => {
                    Err(format!("length must be at most {}, got {}", max, len))
                }
                _ => Ok(()),
            },
            Validator::OneOf(allowed) => match value {
                AttrValue::String(s) if !allowed.iter().any(|a| a == s) => Err(format!(
                    "value must be one of: [{}], got \"{}\"",
                    allowed
                        .iter()
                        .map(|a| format!("\"{}\"", a))
                        .collect::<Vec<_>>()
                        .join(" "),
                    s
                )),
                _ => Ok(()),
            },
            Validator::IntBetween { min, max } => match value {
                AttrValue::Int(i) if i < min || i > max => Err(format!(
                    "value must be between {} and {}, got: {}",
                    min, max, i
                )),
                _ => Ok(()),
            },
            Validator::IntAtLeast(min) => match value {
                AttrValue::Int(i) if i < min => {
                    Err(format!("value must be at least {}, got: {}", min, i))
                }
                _ => Ok(()),
            },
            Validator::IntAtMost(max) => match value {
                AttrValue::Int(i) if i > max => {
                    Err(format!("value must be at most {}, got: {}", max, i))
                }
                _ => Ok(()),
            },
            Validator::NumberBetween { min, max } => match number_of(value) {
                Some(n) if n < *min || n > *max => Err(format!(
                    "value must be between {} and {}, got: {}",
                    min, max, n
                )),
                _ => Ok(()),
            },
            Validator::NumberAtLeast(min) => match number_of(value) {
                Some(n) if n < *min => Err(format!("value must be at least {}, got: {}", min, n)),
                _ => Ok(()),
            },
            Validator::NumberAtMost(max) => match number_of(value) {
                Some(n) if n > *max => Err(format!("value must be at most {}, got: {}", max, n)),
                _ => Ok(()),
            },
            Validator::RegexMatches { pattern, message } => match value {
                AttrValue::String(s) => {
                    let re = Regex::new(pattern)
                        .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))?;
                    if re.is_match(s) {
                        Ok(())
                    } else if message.is_empty() {
                        Err(format!("value must match pattern '{}', got \"{}\"", pattern, s))
                    } else {
                        Err(format!("{}, got \"{}\"", message, s))
                    }
                }
                _ => Ok(()),
            },
            Validator::Items(inner) => match value {
                AttrValue::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if item.is_null() {
                            continue;
                        }
                        for validator in inner {
                            validator
                                .check(item)
                                .map_err(|message| format!("element {}: {}", i, message))?;
                        }
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
        }
    }
}

fn number_of(value: &AttrValue) -> Option<f64> {
    match value {
        AttrValue::Number(n) => Some(*n),
        AttrValue::Int(i) => Some(*i as f64),
        _ => None,
    }
}

fn length_of(value: &AttrValue) -> Option<u64> {
    match value {
        AttrValue::String(s) => Some(s.chars().count() as u64),
        AttrValue::List(items) => Some(items.len() as u64),
        AttrValue::Map(map) => Some(map.len() as u64),
        _ => None,
    }
}

/// A validation failure at a specific attribute path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate an object value against its attribute list
///
/// Reports missing required attributes and every validator violation,
/// with dotted paths rooted at `prefix` (e.g. `spec.ports[0].port`).
pub fn validate_object(
    attrs: &[Attribute],
    value: &AttrValue,
    prefix: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    walk_object(attrs, value, prefix, &mut issues);
    issues
}

fn walk_object(
    attrs: &[Attribute],
    value: &AttrValue,
    prefix: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for attr in attrs {
        let path = format!("{}.{}", prefix, attr.name);
        let field = value.get(&attr.name).unwrap_or(&AttrValue::Null);

        if field.is_null() {
            if attr.required {
                issues.push(ValidationIssue {
                    path,
                    message: "attribute is required".to_string(),
                });
            }
            continue;
        }

        walk_value(attr, &attr.attr_type, field, &path, issues);
    }
}

fn walk_value(
    attr: &Attribute,
    attr_type: &AttrType,
    value: &AttrValue,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match (attr_type, value) {
        (AttrType::Object(nested), AttrValue::Object(_)) => {
            walk_object(nested, value, path, issues);
        }
        (AttrType::List(inner), AttrValue::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                match inner.as_ref() {
                    AttrType::Object(nested) => walk_object(nested, item, &item_path, issues),
                    other => {
                        if let Err(message) = check_scalar(other, item) {
                            issues.push(ValidationIssue { path: item_path, message });
                        }
                    }
                }
            }
        }
        (other, value) => {
            if let Err(message) = check_scalar(other, value) {
                issues.push(ValidationIssue {
                    path: path.to_string(),
                    message,
                });
                return;
            }
        }
    }

    for validator in &attr.validators {
        if let (Validator::Items(inner), AttrValue::List(items)) = (validator, value) {
            check_items(inner, items, path, issues);
            continue;
        }
        if let Err(message) = validator.check(value) {
            issues.push(ValidationIssue {
                path: path.to_string(),
                message,
            });
        }
    }
}

fn check_items(
    validators: &[Validator],
    items: &[AttrValue],
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for (i, item) in items.iter().enumerate() {
        if item.is_null() {
            continue;
        }
        let item_path = format!("{}[{}]", path, i);
        for validator in validators {
            if let Err(message) = validator.check(item) {
                issues.push(ValidationIssue {
                    path: item_path.clone(),
                    message,
                });
            }
        }
    }
}

fn check_scalar(attr_type: &AttrType, value: &AttrValue) -> Result<(), String> {
    let ok = matches!(
        (attr_type, value),
        (AttrType::String, AttrValue::String(_))
            | (AttrType::Bool, AttrValue::Bool(_))
            | (AttrType::Int64, AttrValue::Int(_))
            | (AttrType::Number, AttrValue::Number(_) | AttrValue::Int(_))
            | (AttrType::Map, AttrValue::Map(_))
            | (AttrType::Object(_), AttrValue::Object(_))
            | (AttrType::List(_), AttrValue::List(_))
            | (_, AttrValue::Null)
    );
    if ok {
        Ok(())
    } else {
        Err(format!(
            "expected {}, got {}",
            attr_type.name(),
            value.type_name()
        ))
    }
}
