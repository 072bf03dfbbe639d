//! Post-apply wait conditions
//!
//! A `wait_for` block names a JSONPath into the applied object and an
//! optional expected value. Timeouts are Go-style duration strings:
//! unset means 30s, zero means check once, negative means one week.

use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::schema::{AttrType, Attribute};

/// Timeout used when `wait_for.timeout` is unset
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound used for negative timeouts
pub const MAX_WAIT_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A condition to wait for after an apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitFor {
    /// Path into the object, e.g. `.status.phase` or `{.status.conditions[0].type}`
    pub jsonpath: String,
    /// Expected value; when unset the path only has to exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// How long to keep polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeout {
    /// Evaluate the condition exactly once
    CheckOnce,
    /// Poll until the duration elapses
    Within(Duration),
}

impl WaitFor {
    pub fn new(jsonpath: impl Into<String>) -> Self {
        Self {
            jsonpath: jsonpath.into(),
            value: None,
            timeout: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Resolve the configured timeout
    pub fn deadline(&self) -> Result<WaitTimeout> {
        let Some(raw) = self.timeout.as_deref() else {
            return Ok(WaitTimeout::Within(DEFAULT_WAIT_TIMEOUT));
        };

        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix('-') {
            parse_duration(raw, rest)?;
            return Ok(WaitTimeout::Within(MAX_WAIT_TIMEOUT));
        }

        let duration = parse_duration(raw, raw.strip_prefix('+').unwrap_or(raw))?;
        if duration.is_zero() {
            Ok(WaitTimeout::CheckOnce)
        } else {
            Ok(WaitTimeout::Within(duration))
        }
    }

    /// Evaluate the condition against a full object
    pub fn is_satisfied(&self, object: &JsonValue) -> Result<bool> {
        let found = lookup(object, &self.jsonpath)?;
        Ok(match (found, &self.value) {
            (None | Some(JsonValue::Null), _) => false,
            (Some(_), None) => true,
            (Some(JsonValue::String(s)), Some(expected)) => s == expected,
            (Some(other), Some(expected)) => other.to_string() == *expected,
        })
    }
}

fn parse_duration(raw: &str, unsigned: &str) -> Result<Duration> {
    if unsigned == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(unsigned).map_err(|e| CoreError::InvalidDuration {
        value: raw.to_string(),
        message: e.to_string(),
    })
}

/// Resolve a simple JSONPath (`.a.b[0].c`, optionally wrapped in `{}`)
pub fn lookup<'a>(object: &'a JsonValue, jsonpath: &str) -> Result<Option<&'a JsonValue>> {
    let path = jsonpath.trim();
    let path = path
        .strip_prefix('{')
        .and_then(|p| p.strip_suffix('}'))
        .unwrap_or(path);
    let path = path.strip_prefix('$').unwrap_or(path);

    let invalid = |message: &str| CoreError::InvalidValue {
        path: "wait_for.jsonpath".to_string(),
        message: format!("{} in '{}'", message, jsonpath),
    };

    let mut current = object;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (key, indexes) = match segment.find('[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };

        if !key.is_empty() {
            match current.get(key) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        let mut rest = indexes;
        while let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped
                .find(']')
                .ok_or_else(|| invalid("unterminated index"))?;
            let index: usize = stripped[..end]
                .parse()
                .map_err(|_| invalid("non-numeric index"))?;
            match current.get(index) {
                Some(next) => current = next,
                None => return Ok(None),
            }
            rest = &stripped[end + 1..];
        }
        if !rest.is_empty() {
            return Err(invalid("unexpected characters after index"));
        }
    }

    Ok(Some(current))
}

/// Attribute descriptors for the resource-level `wait_for` block
pub fn wait_for_attributes() -> Vec<Attribute> {
    vec![
        Attribute::new("jsonpath", AttrType::String)
            .required()
            .with_description("JSONPath into the applied object, e.g. '.status.phase'."),
        Attribute::new("value", AttrType::String)
            .with_description("Expected value at the path. When unset the path only has to exist."),
        Attribute::new("timeout", AttrType::String).with_description(
            "How long to wait. Defaults to 30s, '0' checks once, negative values wait up to one week.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_timeout() {
        let wait = WaitFor::new(".status.phase");
        assert_eq!(wait.deadline().unwrap(), WaitTimeout::Within(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_timeout_checks_once() {
        assert_eq!(
            WaitFor::new(".x").with_timeout("0").deadline().unwrap(),
            WaitTimeout::CheckOnce
        );
        assert_eq!(
            WaitFor::new(".x").with_timeout("0s").deadline().unwrap(),
            WaitTimeout::CheckOnce
        );
    }

    #[test]
    fn test_negative_timeout_waits_a_week() {
        assert_eq!(
            WaitFor::new(".x").with_timeout("-1s").deadline().unwrap(),
            WaitTimeout::Within(MAX_WAIT_TIMEOUT)
        );
    }

    #[test]
    fn test_explicit_timeout() {
        assert_eq!(
            WaitFor::new(".x").with_timeout("5m").deadline().unwrap(),
            WaitTimeout::Within(Duration::from_secs(300))
        );
        assert!(WaitFor::new(".x").with_timeout("soon").deadline().is_err());
    }

    #[test]
    fn test_lookup_paths() {
        let object = json!({
            "status": {
                "phase": "Active",
                "conditions": [{"type": "Ready", "status": "True"}],
                "replicas": 3
            }
        });

        assert_eq!(lookup(&object, ".status.phase").unwrap(), Some(&json!("Active")));
        assert_eq!(
            lookup(&object, "{.status.conditions[0].type}").unwrap(),
            Some(&json!("Ready"))
        );
        assert_eq!(lookup(&object, "$.status.replicas").unwrap(), Some(&json!(3)));
        assert_eq!(lookup(&object, ".status.conditions[3].type").unwrap(), None);
        assert_eq!(lookup(&object, ".spec.vip").unwrap(), None);
        assert!(lookup(&object, ".status.conditions[x]").is_err());
    }

    #[test]
    fn test_is_satisfied() {
        let object = json!({"status": {"phase": "Active", "replicas": 3}});

        assert!(WaitFor::new(".status.phase").is_satisfied(&object).unwrap());
        assert!(WaitFor::new(".status.phase").with_value("Active").is_satisfied(&object).unwrap());
        let pending = WaitFor::new(".status.phase").with_value("Pending");
        assert!(!pending.is_satisfied(&object).unwrap());
        assert!(WaitFor::new(".status.replicas").with_value("3").is_satisfied(&object).unwrap());
        assert!(!WaitFor::new(".status.missing").is_satisfied(&object).unwrap());
    }
}
