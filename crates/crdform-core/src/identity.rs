//! Object identity: metadata, state IDs and import IDs
//!
//! Names and namespaces are DNS labels. The state ID is always
//! `name/namespace`, while import IDs use the kubectl-style `namespace/name`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{CoreError, Result};
use crate::schema::{AttrType, Attribute};
use crate::validate::Validator;

/// RFC 1123 label pattern used for names and namespaces
pub const DNS_LABEL_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Maximum length of a DNS label
pub const DNS_LABEL_MAX_LENGTH: usize = 63;

static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DNS_LABEL_PATTERN).expect("valid regex"));

/// Validate a DNS label (`metadata.name` or `metadata.namespace`)
pub fn validate_dns_label(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CoreError::InvalidValue {
            path: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if value.len() > DNS_LABEL_MAX_LENGTH {
        return Err(CoreError::InvalidValue {
            path: field.to_string(),
            message: format!(
                "must be at most {} characters, got {}",
                DNS_LABEL_MAX_LENGTH,
                value.len()
            ),
        });
    }
    if !DNS_LABEL.is_match(value) {
        return Err(CoreError::InvalidValue {
            path: field.to_string(),
            message: format!(
                "must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character, got \"{}\"",
                value
            ),
        });
    }
    Ok(())
}

/// The `metadata` block of a managed object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: None,
            annotations: None,
        }
    }

    /// Validate name and namespace
    pub fn validate(&self) -> Result<()> {
        validate_dns_label("metadata.name", &self.name)?;
        validate_dns_label("metadata.namespace", &self.namespace)
    }

    /// State ID for this object
    pub fn id(&self) -> String {
        state_id(&self.name, &self.namespace)
    }

    /// Wire JSON for the metadata block
    pub fn to_json(&self) -> JsonValue {
        let mut out = JsonMap::new();
        out.insert("name".to_string(), JsonValue::String(self.name.clone()));
        out.insert(
            "namespace".to_string(),
            JsonValue::String(self.namespace.clone()),
        );
        if let Some(labels) = &self.labels {
            out.insert("labels".to_string(), string_map(labels));
        }
        if let Some(annotations) = &self.annotations {
            out.insert("annotations".to_string(), string_map(annotations));
        }
        JsonValue::Object(out)
    }

    /// Project a cluster object's metadata, dropping server-managed fields
    pub fn from_json(json: &JsonValue) -> Self {
        let text = |key: &str| {
            json.get(key)
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let map = |key: &str| {
            json.get(key).and_then(JsonValue::as_object).map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect::<BTreeMap<_, _>>()
            })
        };

        Self {
            name: text("name"),
            namespace: text("namespace"),
            labels: map("labels"),
            annotations: map("annotations"),
        }
    }
}

fn string_map(map: &BTreeMap<String, String>) -> JsonValue {
    JsonValue::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect(),
    )
}

/// Attribute descriptors for the `metadata` block
pub fn metadata_attributes() -> Vec<Attribute> {
    let label = |name: &str, description: &str| {
        Attribute::new(name, AttrType::String)
            .required()
            .with_description(description)
            .with_validator(Validator::LengthBetween {
                min: 1,
                max: DNS_LABEL_MAX_LENGTH as u64,
            })
            .with_validator(Validator::RegexMatches {
                pattern: DNS_LABEL_PATTERN.to_string(),
                message: "must be a valid DNS label".to_string(),
            })
    };

    vec![
        label(
            "name",
            "Unique identifier for this object. Changing it forces replacement.",
        ),
        label(
            "namespace",
            "Namespace that contains this object. Changing it forces replacement.",
        ),
        Attribute::new("labels", AttrType::Map)
            .with_description("Map of string keys and values used to organize and categorize objects."),
        Attribute::new("annotations", AttrType::Map)
            .with_description("Unstructured key value map stored with the object."),
    ]
}

/// State ID in the fixed `name/namespace` order
pub fn state_id(name: &str, namespace: &str) -> String {
    format!("{}/{}", name, namespace)
}

/// A parsed import identifier (`namespace/name`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportId {
    pub namespace: String,
    pub name: String,
}

impl ImportId {
    /// Parse `namespace/name`: exactly one `/` with both halves non-empty
    pub fn parse(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split('/').collect();
        match parts.as_slice() {
            [namespace, name] if !namespace.is_empty() && !name.is_empty() => Ok(Self {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            _ => Err(CoreError::ImportFormat { id: id.to_string() }),
        }
    }
}

/// Whether moving from `prior` to `planned` must replace the object
pub fn requires_replace(prior: &ObjectMeta, planned: &ObjectMeta) -> bool {
    prior.name != planned.name || prior.namespace != planned.namespace
}
