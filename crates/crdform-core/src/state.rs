//! Configuration and state records
//!
//! `ResourceConfig` is what a user declares for a resource, `ManifestConfig`
//! the subset a manifest needs, and `StateRecord` the persisted projection of
//! the cluster object after each operation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{CoreError, Result};
use crate::gvk::GvkDescriptor;
use crate::identity::{ObjectMeta, validate_dns_label};
use crate::mapper;
use crate::suggest;
use crate::validate::{ValidationIssue, validate_object};
use crate::value::AttrValue;
use crate::wait::WaitFor;

const RESOURCE_KEYS: &[&str] = &[
    "metadata",
    "spec",
    "force_conflicts",
    "field_manager",
    "wait_for",
];
const MANIFEST_KEYS: &[&str] = &["metadata", "spec"];

/// Desired state of a managed object
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResourceConfig {
    pub metadata: ObjectMeta,
    pub spec: AttrValue,
    /// Per-resource override of the provider's force-conflicts default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_conflicts: Option<bool>,
    /// Per-resource override of the provider's field manager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<WaitFor>,
}

impl ResourceConfig {
    /// Decode user configuration for `descriptor`
    pub fn from_json(descriptor: &GvkDescriptor, json: &JsonValue) -> Result<Self> {
        let fields = top_level(json, RESOURCE_KEYS)?;

        let force_conflicts = match fields.get("force_conflicts") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Bool(b)) => Some(*b),
            Some(JsonValue::String(s)) => Some(s.parse::<bool>().map_err(|_| {
                CoreError::InvalidValue {
                    path: "force_conflicts".to_string(),
                    message: format!("expected bool, got \"{}\"", s),
                }
            })?),
            Some(_) => {
                return Err(CoreError::TypeMismatch {
                    path: "force_conflicts".to_string(),
                    expected: "bool".to_string(),
                    found: "non-bool".to_string(),
                });
            }
        };

        let field_manager = fields
            .get("field_manager")
            .filter(|v| !v.is_null())
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| CoreError::TypeMismatch {
                    path: "field_manager".to_string(),
                    expected: "string".to_string(),
                    found: "non-string".to_string(),
                })
            })
            .transpose()?;

        let wait_for = fields
            .get("wait_for")
            .filter(|v| !v.is_null())
            .map(|v| decode_block::<WaitFor>(v, "wait_for"))
            .transpose()?;

        Ok(Self {
            metadata: decode_metadata(fields)?,
            spec: decode_spec(descriptor, fields)?,
            force_conflicts,
            field_manager,
            wait_for,
        })
    }

    /// Collect every validation issue in this configuration
    pub fn validate(&self, descriptor: &GvkDescriptor) -> Vec<ValidationIssue> {
        let mut issues = validate_body(descriptor, &self.metadata, &self.spec);

        if let Some(manager) = &self.field_manager {
            if manager.trim().is_empty() {
                issues.push(ValidationIssue {
                    path: "field_manager".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }

        if let Some(wait) = &self.wait_for {
            if wait.jsonpath.trim().is_empty() {
                issues.push(ValidationIssue {
                    path: "wait_for.jsonpath".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            if let Err(e) = wait.deadline() {
                issues.push(ValidationIssue {
                    path: "wait_for.timeout".to_string(),
                    message: e.to_string(),
                });
            }
        }

        issues
    }

    /// Fail with all validation issues, if any
    pub fn ensure_valid(&self, descriptor: &GvkDescriptor) -> Result<()> {
        let issues = self.validate(descriptor);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(CoreError::validation(issues))
        }
    }

    /// Full wire object for server-side apply
    pub fn to_object(&self, descriptor: &GvkDescriptor) -> Result<JsonValue> {
        build_object(descriptor, &self.metadata, &self.spec)
    }
}

/// Configuration of a manifest generator: metadata and spec only
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ManifestConfig {
    pub metadata: ObjectMeta,
    pub spec: AttrValue,
}

impl ManifestConfig {
    pub fn from_json(descriptor: &GvkDescriptor, json: &JsonValue) -> Result<Self> {
        let fields = top_level(json, MANIFEST_KEYS)?;
        Ok(Self {
            metadata: decode_metadata(fields)?,
            spec: decode_spec(descriptor, fields)?,
        })
    }

    pub fn validate(&self, descriptor: &GvkDescriptor) -> Vec<ValidationIssue> {
        validate_body(descriptor, &self.metadata, &self.spec)
    }
}

impl From<ResourceConfig> for ManifestConfig {
    fn from(config: ResourceConfig) -> Self {
        Self {
            metadata: config.metadata,
            spec: config.spec,
        }
    }
}

/// Persisted projection of a managed object
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StateRecord {
    /// Always `name/namespace`
    pub id: String,
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: AttrValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_conflicts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<WaitFor>,
}

impl StateRecord {
    /// Project a cluster object into state, replacing metadata and spec wholesale
    pub fn from_object(descriptor: &GvkDescriptor, object: &JsonValue) -> Result<Self> {
        let metadata = ObjectMeta::from_json(object.get("metadata").unwrap_or(&JsonValue::Null));
        let spec = mapper::from_json(
            &descriptor.schema.spec,
            object.get("spec").unwrap_or(&JsonValue::Null),
            "spec",
        )?;

        Ok(Self {
            id: metadata.id(),
            api_version: descriptor.api_version(),
            kind: descriptor.kind.clone(),
            metadata,
            spec,
            force_conflicts: None,
            field_manager: None,
            wait_for: None,
        })
    }

    /// Carry the resource-level controls of `config` into this record
    pub fn with_controls(mut self, config: &ResourceConfig) -> Self {
        self.force_conflicts = config.force_conflicts;
        self.field_manager = config.field_manager.clone();
        self.wait_for = config.wait_for.clone();
        self
    }

    /// Load a previously persisted record
    pub fn from_json(descriptor: &GvkDescriptor, json: &JsonValue) -> Result<Self> {
        let fields = json.as_object().ok_or_else(|| CoreError::TypeMismatch {
            path: "state".to_string(),
            expected: "object".to_string(),
            found: "non-object".to_string(),
        })?;

        let mut config_json = JsonMap::new();
        for key in RESOURCE_KEYS {
            if let Some(v) = fields.get(*key) {
                config_json.insert(key.to_string(), v.clone());
            }
        }
        let config = ResourceConfig::from_json(descriptor, &JsonValue::Object(config_json))?;

        let id = fields
            .get("id")
            .and_then(JsonValue::as_str)
            .map(String::from)
            .unwrap_or_else(|| config.metadata.id());

        Ok(Self {
            id,
            api_version: descriptor.api_version(),
            kind: descriptor.kind.clone(),
            force_conflicts: config.force_conflicts,
            field_manager: config.field_manager,
            wait_for: config.wait_for,
            metadata: config.metadata,
            spec: config.spec,
        })
    }

    /// The desired configuration this record corresponds to
    pub fn to_config(&self) -> ResourceConfig {
        ResourceConfig {
            metadata: self.metadata.clone(),
            spec: self.spec.clone(),
            force_conflicts: self.force_conflicts,
            field_manager: self.field_manager.clone(),
            wait_for: self.wait_for.clone(),
        }
    }
}

/// Assemble `{apiVersion, kind, metadata, spec}` for a kind
pub fn build_object(
    descriptor: &GvkDescriptor,
    metadata: &ObjectMeta,
    spec: &AttrValue,
) -> Result<JsonValue> {
    let mut object = JsonMap::new();
    object.insert(
        "apiVersion".to_string(),
        JsonValue::String(descriptor.api_version()),
    );
    object.insert("kind".to_string(), JsonValue::String(descriptor.kind.clone()));
    object.insert("metadata".to_string(), metadata.to_json());
    if !spec.is_null() || descriptor.schema.spec_required {
        object.insert(
            "spec".to_string(),
            mapper::to_json(&descriptor.schema.spec, spec, "spec")?,
        );
    }
    Ok(JsonValue::Object(object))
}

fn top_level<'a>(json: &'a JsonValue, allowed: &[&str]) -> Result<&'a JsonMap<String, JsonValue>> {
    let fields = json.as_object().ok_or_else(|| CoreError::TypeMismatch {
        path: "configuration".to_string(),
        expected: "object".to_string(),
        found: "non-object".to_string(),
    })?;

    for key in fields.keys() {
        if !allowed.contains(&key.as_str()) {
            let suggestions = suggest::closest_matches(key, allowed.iter().copied(), 1);
            return Err(CoreError::UnknownAttribute {
                path: "configuration".to_string(),
                name: key.clone(),
                hint: suggest::hint(&suggestions),
            });
        }
    }

    Ok(fields)
}

fn decode_metadata(fields: &JsonMap<String, JsonValue>) -> Result<ObjectMeta> {
    let metadata = fields
        .get("metadata")
        .filter(|v| !v.is_null())
        .ok_or_else(|| CoreError::MissingRequired {
            path: "metadata".to_string(),
        })?;
    decode_block(metadata, "metadata")
}

/// Deserialize a fixed-shape block, reporting shape errors as invalid configuration
fn decode_block<T: DeserializeOwned>(value: &JsonValue, path: &str) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| CoreError::InvalidValue {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn decode_spec(
    descriptor: &GvkDescriptor,
    fields: &JsonMap<String, JsonValue>,
) -> Result<AttrValue> {
    match fields.get("spec").filter(|v| !v.is_null()) {
        Some(spec) => mapper::from_config(&descriptor.schema.spec, spec, "spec"),
        None if descriptor.schema.spec_required => Err(CoreError::MissingRequired {
            path: "spec".to_string(),
        }),
        None => Ok(AttrValue::Null),
    }
}

fn validate_body(
    descriptor: &GvkDescriptor,
    metadata: &ObjectMeta,
    spec: &AttrValue,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (path, value) in [
        ("metadata.name", &metadata.name),
        ("metadata.namespace", &metadata.namespace),
    ] {
        if let Err(CoreError::InvalidValue { path, message }) = validate_dns_label(path, value) {
            issues.push(ValidationIssue { path, message });
        }
    }

    if spec.is_null() {
        if descriptor.schema.spec_required {
            issues.push(ValidationIssue {
                path: "spec".to_string(),
                message: "attribute is required".to_string(),
            });
        }
    } else {
        issues.extend(validate_object(&descriptor.schema.spec, spec, "spec"));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttrType, Attribute, ResourceSchema};
    use crate::validate::Validator;
    use serde_json::json;

    fn descriptor() -> GvkDescriptor {
        GvkDescriptor {
            group: "networking.elb.io".to_string(),
            version: "v1".to_string(),
            kind: "ExternalLoadBalancer".to_string(),
            plural: "externalloadbalancers".to_string(),
            namespaced: true,
            schema: ResourceSchema {
                description: String::new(),
                spec: vec![
                    Attribute::new("vip", AttrType::String)
                        .required()
                        .with_validator(Validator::LengthAtMost(15)),
                    Attribute::new("nodePort", AttrType::Int64)
                        .with_validator(Validator::IntBetween { min: 1, max: 65535 }),
                ],
                spec_required: true,
            },
        }
    }

    #[test]
    fn test_resource_config_from_json() {
        let json = json!({
            "metadata": {"name": "demo", "namespace": "default"},
            "spec": {"vip": "10.0.0.1", "node_port": 30080},
            "force_conflicts": true,
            "wait_for": {"jsonpath": ".status.phase", "value": "Active"}
        });

        let config = ResourceConfig::from_json(&descriptor(), &json).unwrap();
        assert_eq!(config.metadata.id(), "demo/default");
        assert_eq!(config.force_conflicts, Some(true));
        assert!(config.field_manager.is_none());
        assert_eq!(config.wait_for.as_ref().map(|w| w.jsonpath.as_str()), Some(".status.phase"));
        assert!(config.validate(&descriptor()).is_empty());
    }

    #[test]
    fn test_resource_config_unknown_top_level_key() {
        let json = json!({
            "metadata": {"name": "demo", "namespace": "default"},
            "spec": {"vip": "10.0.0.1"},
            "force_conflict": true
        });
        let err = ResourceConfig::from_json(&descriptor(), &json).unwrap_err();
        assert!(err.to_string().contains("did you mean 'force_conflicts'"));
    }

    #[test]
    fn test_manifest_config_rejects_resource_controls() {
        let json = json!({
            "metadata": {"name": "demo", "namespace": "default"},
            "spec": {"vip": "10.0.0.1"},
            "field_manager": "me"
        });
        assert!(ManifestConfig::from_json(&descriptor(), &json).is_err());
    }

    #[test]
    fn test_malformed_blocks_are_configuration_errors() {
        let cases = [
            (json!({"name": "demo"}), None, "metadata"),
            (json!({"name": "demo", "namespace": "default", "uid": "abc"}), None, "metadata"),
            (
                json!({"name": "demo", "namespace": "default"}),
                Some(json!({"json_path": ".status.phase"})),
                "wait_for",
            ),
        ];

        for (metadata, wait_for, expected_path) in cases {
            let mut json = json!({"metadata": metadata, "spec": {"vip": "10.0.0.1"}});
            if let Some(wait_for) = wait_for {
                json["wait_for"] = wait_for;
            }

            let err = ResourceConfig::from_json(&descriptor(), &json).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidValue { ref path, .. } if path == expected_path),
                "unexpected error: {err:?}"
            );
            assert_eq!(
                crate::Diagnostic::from(err).summary,
                "Invalid configuration"
            );
        }
    }

    #[test]
    fn test_missing_spec_is_an_error() {
        let json = json!({"metadata": {"name": "demo", "namespace": "default"}});
        let err = ResourceConfig::from_json(&descriptor(), &json).unwrap_err();
        assert!(matches!(err, CoreError::MissingRequired { ref path } if path == "spec"));
    }

    #[test]
    fn test_validate_reports_all_issues() {
        let json = json!({
            "metadata": {"name": "Demo", "namespace": ""},
            "spec": {"vip": "1234567890123456", "node_port": 0},
            "field_manager": " ",
            "wait_for": {"jsonpath": ".status", "timeout": "later"}
        });
        let config = ResourceConfig::from_json(&descriptor(), &json).unwrap();
        let paths: Vec<String> = config
            .validate(&descriptor())
            .into_iter()
            .map(|i| i.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "metadata.name",
                "metadata.namespace",
                "spec.vip",
                "spec.node_port",
                "field_manager",
                "wait_for.timeout"
            ]
        );
    }

    #[test]
    fn test_state_from_object_projects_declared_fields() {
        let object = json!({
            "apiVersion": "networking.elb.io/v1",
            "kind": "ExternalLoadBalancer",
            "metadata": {"name": "demo", "namespace": "default", "uid": "abc"},
            "spec": {"vip": "10.0.0.1", "extra": true},
            "status": {"phase": "Active"}
        });

        let state = StateRecord::from_object(&descriptor(), &object).unwrap();
        assert_eq!(state.id, "demo/default");
        assert_eq!(state.api_version, "networking.elb.io/v1");
        assert_eq!(state.kind, "ExternalLoadBalancer");
        assert_eq!(state.spec.get("vip"), Some(&AttrValue::from("10.0.0.1")));
        assert!(state.spec.get("extra").is_none());
    }

    #[test]
    fn test_state_persists_and_reloads() {
        let config = ResourceConfig::from_json(
            &descriptor(),
            &json!({
                "metadata": {"name": "demo", "namespace": "default"},
                "spec": {"vip": "10.0.0.1"},
                "field_manager": "ops"
            }),
        )
        .unwrap();
        let object = config.to_object(&descriptor()).unwrap();
        let state = StateRecord::from_object(&descriptor(), &object)
            .unwrap()
            .with_controls(&config);

        let persisted = serde_json::to_value(&state).unwrap();
        let reloaded = StateRecord::from_json(&descriptor(), &persisted).unwrap();
        assert_eq!(reloaded, state);
    }

    #[test]
    fn test_build_object_shape() {
        let object = build_object(
            &descriptor(),
            &ObjectMeta::new("demo", "default"),
            &AttrValue::object([("vip", AttrValue::from("10.0.0.1"))]),
        )
        .unwrap();

        assert_eq!(
            object,
            json!({
                "apiVersion": "networking.elb.io/v1",
                "kind": "ExternalLoadBalancer",
                "metadata": {"name": "demo", "namespace": "default"},
                "spec": {"vip": "10.0.0.1"}
            })
        );
    }
}
