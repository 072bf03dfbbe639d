//! CustomResourceDefinition import
//!
//! Parses CRD manifests and derives attribute descriptors from the
//! `openAPIV3Schema` of a version:
//! - `required` lists become required attributes
//! - `enum`, `minLength`/`maxLength`, `minItems`/`maxItems`, `minimum`/`maximum`
//!   and `pattern` become validators, `format: int32` bounds integers
//! - constraints on scalar list `items` apply to every element
//! - `additionalProperties: {type: string}` becomes a string map
//! - `x-kubernetes-int-or-string` becomes a string
//!
//! Shapes with no fixed structure (preserve-unknown-fields objects, maps of
//! non-strings) are dropped with a warning.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::gvk::GvkDescriptor;
use crate::schema::{AttrType, Attribute, ResourceSchema};
use crate::validate::Validator;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdDefinition {
    /// Full CRD name (e.g. "checlusters.org.eclipse.che")
    pub name: String,
    pub group: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
    pub versions: Vec<CrdVersion>,
}

/// A single served version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersion {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    /// Raw `openAPIV3Schema`
    pub schema: Option<Value>,
}

impl CrdDefinition {
    /// Storage version, or the first version when none is flagged
    pub fn storage_version(&self) -> Option<&CrdVersion> {
        self.versions
            .iter()
            .find(|v| v.storage)
            .or_else(|| self.versions.first())
    }

    /// Build the descriptor for `version` (storage version when `None`)
    pub fn descriptor(&self, version: Option<&str>) -> Result<GvkDescriptor> {
        if !self.namespaced {
            return Err(CoreError::InvalidCrd {
                message: format!("{}: cluster-scoped kinds are not supported", self.name),
            });
        }

        let version = match version {
            Some(v) => self.versions.iter().find(|cv| cv.name == v).ok_or_else(|| {
                CoreError::InvalidCrd {
                    message: format!("{}: version '{}' not found", self.name, v),
                }
            })?,
            None => self.storage_version().ok_or_else(|| CoreError::InvalidCrd {
                message: format!("{}: no versions defined", self.name),
            })?,
        };

        let schema = version
            .schema
            .as_ref()
            .map(|root| schema_from_openapi(root, &self.kind))
            .unwrap_or_default();

        debug!(
            crd = %self.name,
            version = %version.name,
            attributes = schema.spec.len(),
            "derived descriptor"
        );

        Ok(GvkDescriptor {
            group: self.group.clone(),
            version: version.name.clone(),
            kind: self.kind.clone(),
            plural: self.plural.clone(),
            namespaced: self.namespaced,
            schema,
        })
    }

    /// Descriptors for every served version
    pub fn served_descriptors(&self) -> Result<Vec<GvkDescriptor>> {
        self.versions
            .iter()
            .filter(|v| v.served)
            .map(|v| self.descriptor(Some(&v.name)))
            .collect()
    }
}

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse every CRD in a (possibly multi-document) YAML stream
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdDefinition>> {
        let mut crds = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value: Value = serde::Deserialize::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            crds.push(Self::parse_value(&value)?);
        }
        Ok(crds)
    }

    /// Parse a single CRD YAML manifest
    pub fn parse(yaml: &str) -> Result<CrdDefinition> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::parse_value(&value)
    }

    /// Parse from a JSON value
    pub fn parse_value(value: &Value) -> Result<CrdDefinition> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(invalid(format!(
                "Expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'metadata.name' field"))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| invalid("Missing 'spec' field"))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'spec.group' field"))?
            .to_string();

        let names = spec
            .get("names")
            .ok_or_else(|| invalid("Missing 'spec.names' field"))?;

        let crd_kind = names
            .get("kind")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| invalid("Missing 'spec.names.kind' field"))?
            .to_string();

        let plural = names
            .get("plural")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| invalid("Missing 'spec.names.plural' field"))?
            .to_string();

        if plural != plural.to_lowercase() {
            return Err(invalid(format!(
                "spec.names.plural must be lowercase, got '{}'",
                plural
            )));
        }

        let namespaced = spec.get("scope").and_then(Value::as_str) != Some("Cluster");

        let versions = spec
            .get("versions")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("Missing 'spec.versions' array"))?
            .iter()
            .map(Self::parse_version)
            .collect::<Result<Vec<_>>>()?;

        Ok(CrdDefinition {
            name,
            group,
            kind: crd_kind,
            plural,
            namespaced,
            versions,
        })
    }

    fn parse_version(version: &Value) -> Result<CrdVersion> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Version missing 'name' field"))?
            .to_string();

        Ok(CrdVersion {
            name,
            served: version.get("served").and_then(Value::as_bool).unwrap_or(true),
            storage: version
                .get("storage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            schema: version
                .get("schema")
                .and_then(|s| s.get("openAPIV3Schema"))
                .cloned(),
        })
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidCrd {
        message: message.into(),
    }
}

/// Derive the `spec` schema from a root `openAPIV3Schema`
pub fn schema_from_openapi(root: &Value, kind: &str) -> ResourceSchema {
    let description = text(root, "description");
    let spec_required = required_names(root).iter().any(|r| r == "spec");

    let spec = root
        .get("properties")
        .and_then(|p| p.get("spec"))
        .map(|spec| object_attributes(spec, &format!("{}.spec", kind)))
        .unwrap_or_default();

    ResourceSchema {
        description,
        spec,
        spec_required,
    }
}

fn object_attributes(schema: &Value, path: &str) -> Vec<Attribute> {
    let required = required_names(schema);
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter_map(|(json_name, prop)| {
                    let prop_path = format!("{}.{}", path, json_name);
                    let attr_type = attr_type(prop, &prop_path)?;
                    let mut attr = Attribute::new(json_name.as_str(), attr_type)
                        .with_description(text(prop, "description"));
                    if required.iter().any(|r| r == json_name) {
                        attr = attr.required();
                    }
                    attr.validators = validators(prop);
                    Some(attr)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn attr_type(prop: &Value, path: &str) -> Option<AttrType> {
    if flag(prop, "x-kubernetes-int-or-string") {
        return Some(AttrType::String);
    }

    match prop.get("type").and_then(Value::as_str) {
        Some("string") => Some(AttrType::String),
        Some("boolean") => Some(AttrType::Bool),
        Some("integer") => Some(AttrType::Int64),
        Some("number") => Some(AttrType::Number),
        Some("array") => {
            let items = prop.get("items")?;
            match attr_type(items, &format!("{}[]", path)) {
                Some(inner) => Some(AttrType::List(Box::new(inner))),
                None => {
                    warn!(path, "dropping list with unsupported item schema");
                    None
                }
            }
        }
        Some("object") => {
            if prop.get("properties").and_then(Value::as_object).is_some() {
                return Some(AttrType::Object(object_attributes(prop, path)));
            }
            let string_values = prop
                .get("additionalProperties")
                .and_then(|ap| ap.get("type"))
                .and_then(Value::as_str)
                == Some("string");
            if string_values {
                return Some(AttrType::Map);
            }
            warn!(path, "dropping free-form object attribute");
            None
        }
        other => {
            warn!(path, kind = ?other, "dropping attribute with unsupported type");
            None
        }
    }
}

fn validators(prop: &Value) -> Vec<Validator> {
    let mut out = Vec::new();

    let bounds = |min_key: &str, max_key: &str| {
        (
            prop.get(min_key).and_then(Value::as_u64),
            prop.get(max_key).and_then(Value::as_u64),
        )
    };
    let (min_len, max_len) = match prop.get("type").and_then(Value::as_str) {
        Some("array") => bounds("minItems", "maxItems"),
        _ => bounds("minLength", "maxLength"),
    };
    match (min_len, max_len) {
        (Some(min), Some(max)) => out.push(Validator::LengthBetween { min, max }),
        (Some(min), None) => out.push(Validator::LengthAtLeast(min)),
        (None, Some(max)) => out.push(Validator::LengthAtMost(max)),
        (None, None) => {}
    }

    if let Some(values) = prop.get("enum").and_then(Value::as_array) {
        let allowed: Vec<String> = values
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
        if !allowed.is_empty() {
            out.push(Validator::OneOf(allowed));
        }
    }

    match prop.get("type").and_then(Value::as_str) {
        Some("integer") => {
            let int32 = prop.get("format").and_then(Value::as_str) == Some("int32");
            let minimum = prop
                .get("minimum")
                .and_then(Value::as_i64)
                .or(int32.then_some(i64::from(i32::MIN)));
            let maximum = prop
                .get("maximum")
                .and_then(Value::as_i64)
                .or(int32.then_some(i64::from(i32::MAX)));
            match (minimum, maximum) {
                (Some(min), Some(max)) => out.push(Validator::IntBetween { min, max }),
                (Some(min), None) => out.push(Validator::IntAtLeast(min)),
                (None, Some(max)) => out.push(Validator::IntAtMost(max)),
                (None, None) => {}
            }
        }
        Some("number") => {
            let minimum = prop.get("minimum").and_then(Value::as_f64);
            let maximum = prop.get("maximum").and_then(Value::as_f64);
            match (minimum, maximum) {
                (Some(min), Some(max)) => out.push(Validator::NumberBetween { min, max }),
                (Some(min), None) => out.push(Validator::NumberAtLeast(min)),
                (None, Some(max)) => out.push(Validator::NumberAtMost(max)),
                (None, None) => {}
            }
        }
        Some("array") => {
            // Object items carry their constraints on the nested attributes
            let scalar_items = prop
                .get("items")
                .filter(|items| items.get("type").and_then(Value::as_str) != Some("object"));
            if let Some(items) = scalar_items {
                let item_validators = validators(items);
                if !item_validators.is_empty() {
                    out.push(Validator::Items(item_validators));
                }
            }
        }
        _ => {}
    }

    if let Some(pattern) = prop.get("pattern").and_then(Value::as_str) {
        out.push(Validator::RegexMatches {
            pattern: pattern.to_string(),
            message: String::new(),
        });
    }

    out
}

fn required_names(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::find;
    use crate::validate::validate_object;
    use crate::value::AttrValue;

    const SAMPLE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
    - name: v1alpha1
      served: true
      storage: false
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                size:
                  type: string
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          required: [spec]
          properties:
            spec:
              type: object
              required: [size]
              properties:
                size:
                  description: Widget size
                  type: string
                  enum: [small, large]
                replicas:
                  type: integer
                  minimum: 0
                  maximum: 10
                tags:
                  type: array
                  maxItems: 5
                  items:
                    type: string
                    maxLength: 10
                labels:
                  type: object
                  additionalProperties:
                    type: string
                port:
                  x-kubernetes-int-or-string: true
                raw:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
                parts:
                  type: array
                  items:
                    type: object
                    required: [partName]
                    properties:
                      partName:
                        type: string
                        pattern: "^[a-z]+$"
"#;

    #[test]
    fn test_parse_crd() {
        let crd = CrdParser::parse(SAMPLE_CRD).unwrap();
        assert_eq!(crd.name, "widgets.example.com");
        assert_eq!(crd.group, "example.com");
        assert_eq!(crd.kind, "Widget");
        assert_eq!(crd.plural, "widgets");
        assert!(crd.namespaced);
        assert_eq!(crd.versions.len(), 2);
        assert_eq!(crd.storage_version().map(|v| v.name.as_str()), Some("v1"));
    }

    #[test]
    fn test_descriptor_from_storage_version() {
        let gvk = CrdParser::parse(SAMPLE_CRD).unwrap().descriptor(None).unwrap();
        assert_eq!(gvk.api_version(), "example.com/v1");
        assert!(gvk.schema.spec_required);

        let spec = &gvk.schema.spec;
        let size = find(spec, "size").unwrap();
        assert!(size.required);
        assert_eq!(size.description, "Widget size");
        assert_eq!(
            size.validators,
            vec![Validator::OneOf(vec!["small".into(), "large".into()])]
        );

        let replicas = find(spec, "replicas").unwrap();
        assert_eq!(replicas.attr_type, AttrType::Int64);
        assert!(replicas.optional);
        assert_eq!(replicas.description, "");
        assert_eq!(replicas.validators, vec![Validator::IntBetween { min: 0, max: 10 }]);

        let tags = find(spec, "tags").unwrap();
        assert_eq!(tags.attr_type, AttrType::List(Box::new(AttrType::String)));
        assert_eq!(
            tags.validators,
            vec![
                Validator::LengthAtMost(5),
                Validator::Items(vec![Validator::LengthAtMost(10)]),
            ]
        );

        assert_eq!(find(spec, "labels").unwrap().attr_type, AttrType::Map);
        assert_eq!(find(spec, "port").unwrap().attr_type, AttrType::String);
        assert!(find(spec, "raw").is_none());

        let parts = find(spec, "parts").unwrap();
        let nested = parts.attr_type.nested().unwrap();
        let part_name = find(nested, "part_name").unwrap();
        assert!(part_name.required);
        assert_eq!(part_name.json_name, "partName");
        assert!(matches!(part_name.validators[0], Validator::RegexMatches { .. }));
    }

    const CONSTRAINED_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: dials.example.com
spec:
  group: example.com
  names:
    kind: Dial
    plural: dials
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                modes:
                  type: array
                  items:
                    type: string
                    enum: [a, b]
                    maxLength: 1
                ratio:
                  type: number
                  minimum: 0
                  maximum: 1
                small:
                  type: integer
                  format: int32
                wide:
                  type: integer
                  format: int64
"#;

    #[test]
    fn test_item_number_and_int32_constraints() {
        let gvk = CrdParser::parse(CONSTRAINED_CRD).unwrap().descriptor(None).unwrap();
        let spec = &gvk.schema.spec;

        assert_eq!(
            find(spec, "modes").unwrap().validators,
            vec![Validator::Items(vec![
                Validator::LengthAtMost(1),
                Validator::OneOf(vec!["a".into(), "b".into()]),
            ])]
        );
        assert_eq!(
            find(spec, "ratio").unwrap().validators,
            vec![Validator::NumberBetween { min: 0.0, max: 1.0 }]
        );
        assert_eq!(
            find(spec, "small").unwrap().validators,
            vec![Validator::IntBetween {
                min: i64::from(i32::MIN),
                max: i64::from(i32::MAX),
            }]
        );
        assert!(find(spec, "wide").unwrap().validators.is_empty());
    }

    #[test]
    fn test_constraints_reject_out_of_range_values() {
        let gvk = CrdParser::parse(CONSTRAINED_CRD).unwrap().descriptor(None).unwrap();
        let value = AttrValue::object([
            ("modes", AttrValue::List(vec![AttrValue::from("a"), AttrValue::from("zzzz")])),
            ("ratio", AttrValue::Number(7.5)),
            ("small", AttrValue::Int(1 << 40)),
            ("wide", AttrValue::Int(1 << 40)),
        ]);

        let issues = validate_object(&gvk.schema.spec, &value, "spec");
        let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["spec.modes[1]", "spec.modes[1]", "spec.ratio", "spec.small"]
        );
    }

    #[test]
    fn test_descriptor_for_named_version() {
        let crd = CrdParser::parse(SAMPLE_CRD).unwrap();
        let gvk = crd.descriptor(Some("v1alpha1")).unwrap();
        assert_eq!(gvk.version, "v1alpha1");
        assert!(!gvk.schema.spec_required);
        assert_eq!(gvk.schema.spec.len(), 1);

        assert!(crd.descriptor(Some("v9")).is_err());
        assert_eq!(crd.served_descriptors().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_rejects_non_crd() {
        let err = CrdParser::parse("kind: ConfigMap\nmetadata:\n  name: x\n").unwrap_err();
        assert!(err.to_string().contains("Expected CustomResourceDefinition"));
    }

    #[test]
    fn test_cluster_scoped_is_rejected() {
        let yaml = SAMPLE_CRD.replace("scope: Namespaced", "scope: Cluster");
        let crd = CrdParser::parse(&yaml).unwrap();
        assert!(!crd.namespaced);
        assert!(crd.descriptor(None).is_err());
    }

    #[test]
    fn test_parse_all_multi_document() {
        let yaml = format!("{}\n---\n{}", SAMPLE_CRD, SAMPLE_CRD.replace("widgets", "gadgets"));
        let crds = CrdParser::parse_all(&yaml).unwrap();
        assert_eq!(crds.len(), 2);
        assert_eq!(crds[1].plural, "gadgets");
    }

    #[test]
    fn test_generated_schema_is_consistent() {
        let gvk = CrdParser::parse(SAMPLE_CRD).unwrap().descriptor(None).unwrap();
        assert!(gvk.schema.check_consistency().is_empty());
    }
}
