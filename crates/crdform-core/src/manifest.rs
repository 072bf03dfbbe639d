//! Offline manifest rendering
//!
//! Turns user configuration into the YAML document a GitOps pipeline or
//! `kubectl apply` would consume. Pure: no cluster access, and identical
//! input always renders identical bytes.

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::gvk::GvkDescriptor;
use crate::identity::ObjectMeta;
use crate::state::{ManifestConfig, build_object};
use crate::value::AttrValue;

/// Result of rendering a manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestState {
    /// Always `name/namespace`
    pub id: String,
    pub metadata: ObjectMeta,
    pub spec: AttrValue,
    /// The rendered document
    pub yaml: String,
}

/// Validate and render a manifest for `descriptor`
pub fn render_manifest(
    descriptor: &GvkDescriptor,
    config: &ManifestConfig,
) -> Result<ManifestState> {
    let issues = config.validate(descriptor);
    if !issues.is_empty() {
        return Err(CoreError::validation(issues));
    }

    let object = build_object(descriptor, &config.metadata, &config.spec)?;
    let yaml = serde_yaml::to_string(&object)?;

    Ok(ManifestState {
        id: config.metadata.id(),
        metadata: config.metadata.clone(),
        spec: config.spec.clone(),
        yaml,
    })
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
                    Attribute::new("selector", AttrType::Map),
                    Attribute::new(
                        "ports",
                        AttrType::List(Box::new(AttrType::Object(vec![
                            Attribute::new("port", AttrType::Int64)
                                .required()
                                .with_validator(Validator::IntBetween { min: 1, max: 65535 }),
                        ]))),
                    ),
                ],
                spec_required: true,
            },
        }
    }

    fn config(port: i64) -> ManifestConfig {
        ManifestConfig::from_json(
            &descriptor(),
            &json!({
                "metadata": {
                    "name": "demo",
                    "namespace": "default",
                    "labels": {"team": "net", "app": "lb"}
                },
                "spec": {
                    "vip": "10.0.0.1",
                    "selector": {"z": "1", "a": "2"},
                    "ports": [{"port": port}]
                }
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_render_manifest_document() {
        let state = render_manifest(&descriptor(), &config(80)).unwrap();
        assert_eq!(state.id, "demo/default");

        let parsed: serde_json::Value = serde_yaml::from_str(&state.yaml).unwrap();
        assert_eq!(parsed["apiVersion"], "networking.elb.io/v1");
        assert_eq!(parsed["kind"], "ExternalLoadBalancer");
        assert_eq!(parsed["metadata"]["name"], "demo");
        assert_eq!(parsed["metadata"]["labels"]["team"], "net");
        assert_eq!(parsed["spec"]["vip"], "10.0.0.1");
        assert_eq!(parsed["spec"]["ports"][0]["port"], 80);
        assert!(parsed.get("status").is_none());
    }

    #[test]
    fn test_render_manifest_is_deterministic() {
        let first = render_manifest(&descriptor(), &config(80)).unwrap();
        for _ in 0..5 {
            let again = render_manifest(&descriptor(), &config(80)).unwrap();
            assert_eq!(again.yaml, first.yaml);
        }
        assert!(first.yaml.starts_with("apiVersion: networking.elb.io/v1\n"));
    }

    #[test]
    fn test_render_manifest_rejects_invalid_port() {
        let err = render_manifest(&descriptor(), &config(65536)).unwrap_err();
        match err {
            CoreError::Validation { issues, .. } => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, "spec.ports[0].port");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
