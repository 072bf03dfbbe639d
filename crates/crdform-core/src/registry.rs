//! Kind registry
//!
//! Holds every kind the provider exposes. The bundled CRDs are embedded at
//! compile time; more can be registered from CRD files at runtime.

use std::path::Path;
use std::sync::Arc;

use crate::crd::CrdParser;
use crate::error::{CoreError, Result};
use crate::gvk::{ComponentKind, GvkDescriptor};
use crate::suggest;

/// CRD manifests compiled into the binary
const BUILTIN_CRDS: &[(&str, &str)] = &[
    (
        "externalloadbalancers.networking.elb.io",
        include_str!("../crds/externalloadbalancers.networking.elb.io.yaml"),
    ),
    (
        "checlusters.org.eclipse.che",
        include_str!("../crds/checlusters.org.eclipse.che.yaml"),
    ),
];

/// Ordered set of registered kinds
#[derive(Debug, Clone, Default)]
pub struct Registry {
    kinds: Vec<Arc<GvkDescriptor>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the bundled CRDs
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for (name, yaml) in BUILTIN_CRDS {
            registry.register_crds(yaml).map_err(|e| CoreError::InvalidCrd {
                message: format!("bundled CRD {}: {}", name, e),
            })?;
        }
        Ok(registry)
    }

    /// Register a descriptor, rejecting duplicate type names
    pub fn register(&mut self, descriptor: GvkDescriptor) -> Result<()> {
        let type_name = descriptor.type_name(ComponentKind::Resource);
        if self
            .kinds
            .iter()
            .any(|k| k.type_name(ComponentKind::Resource) == type_name)
        {
            return Err(CoreError::DuplicateKind { name: type_name });
        }
        self.kinds.push(Arc::new(descriptor));
        Ok(())
    }

    /// Register every served version of every CRD in a YAML stream
    pub fn register_crds(&mut self, yaml: &str) -> Result<usize> {
        let mut count = 0;
        for crd in CrdParser::parse_all(yaml)? {
            for descriptor in crd.served_descriptors()? {
                self.register(descriptor)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Register CRDs from a file
    pub fn register_crd_file(&mut self, path: &Path) -> Result<usize> {
        let yaml = std::fs::read_to_string(path)?;
        self.register_crds(&yaml)
    }

    /// All registered kinds in registration order
    pub fn kinds(&self) -> &[Arc<GvkDescriptor>] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Look up a kind by kind name, plural, `plural.group` or component type name
    ///
    /// When several versions of a kind match a bare kind name, the first
    /// registered one wins.
    pub fn lookup(&self, name: &str) -> Result<Arc<GvkDescriptor>> {
        if let Some(found) = self.kinds.iter().find(|k| k.matches(name)) {
            return Ok(Arc::clone(found));
        }

        let candidates: Vec<String> = self
            .kinds
            .iter()
            .flat_map(|k| {
                [
                    k.kind.clone(),
                    k.plural.clone(),
                    k.type_name(ComponentKind::Resource),
                ]
            })
            .collect();
        let suggestions =
            suggest::closest_matches(name, candidates.iter().map(String::as_str), 3);

        Err(CoreError::UnknownKind {
            name: name.to_string(),
            hint: suggest::hint(&suggestions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper;
    use crate::schema::{AttrType, Attribute, find};
    use crate::validate::Validator;
    use crate::value::AttrValue;
    use serde_json::Value as JsonValue;
    use std::collections::BTreeMap;

    /// Object value with every required attribute set, and optional ones too when `all`
    fn sample_object(attrs: &[Attribute], all: bool) -> AttrValue {
        AttrValue::Object(
            attrs
                .iter()
                .filter(|a| !a.computed || a.optional)
                .map(|a| {
                    let value = if a.required || all {
                        sample_value(&a.attr_type, all)
                    } else {
                        AttrValue::Null
                    };
                    (a.name.clone(), value)
                })
                .collect(),
        )
    }

    fn sample_value(attr_type: &AttrType, all: bool) -> AttrValue {
        match attr_type {
            AttrType::String => AttrValue::String("x".to_string()),
            AttrType::Bool => AttrValue::Bool(false),
            AttrType::Int64 => AttrValue::Int(1),
            AttrType::Number => AttrValue::Number(1.5),
            AttrType::Map => AttrValue::Map(BTreeMap::new()),
            AttrType::List(inner) => AttrValue::List(vec![sample_value(inner, all)]),
            AttrType::Object(nested) => sample_object(nested, all),
        }
    }

    /// Walk the encoded JSON, asserting which keys are present
    fn assert_keys(attrs: &[Attribute], json: &JsonValue, path: &str, all: bool) {
        for attr in attrs.iter().filter(|a| !a.computed || a.optional) {
            let attr_path = format!("{}.{}", path, attr.name);
            let encoded = json.get(&attr.json_name);
            assert_eq!(
                encoded.is_some(),
                attr.required || all,
                "{} ({})",
                attr_path,
                attr.json_name
            );
            let Some(encoded) = encoded else { continue };
            match &attr.attr_type {
                AttrType::Object(nested) => assert_keys(nested, encoded, &attr_path, all),
                AttrType::List(inner) => {
                    if let AttrType::Object(nested) = inner.as_ref() {
                        for item in encoded.as_array().unwrap() {
                            assert_keys(nested, item, &attr_path, all);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.len(), 2);

        let elb = registry.lookup("ExternalLoadBalancer").unwrap();
        assert_eq!(elb.api_version(), "networking.elb.io/v1");
        assert_eq!(elb.plural, "externalloadbalancers");

        let che = registry.lookup("checlusters").unwrap();
        assert_eq!(che.api_version(), "org.eclipse.che/v2");
        assert_eq!(che.kind, "CheCluster");
    }

    #[test]
    fn test_builtin_elb_constraints() {
        let registry = Registry::builtin().unwrap();
        let elb = registry.lookup("externalloadbalancers.networking.elb.io").unwrap();
        let spec = &elb.schema.spec;

        let vip = find(spec, "vip").unwrap();
        assert!(vip.required);
        assert_eq!(vip.validators, vec![Validator::LengthAtMost(15)]);

        let ports = find(spec, "ports").unwrap();
        assert!(ports.required);
        let port = find(ports.attr_type.nested().unwrap(), "port").unwrap();
        assert_eq!(port.attr_type, AttrType::Int64);
        assert_eq!(port.validators, vec![Validator::IntBetween { min: 1, max: 65535 }]);

        assert!(find(spec, "extra_config").is_none());
        assert!(find(spec, "health_check").is_some());
    }

    #[test]
    fn test_required_matches_omit_empty_for_every_kind() {
        let registry = Registry::builtin().unwrap();
        for kind in registry.kinds() {
            assert!(
                kind.schema.check_consistency().is_empty(),
                "{} has inconsistent attributes",
                kind.kind
            );
        }
    }

    #[test]
    fn test_encoding_keeps_required_and_omits_unset_for_every_kind() {
        let registry = Registry::builtin().unwrap();
        for kind in registry.kinds() {
            let spec = &kind.schema.spec;

            let minimal = mapper::to_json(spec, &sample_object(spec, false), "spec").unwrap();
            assert_keys(spec, &minimal, "spec", false);

            let full = mapper::to_json(spec, &sample_object(spec, true), "spec").unwrap();
            assert_keys(spec, &full, "spec", true);
        }
    }

    #[test]
    fn test_lookup_unknown_suggests() {
        let registry = Registry::builtin().unwrap();
        let err = registry.lookup("CheClustr").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown kind 'CheClustr'"));
        assert!(message.contains("CheCluster"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::builtin().unwrap();
        let che = (*registry.lookup("CheCluster").unwrap()).clone();
        assert!(matches!(
            registry.register(che),
            Err(CoreError::DuplicateKind { .. })
        ));
    }

    #[test]
    fn test_register_crd_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widgets.yaml");
        std::fs::write(
            &path,
            r#"
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
                size:
                  type: string
"#,
        )
        .unwrap();

        let mut registry = Registry::builtin().unwrap();
        assert_eq!(registry.register_crd_file(&path).unwrap(), 1);
        assert!(registry.lookup("crdform_example_com_widget_v1").is_ok());
    }
}
