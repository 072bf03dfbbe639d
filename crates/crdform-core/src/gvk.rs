//! Group/Version/Kind descriptors
//!
//! One descriptor parameterizes the generic data source, manifest generator
//! and resource for a single custom resource kind.

use serde::Serialize;

use crate::identity::metadata_attributes;
use crate::schema::{AttrType, Attribute, ResourceSchema, to_snake_case};
use crate::wait::wait_for_attributes;

/// Type name prefix shared by every component the provider registers
pub const TYPE_NAME_PREFIX: &str = "crdform";

/// The three component shapes registered per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    DataSource,
    Manifest,
    Resource,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [
        ComponentKind::DataSource,
        ComponentKind::Manifest,
        ComponentKind::Resource,
    ];

    fn suffix(self) -> &'static str {
        match self {
            ComponentKind::DataSource | ComponentKind::Resource => "",
            ComponentKind::Manifest => "_manifest",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataSource => write!(f, "data source"),
            Self::Manifest => write!(f, "manifest"),
            Self::Resource => write!(f, "resource"),
        }
    }
}

/// Everything the generic engine needs to address and describe one kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GvkDescriptor {
    /// API group (e.g. "org.eclipse.che"), empty for the core group
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Lowercase plural used in REST paths (e.g. "checlusters")
    pub plural: String,
    pub namespaced: bool,
    pub schema: ResourceSchema,
}

impl GvkDescriptor {
    /// `apiVersion` written into every object of this kind
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Fully qualified resource name (`plural.group`)
    pub fn resource_name(&self) -> String {
        if self.group.is_empty() {
            self.plural.clone()
        } else {
            format!("{}.{}", self.plural, self.group)
        }
    }

    /// Type name of one component, e.g. `crdform_org_eclipse_che_che_cluster_v2_manifest`
    pub fn type_name(&self, component: ComponentKind) -> String {
        let group = self.group.replace(['.', '-'], "_");
        let mut name = String::from(TYPE_NAME_PREFIX);
        if !group.is_empty() {
            name.push('_');
            name.push_str(&group);
        }
        name.push('_');
        name.push_str(&to_snake_case(&self.kind));
        name.push('_');
        name.push_str(&self.version);
        name.push_str(component.suffix());
        name
    }

    /// Whether `name` addresses this kind (kind, plural, `plural.group` or a type name)
    pub fn matches(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.kind)
            || name == self.plural
            || name == self.resource_name()
            || ComponentKind::ALL
                .iter()
                .any(|c| self.type_name(*c) == name)
    }

    /// Top-level attribute tree of one component
    pub fn component_schema(&self, component: ComponentKind) -> Vec<Attribute> {
        let id = Attribute::new("id", AttrType::String)
            .computed()
            .with_description("Contains the value `metadata.name/metadata.namespace`.");

        let spec = Attribute::new("spec", AttrType::Object(self.schema.spec.clone()))
            .with_description(self.schema.description.clone());
        let spec = if self.schema.spec_required {
            spec.required()
        } else {
            spec
        };

        let mut attrs = vec![id];
        match component {
            ComponentKind::DataSource => {
                let metadata = metadata_attributes()
                    .into_iter()
                    .map(|a| if a.required { a } else { a.computed() })
                    .collect();
                attrs.push(Attribute::new("metadata", AttrType::Object(metadata)).required());
                attrs.push(
                    Attribute::new("spec", AttrType::Object(self.schema.spec.clone())).computed(),
                );
            }
            ComponentKind::Manifest => {
                attrs.push(
                    Attribute::new("metadata", AttrType::Object(metadata_attributes())).required(),
                );
                attrs.push(spec);
                attrs.push(
                    Attribute::new("yaml", AttrType::String)
                        .computed()
                        .with_description("The generated manifest in YAML format."),
                );
            }
            ComponentKind::Resource => {
                attrs.push(
                    Attribute::new("force_conflicts", AttrType::Bool).with_description(
                        "If 'true', server-side apply will force the changes against conflicts. \
                         Defaults to the provider setting.",
                    ),
                );
                attrs.push(
                    Attribute::new("field_manager", AttrType::String).with_description(
                        "The name of the manager used to track field ownership. \
                         Defaults to the provider setting.",
                    ),
                );
                attrs.push(
                    Attribute::new("wait_for", AttrType::Object(wait_for_attributes()))
                        .with_description("Wait for a condition after each apply."),
                );
                attrs.push(
                    Attribute::new("metadata", AttrType::Object(metadata_attributes())).required(),
                );
                attrs.push(spec);
            }
        }
        attrs
    }
}
