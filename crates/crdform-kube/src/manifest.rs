//! Manifest generator component
//!
//! Needs no provider data, so it keeps working in offline mode.

use std::sync::Arc;

use crdform_core::{
    Attribute, ComponentKind, Diagnostic, GvkDescriptor, ManifestConfig, ManifestState,
    render_manifest,
};

/// Manifest generator for one kind
pub struct ManifestGenerator {
    descriptor: Arc<GvkDescriptor>,
}

impl ManifestGenerator {
    pub fn new(descriptor: Arc<GvkDescriptor>) -> Self {
        Self { descriptor }
    }

    pub fn type_name(&self) -> String {
        self.descriptor.type_name(ComponentKind::Manifest)
    }

    pub fn descriptor(&self) -> &GvkDescriptor {
        &self.descriptor
    }

    pub fn schema(&self) -> Vec<Attribute> {
        self.descriptor.component_schema(ComponentKind::Manifest)
    }

    pub fn render(&self, config: &ManifestConfig) -> Result<ManifestState, Diagnostic> {
        Ok(render_manifest(&self.descriptor, config)?)
    }
}
