//! Read-only data source: a single GET projected into state

use std::sync::Arc;
use tracing::debug;

use crdform_core::identity::validate_dns_label;
use crdform_core::{Attribute, ComponentKind, Diagnostic, GvkDescriptor, StateRecord};

use crate::backend::ApiTarget;
use crate::error::Action;
use crate::provider::ProviderData;

/// Data source for one kind
pub struct DataSource {
    descriptor: Arc<GvkDescriptor>,
    data: Arc<ProviderData>,
}

impl DataSource {
    pub fn new(descriptor: Arc<GvkDescriptor>, data: Arc<ProviderData>) -> Self {
        Self { descriptor, data }
    }

    pub fn type_name(&self) -> String {
        self.descriptor.type_name(ComponentKind::DataSource)
    }

    pub fn descriptor(&self) -> &GvkDescriptor {
        &self.descriptor
    }

    pub fn schema(&self) -> Vec<Attribute> {
        self.descriptor.component_schema(ComponentKind::DataSource)
    }

    /// Fetch `namespace/name` and project its metadata and spec
    pub async fn read(&self, name: &str, namespace: &str) -> Result<StateRecord, Diagnostic> {
        validate_dns_label("metadata.name", name)?;
        validate_dns_label("metadata.namespace", namespace)?;

        let backend = self.data.backend()?;
        let target = ApiTarget::from(self.descriptor.as_ref());
        debug!(type_name = %self.type_name(), namespace, name, "reading data source");

        let object = backend
            .get(&target, namespace, name)
            .await
            .map_err(|e| e.into_diagnostic(Action::Read, &self.descriptor.kind, namespace, name))?;

        let mut state = StateRecord::from_object(&self.descriptor, &object)?;
        state.id = crdform_core::state_id(name, namespace);
        Ok(state)
    }
}
