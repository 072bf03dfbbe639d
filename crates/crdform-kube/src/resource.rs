//! Managed resource: server-side-apply lifecycle for one kind
//!
//! Create and Update are the same idempotent apply. Read refreshes metadata
//! and spec wholesale. Delete leaves state removal to the caller.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info};

use crdform_core::{
    Attribute, ComponentKind, CoreError, Diagnostic, GvkDescriptor, ImportId, ObjectMeta,
    ResourceConfig, StateRecord, requires_replace, state_id,
};

use crate::backend::ApiTarget;
use crate::error::{Action, KubeError};
use crate::provider::ProviderData;
use crate::wait::wait_for_condition;

/// What applying a configuration would do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    /// Name or namespace changed: delete, then create
    Replace,
    NoOp,
}

impl std::fmt::Display for PlanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Replace => write!(f, "replace"),
            Self::NoOp => write!(f, "no-op"),
        }
    }
}

/// A failed create or update
///
/// `applied` holds the object's state when the apply itself succeeded and a
/// later step (the wait condition) failed: the object exists and must still
/// be tracked.
#[derive(Debug, Clone)]
pub struct ApplyError {
    pub diagnostic: Diagnostic,
    pub applied: Option<StateRecord>,
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.diagnostic.fmt(f)
    }
}

impl std::error::Error for ApplyError {}

impl From<Diagnostic> for ApplyError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic,
            applied: None,
        }
    }
}

impl From<CoreError> for ApplyError {
    fn from(err: CoreError) -> Self {
        Diagnostic::from(err).into()
    }
}

/// Resource for one kind
pub struct Resource {
    descriptor: Arc<GvkDescriptor>,
    data: Arc<ProviderData>,
}

impl Resource {
    pub fn new(descriptor: Arc<GvkDescriptor>, data: Arc<ProviderData>) -> Self {
        Self { descriptor, data }
    }

    pub fn type_name(&self) -> String {
        self.descriptor.type_name(ComponentKind::Resource)
    }

    pub fn descriptor(&self) -> &GvkDescriptor {
        &self.descriptor
    }

    pub fn schema(&self) -> Vec<Attribute> {
        self.descriptor.component_schema(ComponentKind::Resource)
    }

    fn target(&self) -> ApiTarget {
        ApiTarget::from(self.descriptor.as_ref())
    }

    /// Create the object with a server-side apply
    pub async fn create(&self, plan: &ResourceConfig) -> Result<StateRecord, ApplyError> {
        self.apply(plan).await
    }

    /// Update the object with a server-side apply
    pub async fn update(&self, plan: &ResourceConfig) -> Result<StateRecord, ApplyError> {
        self.apply(plan).await
    }

    async fn apply(&self, plan: &ResourceConfig) -> Result<StateRecord, ApplyError> {
        plan.ensure_valid(&self.descriptor)?;
        let backend = self.data.backend()?;

        let body = plan.to_object(&self.descriptor)?;
        let params = self.data.apply_params(plan);
        let (name, namespace) = (plan.metadata.name.as_str(), plan.metadata.namespace.as_str());
        let target = self.target();
        let diagnose = |action: Action| {
            move |e: KubeError| {
                e.into_diagnostic(action, &self.descriptor.kind, namespace, name)
            }
        };

        info!(
            type_name = %self.type_name(),
            namespace,
            name,
            field_manager = %params.field_manager,
            force = params.force,
            "applying resource"
        );
        let object = backend
            .apply(&target, namespace, name, &body, &params)
            .await
            .map_err(diagnose(Action::Apply))?;
        let mut state = self.project(plan, &object)?;

        if let Some(condition) = &plan.wait_for {
            let interval = self.data.poll_interval();
            match wait_for_condition(backend, &target, namespace, name, condition, interval).await {
                Ok(ready) => state = self.project(plan, &ready)?,
                Err(e) => {
                    return Err(ApplyError {
                        diagnostic: diagnose(Action::Wait)(e),
                        applied: Some(state),
                    });
                }
            }
        }

        Ok(state)
    }

    fn project(&self, plan: &ResourceConfig, object: &JsonValue) -> Result<StateRecord, CoreError> {
        let mut state = StateRecord::from_object(&self.descriptor, object)?.with_controls(plan);
        state.id = plan.metadata.id();
        Ok(state)
    }

    /// Refresh `state` from the cluster, keeping its id and resource controls
    pub async fn read(&self, state: &StateRecord) -> Result<StateRecord, Diagnostic> {
        let backend = self.data.backend()?;
        let (name, namespace) = (state.metadata.name.as_str(), state.metadata.namespace.as_str());
        debug!(type_name = %self.type_name(), namespace, name, "reading resource");

        let object = backend
            .get(&self.target(), namespace, name)
            .await
            .map_err(|e| e.into_diagnostic(Action::Read, &self.descriptor.kind, namespace, name))?;

        let refreshed = StateRecord::from_object(&self.descriptor, &object)?;
        Ok(StateRecord {
            id: state.id.clone(),
            metadata: refreshed.metadata,
            spec: refreshed.spec,
            ..state.clone()
        })
    }

    /// Delete the object behind `state`
    pub async fn delete(&self, state: &StateRecord) -> Result<(), Diagnostic> {
        let backend = self.data.backend()?;
        let (name, namespace) = (state.metadata.name.as_str(), state.metadata.namespace.as_str());
        info!(type_name = %self.type_name(), namespace, name, "deleting resource");

        backend
            .delete(&self.target(), namespace, name)
            .await
            .map_err(|e| e.into_diagnostic(Action::Delete, &self.descriptor.kind, namespace, name))
    }

    /// Seed state from a `namespace/name` import identifier, without a GET
    pub fn import_state(&self, id: &str) -> Result<StateRecord, Diagnostic> {
        let import = ImportId::parse(id)?;
        Ok(StateRecord {
            id: state_id(&import.name, &import.namespace),
            api_version: self.descriptor.api_version(),
            kind: self.descriptor.kind.clone(),
            metadata: ObjectMeta::new(import.name, import.namespace),
            ..Default::default()
        })
    }

    /// Decide how to move from `prior` state to the `planned` configuration
    pub fn plan(&self, prior: Option<&StateRecord>, planned: &ResourceConfig) -> PlanAction {
        match prior {
            None => PlanAction::Create,
            Some(prior) if requires_replace(&prior.metadata, &planned.metadata) => {
                PlanAction::Replace
            }
            Some(prior) if prior.to_config() == *planned => PlanAction::NoOp,
            Some(_) => PlanAction::Update,
        }
    }
}
