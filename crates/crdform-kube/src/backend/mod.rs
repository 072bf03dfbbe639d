//! Cluster backends
//!
//! The components never talk to kube-rs directly. They go through
//! [`ClusterBackend`], which has two implementations:
//!
//! - [`KubeBackend`]: the real API server, via `Api<DynamicObject>`
//! - [`MockBackend`]: an in-memory store for tests and `--mock` runs

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crdform_core::GvkDescriptor;

use crate::error::Result;

mod cluster;
mod mock;

pub use cluster::KubeBackend;
pub use mock::{MockBackend, OperationCounts};

/// REST coordinates of one kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiTarget {
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Lowercase plural used in the request path
    pub plural: String,
    pub namespaced: bool,
}

impl ApiTarget {
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl From<&GvkDescriptor> for ApiTarget {
    fn from(descriptor: &GvkDescriptor) -> Self {
        Self {
            group: descriptor.group.clone(),
            version: descriptor.version.clone(),
            kind: descriptor.kind.clone(),
            plural: descriptor.plural.clone(),
            namespaced: descriptor.namespaced,
        }
    }
}

/// Server-side apply parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyParams {
    pub field_manager: String,
    /// Take ownership of conflicting fields
    pub force: bool,
}

/// GET / server-side-apply PATCH / DELETE against one cluster
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Fetch an object as JSON
    async fn get(&self, target: &ApiTarget, namespace: &str, name: &str) -> Result<JsonValue>;

    /// Server-side apply `body` and return the object the server persisted
    async fn apply(
        &self,
        target: &ApiTarget,
        namespace: &str,
        name: &str,
        body: &JsonValue,
        params: &ApplyParams,
    ) -> Result<JsonValue>;

    /// Delete an object
    async fn delete(&self, target: &ApiTarget, namespace: &str, name: &str) -> Result<()>;
}
