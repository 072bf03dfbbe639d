//! Error types for crdform-kube

use crdform_core::{CoreError, Diagnostic};
use thiserror::Error;

/// Result type for crdform-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object not found (raised by backends that do not speak HTTP)
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Schema, mapping or validation error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid provider configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No Kubernetes client is available
    #[error("Kubernetes client is not configured")]
    Unconfigured,

    /// Wait condition not met in time
    #[error("timed out after {waited} waiting for {condition}")]
    Timeout { condition: String, waited: String },

    /// Backend failure that is not an API status
    #[error("backend error: {0}")]
    Backend(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            KubeError::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }

    /// Short name of the error class, reported as "Error Type" in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            KubeError::Api(kube::Error::Api(_)) => "ApiError",
            KubeError::Api(_) => "ClientError",
            KubeError::NotFound { .. } => "NotFound",
            KubeError::Core(e) => e.kind(),
            KubeError::Serialization(_) => "SerializationError",
            KubeError::InvalidConfig(_) => "InvalidConfig",
            KubeError::Unconfigured => "Unconfigured",
            KubeError::Timeout { .. } => "Timeout",
            KubeError::Backend(_) => "BackendError",
            KubeError::Io(_) => "IoError",
        }
    }

    /// Convert into the diagnostic reported for `action` on `namespace/name`
    pub fn into_diagnostic(
        self,
        action: Action,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Diagnostic {
        if self.is_not_found() {
            return Diagnostic::error(
                "Unable to find resource",
                format!(
                    "Unable to find {} '{}/{}'. It may have been deleted outside of crdform.",
                    kind, namespace, name
                ),
            );
        }

        match self {
            KubeError::Unconfigured => unconfigured_client(),
            KubeError::Core(e) if !e.is_serialization() => e.into(),
            KubeError::Timeout { .. } => {
                Diagnostic::error("Wait condition not met", self.to_string())
            }
            other => Diagnostic::report_issue(
                action.summary(),
                action.description(),
                other.kind(),
                &other.to_string(),
            ),
        }
    }
}

/// The cluster operation an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Apply,
    Delete,
    Wait,
}

impl Action {
    fn summary(self) -> &'static str {
        match self {
            Action::Read => "Unable to GET resource",
            Action::Apply => "Unable to PATCH resource",
            Action::Delete => "Unable to DELETE resource",
            Action::Wait => "Unable to wait for resource",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Action::Read => "reading the resource",
            Action::Apply => "applying the resource",
            Action::Delete => "deleting the resource",
            Action::Wait => "waiting for the resource",
        }
    }
}

/// Diagnostic reported by cluster operations when no client is configured
pub fn unconfigured_client() -> Diagnostic {
    Diagnostic::error(
        "Unconfigured Kubernetes client",
        "Expected a configured Kubernetes client, got none. \
         The provider is running in offline mode or failed to build a client; \
         check the provider configuration.",
    )
}
