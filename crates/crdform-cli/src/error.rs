//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use crdform_core::{CoreError, Diagnostic as ProviderDiagnostic};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration failed validation
    #[error("{message}")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The object does not exist in the cluster
    #[error("{summary}")]
    #[diagnostic(code(crdform::cli::not_found))]
    NotFound {
        summary: String,
        #[help]
        detail: Option<String>,
    },

    /// A provider operation failed
    #[error("{summary}")]
    #[diagnostic(code(crdform::cli::provider))]
    Provider {
        summary: String,
        #[help]
        detail: Option<String>,
    },

    /// Invalid arguments (unknown kind, missing input)
    #[error("{message}")]
    #[diagnostic(code(crdform::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    /// Internal error (serialization, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(crdform::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Provider { .. } => exit_codes::PROVIDER_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => e.into(),
            CoreError::UnknownKind { .. } => CliError::Usage {
                message: err.to_string(),
                help: Some("Run `crdform kinds` to list registered kinds".to_string()),
            },
            other => ProviderDiagnostic::from(other).into(),
        }
    }
}

impl From<ProviderDiagnostic> for CliError {
    fn from(diag: ProviderDiagnostic) -> Self {
        let detail = (!diag.detail.is_empty()).then_some(diag.detail);
        match diag.summary.as_str() {
            "Invalid configuration" | "Error parsing ID" => CliError::Validation {
                message: detail.unwrap_or_else(|| diag.summary.clone()),
                help: None,
            },
            "Unknown kind" => CliError::Usage {
                message: detail.unwrap_or_else(|| diag.summary.clone()),
                help: Some("Run `crdform kinds` to list registered kinds".to_string()),
            },
            "Unable to find resource" => CliError::NotFound {
                summary: diag.summary,
                detail,
            },
            _ => CliError::Provider {
                summary: diag.summary,
                detail,
            },
        }
    }
}

impl From<crdform_kube::KubeError> for CliError {
    fn from(err: crdform_kube::KubeError) -> Self {
        match err {
            crdform_kube::KubeError::Io(e) => e.into(),
            crdform_kube::KubeError::InvalidConfig(message) => CliError::Usage {
                message: format!("invalid provider configuration: {}", message),
                help: None,
            },
            other => CliError::Provider {
                summary: other.to_string(),
                detail: None,
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_exit_codes() {
        let not_found: CliError =
            ProviderDiagnostic::error("Unable to find resource", "gone").into();
        assert_eq!(not_found.exit_code(), exit_codes::NOT_FOUND);

        let invalid: CliError =
            ProviderDiagnostic::error("Invalid configuration", "spec.vip: too long").into();
        assert_eq!(invalid.exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(invalid.to_string(), "spec.vip: too long");

        let provider: CliError = ProviderDiagnostic::error("Unable to GET resource", "boom").into();
        assert_eq!(provider.exit_code(), exit_codes::PROVIDER_ERROR);
    }

    #[test]
    fn test_unknown_kind_is_usage_error() {
        let err: CliError = CoreError::UnknownKind {
            name: "Widget".to_string(),
            hint: String::new(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
    }
}
