//! User-facing diagnostics
//!
//! Every operation turns its failures into a `Diagnostic` at the boundary;
//! nothing is retried and nothing panics.

use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A summary line plus detail text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Diagnostic for an unexpected internal failure
    pub fn report_issue(
        summary: impl Into<String>,
        action: &str,
        kind: &str,
        message: &str,
    ) -> Self {
        Self::error(
            summary,
            format!(
                "An unexpected error occurred while {}. Please report this issue to the provider developers.\n\nError Type: {}\nError Message: {}",
                action, kind, message
            ),
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if !self.detail.is_empty() {
            write!(f, "\n\n{}", self.detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

impl From<CoreError> for Diagnostic {
    fn from(e: CoreError) -> Self {
        match &e {
            CoreError::ImportFormat { .. } => {
                Diagnostic::error("Error parsing ID", e.to_string())
            }
            CoreError::Validation { .. }
            | CoreError::MissingRequired { .. }
            | CoreError::TypeMismatch { .. }
            | CoreError::UnknownAttribute { .. }
            | CoreError::InvalidValue { .. }
            | CoreError::InvalidDuration { .. }
            | CoreError::InvalidSet { .. } => {
                Diagnostic::error("Invalid configuration", e.to_string())
            }
            CoreError::UnknownKind { .. } => Diagnostic::error("Unknown kind", e.to_string()),
            CoreError::YamlParse(_) | CoreError::JsonParse(_) => Diagnostic::report_issue(
                "Unable to serialize resource",
                "serializing the resource",
                e.kind(),
                &e.to_string(),
            ),
            _ => Diagnostic::error("Provider error", e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_diagnostic() {
        let diag: Diagnostic = CoreError::ImportFormat {
            id: "default".to_string(),
        }
        .into();
        assert!(diag.is_error());
        assert_eq!(diag.summary, "Error parsing ID");
        assert!(diag.detail.contains("'namespace/name'"));
        assert!(diag.detail.contains("Got: 'default'"));
    }

    #[test]
    fn test_report_issue_detail() {
        let diag = Diagnostic::report_issue(
            "Unable to GET resource",
            "reading the resource",
            "ApiError",
            "boom",
        );
        assert!(diag.detail.contains("Please report this issue"));
        assert!(diag.detail.contains("Error Type: ApiError"));
        assert!(diag.detail.contains("Error Message: boom"));
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::warning("Offline mode", "");
        assert_eq!(diag.to_string(), "Warning: Offline mode");
    }
}
