//! Core error types

use thiserror::Error;

use crate::validate::ValidationIssue;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing required attribute: {path}")]
    MissingRequired { path: String },

    #[error("Type mismatch at {path}: expected {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Unknown attribute '{name}' at {path}{hint}")]
    UnknownAttribute {
        path: String,
        name: String,
        hint: String,
    },

    #[error("Invalid value for {path}: {message}")]
    InvalidValue { path: String, message: String },

    #[error("Validation failed:\n{message}")]
    Validation {
        message: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("Invalid CRD: {message}")]
    InvalidCrd { message: String },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Unknown kind '{name}'{hint}")]
    UnknownKind { name: String, hint: String },

    #[error("Kind '{name}' is already registered")]
    DuplicateKind { name: String },

    #[error("Expected import identifier with format: 'namespace/name'. Got: '{id}'")]
    ImportFormat { id: String },

    #[error("Invalid duration '{value}': {message}")]
    InvalidDuration { value: String, message: String },

    #[error("Invalid --set format: '{arg}'. Expected key=value")]
    InvalidSet { arg: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Short machine-friendly name of the error class, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingRequired { .. } => "MissingRequired",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::UnknownAttribute { .. } => "UnknownAttribute",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::Validation { .. } => "Validation",
            Self::InvalidCrd { .. } => "InvalidCrd",
            Self::InvalidSchema { .. } => "InvalidSchema",
            Self::UnknownKind { .. } => "UnknownKind",
            Self::DuplicateKind { .. } => "DuplicateKind",
            Self::ImportFormat { .. } => "ImportFormat",
            Self::InvalidDuration { .. } => "InvalidDuration",
            Self::InvalidSet { .. } => "InvalidSet",
            Self::YamlParse(_) => "YamlError",
            Self::JsonParse(_) => "JsonError",
            Self::Io(_) => "IoError",
        }
    }

    /// Collect validation issues into a single error
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        let message = issues
            .iter()
            .map(|issue| format!("  - {}", issue))
            .collect::<Vec<_>>()
            .join("\n");
        Self::Validation { message, issues }
    }

    /// Whether this error comes from (de)serialization rather than user input
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::YamlParse(_) | Self::JsonParse(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
