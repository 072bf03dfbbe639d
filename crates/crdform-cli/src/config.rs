//! Provider settings and configuration input
//!
//! Provider settings are layered: defaults, then `--provider-config`, then
//! `CRDFORM_*` environment variables, then command-line flags.

use clap::Args;
use crdform_core::{GvkDescriptor, Registry, StateRecord, Values, parse_set_values};
use crdform_kube::{MockBackend, Provider, ProviderConfig};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::display;
use crate::error::{CliError, Result};

/// Flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Do not build a Kubernetes client (manifests only)
    #[arg(long, global = true)]
    pub offline: bool,

    /// Path to a kubeconfig file
    #[arg(long, global = true, value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Default field manager for server-side apply
    #[arg(long, global = true)]
    pub field_manager: Option<String>,

    /// Force apply conflicts by default
    #[arg(long, global = true)]
    pub force_conflicts: bool,

    /// Provider settings file (YAML)
    #[arg(long, global = true, value_name = "FILE")]
    pub provider_config: Option<PathBuf>,

    /// Register additional CRDs from a file (repeatable)
    #[arg(long = "crd", global = true, value_name = "FILE")]
    pub crds: Vec<PathBuf>,

    /// Use an in-memory cluster instead of a real one
    #[arg(long, global = true)]
    pub mock: bool,
}

impl ProviderArgs {
    /// Resolve the effective provider settings
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let base = match &self.provider_config {
            Some(path) => ProviderConfig::from_file(path)?,
            None => ProviderConfig::default(),
        };
        let mut config = base.with_env(|key| std::env::var(key).ok())?;

        if self.offline {
            config.offline = true;
        }
        if let Some(path) = &self.kubeconfig {
            config.kubeconfig = Some(path.clone());
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }
        if let Some(manager) = &self.field_manager {
            config.field_manager = manager.clone();
        }
        if self.force_conflicts {
            config.force_conflicts = true;
        }
        Ok(config)
    }

    /// Built-in kinds plus every `--crd` file
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::builtin()?;
        for path in &self.crds {
            let count = registry.register_crd_file(path)?;
            tracing::debug!(path = %path.display(), count, "registered CRD file");
        }
        Ok(registry)
    }

    /// Configure the provider, printing configuration diagnostics to stderr
    pub async fn provider(&self) -> Result<Provider> {
        let config = self.provider_config()?;
        let registry = self.registry()?;

        let provider = if self.mock {
            Provider::with_backend(&config, registry, Arc::new(MockBackend::new()))
        } else {
            Provider::configure(config, registry).await
        };

        for diag in provider.diagnostics() {
            display::print_diagnostic(diag);
        }
        Ok(provider)
    }
}

/// Merge configuration files in order, then `--set` overrides
pub fn load_values(files: &[PathBuf], set: &[String]) -> Result<Values> {
    if files.is_empty() && set.is_empty() {
        return Err(CliError::usage_with_help(
            "no configuration given",
            "Pass a configuration file with -f or values with --set key=value",
        ));
    }

    let mut values = Values::new();
    for file in files {
        let layer = Values::from_file(file).map_err(|e| match e {
            crdform_core::CoreError::Io(io) => CliError::Io {
                message: format!("{}: {}", file.display(), io),
            },
            other => CliError::validation(format!("{}: {}", file.display(), other)),
        })?;
        values.merge(&layer);
    }
    values.merge(&parse_set_values(set)?);
    Ok(values)
}

/// Load a state file together with the kind it belongs to
pub fn load_state(registry: &Registry, path: &Path) -> Result<(Arc<GvkDescriptor>, StateRecord)> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    let json: JsonValue = serde_yaml::from_str(&content)?;

    let field = |key: &str| json.get(key).and_then(JsonValue::as_str).unwrap_or_default();
    let (api_version, kind) = (field("api_version"), field("kind"));
    let descriptor = registry
        .kinds()
        .iter()
        .find(|k| k.kind == kind && k.api_version() == api_version)
        .cloned()
        .ok_or_else(|| {
            CliError::usage_with_help(
                format!(
                    "state file {} is for unregistered kind '{}' ({})",
                    path.display(),
                    kind,
                    api_version
                ),
                "Register the CRD with --crd",
            )
        })?;

    let state = StateRecord::from_json(&descriptor, &json)?;
    Ok((descriptor, state))
}

/// Write a state record as YAML
pub fn save_state(path: &Path, state: &StateRecord) -> Result<()> {
    let yaml = serde_yaml::to_string(state)?;
    std::fs::write(path, yaml)?;
    Ok(())
}
