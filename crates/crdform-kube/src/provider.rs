//! Provider configuration and component registration
//!
//! `Provider::configure` runs once. It builds the shared [`ProviderData`]
//! (the cluster backend plus apply defaults) that every data source and
//! resource receives. Offline mode and client construction failures leave
//! the backend unset; cluster operations then fail fast.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crdform_core::{ComponentKind, Diagnostic, GvkDescriptor, Registry, ResourceConfig};

use crate::backend::{ApplyParams, ClusterBackend, KubeBackend};
use crate::data_source::DataSource;
use crate::error::{KubeError, Result, unconfigured_client};
use crate::manifest::ManifestGenerator;
use crate::resource::Resource;

/// Field manager used when neither the resource nor the provider names one
pub const DEFAULT_FIELD_MANAGER: &str = "crdform";

/// Interval between GETs while waiting for a condition
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const ENV_OFFLINE: &str = "CRDFORM_OFFLINE";
pub const ENV_KUBECONFIG: &str = "KUBECONFIG";
pub const ENV_CONTEXT: &str = "CRDFORM_CONTEXT";
pub const ENV_FIELD_MANAGER: &str = "CRDFORM_FIELD_MANAGER";
pub const ENV_FORCE_CONFLICTS: &str = "CRDFORM_FORCE_CONFLICTS";

/// Provider-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Never build a Kubernetes client; only manifests can be rendered
    pub offline: bool,
    /// Path to a kubeconfig file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Default field manager for server-side apply
    pub field_manager: String,
    /// Default for forcing apply conflicts
    pub force_conflicts: bool,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            offline: false,
            kubeconfig: None,
            context: None,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ProviderConfig {
    /// Load from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| KubeError::InvalidConfig(e.to_string()))
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Override fields from environment variables resolved by `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_OFFLINE) {
            self.offline = parse_bool(ENV_OFFLINE, &raw)?;
        }
        if let Some(path) = lookup(ENV_KUBECONFIG).filter(|p| !p.is_empty()) {
            self.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(context) = lookup(ENV_CONTEXT).filter(|c| !c.is_empty()) {
            self.context = Some(context);
        }
        if let Some(manager) = lookup(ENV_FIELD_MANAGER).filter(|m| !m.is_empty()) {
            self.field_manager = manager;
        }
        if let Some(raw) = lookup(ENV_FORCE_CONFLICTS) {
            self.force_conflicts = parse_bool(ENV_FORCE_CONFLICTS, &raw)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.field_manager.trim().is_empty() {
            return Err(KubeError::InvalidConfig(
                "field_manager must not be empty".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(KubeError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(KubeError::InvalidConfig(format!(
            "{} must be a boolean, got '{}'",
            var, raw
        ))),
    }
}

/// State shared by every component after configuration
pub struct ProviderData {
    backend: Option<Arc<dyn ClusterBackend>>,
    field_manager: String,
    force_conflicts: bool,
    poll_interval: Duration,
}

impl ProviderData {
    /// The configured backend, or the "unconfigured client" diagnostic
    pub fn backend(&self) -> std::result::Result<&dyn ClusterBackend, Diagnostic> {
        self.backend.as_deref().ok_or_else(unconfigured_client)
    }

    pub fn is_offline(&self) -> bool {
        self.backend.is_none()
    }

    /// Resolve apply parameters: resource override, then provider default
    pub fn apply_params(&self, config: &ResourceConfig) -> ApplyParams {
        ApplyParams {
            field_manager: config
                .field_manager
                .clone()
                .unwrap_or_else(|| self.field_manager.clone()),
            force: config.force_conflicts.unwrap_or(self.force_conflicts),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// A configured provider: the kind registry plus shared data
pub struct Provider {
    registry: Arc<Registry>,
    data: Arc<ProviderData>,
    diagnostics: Vec<Diagnostic>,
}

impl Provider {
    /// Configure against a real cluster, unless `config.offline` is set
    ///
    /// Never fails: problems are recorded as diagnostics and leave the
    /// provider without a backend.
    pub async fn configure(config: ProviderConfig, registry: Registry) -> Self {
        let mut diagnostics = Vec::new();

        if let Err(e) = config.validate() {
            diagnostics.push(Diagnostic::error("Invalid provider configuration", e.to_string()));
            return Self::assemble(&config, registry, None, diagnostics);
        }

        if config.offline {
            warn!("provider is running in offline mode");
            diagnostics.push(Diagnostic::warning(
                "Provider configured in offline mode",
                "No Kubernetes client was built. Manifests can be rendered, \
                 but data sources and resources will fail.",
            ));
            return Self::assemble(&config, registry, None, diagnostics);
        }

        match KubeBackend::connect(config.kubeconfig.as_deref(), config.context.as_deref()).await {
            Ok(backend) => {
                debug!(kinds = registry.len(), "provider configured");
                Self::assemble(&config, registry, Some(Arc::new(backend)), diagnostics)
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Unable to create Kubernetes client",
                    format!(
                        "An unexpected error occurred while creating the Kubernetes client: {}",
                        e
                    ),
                ));
                Self::assemble(&config, registry, None, diagnostics)
            }
        }
    }

    /// Configure with an explicit backend (tests, `--mock`)
    pub fn with_backend(
        config: &ProviderConfig,
        registry: Registry,
        backend: Arc<dyn ClusterBackend>,
    ) -> Self {
        let backend = if config.offline { None } else { Some(backend) };
        Self::assemble(config, registry, backend, Vec::new())
    }

    fn assemble(
        config: &ProviderConfig,
        registry: Registry,
        backend: Option<Arc<dyn ClusterBackend>>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            data: Arc::new(ProviderData {
                backend,
                field_manager: config.field_manager.clone(),
                force_conflicts: config.force_conflicts,
                poll_interval: config.poll_interval,
            }),
            diagnostics,
        }
    }

    /// Diagnostics produced while configuring
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn data(&self) -> Arc<ProviderData> {
        Arc::clone(&self.data)
    }

    /// Every component type name, grouped per kind
    pub fn type_names(&self) -> Vec<(ComponentKind, String)> {
        self.registry
            .kinds()
            .iter()
            .flat_map(|kind| {
                ComponentKind::ALL
                    .iter()
                    .map(move |c| (*c, kind.type_name(*c)))
            })
            .collect()
    }

    fn lookup(&self, name: &str) -> std::result::Result<Arc<GvkDescriptor>, Diagnostic> {
        self.registry.lookup(name).map_err(Diagnostic::from)
    }

    pub fn data_source(&self, name: &str) -> std::result::Result<DataSource, Diagnostic> {
        Ok(DataSource::new(self.lookup(name)?, self.data()))
    }

    pub fn resource(&self, name: &str) -> std::result::Result<Resource, Diagnostic> {
        Ok(Resource::new(self.lookup(name)?, self.data()))
    }

    pub fn manifest(&self, name: &str) -> std::result::Result<ManifestGenerator, Diagnostic> {
        Ok(ManifestGenerator::new(self.lookup(name)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert!(!config.offline);
        assert_eq!(config.field_manager, "crdform");
        assert!(!config.force_conflicts);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_config_from_yaml() {
        let config = ProviderConfig::from_yaml(
            "offline: true\nfield_manager: ops\nforce_conflicts: true\npoll_interval: 500ms\n",
        )
        .unwrap();
        assert!(config.offline);
        assert_eq!(config.field_manager, "ops");
        assert!(config.force_conflicts);
        assert_eq!(config.poll_interval, Duration::from_millis(500));

        assert!(ProviderConfig::from_yaml("offlne: true\n").is_err());
    }

    #[test]
    fn test_config_from_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_OFFLINE, "1"),
            (ENV_CONTEXT, "kind-dev"),
            (ENV_FIELD_MANAGER, "pipeline"),
            (ENV_FORCE_CONFLICTS, "true"),
        ]);
        let config = ProviderConfig::default()
            .with_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert!(config.offline);
        assert_eq!(config.context.as_deref(), Some("kind-dev"));
        assert_eq!(config.field_manager, "pipeline");
        assert!(config.force_conflicts);
        assert!(config.kubeconfig.is_none());

        let bad = ProviderConfig::default()
            .with_env(|key| (key == ENV_OFFLINE).then(|| "maybe".to_string()));
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_offline_configure_warns_and_has_no_backend() {
        let config = ProviderConfig {
            offline: true,
            ..Default::default()
        };
        let provider = Provider::configure(config, Registry::builtin().unwrap()).await;

        assert_eq!(provider.diagnostics().len(), 1);
        assert!(!provider.diagnostics()[0].is_error());
        assert!(provider.data().is_offline());

        let diag = provider.data().backend().err().unwrap();
        assert_eq!(diag.summary, "Unconfigured Kubernetes client");
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error_diagnostic() {
        let config = ProviderConfig {
            field_manager: " ".to_string(),
            ..Default::default()
        };
        let provider = Provider::configure(config, Registry::builtin().unwrap()).await;
        assert!(provider.diagnostics()[0].is_error());
        assert!(provider.data().is_offline());
    }

    #[test]
    fn test_apply_params_fallback() {
        let config = ProviderConfig {
            field_manager: "provider-manager".to_string(),
            force_conflicts: true,
            ..Default::default()
        };
        let registry = Registry::builtin().unwrap();
        let provider = Provider::with_backend(&config, registry, Arc::new(MockBackend::new()));
        let data = provider.data();

        let mut resource = ResourceConfig::default();
        assert_eq!(
            data.apply_params(&resource),
            ApplyParams {
                field_manager: "provider-manager".to_string(),
                force: true
            }
        );

        resource.field_manager = Some("resource-manager".to_string());
        resource.force_conflicts = Some(false);
        assert_eq!(
            data.apply_params(&resource),
            ApplyParams {
                field_manager: "resource-manager".to_string(),
                force: false
            }
        );
    }

    #[test]
    fn test_components_per_kind() {
        let provider = Provider::with_backend(
            &ProviderConfig::default(),
            Registry::builtin().unwrap(),
            Arc::new(MockBackend::new()),
        );

        assert_eq!(provider.type_names().len(), 6);
        assert!(provider.resource("ExternalLoadBalancer").is_ok());
        assert!(provider.data_source("checlusters").is_ok());
        assert!(provider.manifest("crdform_org_eclipse_che_che_cluster_v2_manifest").is_ok());

        let diag = provider.resource("ExternalLoadBalancr").err().unwrap();
        assert_eq!(diag.summary, "Unknown kind");
        assert!(diag.detail.contains("ExternalLoadBalancer"));
    }
}
