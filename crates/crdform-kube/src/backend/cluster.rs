//! Kubernetes API backend

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;
use kube::{Client, Config};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

use super::{ApiTarget, ApplyParams, ClusterBackend};
use crate::error::{KubeError, Result};

/// Backend talking to a real API server
#[derive(Clone)]
pub struct KubeBackend {
    client: Client,
}

impl KubeBackend {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from a kubeconfig file and/or context, or infer one
    /// (in-cluster service account, then `$KUBECONFIG`, then `~/.kube/config`)
    pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Self> {
        let options = KubeConfigOptions {
            context: context.map(String::from),
            ..Default::default()
        };

        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    KubeError::InvalidConfig(format!(
                        "failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| KubeError::InvalidConfig(e.to_string()))?
            }
            None if context.is_some() => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| KubeError::InvalidConfig(e.to_string()))?,
            None => Config::infer()
                .await
                .map_err(|e| KubeError::InvalidConfig(e.to_string()))?,
        };

        debug!(cluster_url = %config.cluster_url, "building Kubernetes client");
        let client = Client::try_from(config)?;
        Ok(Self::new(client))
    }

    /// Get the underlying Kubernetes client
    pub fn kube_client(&self) -> &Client {
        &self.client
    }

    fn api(&self, target: &ApiTarget, namespace: &str) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(&target.group, &target.version, &target.kind);
        let resource = ApiResource::from_gvk_with_plural(&gvk, &target.plural);
        if target.namespaced {
            Api::namespaced_with(self.client.clone(), namespace, &resource)
        } else {
            Api::all_with(self.client.clone(), &resource)
        }
    }
}

#[async_trait]
impl ClusterBackend for KubeBackend {
    async fn get(&self, target: &ApiTarget, namespace: &str, name: &str) -> Result<JsonValue> {
        debug!(
            api_version = %target.api_version(),
            resource = %target.plural,
            namespace,
            name,
            "GET"
        );
        let object = self.api(target, namespace).get(name).await?;
        Ok(serde_json::to_value(&object)?)
    }

    async fn apply(
        &self,
        target: &ApiTarget,
        namespace: &str,
        name: &str,
        body: &JsonValue,
        params: &ApplyParams,
    ) -> Result<JsonValue> {
        debug!(
            api_version = %target.api_version(),
            resource = %target.plural,
            namespace,
            name,
            field_manager = %params.field_manager,
            force = params.force,
            "PATCH (server-side apply)"
        );

        let mut patch_params = PatchParams::apply(&params.field_manager);
        patch_params.force = params.force;

        let object = self
            .api(target, namespace)
            .patch(name, &patch_params, &Patch::Apply(body))
            .await?;
        Ok(serde_json::to_value(&object)?)
    }

    async fn delete(&self, target: &ApiTarget, namespace: &str, name: &str) -> Result<()> {
        debug!(
            api_version = %target.api_version(),
            resource = %target.plural,
            namespace,
            name,
            "DELETE"
        );
        self.api(target, namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}
