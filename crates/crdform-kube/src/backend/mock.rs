//! Mock backend for testing
//!
//! This backend stores objects in memory, useful for unit tests and
//! `--mock` runs without requiring a Kubernetes cluster.

use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ApiTarget, ApplyParams, ClusterBackend};
use crate::error::{KubeError, Result};

/// (`plural.group/version`, namespace, name)
type ObjectKey = (String, String, String);

/// In-memory backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    store: Arc<RwLock<BTreeMap<ObjectKey, JsonValue>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
    /// Parameters of every apply, in order
    applies: Arc<RwLock<Vec<ApplyParams>>>,
    /// When set, every operation fails with this message
    failure: Arc<RwLock<Option<String>>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub applies: usize,
    pub deletes: usize,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn key(target: &ApiTarget, namespace: &str, name: &str) -> ObjectKey {
    (
        format!("{}.{}/{}", target.plural, target.group, target.version),
        namespace.to_string(),
        name.to_string(),
    )
}

impl MockBackend {
    /// Create a new empty mock backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object as-is, bypassing apply semantics
    pub fn seed(&self, target: &ApiTarget, namespace: &str, name: &str, object: JsonValue) {
        write(&self.store).insert(key(target, namespace, name), object);
    }

    /// Replace the `status` of a stored object, as a controller would
    pub fn set_status(
        &self,
        target: &ApiTarget,
        namespace: &str,
        name: &str,
        status: JsonValue,
    ) -> bool {
        let mut store = write(&self.store);
        match store
            .get_mut(&key(target, namespace, name))
            .and_then(JsonValue::as_object_mut)
        {
            Some(object) => {
                object.insert("status".to_string(), status);
                true
            }
            None => false,
        }
    }

    /// Make every following operation fail with a backend error
    pub fn fail_with(&self, message: impl Into<String>) {
        *write(&self.failure) = Some(message.into());
    }

    /// Stop injecting failures
    pub fn clear_failure(&self) {
        *write(&self.failure) = None;
    }

    /// Get a stored object (for testing)
    pub fn object(&self, target: &ApiTarget, namespace: &str, name: &str) -> Option<JsonValue> {
        read(&self.store).get(&key(target, namespace, name)).cloned()
    }

    /// Count stored objects
    pub fn object_count(&self) -> usize {
        read(&self.store).len()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        read(&self.operations).clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        *write(&self.operations) = OperationCounts::default();
    }

    /// Parameters of the most recent apply
    pub fn last_apply(&self) -> Option<ApplyParams> {
        read(&self.applies).last().cloned()
    }

    fn check_failure(&self) -> Result<()> {
        match read(&self.failure).as_ref() {
            Some(message) => Err(KubeError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn not_found(target: &ApiTarget, namespace: &str, name: &str) -> KubeError {
        KubeError::NotFound {
            kind: target.kind.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ClusterBackend for MockBackend {
    async fn get(&self, target: &ApiTarget, namespace: &str, name: &str) -> Result<JsonValue> {
        write(&self.operations).gets += 1;
        self.check_failure()?;

        read(&self.store)
            .get(&key(target, namespace, name))
            .cloned()
            .ok_or_else(|| Self::not_found(target, namespace, name))
    }

    async fn apply(
        &self,
        target: &ApiTarget,
        namespace: &str,
        name: &str,
        body: &JsonValue,
        params: &ApplyParams,
    ) -> Result<JsonValue> {
        write(&self.operations).applies += 1;
        write(&self.applies).push(params.clone());
        self.check_failure()?;

        if !body.is_object() {
            return Err(KubeError::Backend("apply body must be an object".to_string()));
        }

        let mut store = write(&self.store);
        let object_key = key(target, namespace, name);
        let next_uid = store.len() + 1;

        let object = match store.get(&object_key) {
            Some(existing) => {
                let mut object = existing.clone();
                merge_applied(&mut object, body);
                bump_generation(&mut object);
                object
            }
            None => {
                let mut object = body.clone();
                if let Some(metadata) = object
                    .as_object_mut()
                    .map(|o| o.entry("metadata").or_insert_with(|| json!({})))
                    .and_then(JsonValue::as_object_mut)
                {
                    metadata.insert("uid".to_string(), json!(format!("mock-uid-{}", next_uid)));
                    metadata.insert("resourceVersion".to_string(), json!("1"));
                    metadata.insert("generation".to_string(), json!(1));
                    metadata.insert(
                        "managedFields".to_string(),
                        json!([{"manager": params.field_manager, "operation": "Apply"}]),
                    );
                }
                object
            }
        };

        store.insert(object_key, object.clone());
        Ok(object)
    }

    async fn delete(&self, target: &ApiTarget, namespace: &str, name: &str) -> Result<()> {
        write(&self.operations).deletes += 1;
        self.check_failure()?;

        write(&self.store)
            .remove(&key(target, namespace, name))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(target, namespace, name))
    }
}

/// Apply `body` over a stored object: objects merge, everything else is replaced
fn merge_applied(base: &mut JsonValue, body: &JsonValue) {
    match (base, body) {
        (JsonValue::Object(base_map), JsonValue::Object(body_map)) => {
            for (k, v) in body_map {
                match base_map.get_mut(k) {
                    Some(existing) => merge_applied(existing, v),
                    None => {
                        base_map.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (base, body) => *base = body.clone(),
    }
}

fn bump_generation(object: &mut JsonValue) {
    let Some(metadata) = object.get_mut("metadata").and_then(JsonValue::as_object_mut) else {
        return;
    };
    let bump = |metadata: &mut JsonMap<String, JsonValue>, field: &str, as_string: bool| {
        let current = match metadata.get(field) {
            Some(JsonValue::String(s)) => s.parse::<u64>().unwrap_or(0),
            Some(JsonValue::Number(n)) => n.as_u64().unwrap_or(0),
            _ => 0,
        };
        let next = current + 1;
        let value = if as_string { json!(next.to_string()) } else { json!(next) };
        metadata.insert(field.to_string(), value);
    };
    bump(metadata, "resourceVersion", true);
    bump(metadata, "generation", false);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ApiTarget {
        ApiTarget {
            group: "networking.elb.io".to_string(),
            version: "v1".to_string(),
            kind: "ExternalLoadBalancer".to_string(),
            plural: "externalloadbalancers".to_string(),
            namespaced: true,
        }
    }

    fn params() -> ApplyParams {
        ApplyParams {
            field_manager: "crdform".to_string(),
            force: false,
        }
    }

    #[tokio::test]
    async fn test_apply_creates_then_merges() {
        let backend = MockBackend::new();
        let body = json!({
            "apiVersion": "networking.elb.io/v1",
            "kind": "ExternalLoadBalancer",
            "metadata": {"name": "demo", "namespace": "default"},
            "spec": {"vip": "10.0.0.1", "ports": [{"port": 80}]}
        });

        let created = backend
            .apply(&target(), "default", "demo", &body, &params())
            .await
            .unwrap();
        assert_eq!(created["metadata"]["uid"], "mock-uid-1");
        assert_eq!(created["metadata"]["generation"], 1);

        let update = json!({
            "metadata": {"name": "demo", "namespace": "default"},
            "spec": {"ports": [{"port": 443}]}
        });
        let updated = backend
            .apply(&target(), "default", "demo", &update, &params())
            .await
            .unwrap();
        assert_eq!(updated["spec"]["vip"], "10.0.0.1");
        assert_eq!(updated["spec"]["ports"], json!([{"port": 443}]));
        assert_eq!(updated["metadata"]["generation"], 2);
        assert_eq!(updated["metadata"]["resourceVersion"], "2");

        assert_eq!(backend.object_count(), 1);
        assert_eq!(backend.operation_counts().applies, 2);
    }

    #[tokio::test]
    async fn test_get_and_delete_missing() {
        let backend = MockBackend::new();

        let err = backend.get(&target(), "default", "missing").await.unwrap_err();
        assert!(err.is_not_found());

        let err = backend.delete(&target(), "default", "missing").await.unwrap_err();
        assert!(err.is_not_found());

        let counts = backend.operation_counts();
        assert_eq!(counts.gets, 1);
        assert_eq!(counts.deletes, 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MockBackend::new();
        backend.seed(&target(), "default", "demo", json!({"metadata": {"name": "demo"}}));
        backend.fail_with("connection refused");

        let err = backend.get(&target(), "default", "demo").await.unwrap_err();
        assert!(matches!(err, KubeError::Backend(ref m) if m == "connection refused"));
        assert!(!err.is_not_found());

        backend.clear_failure();
        assert!(backend.get(&target(), "default", "demo").await.is_ok());
    }

    #[tokio::test]
    async fn test_set_status_and_reset_counts() {
        let backend = MockBackend::new();
        assert!(!backend.set_status(&target(), "default", "demo", json!({"phase": "Active"})));

        backend.seed(&target(), "default", "demo", json!({"metadata": {"name": "demo"}}));
        assert!(backend.set_status(&target(), "default", "demo", json!({"phase": "Active"})));

        let object = backend.get(&target(), "default", "demo").await.unwrap();
        assert_eq!(object["status"]["phase"], "Active");

        backend.reset_counts();
        assert_eq!(backend.operation_counts(), OperationCounts::default());
    }
}
