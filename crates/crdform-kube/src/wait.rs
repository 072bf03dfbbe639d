//! Post-apply wait loop
//!
//! Polls the object until its `wait_for` condition holds or the timeout
//! elapses.

use crdform_core::{WaitFor, WaitTimeout};
use humantime_serde::re::humantime;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::backend::{ApiTarget, ClusterBackend};
use crate::error::{KubeError, Result};

/// Wait until `condition` holds for `namespace/name`, returning the last object read
pub async fn wait_for_condition(
    backend: &dyn ClusterBackend,
    target: &ApiTarget,
    namespace: &str,
    name: &str,
    condition: &WaitFor,
    interval: Duration,
) -> Result<JsonValue> {
    let timeout = condition.deadline()?;
    let start = Instant::now();

    loop {
        let object = backend.get(target, namespace, name).await?;
        if condition.is_satisfied(&object)? {
            debug!(
                namespace,
                name,
                jsonpath = %condition.jsonpath,
                elapsed = ?start.elapsed(),
                "wait condition met"
            );
            return Ok(object);
        }

        let limit = match timeout {
            WaitTimeout::CheckOnce => Duration::ZERO,
            WaitTimeout::Within(limit) => limit,
        };
        let elapsed = start.elapsed();
        if elapsed >= limit {
            return Err(KubeError::Timeout {
                condition: describe(condition),
                waited: humantime::format_duration(truncate_millis(elapsed)).to_string(),
            });
        }

        tokio::time::sleep(interval.min(limit - elapsed)).await;
    }
}

fn describe(condition: &WaitFor) -> String {
    match &condition.value {
        Some(value) => format!("'{}' to equal '{}'", condition.jsonpath, value),
        None => format!("'{}' to be set", condition.jsonpath),
    }
}

fn truncate_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use serde_json::json;

    const POLL: Duration = Duration::from_millis(10);

    fn target() -> ApiTarget {
        ApiTarget {
            group: "org.eclipse.che".to_string(),
            version: "v2".to_string(),
            kind: "CheCluster".to_string(),
            plural: "checlusters".to_string(),
            namespaced: true,
        }
    }

    #[tokio::test]
    async fn test_condition_already_met() {
        let backend = MockBackend::new();
        backend.seed(
            &target(),
            "eclipse-che",
            "che",
            json!({"metadata": {"name": "che"}, "status": {"chePhase": "Active"}}),
        );

        let wait = WaitFor::new(".status.chePhase").with_value("Active");
        let object = wait_for_condition(&backend, &target(), "eclipse-che", "che", &wait, POLL)
            .await
            .unwrap();
        assert_eq!(object["status"]["chePhase"], "Active");
        assert_eq!(backend.operation_counts().gets, 1);
    }

    #[tokio::test]
    async fn test_check_once_does_not_poll() {
        let backend = MockBackend::new();
        backend.seed(&target(), "eclipse-che", "che", json!({"metadata": {"name": "che"}}));

        let wait = WaitFor::new(".status.chePhase").with_timeout("0");
        let err = wait_for_condition(&backend, &target(), "eclipse-che", "che", &wait, POLL)
            .await
            .unwrap_err();
        assert!(matches!(err, KubeError::Timeout { .. }));
        assert_eq!(backend.operation_counts().gets, 1);
    }

    #[tokio::test]
    async fn test_times_out_after_polling() {
        let backend = MockBackend::new();
        backend.seed(
            &target(),
            "eclipse-che",
            "che",
            json!({"metadata": {"name": "che"}, "status": {"chePhase": "Pending"}}),
        );

        let wait = WaitFor::new(".status.chePhase")
            .with_value("Active")
            .with_timeout("50ms");
        let err = wait_for_condition(&backend, &target(), "eclipse-che", "che", &wait, POLL)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("'.status.chePhase' to equal 'Active'"));
        assert!(backend.operation_counts().gets > 1);
    }

    #[tokio::test]
    async fn test_missing_object_fails_immediately() {
        let backend = MockBackend::new();
        let wait = WaitFor::new(".status.chePhase");
        let err = wait_for_condition(&backend, &target(), "eclipse-che", "che", &wait, POLL)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
