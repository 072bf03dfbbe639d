//! crdform Kube - Kubernetes integration
//!
//! This crate provides the cluster-facing half of crdform:
//! - `ClusterBackend`: GET / server-side-apply PATCH / DELETE, with a kube-rs
//!   implementation and an in-memory mock
//! - `Provider`: configuration, shared client and per-kind components
//! - `DataSource`, `ManifestGenerator`, `Resource`: the three components every
//!   registered kind gets
//! - `wait_for_condition`: post-apply polling

pub mod backend;
pub mod data_source;
pub mod error;
pub mod manifest;
pub mod provider;
pub mod resource;
pub mod wait;

pub use backend::{
    ApiTarget, ApplyParams, ClusterBackend, KubeBackend, MockBackend, OperationCounts,
};
pub use data_source::DataSource;
pub use error::{Action, KubeError, Result};
pub use manifest::ManifestGenerator;
pub use provider::{DEFAULT_FIELD_MANAGER, Provider, ProviderConfig, ProviderData};
pub use resource::{ApplyError, PlanAction, Resource};
pub use wait::wait_for_condition;
