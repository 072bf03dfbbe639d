//! crdform Core - schema descriptors and value mapping for Kubernetes CRDs
//!
//! This crate provides the cluster-independent half of crdform:
//! - `Attribute` / `ResourceSchema`: declarative schema trees derived from CRDs
//! - `AttrValue`: recursive value type for configuration and state
//! - `mapper`: attribute tree <-> Kubernetes JSON
//! - `GvkDescriptor` / `Registry`: the kinds the provider exposes
//! - `render_manifest`: offline YAML rendering
//! - Identity rules (`name/namespace` state IDs, `namespace/name` import IDs)

pub mod crd;
pub mod diagnostic;
pub mod error;
pub mod gvk;
pub mod identity;
pub mod manifest;
pub mod mapper;
pub mod registry;
pub mod schema;
pub mod state;
pub mod suggest;
pub mod validate;
pub mod value;
pub mod values;
pub mod wait;

pub use crd::{CrdDefinition, CrdParser};
pub use diagnostic::{Diagnostic, Severity};
pub use error::{CoreError, Result};
pub use gvk::{ComponentKind, GvkDescriptor};
pub use identity::{ImportId, ObjectMeta, requires_replace, state_id};
pub use manifest::{ManifestState, render_manifest};
pub use registry::Registry;
pub use schema::{AttrType, Attribute, ResourceSchema};
pub use state::{ManifestConfig, ResourceConfig, StateRecord};
pub use validate::{ValidationIssue, Validator};
pub use value::AttrValue;
pub use values::{Values, parse_set_values};
pub use wait::{WaitFor, WaitTimeout};
