//! CLI commands

// Offline commands
pub mod kinds;
pub mod manifest;
pub mod schema;
pub mod validate;

// Cluster commands
pub mod apply;
pub mod delete;
pub mod get;
pub mod import;
pub mod refresh;
