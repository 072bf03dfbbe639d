//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - configuration failed schema validation
pub const VALIDATION_ERROR: i32 = 2;

/// Provider error - the cluster rejected or failed an operation
pub const PROVIDER_ERROR: i32 = 3;

/// Not found - the object does not exist in the cluster
pub const NOT_FOUND: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
