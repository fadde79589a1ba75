//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - generated resources violate a schema
pub const VALIDATION_ERROR: i32 = 2;

/// Configuration error - invalid property, fragment, profile or processor setting
pub const CONFIG_ERROR: i32 = 3;

/// Project error - missing or invalid manifold.yaml
pub const PROJECT_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
