//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - no readable manifests, or a resource could not be processed
pub const INPUT_ERROR: i32 = 2;

/// Analysis error - relationship detection failed
pub const ANALYSIS_ERROR: i32 = 3;

/// Generation error - charts could not be built from the graph
pub const GENERATE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, output exists, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Deadline given with `--timeout` passed (same as timeout(1))
pub const TIMEOUT: i32 = 124;

/// Interrupted by Ctrl-C (128 + SIGINT)
pub const INTERRUPTED: i32 = 130;
