//! Exit code constants for the cryorun CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state)
//! - 2: Configuration failure (unresolvable paths or environment)
//! - 3: Invocation failure (tool exited non-zero or timed out)
//! - 4: Missing artifact (tool succeeded but declared output is absent)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid state, or unknown tool.
pub const USER_ERROR: i32 = 1;

/// Configuration failure: activation script, tool directory, or install
/// root could not be resolved.
pub const CONFIG_FAILURE: i32 = 2;

/// Invocation failure: the external tool exited non-zero or timed out.
pub const INVOCATION_FAILURE: i32 = 3;

/// Missing artifact: the tool reported success but its declared output
/// file does not exist.
pub const MISSING_ARTIFACT: i32 = 4;
