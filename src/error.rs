//! Error types for the cryorun CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cryorun operations.
///
/// Each variant maps to a distinct exit code so that calling scripts can
/// tell a misconfigured environment apart from a tool that actually ran
/// and failed.
#[derive(Error, Debug)]
pub enum CryorunError {
    /// User provided invalid arguments or the project is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// A required path or environment value could not be resolved before
    /// the tool was started.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The external tool was started but exited non-zero or timed out.
    /// The message carries the tool's captured standard error.
    #[error("Tool invocation failed: {0}")]
    InvocationError(String),

    /// The external tool reported success but the output file it was asked
    /// to produce does not exist.
    #[error("Tool reported success but declared output '{}' does not exist", .0.display())]
    MissingArtifact(PathBuf),
}

impl CryorunError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CryorunError::UserError(_) => exit_codes::USER_ERROR,
            CryorunError::ConfigError(_) => exit_codes::CONFIG_FAILURE,
            CryorunError::InvocationError(_) => exit_codes::INVOCATION_FAILURE,
            CryorunError::MissingArtifact(_) => exit_codes::MISSING_ARTIFACT,
        }
    }
}

/// Result type alias for cryorun operations.
pub type Result<T> = std::result::Result<T, CryorunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = CryorunError::UserError("unknown tool 'frobnicate'".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn config_error_has_correct_exit_code() {
        let err = CryorunError::ConfigError("activation script not found".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);
    }

    #[test]
    fn invocation_error_has_correct_exit_code() {
        let err = CryorunError::InvocationError("exited with code 1".to_string());
        assert_eq!(err.exit_code(), exit_codes::INVOCATION_FAILURE);
    }

    #[test]
    fn missing_artifact_has_correct_exit_code() {
        let err = CryorunError::MissingArtifact(PathBuf::from("/out/map.mrc"));
        assert_eq!(err.exit_code(), exit_codes::MISSING_ARTIFACT);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = CryorunError::ConfigError("conda base could not be resolved".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: conda base could not be resolved"
        );

        let err = CryorunError::MissingArtifact(PathBuf::from("/out/map_enhanced.mrc"));
        assert_eq!(
            err.to_string(),
            "Tool reported success but declared output '/out/map_enhanced.mrc' does not exist"
        );
    }

    #[test]
    fn invocation_error_preserves_tool_stderr() {
        let err = CryorunError::InvocationError("exited with code 1: boom".to_string());
        assert!(err.to_string().contains("boom"));
    }
}
