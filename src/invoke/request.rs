//! Invocation requests.

use crate::error::{CryorunError, Result};
use crate::invoke::plan::Activation;
use std::path::{Path, PathBuf};

/// Input for one external tool invocation.
///
/// A request is immutable once constructed. The builder methods consume
/// and return the request so construction reads as one expression:
///
/// ```no_run
/// use cryorun::invoke::InvocationRequest;
///
/// let request = InvocationRequest::new("/data/map.mrc", "/out/map_enhanced.mrc")?
///     .with_extra_args("--gpu 0");
/// # Ok::<(), cryorun::error::CryorunError>(())
/// ```
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    input_path: PathBuf,
    output_path: PathBuf,
    extra_args: String,
    activation: Option<Activation>,
}

impl InvocationRequest {
    /// Create a request for the given input and output paths.
    ///
    /// # Returns
    ///
    /// * `Ok(InvocationRequest)` - With no extra arguments and no activation
    /// * `Err(CryorunError::ConfigError)` - If either path is empty
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Result<Self> {
        let input_path = input_path.into();
        let output_path = output_path.into();

        if input_path.as_os_str().is_empty() {
            return Err(CryorunError::ConfigError(
                "input path must not be empty".to_string(),
            ));
        }
        if output_path.as_os_str().is_empty() {
            return Err(CryorunError::ConfigError(
                "output path must not be empty".to_string(),
            ));
        }

        Ok(InvocationRequest {
            input_path,
            output_path,
            extra_args: String::new(),
            activation: None,
        })
    }

    /// Attach extra arguments, appended verbatim to the tool command line.
    pub fn with_extra_args(mut self, extra_args: impl Into<String>) -> Self {
        self.extra_args = extra_args.into();
        self
    }

    /// Attach an environment activation stage.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    /// Path of the input file the tool reads.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Path of the output file the tool is asked to produce.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Extra arguments, exactly as given.
    pub fn extra_args(&self) -> &str {
        &self.extra_args
    }

    /// The activation stage, if any.
    pub fn activation(&self) -> Option<&Activation> {
        self.activation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_input_path() {
        let err = InvocationRequest::new("", "/out/map.mrc").unwrap_err();
        assert!(matches!(err, CryorunError::ConfigError(_)));
        assert!(err.to_string().contains("input path"));
    }

    #[test]
    fn new_rejects_empty_output_path() {
        let err = InvocationRequest::new("/data/map.mrc", "").unwrap_err();
        assert!(matches!(err, CryorunError::ConfigError(_)));
        assert!(err.to_string().contains("output path"));
    }

    #[test]
    fn new_starts_without_extras_or_activation() {
        let request = InvocationRequest::new("/data/map.mrc", "/out/map.mrc").unwrap();

        assert_eq!(request.input_path(), Path::new("/data/map.mrc"));
        assert_eq!(request.output_path(), Path::new("/out/map.mrc"));
        assert_eq!(request.extra_args(), "");
        assert!(request.activation().is_none());
    }

    #[test]
    fn builder_methods_set_fields() {
        let activation = Activation {
            script: PathBuf::from("/opt/conda/etc/profile.d/conda.sh"),
            activate_command: "conda".to_string(),
            env_name: "cryoten_env".to_string(),
        };

        let request = InvocationRequest::new("/data/map.mrc", "/out/map.mrc")
            .unwrap()
            .with_extra_args("--gpu 0")
            .with_activation(activation.clone());

        assert_eq!(request.extra_args(), "--gpu 0");
        assert_eq!(request.activation(), Some(&activation));
    }
}
