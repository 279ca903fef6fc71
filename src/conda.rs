//! Conda installation discovery.
//!
//! External tools run inside conda environments. Activating one from a
//! non-interactive shell requires sourcing the activation script shipped
//! with the conda installation, so the runner has to locate that script
//! before it can build a command line. Discovery goes through
//! `conda info --base`, the same probe the interactive shell setup uses.

use crate::error::{CryorunError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Relative path from a conda base prefix to the activation script.
pub const ACTIVATION_SCRIPT: &str = "etc/profile.d/conda.sh";

/// Locate the conda activation script by probing the installed conda.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path to `etc/profile.d/conda.sh` under the conda base
/// * `Err(CryorunError::ConfigError)` - If conda is missing, the probe
///   fails, or the script does not exist under the reported base
pub fn discover_activation_script() -> Result<PathBuf> {
    let base = conda_base()?;
    activation_script_in(&base)
}

/// Resolve the activation script under a known conda base prefix.
pub fn activation_script_in(base: &Path) -> Result<PathBuf> {
    let script = base.join(ACTIVATION_SCRIPT);
    if script.is_file() {
        Ok(script)
    } else {
        Err(CryorunError::ConfigError(format!(
            "conda activation script not found at '{}'",
            script.display()
        )))
    }
}

/// Ask the installed conda for its base prefix via `conda info --base`.
pub fn conda_base() -> Result<PathBuf> {
    let output = Command::new("conda")
        .args(["info", "--base"])
        .output()
        .map_err(|e| {
            CryorunError::ConfigError(format!(
                "failed to execute conda info --base: {} (is conda installed?)",
                e
            ))
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let exit_code = output.status.code().unwrap_or(-1);
        let error_msg = if stderr.is_empty() { stdout } else { stderr };
        return Err(CryorunError::ConfigError(format!(
            "conda info --base failed (exit code {}): {}",
            exit_code, error_msg
        )));
    }

    if stdout.is_empty() {
        return Err(CryorunError::ConfigError(
            "conda info --base returned no output".to_string(),
        ));
    }

    Ok(PathBuf::from(stdout))
}
