//! Installation settings resolved from the process environment.
//!
//! Tool installations live under a single root directory. The root comes
//! from the `CRYORUN_ROOT` environment variable when set, falling back to
//! a fixed location under the user's home directory. This is the only
//! place the crate reads ambient environment state; everything downstream
//! receives a resolved [`Settings`] value.

use crate::error::{CryorunError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the tool installation root.
pub const ROOT_ENV_VAR: &str = "CRYORUN_ROOT";

/// Default installation root, relative to the user's home directory.
const DEFAULT_ROOT_SUFFIX: &str = ".local/share/cryorun";

/// Resolved installation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root directory under which tool directories are resolved.
    pub install_root: PathBuf,
}

impl Settings {
    /// Resolve settings from the process environment.
    ///
    /// `CRYORUN_ROOT` wins when set to a non-empty value. Otherwise the
    /// default root under the home directory is used.
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - With the resolved install root
    /// * `Err(CryorunError::ConfigError)` - If neither the variable nor a
    ///   home directory is available
    pub fn from_env() -> Result<Self> {
        match env::var(ROOT_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => Ok(Settings {
                install_root: PathBuf::from(value),
            }),
            _ => Ok(Settings {
                install_root: default_root()?,
            }),
        }
    }

    /// Build settings with an explicit install root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Settings {
            install_root: root.into(),
        }
    }

    /// Resolve a tool directory against the install root.
    ///
    /// Absolute paths pass through unchanged; relative paths are joined
    /// onto the install root.
    pub fn resolve_tool_dir(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.install_root.join(dir)
        }
    }
}

/// Default install root under the user's home directory.
fn default_root() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_ROOT_SUFFIX))
        .ok_or_else(|| {
            CryorunError::ConfigError(format!(
                "could not determine home directory; set {} explicitly",
                ROOT_ENV_VAR
            ))
        })
}
