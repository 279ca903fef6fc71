//! Project context resolution for cryorun.
//!
//! A project is any directory containing a `.cryorun/` state directory.
//! Commands can be invoked from anywhere inside the project; resolution
//! walks up the directory tree to find the state directory, the same way
//! version control tools locate their repository root.

use crate::error::{CryorunError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the project state directory.
pub const STATE_DIR_NAME: &str = ".cryorun";

/// Resolved paths for a cryorun project.
///
/// All paths are derived from the project root.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Directory containing the `.cryorun/` state directory.
    pub project_root: PathBuf,

    /// The `.cryorun/` state directory itself.
    pub state_dir: PathBuf,
}

impl ProjectContext {
    /// Resolve the project context from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            CryorunError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Ok(Self::resolve_from(&cwd))
    }

    /// Resolve the project context starting from a specific directory.
    ///
    /// Walks up the ancestors of `dir` looking for a `.cryorun/` state
    /// directory. When none is found the context is rooted at `dir`
    /// itself, uninitialized.
    pub fn resolve_from<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();

        for ancestor in dir.ancestors() {
            if ancestor.join(STATE_DIR_NAME).is_dir() {
                return Self::at(ancestor);
            }
        }

        Self::at(dir)
    }

    /// Build the context for an explicit project root without searching.
    ///
    /// Used by `init`, which creates the state directory where it is run
    /// instead of attaching to an enclosing project.
    pub fn at<P: AsRef<Path>>(root: P) -> Self {
        let project_root = root.as_ref().to_path_buf();
        let state_dir = project_root.join(STATE_DIR_NAME);

        Self {
            project_root,
            state_dir,
        }
    }

    /// Check if the project state directory exists.
    pub fn is_initialized(&self) -> bool {
        self.state_dir.is_dir()
    }

    /// Ensure the project is initialized, returning an error if not.
    ///
    /// Called by every command except `init` so users get pointed at the
    /// missing step instead of a missing-file error.
    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(CryorunError::UserError(format!(
                "project not initialized.\n\
                 Expected state directory at: {}\n\n\
                 Run `cryorun init` to initialize a project in this directory.",
                self.state_dir.display()
            )));
        }

        Ok(())
    }

    /// Get the path to the tools config file.
    pub fn tools_config_path(&self) -> PathBuf {
        self.state_dir.join("tools.yaml")
    }

    /// Get the path to the data object registry file.
    pub fn objects_file(&self) -> PathBuf {
        self.state_dir.join("objects.ndjson")
    }

    /// Get the path to the run event log file.
    pub fn runs_file(&self) -> PathBuf {
        self.state_dir.join("runs.ndjson")
    }
}

/// Convenience function to resolve a context from a directory and require
/// an initialized project.
pub fn require_initialized<P: AsRef<Path>>(dir: P) -> Result<ProjectContext> {
    let ctx = ProjectContext::resolve_from(dir);
    ctx.ensure_initialized()?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_from_project_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(STATE_DIR_NAME)).unwrap();

        let ctx = ProjectContext::resolve_from(temp_dir.path());

        assert_eq!(ctx.project_root, temp_dir.path());
        assert!(ctx.is_initialized());
    }

    #[test]
    fn test_resolve_from_subdirectory_finds_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(STATE_DIR_NAME)).unwrap();

        let subdir = temp_dir.path().join("maps").join("session-01");
        fs::create_dir_all(&subdir).unwrap();

        let ctx = ProjectContext::resolve_from(&subdir);

        assert_eq!(ctx.project_root, temp_dir.path());
        assert!(ctx.is_initialized());
    }

    #[test]
    fn test_resolve_without_state_dir_roots_at_given_directory() {
        let temp_dir = TempDir::new().unwrap();

        let ctx = ProjectContext::resolve_from(temp_dir.path());

        assert_eq!(ctx.project_root, temp_dir.path());
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn test_at_ignores_enclosing_project() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(STATE_DIR_NAME)).unwrap();

        let inner = temp_dir.path().join("inner");
        fs::create_dir_all(&inner).unwrap();

        let ctx = ProjectContext::at(&inner);

        assert_eq!(ctx.project_root, inner);
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn test_ensure_initialized_fails_with_guidance() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ProjectContext::at(temp_dir.path());

        let err = ctx.ensure_initialized().unwrap_err();
        assert!(matches!(err, CryorunError::UserError(_)));
        assert!(err.to_string().contains("cryorun init"));
    }

    #[test]
    fn test_state_file_paths() {
        let ctx = ProjectContext::at("/project");

        assert_eq!(
            ctx.tools_config_path(),
            PathBuf::from("/project/.cryorun/tools.yaml")
        );
        assert_eq!(
            ctx.objects_file(),
            PathBuf::from("/project/.cryorun/objects.ndjson")
        );
        assert_eq!(
            ctx.runs_file(),
            PathBuf::from("/project/.cryorun/runs.ndjson")
        );
    }

    #[test]
    fn test_require_initialized() {
        let temp_dir = TempDir::new().unwrap();

        assert!(require_initialized(temp_dir.path()).is_err());

        fs::create_dir(temp_dir.path().join(STATE_DIR_NAME)).unwrap();
        let ctx = require_initialized(temp_dir.path()).unwrap();
        assert_eq!(ctx.project_root, temp_dir.path());
    }
}
