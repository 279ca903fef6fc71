use crate::context::ProjectContext;
use std::env;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Scoped override of one environment variable.
///
/// Restores the previous value (or unsets the variable) on drop.
pub(crate) struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        // Mutating the process environment is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = ENV_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let previous = env::var(key).ok();
        // SAFETY: the lock above serializes every environment mutation in tests.
        unsafe { env::set_var(key, value) };
        Self {
            key,
            previous,
            _lock: lock,
        }
    }

    pub(crate) fn unset(key: &'static str) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let previous = env::var(key).ok();
        // SAFETY: the lock above serializes every environment mutation in tests.
        unsafe { env::remove_var(key) };
        Self {
            key,
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: still holding the lock acquired at construction.
        unsafe {
            match &self.previous {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Create a temporary directory with an initialized project state dir.
pub(crate) fn create_test_project() -> (TempDir, ProjectContext) {
    let temp_dir = TempDir::new().unwrap();
    let ctx = ProjectContext::at(temp_dir.path());
    std::fs::create_dir_all(&ctx.state_dir).unwrap();
    (temp_dir, ctx)
}

/// Write a tools config into a test project.
pub(crate) fn write_tools_config(ctx: &ProjectContext, yaml: &str) {
    std::fs::write(ctx.tools_config_path(), yaml).unwrap();
}

/// A tools config whose single tool copies its input to its output.
///
/// Runs without conda, without an install root, and is the default tool,
/// so command tests can exercise the whole pipeline with nothing
/// installed.
pub(crate) fn passthrough_tools_yaml() -> &'static str {
    r#"
tools:
  passthrough:
    name: "Copy passthrough"
    entrypoint: "cp {input} {output}"
    default: true
"#
}
