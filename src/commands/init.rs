//! Implementation of the `cryorun init` command.
//!
//! Creates the project state directory in the current directory.
//!
//! # What `cryorun init` does
//!
//! 1. Creates the `.cryorun/` state directory
//! 2. Writes a starter `tools.yaml` (if missing)
//! 3. Appends an `init` event to the run log
//!
//! The command is **idempotent**: re-running it never overwrites an
//! edited `tools.yaml` and never errors on an existing project.

use crate::context::ProjectContext;
use crate::error::{CryorunError, Result};
use crate::fs::atomic_write_file;
use crate::runlog::{RunAction, RunEvent, append_event};
use crate::tools::starter_config_content;
use serde_json::json;
use std::fs;
use std::path::Path;

/// Execute the `cryorun init` command.
pub fn cmd_init(dir: &Path) -> Result<()> {
    // Init always roots the project where it is run, even when an
    // enclosing directory is already a project.
    let ctx = ProjectContext::at(dir);
    let already_initialized = ctx.is_initialized();

    create_state_dir(&ctx)?;
    let config_written = seed_tools_config(&ctx)?;

    if !already_initialized {
        let event = RunEvent::new(RunAction::Init).with_details(json!({
            "project_root": ctx.project_root.display().to_string(),
        }));
        append_event(&ctx, &event)?;
    }

    if already_initialized {
        println!("Reinitialized existing cryorun project.");
    } else {
        println!("Initialized cryorun project.");
    }
    println!();
    println!("Project root: {}", ctx.project_root.display());
    println!("State dir:    {}", ctx.state_dir.display());

    if config_written {
        println!();
        println!("Created starter tools config:");
        println!("  {}", ctx.tools_config_path().display());
        println!();
        println!("Next steps:");
        println!("  1. Edit tools.yaml to match your installation");
        println!("  2. Run `cryorun check` to verify the environment");
        println!("  3. Run `cryorun run --input <map.mrc> --output <enhanced.mrc>`");
    }

    Ok(())
}

/// Create the `.cryorun/` state directory.
fn create_state_dir(ctx: &ProjectContext) -> Result<()> {
    fs::create_dir_all(&ctx.state_dir).map_err(|e| {
        CryorunError::UserError(format!(
            "failed to create state directory '{}': {}",
            ctx.state_dir.display(),
            e
        ))
    })
}

/// Write the starter `tools.yaml` unless one already exists.
///
/// Returns true when the file was written.
fn seed_tools_config(ctx: &ProjectContext) -> Result<bool> {
    let path = ctx.tools_config_path();
    if path.exists() {
        return Ok(false);
    }

    atomic_write_file(&path, starter_config_content())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runlog::read_events;
    use crate::tools::ToolsConfig;
    use tempfile::TempDir;

    #[test]
    fn init_creates_state_dir_and_starter_config() {
        let temp_dir = TempDir::new().unwrap();

        cmd_init(temp_dir.path()).unwrap();

        let ctx = ProjectContext::at(temp_dir.path());
        assert!(ctx.is_initialized());
        assert!(ctx.tools_config_path().exists());

        let config = ToolsConfig::load(ctx.tools_config_path()).unwrap().unwrap();
        let (id, tool) = config.default_tool().unwrap();
        assert_eq!(id, "cryoten");
        assert!(tool.needs_activation());
    }

    #[test]
    fn init_appends_one_init_event() {
        let temp_dir = TempDir::new().unwrap();

        cmd_init(temp_dir.path()).unwrap();

        let ctx = ProjectContext::at(temp_dir.path());
        let events = read_events(&ctx).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, RunAction::Init);
    }

    #[test]
    fn init_is_idempotent_and_preserves_edited_config() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ProjectContext::at(temp_dir.path());

        cmd_init(temp_dir.path()).unwrap();

        let edited = "tools:\n  mytool:\n    entrypoint: \"mytool {input} {output}\"\n";
        std::fs::write(ctx.tools_config_path(), edited).unwrap();

        cmd_init(temp_dir.path()).unwrap();

        let content = std::fs::read_to_string(ctx.tools_config_path()).unwrap();
        assert_eq!(content, edited);

        // Re-running does not pile up init events.
        let events = read_events(&ctx).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn init_roots_at_given_directory_not_enclosing_project() {
        let temp_dir = TempDir::new().unwrap();
        cmd_init(temp_dir.path()).unwrap();

        let inner = temp_dir.path().join("session-02");
        std::fs::create_dir(&inner).unwrap();
        cmd_init(&inner).unwrap();

        let inner_ctx = ProjectContext::at(&inner);
        assert!(inner_ctx.is_initialized());
    }
}
