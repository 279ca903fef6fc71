//! Command implementations for cryorun.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command except `init` requires an initialized
//! project and resolves it from the current working directory.

mod check;
mod history;
mod init;
mod objects;
mod run;
mod tools_cmd;

use crate::cli::Command;
use crate::context::ProjectContext;
use crate::error::{CryorunError, Result};
use crate::tools::ToolsConfig;
use std::env;

/// Dispatch a command to its implementation.
///
/// The working directory is resolved once here and passed down so the
/// command functions stay testable against temporary directories.
pub fn dispatch(command: Command) -> Result<()> {
    let cwd = env::current_dir().map_err(|e| {
        CryorunError::UserError(format!("failed to get current working directory: {}", e))
    })?;

    match command {
        Command::Init => init::cmd_init(&cwd),
        Command::Run(args) => run::cmd_run(&cwd, args),
        Command::Tools => tools_cmd::cmd_tools(&cwd),
        Command::Check(args) => check::cmd_check(&cwd, args),
        Command::Objects(args) => objects::cmd_objects(&cwd, args),
        Command::History(args) => history::cmd_history(&cwd, args),
    }
}

/// Load the project's tools config, failing with guidance when absent.
pub(crate) fn load_tools_config(ctx: &ProjectContext) -> Result<ToolsConfig> {
    ToolsConfig::load(ctx.tools_config_path())?.ok_or_else(|| {
        CryorunError::UserError(format!(
            "no tools config found at {}\n\n\
             Run `cryorun init` to create a starter config.",
            ctx.tools_config_path().display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use crate::test_support::create_test_project;

    #[test]
    fn load_tools_config_missing_file_points_at_init() {
        let (_temp, ctx) = create_test_project();

        let err = load_tools_config(&ctx).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("cryorun init"));
    }

    #[test]
    fn load_tools_config_reads_existing_file() {
        let (_temp, ctx) = create_test_project();
        crate::test_support::write_tools_config(&ctx, crate::test_support::passthrough_tools_yaml());

        let config = load_tools_config(&ctx).unwrap();
        assert!(config.has_tools());
    }
}
