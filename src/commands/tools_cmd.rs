//! Implementation of the `cryorun tools` command.
//!
//! Lists the tool profiles configured in `tools.yaml`.

use crate::commands::load_tools_config;
use crate::context::require_initialized;
use crate::error::Result;
use std::path::Path;

/// Execute the `cryorun tools` command.
pub fn cmd_tools(dir: &Path) -> Result<()> {
    let ctx = require_initialized(dir)?;
    let config = load_tools_config(&ctx)?;

    if !config.has_tools() {
        println!("No tools configured.");
        println!();
        println!("Edit {} to add tool profiles.", ctx.tools_config_path().display());
        return Ok(());
    }

    println!("Configured tools ({}):", config.tools.len());
    println!();

    for (id, tool) in config.iter() {
        let marker = if tool.default { " (default)" } else { "" };
        println!("  {}{}", id, marker);

        if !tool.name.is_empty() {
            println!("    Name:       {}", tool.name);
        }
        println!("    Entrypoint: {}", tool.entrypoint);
        if let Some(env) = &tool.conda_env {
            println!("    Conda env:  {}", env);
        }
        if let Some(tool_dir) = &tool.tool_dir {
            println!("    Tool dir:   {}", tool_dir.display());
        }
        if let Some(timeout) = tool.effective_timeout(&config.defaults) {
            println!("    Timeout:    {}s", timeout);
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_project, passthrough_tools_yaml, write_tools_config};

    #[test]
    fn tools_lists_configured_profiles() {
        let (_temp, ctx) = create_test_project();
        write_tools_config(&ctx, passthrough_tools_yaml());

        cmd_tools(&ctx.project_root).unwrap();
    }

    #[test]
    fn tools_handles_empty_config() {
        let (_temp, ctx) = create_test_project();
        write_tools_config(&ctx, "tools: {}\n");

        cmd_tools(&ctx.project_root).unwrap();
    }

    #[test]
    fn tools_requires_initialized_project() {
        let temp_dir = tempfile::TempDir::new().unwrap();

        let err = cmd_tools(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("cryorun init"));
    }
}
