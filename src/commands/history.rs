//! Implementation of the `cryorun history` command.
//!
//! Shows the most recent entries of the append-only run log.

use crate::cli::HistoryArgs;
use crate::context::require_initialized;
use crate::error::Result;
use crate::runlog::read_events;
use std::path::Path;

/// Execute the `cryorun history` command.
pub fn cmd_history(dir: &Path, args: HistoryArgs) -> Result<()> {
    let ctx = require_initialized(dir)?;
    let events = read_events(&ctx)?;

    if events.is_empty() {
        println!("No run events recorded.");
        return Ok(());
    }

    let start = events.len().saturating_sub(args.tail);
    let shown = &events[start..];

    println!("Run events ({} of {}):", shown.len(), events.len());
    println!();

    for event in shown {
        let tool = event.tool.as_deref().unwrap_or("-");
        println!(
            "  {}  {:<8}  {:<12}  {}",
            event.ts.format("%Y-%m-%d %H:%M:%S UTC"),
            event.action.to_string(),
            tool,
            event.actor
        );
    }

    Ok(())
}
