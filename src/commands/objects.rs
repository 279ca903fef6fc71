//! Implementation of the `cryorun objects` command.
//!
//! Lists registered data objects with their provenance.

use crate::cli::ObjectsArgs;
use crate::context::require_initialized;
use crate::error::Result;
use crate::project::Project;
use std::path::Path;

/// Execute the `cryorun objects` command.
pub fn cmd_objects(dir: &Path, args: ObjectsArgs) -> Result<()> {
    let ctx = require_initialized(dir)?;
    let project = Project::load(&ctx)?;

    let objects = project.objects();
    if objects.is_empty() {
        println!("No data objects registered.");
        return Ok(());
    }

    let start = objects.len().saturating_sub(args.limit);
    let shown = &objects[start..];

    println!("Data objects ({} of {}):", shown.len(), objects.len());
    println!();

    for object in shown {
        println!("  [{}] {} ({})", object.id, object.label, object.kind);
        println!("    Path:     {}", object.path.display());
        println!("    Protocol: {}", object.protocol);
        println!(
            "    Created:  {}",
            object.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Some(parent) = object.derived_from {
            match project.get(parent) {
                Some(source) => println!("    Source:   [{}] {}", source.id, source.label),
                None => println!("    Source:   [{}]", parent),
            }
        }
        println!();
    }

    Ok(())
}
