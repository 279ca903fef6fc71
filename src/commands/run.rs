//! Implementation of the `cryorun run` command.
//!
//! Runs one external tool against an input file as a single blocking
//! child process and, on success, registers the produced output in the
//! project graph with a provenance link back to the input.
//!
//! # What `cryorun run` does
//!
//! 1. Loads `tools.yaml` and selects the requested (or default) profile
//! 2. Resolves conda activation and the tool directory
//! 3. Builds the command plan and, unless `--dry-run`, invokes it
//! 4. Registers the output object as derived from the input object
//! 5. Appends `run` and `register` events to the run log
//!
//! A failed invocation stops at step 3: nothing is registered and no
//! events are written.

use crate::cli::RunArgs;
use crate::commands::load_tools_config;
use crate::conda;
use crate::context::{ProjectContext, require_initialized};
use crate::error::Result;
use crate::invoke::{self, Activation, InvocationRequest, InvocationResult};
use crate::project::{DataObject, ObjectKind, Project};
use crate::runlog::{RunAction, RunEvent, append_event};
use crate::settings::Settings;
use crate::tools::{ToolDefaults, ToolProfile};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Execute the `cryorun run` command.
pub fn cmd_run(dir: &Path, args: RunArgs) -> Result<()> {
    let ctx = require_initialized(dir)?;
    let config = load_tools_config(&ctx)?;
    let (tool_id, profile) = config.select(args.tool.as_deref())?;

    let input = absolutize(dir, &args.input);
    let output = absolutize(dir, &args.output);

    let mut request = InvocationRequest::new(&input, &output)?;
    if let Some(extra) = &args.args {
        request = request.with_extra_args(extra.clone());
    }
    if let Some(activation) = resolve_activation(profile, &config.defaults)? {
        request = request.with_activation(activation);
    }

    // The install root only matters when the profile pins a tool
    // directory; resolving it lazily keeps env-free profiles env-free.
    let settings = match &profile.tool_dir {
        Some(_) => Settings::from_env()?,
        None => Settings::with_root(ctx.project_root.clone()),
    };

    let plan = profile.build_plan(&settings, request.activation().cloned(), &request)?;

    if args.dry_run {
        println!("{}", plan.render());
        return Ok(());
    }

    let timeout = args
        .timeout_seconds
        .or_else(|| profile.effective_timeout(&config.defaults))
        .map(Duration::from_secs);

    let result = invoke::invoke(&plan, &request, timeout)?;

    report_tool_output(&result);

    let (input_object, output_object) =
        register_run(&ctx, &input, &output, args.label.as_deref(), tool_id)?;

    append_event(
        &ctx,
        &RunEvent::new(RunAction::Run)
            .with_tool(tool_id)
            .with_details(json!({
                "input": input.display().to_string(),
                "output": output.display().to_string(),
                "exit_code": result.exit_code,
                "duration_ms": result.duration.as_millis() as u64,
                "command": plan.render(),
            })),
    )?;
    append_event(
        &ctx,
        &RunEvent::new(RunAction::Register)
            .with_tool(tool_id)
            .with_details(json!({
                "object_id": output_object.id,
                "derived_from": input_object.id,
            })),
    )?;

    println!(
        "Run completed in {} (exit code {}).",
        format_duration(result.duration),
        result.exit_code
    );
    println!();
    println!("Registered output:");
    println!("  [{}] {}", output_object.id, output_object.path.display());
    println!(
        "  derived from [{}] {}",
        input_object.id,
        input_object.path.display()
    );

    Ok(())
}

/// Resolve the conda activation stage for a profile.
///
/// Profiles without a conda environment run without activation. An
/// explicit `activation_script` in the profile wins over discovery,
/// which probes `conda info --base`.
fn resolve_activation(
    profile: &ToolProfile,
    defaults: &ToolDefaults,
) -> Result<Option<Activation>> {
    let Some(env_name) = &profile.conda_env else {
        return Ok(None);
    };

    let script = match &profile.activation_script {
        Some(script) => script.clone(),
        None => conda::discover_activation_script()?,
    };

    Ok(Some(Activation {
        script,
        activate_command: defaults.activate_command.clone(),
        env_name: env_name.clone(),
    }))
}

/// Make a user-supplied path absolute against the invocation directory.
fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Register the finished run in the project graph.
///
/// The input is registered as an imported root object if this is the
/// first run that uses it; the output is always a new object derived
/// from the input.
fn register_run(
    ctx: &ProjectContext,
    input: &Path,
    output: &Path,
    label: Option<&str>,
    tool_id: &str,
) -> Result<(DataObject, DataObject)> {
    let mut project = Project::load(ctx)?;

    let input_object = project.ensure_imported(input, ObjectKind::Volume, file_label(input))?;

    let output_label = label.map(str::to_string).unwrap_or_else(|| file_label(output));
    let output_object = project.register(
        ObjectKind::Volume,
        output,
        output_label,
        tool_id,
        Some(input_object.id),
    )?;

    Ok((input_object, output_object))
}

/// Echo the captured tool output once the run has finished.
///
/// Streams are captured rather than inherited, so they surface here in
/// one block after the child exits.
fn report_tool_output(result: &InvocationResult) {
    if !result.stdout.trim().is_empty() {
        println!("{}", result.stdout.trim_end());
    }
    if !result.stderr.trim().is_empty() {
        eprintln!("{}", result.stderr.trim_end());
    }
}

/// Default object label for a file path.
fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Render a duration as seconds with one decimal.
fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}
