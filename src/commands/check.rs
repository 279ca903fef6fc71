//! Implementation of the `cryorun check` command.
//!
//! Probes the environment each configured tool needs, without running
//! any tool: the entrypoint must parse, the conda activation script must
//! exist for tools that activate an environment, and the tool directory
//! must resolve against the install root. Every probe is reported on its
//! own line so all problems surface in one pass.

use crate::cli::CheckArgs;
use crate::commands::load_tools_config;
use crate::conda;
use crate::context::require_initialized;
use crate::error::{CryorunError, Result};
use crate::settings::Settings;
use crate::tools::{ToolProfile, template};
use std::path::Path;

/// Outcome of one environment probe.
struct Probe {
    label: &'static str,
    outcome: std::result::Result<String, String>,
}

impl Probe {
    fn ok(label: &'static str, detail: impl Into<String>) -> Self {
        Self {
            label,
            outcome: Ok(detail.into()),
        }
    }

    fn fail(label: &'static str, detail: impl Into<String>) -> Self {
        Self {
            label,
            outcome: Err(detail.into()),
        }
    }

    fn failed(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Execute the `cryorun check` command.
pub fn cmd_check(dir: &Path, args: CheckArgs) -> Result<()> {
    let ctx = require_initialized(dir)?;
    let config = load_tools_config(&ctx)?;

    let selected: Vec<(&str, &ToolProfile)> = match args.tool.as_deref() {
        Some(name) => vec![config.select(Some(name))?],
        None => config.iter().collect(),
    };

    if selected.is_empty() {
        println!("No tools configured; nothing to check.");
        return Ok(());
    }

    let mut failures = 0;
    for (id, profile) in selected {
        println!("{}:", id);
        for probe in probe_profile(profile) {
            match &probe.outcome {
                Ok(detail) => println!("  ok    {}: {}", probe.label, detail),
                Err(detail) => {
                    failures += 1;
                    println!("  FAIL  {}: {}", probe.label, detail);
                }
            }
        }
        println!();
    }

    if failures > 0 {
        return Err(CryorunError::ConfigError(format!(
            "{} check(s) failed",
            failures
        )));
    }

    println!("All checks passed.");
    Ok(())
}

/// Run every probe that applies to a profile.
///
/// Probes are scoped to what the profile actually uses: conda is only
/// probed for tools that activate an environment, the install root only
/// for tools with a relative tool directory.
fn probe_profile(profile: &ToolProfile) -> Vec<Probe> {
    let mut probes = vec![probe_entrypoint(profile)];
    if let Some(probe) = probe_activation(profile) {
        probes.push(probe);
    }
    if let Some(probe) = probe_tool_dir(profile) {
        probes.push(probe);
    }
    probes
}

/// Check that the entrypoint template renders and parses.
fn probe_entrypoint(profile: &ToolProfile) -> Probe {
    let values = template::values([("input", "INPUT"), ("output", "OUTPUT")]);

    let rendered = match template::render(&profile.entrypoint, &values) {
        Ok(rendered) => rendered,
        Err(e) => return Probe::fail("entrypoint", e.to_string()),
    };

    match shell_words::split(&rendered) {
        Err(e) => Probe::fail("entrypoint", format!("does not parse: {}", e)),
        Ok(words) => match words.first() {
            None => Probe::fail("entrypoint", "empty after parsing"),
            Some(program) => Probe::ok("entrypoint", format!("runs '{}'", program)),
        },
    }
}

/// Check that the activation script resolves, for tools that need one.
fn probe_activation(profile: &ToolProfile) -> Option<Probe> {
    profile.conda_env.as_ref()?;

    let probe = match &profile.activation_script {
        Some(script) => {
            if script.is_file() {
                Probe::ok("activation script", script.display().to_string())
            } else {
                Probe::fail(
                    "activation script",
                    format!("missing: {}", script.display()),
                )
            }
        }
        None => match conda::discover_activation_script() {
            Ok(script) => Probe::ok("activation script", script.display().to_string()),
            Err(e) => Probe::fail("activation script", e.to_string()),
        },
    };

    Some(probe)
}

/// Check that the tool directory exists, for tools that pin one.
fn probe_tool_dir(profile: &ToolProfile) -> Option<Probe> {
    let tool_dir = profile.tool_dir.as_ref()?;

    let resolved = if tool_dir.is_absolute() {
        tool_dir.clone()
    } else {
        match Settings::from_env() {
            Ok(settings) => settings.resolve_tool_dir(tool_dir),
            Err(e) => return Some(Probe::fail("tool directory", e.to_string())),
        }
    };

    let probe = if resolved.is_dir() {
        Probe::ok("tool directory", resolved.display().to_string())
    } else {
        Probe::fail("tool directory", format!("missing: {}", resolved.display()))
    };

    Some(probe)
}
