//! Deterministic command plans.
//!
//! A plan captures everything needed to start an external tool: the
//! optional environment activation stage, the working directory, the
//! program with its arguments in fixed order, and extra user arguments
//! appended verbatim. A plan with an activation stage must run through a
//! shell, because activation works by sourcing a script into the shell
//! that then runs the tool. Without one the program is spawned directly
//! and nothing is shell-interpreted.

use crate::error::{CryorunError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment activation stage of a command plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Shell script sourced to make the activation command available.
    pub script: PathBuf,
    /// Command used to activate the environment, usually `conda`.
    pub activate_command: String,
    /// Name of the environment to activate.
    pub env_name: String,
}

/// Deterministic description of one external tool invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandPlan {
    /// Optional activation stage. Present means execution goes through
    /// `bash -c` with the rendered line.
    pub activation: Option<Activation>,
    /// Working directory for the tool, if any.
    pub workdir: Option<PathBuf>,
    /// Program to execute.
    pub program: String,
    /// Arguments in fixed order, already free of shell quoting.
    pub args: Vec<String>,
    /// Extra user arguments, appended verbatim to the rendered line.
    pub extra_args: String,
    /// Additional environment variables for the child process.
    pub env: BTreeMap<String, String>,
}

impl CommandPlan {
    /// True when the plan must run through a shell.
    pub fn requires_shell(&self) -> bool {
        self.activation.is_some()
    }

    /// Render the full command line for this plan.
    ///
    /// Segments are joined with `&&` so a failed activation or directory
    /// change aborts the invocation instead of running the tool in the
    /// wrong environment:
    ///
    /// `source <script> && <cmd> activate <env> && cd <dir> && <program> <args...> <extra>`
    ///
    /// Paths and arguments are shell-quoted; the extra arguments are
    /// appended exactly as given.
    pub fn render(&self) -> String {
        let mut segments = Vec::new();

        if let Some(activation) = &self.activation {
            segments.push(format!(
                "source {}",
                shell_words::quote(&activation.script.to_string_lossy())
            ));
            segments.push(format!(
                "{} activate {}",
                activation.activate_command,
                shell_words::quote(&activation.env_name)
            ));
        }

        if let Some(workdir) = &self.workdir {
            segments.push(format!(
                "cd {}",
                shell_words::quote(&workdir.to_string_lossy())
            ));
        }

        let mut tool = shell_words::join(
            std::iter::once(self.program.as_str()).chain(self.args.iter().map(|s| s.as_str())),
        );
        let extra = self.extra_args.trim();
        if !extra.is_empty() {
            tool.push(' ');
            tool.push_str(extra);
        }
        segments.push(tool);

        segments.join(" && ")
    }

    /// Argument vector for direct execution without a shell.
    ///
    /// The extra arguments are split with shell-words so quoting inside
    /// the extra string survives the transition to an argument list.
    pub fn direct_args(&self) -> Result<Vec<String>> {
        let mut args = self.args.clone();

        let extra = self.extra_args.trim();
        if !extra.is_empty() {
            let split = shell_words::split(extra).map_err(|e| {
                CryorunError::UserError(format!(
                    "failed to parse extra arguments '{}': {}\n\
                     Fix: check for unmatched quotes or invalid escape sequences.",
                    extra, e
                ))
            })?;
            args.extend(split);
        }

        Ok(args)
    }
}
