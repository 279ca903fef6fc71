//! Tool configuration schema.
//!
//! This module defines the `tools.yaml` configuration file format, which
//! describes the external tools a project can invoke.
//!
//! # File Format
//!
//! ```yaml
//! tools:
//!   cryoten:
//!     name: "CryoTen map enhancement"
//!     entrypoint: "python eval.py {input} {output}"
//!     conda_env: cryoten_env
//!     tool_dir: "software/em/cryoten-1.0.0/cryoten"
//!     timeout_seconds: 7200
//!     environment:
//!       CUDA_VISIBLE_DEVICES: "0"
//!     default: true
//!
//! defaults:
//!   activate_command: conda
//! ```
//!
//! # Entrypoint Placeholders
//!
//! - `{input}` - Shell-quoted path of the input file
//! - `{output}` - Shell-quoted path of the output file
//!
//! Both placeholders are mandatory so the request paths always reach the
//! tool in a fixed position.

use crate::error::{CryorunError, Result};
use crate::invoke::{Activation, CommandPlan, InvocationRequest};
use crate::settings::Settings;
use crate::tools::template::{self, TemplateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for all tools, loaded from `tools.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Tool profiles keyed by identifier.
    #[serde(default)]
    pub tools: BTreeMap<String, ToolProfile>,

    /// Default settings applied to all tools.
    #[serde(default)]
    pub defaults: ToolDefaults,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Default settings for tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefaults {
    /// Command used to activate conda environments.
    #[serde(default = "default_activate_command")]
    pub activate_command: String,

    /// Default wall-clock limit in seconds; absent means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            activate_command: default_activate_command(),
            timeout_seconds: None,
            extra: BTreeMap::new(),
        }
    }
}

fn default_activate_command() -> String {
    "conda".to_string()
}

/// Profile for a single external tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolProfile {
    /// Human-readable name for the tool.
    #[serde(default)]
    pub name: String,

    /// Entrypoint template with `{input}` and `{output}` placeholders.
    pub entrypoint: String,

    /// Conda environment the tool runs in; absent means no activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conda_env: Option<String>,

    /// Explicit activation script, overriding conda discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_script: Option<PathBuf>,

    /// Directory the tool runs in, resolved against the install root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_dir: Option<PathBuf>,

    /// Wall-clock limit in seconds (overrides the default if set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Environment variables to set for the tool process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Whether this is the default tool.
    #[serde(default)]
    pub default: bool,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ToolProfile {
    /// True when this tool needs a conda environment activated.
    pub fn needs_activation(&self) -> bool {
        self.conda_env.is_some()
    }

    /// Get the effective timeout for this tool, if any.
    pub fn effective_timeout(&self, defaults: &ToolDefaults) -> Option<u64> {
        self.timeout_seconds.or(defaults.timeout_seconds)
    }

    /// Build the command plan for one invocation of this tool.
    ///
    /// The request paths are shell-quoted, substituted into the
    /// entrypoint template, and the result is split into an argument
    /// list. The tool directory is resolved against the install root.
    ///
    /// # Arguments
    ///
    /// * `settings` - Resolved installation settings
    /// * `activation` - Activation stage, already resolved by the caller
    /// * `request` - The invocation request
    pub fn build_plan(
        &self,
        settings: &Settings,
        activation: Option<Activation>,
        request: &InvocationRequest,
    ) -> Result<CommandPlan> {
        let values = template::values([
            (
                "input",
                shell_words::quote(&request.input_path().to_string_lossy()).into_owned(),
            ),
            (
                "output",
                shell_words::quote(&request.output_path().to_string_lossy()).into_owned(),
            ),
        ]);

        let rendered = template::render(&self.entrypoint, &values).map_err(|e| match e {
            TemplateError::UndefinedPlaceholder { name, .. } => CryorunError::UserError(format!(
                "tool entrypoint references undefined placeholder '{}'\n\
                 Entrypoint: {}\n\
                 Available placeholders: input, output",
                name, self.entrypoint
            )),
            TemplateError::UnmatchedBrace { position } => CryorunError::UserError(format!(
                "tool entrypoint has unmatched '{{' at position {}",
                position
            )),
            TemplateError::EmptyPlaceholderName { position } => CryorunError::UserError(format!(
                "tool entrypoint has empty placeholder name at position {}",
                position
            )),
        })?;

        let words = shell_words::split(&rendered).map_err(|e| {
            CryorunError::UserError(format!(
                "failed to parse tool entrypoint '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                rendered, e
            ))
        })?;

        let Some((program, args)) = words.split_first() else {
            return Err(CryorunError::UserError(format!(
                "tool entrypoint is empty after parsing: '{}'",
                rendered
            )));
        };

        Ok(CommandPlan {
            activation,
            workdir: self
                .tool_dir
                .as_ref()
                .map(|dir| settings.resolve_tool_dir(dir)),
            program: program.clone(),
            args: args.to_vec(),
            extra_args: request.extra_args().to_string(),
            env: self.environment.clone(),
        })
    }
}

impl ToolsConfig {
    /// Load tools config from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    /// Returns `Err` if the file exists but cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CryorunError::UserError(format!(
                "failed to read tools config '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_yaml(&content)?;
        Ok(Some(config))
    }

    /// Parse tools config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ToolsConfig = serde_yaml::from_str(yaml)
            .map_err(|e| CryorunError::UserError(format!("failed to parse tools.yaml: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| CryorunError::UserError(format!("failed to serialize tools config: {}", e)))
    }

    /// Validate the tools configuration.
    ///
    /// Validation rules:
    /// - Tool identifiers must not be empty
    /// - Entrypoints must not be empty and must reference both placeholders
    /// - At most one tool can be marked as default
    /// - Timeouts must be positive when set
    pub fn validate(&self) -> Result<()> {
        if self.defaults.activate_command.trim().is_empty() {
            return Err(CryorunError::UserError(
                "tools.yaml validation failed: defaults.activate_command cannot be empty"
                    .to_string(),
            ));
        }

        if let Some(timeout) = self.defaults.timeout_seconds
            && timeout == 0
        {
            return Err(CryorunError::UserError(
                "tools.yaml validation failed: defaults.timeout_seconds must be greater than 0"
                    .to_string(),
            ));
        }

        let default_count = self.tools.values().filter(|t| t.default).count();
        if default_count > 1 {
            return Err(CryorunError::UserError(
                "tools.yaml validation failed: at most one tool can be marked as default"
                    .to_string(),
            ));
        }

        for (id, tool) in &self.tools {
            if id.is_empty() {
                return Err(CryorunError::UserError(
                    "tools.yaml validation failed: tool identifier cannot be empty".to_string(),
                ));
            }

            if tool.entrypoint.is_empty() {
                return Err(CryorunError::UserError(format!(
                    "tools.yaml validation failed: tool '{}' has empty entrypoint",
                    id
                )));
            }

            for placeholder in ["{input}", "{output}"] {
                if !tool.entrypoint.contains(placeholder) {
                    return Err(CryorunError::UserError(format!(
                        "tools.yaml validation failed: tool '{}' entrypoint does not reference {}",
                        id, placeholder
                    )));
                }
            }

            if let Some(timeout) = tool.timeout_seconds
                && timeout == 0
            {
                return Err(CryorunError::UserError(format!(
                    "tools.yaml validation failed: tool '{}' has timeout_seconds of 0",
                    id
                )));
            }
        }

        Ok(())
    }

    /// Select a tool by name, or the default tool when no name is given.
    pub fn select<'a>(&'a self, requested: Option<&'a str>) -> Result<(&'a str, &'a ToolProfile)> {
        match requested {
            Some(name) => self
                .get(name)
                .map(|tool| (name, tool))
                .ok_or_else(|| {
                    CryorunError::UserError(format!(
                        "unknown tool '{}'\nAvailable tools: {}",
                        name,
                        self.tool_names()
                    ))
                }),
            None => self.default_tool().ok_or_else(|| {
                CryorunError::UserError(format!(
                    "no tool specified and no default tool configured\nAvailable tools: {}",
                    self.tool_names()
                ))
            }),
        }
    }

    /// Get the default tool, if one is configured.
    pub fn default_tool(&self) -> Option<(&str, &ToolProfile)> {
        self.tools
            .iter()
            .find(|(_, t)| t.default)
            .map(|(id, t)| (id.as_str(), t))
    }

    /// Get a tool by identifier.
    pub fn get(&self, id: &str) -> Option<&ToolProfile> {
        self.tools.get(id)
    }

    /// Check if any tools are configured.
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    /// Iterate over all tools.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolProfile)> {
        self.tools.iter().map(|(id, t)| (id.as_str(), t))
    }

    fn tool_names(&self) -> String {
        if self.tools.is_empty() {
            "(none)".to_string()
        } else {
            self.tools
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Starter `tools.yaml` content written by `cryorun init`.
pub fn starter_config_content() -> &'static str {
    r#"# Tool profiles for cryorun.
#
# Each entry describes one installed external tool. `entrypoint` is a
# template with {input} and {output} placeholders. `tool_dir` is resolved
# against the install root (CRYORUN_ROOT, or ~/.local/share/cryorun).
tools:
  cryoten:
    name: "CryoTen map enhancement"
    entrypoint: "python eval.py {input} {output}"
    conda_env: cryoten_env
    tool_dir: "software/em/cryoten-1.0.0/cryoten"
    default: true

defaults:
  activate_command: conda
"#
}
