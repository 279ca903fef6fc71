//! Tool profiles and entrypoint templates.
//!
//! A tool profile describes one installed external tool: its entrypoint
//! template, the conda environment it needs, and the directory it runs
//! in. Profiles are loaded from `tools.yaml` in the project state
//! directory.

pub mod config;
pub mod template;

pub use config::{ToolDefaults, ToolProfile, ToolsConfig, starter_config_content};
