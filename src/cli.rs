//! CLI argument parsing for cryorun.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cryorun: protocol runner for cryo-EM map-enhancement tools.
///
/// Projects are plain directories with state under `.cryorun/`:
/// - `tools.yaml` describes the installed external tools
/// - `objects.ndjson` records every file with its provenance
/// - `runs.ndjson` is the append-only audit log
#[derive(Parser, Debug)]
#[command(name = "cryorun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cryorun.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a cryorun project in the current directory.
    ///
    /// Creates the `.cryorun/` state directory with a starter tools
    /// config describing the cryoten profile.
    Init,

    /// Run a tool on an input file and register the output.
    ///
    /// Builds the command line for the tool (conda activation, directory
    /// change, entrypoint), runs it as a blocking child process, and on
    /// success registers the output file with a provenance link to the
    /// input.
    Run(RunArgs),

    /// List the configured tools.
    Tools,

    /// Check that the environment can run the configured tools.
    ///
    /// Probes conda, the install root, and each tool directory, and
    /// reports what is missing.
    Check(CheckArgs),

    /// List registered data objects with their provenance.
    Objects(ObjectsArgs),

    /// Show the run event log.
    History(HistoryArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Tool to run (defaults to the tool marked `default` in tools.yaml).
    pub tool: Option<String>,

    /// Input file the tool reads.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file the tool must produce.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Extra arguments appended verbatim to the tool command line.
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Label for the registered output object (defaults to the file name).
    #[arg(long)]
    pub label: Option<String>,

    /// Wall-clock limit in seconds (overrides the tool profile).
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Print the command that would run without executing it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Check a single tool instead of all configured tools.
    pub tool: Option<String>,
}

/// Arguments for the `objects` command.
#[derive(Parser, Debug)]
pub struct ObjectsArgs {
    /// Maximum number of objects to list, newest last.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

/// Arguments for the `history` command.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Number of most recent events to show.
    #[arg(long, default_value_t = 20)]
    pub tail: usize,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
