//! Cryorun: protocol runner for cryo-EM map-enhancement tools.
//!
//! This is the main entry point for the `cryorun` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and maps
//! errors to exit codes.

mod cli;
mod commands;
pub mod conda;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod invoke;
pub mod project;
pub mod runlog;
pub mod settings;
pub mod tools;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
