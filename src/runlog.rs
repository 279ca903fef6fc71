//! Run event logging.
//!
//! Append-only audit log of everything cryorun did to a project. Events
//! are stored in NDJSON format (one JSON object per line) in
//! `.cryorun/runs.ndjson`.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (init, run, register)
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `tool`: Optional tool identifier for tool-specific events
//! - `details`: Freeform object with action-specific details

use crate::context::ProjectContext;
use crate::error::{CryorunError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions that can be logged as run events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAction {
    /// Project initialization
    Init,
    /// Tool invocation completed
    Run,
    /// Data object registered
    Register,
}

impl std::fmt::Display for RunAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunAction::Init => write!(f, "init"),
            RunAction::Run => write!(f, "run"),
            RunAction::Register => write!(f, "register"),
        }
    }
}

/// An event record for the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: RunAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Optional tool identifier for tool-specific events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl RunEvent {
    /// Create a new event with the given action.
    ///
    /// The timestamp is set to the current time, and the actor is
    /// determined from the environment (USER@HOSTNAME).
    pub fn new(action: RunAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            tool: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the tool identifier for this event.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            CryorunError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the actor string for event metadata.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the run log.
///
/// The event is written as a single JSON line with a trailing newline
/// and the file is synced to disk. The file is created on first use.
pub fn append_event(ctx: &ProjectContext, event: &RunEvent) -> Result<()> {
    let runs_file = ctx.runs_file();
    let json_line = event.to_ndjson_line()?;

    if !ctx.state_dir.exists() {
        fs::create_dir_all(&ctx.state_dir).map_err(|e| {
            CryorunError::UserError(format!(
                "failed to create state directory '{}': {}",
                ctx.state_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&runs_file)
        .map_err(|e| {
            CryorunError::UserError(format!(
                "failed to open run log '{}': {}",
                runs_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        CryorunError::UserError(format!(
            "failed to write event to '{}': {}",
            runs_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        CryorunError::UserError(format!(
            "failed to sync run log '{}': {}",
            runs_file.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read all events from the run log in append order.
///
/// A missing log file is an empty history, not an error.
pub fn read_events(ctx: &ProjectContext) -> Result<Vec<RunEvent>> {
    let runs_file = ctx.runs_file();

    if !runs_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&runs_file).map_err(|e| {
        CryorunError::UserError(format!(
            "failed to read run log '{}': {}",
            runs_file.display(),
            e
        ))
    })?;

    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: RunEvent = serde_json::from_str(line).map_err(|e| {
            CryorunError::UserError(format!(
                "failed to parse run log '{}' line {}: {}",
                runs_file.display(),
                index + 1,
                e
            ))
        })?;
        events.push(event);
    }

    Ok(events)
}
