//! Data object records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of data a registered object holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A 3D density map volume.
    Volume,
    /// Any other file a tool consumed or produced.
    Generic,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Volume => write!(f, "volume"),
            ObjectKind::Generic => write!(f, "generic"),
        }
    }
}

/// One entry in the project data object registry.
///
/// Objects are serialized as single-line JSON and appended to
/// `objects.ndjson`; identifiers are assigned sequentially and never
/// reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataObject {
    /// Sequential identifier, unique within the project.
    pub id: u64,

    /// Kind of data this object holds.
    pub kind: ObjectKind,

    /// Path of the file, absolute.
    pub path: PathBuf,

    /// Human-readable label shown in listings.
    pub label: String,

    /// Identifier of the tool that produced this object, or `import`
    /// for files brought in from outside.
    pub protocol: String,

    /// RFC3339 timestamp when the object was registered.
    pub created_at: DateTime<Utc>,

    /// Identifier of the object this one was derived from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<u64>,
}
