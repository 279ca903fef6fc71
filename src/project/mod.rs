//! Project data object registry.
//!
//! Every file a tool produces (and every input it consumes) is recorded
//! as a data object with a provenance link to the object it was derived
//! from. The registry is an append-only NDJSON file in the project state
//! directory, one object per line.

mod objects;
mod store;

pub use objects::{DataObject, ObjectKind};
pub use store::Project;
