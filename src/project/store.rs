//! Append-only object registry store.
//!
//! The registry lives in `objects.ndjson`, one JSON object per line.
//! Registration appends a line and fsyncs before the in-memory view is
//! updated, so a crash can lose at most the object being written, never
//! corrupt earlier ones.

use crate::context::ProjectContext;
use crate::error::{CryorunError, Result};
use crate::project::objects::{DataObject, ObjectKind};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// In-memory view of a project's data object registry.
#[derive(Debug)]
pub struct Project {
    objects_file: PathBuf,
    objects: Vec<DataObject>,
}

impl Project {
    /// Load the registry from the project state directory.
    ///
    /// A missing registry file is an empty registry, not an error.
    pub fn load(ctx: &ProjectContext) -> Result<Self> {
        let objects_file = ctx.objects_file();

        let mut objects = Vec::new();
        if objects_file.exists() {
            let content = fs::read_to_string(&objects_file).map_err(|e| {
                CryorunError::UserError(format!(
                    "failed to read object registry '{}': {}",
                    objects_file.display(),
                    e
                ))
            })?;

            for (index, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let object: DataObject = serde_json::from_str(line).map_err(|e| {
                    CryorunError::UserError(format!(
                        "failed to parse object registry '{}' line {}: {}",
                        objects_file.display(),
                        index + 1,
                        e
                    ))
                })?;
                objects.push(object);
            }
        }

        Ok(Self {
            objects_file,
            objects,
        })
    }

    /// Register a new data object and persist it.
    ///
    /// # Arguments
    ///
    /// * `kind` - Kind of data the file holds
    /// * `path` - Path of the file, absolute
    /// * `label` - Human-readable label for listings
    /// * `protocol` - Tool identifier that produced the file
    /// * `derived_from` - Identifier of the source object, if any
    ///
    /// # Returns
    ///
    /// * `Ok(DataObject)` - The registered object with its assigned id
    /// * `Err(CryorunError::UserError)` - Unknown parent id or write failure
    pub fn register(
        &mut self,
        kind: ObjectKind,
        path: impl Into<PathBuf>,
        label: impl Into<String>,
        protocol: impl Into<String>,
        derived_from: Option<u64>,
    ) -> Result<DataObject> {
        if let Some(parent) = derived_from
            && self.get(parent).is_none()
        {
            return Err(CryorunError::UserError(format!(
                "cannot register object derived from unknown object id {}",
                parent
            )));
        }

        let object = DataObject {
            id: self.next_id(),
            kind,
            path: path.into(),
            label: label.into(),
            protocol: protocol.into(),
            created_at: Utc::now(),
            derived_from,
        };

        self.append_line(&object)?;
        self.objects.push(object.clone());

        Ok(object)
    }

    /// Find an object for `path`, registering it as an import if absent.
    ///
    /// Keeps re-running a tool on the same input from piling up duplicate
    /// import entries.
    pub fn ensure_imported(
        &mut self,
        path: &Path,
        kind: ObjectKind,
        label: impl Into<String>,
    ) -> Result<DataObject> {
        if let Some(existing) = self.find_by_path(path) {
            return Ok(existing.clone());
        }

        self.register(kind, path, label, "import", None)
    }

    /// Get an object by identifier.
    pub fn get(&self, id: u64) -> Option<&DataObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Find the most recently registered object with the given path.
    pub fn find_by_path(&self, path: &Path) -> Option<&DataObject> {
        self.objects.iter().rev().find(|o| o.path == path)
    }

    /// Walk the derivation chain from an object back to its root.
    ///
    /// The returned list starts with the object itself and ends at the
    /// object with no parent.
    pub fn lineage(&self, id: u64) -> Vec<&DataObject> {
        let mut chain = Vec::new();
        let mut current = self.get(id);

        while let Some(object) = current {
            chain.push(object);
            if chain.len() > self.objects.len() {
                break;
            }
            current = object.derived_from.and_then(|parent| self.get(parent));
        }

        chain
    }

    /// All registered objects in registration order.
    pub fn objects(&self) -> &[DataObject] {
        &self.objects
    }

    fn next_id(&self) -> u64 {
        self.objects.iter().map(|o| o.id).max().unwrap_or(0) + 1
    }

    /// Append one object as a JSON line and fsync the registry file.
    fn append_line(&self, object: &DataObject) -> Result<()> {
        let json_line = serde_json::to_string(object).map_err(|e| {
            CryorunError::UserError(format!("failed to serialize object to JSON: {}", e))
        })?;

        if let Some(parent) = self.objects_file.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                CryorunError::UserError(format!(
                    "failed to create state directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.objects_file)
            .map_err(|e| {
                CryorunError::UserError(format!(
                    "failed to open object registry '{}': {}",
                    self.objects_file.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            CryorunError::UserError(format!(
                "failed to write to object registry '{}': {}",
                self.objects_file.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            CryorunError::UserError(format!(
                "failed to sync object registry '{}': {}",
                self.objects_file.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_project;

    #[test]
    fn test_load_missing_registry_is_empty() {
        let (_temp_dir, ctx) = create_test_project();

        let project = Project::load(&ctx).unwrap();
        assert!(project.objects().is_empty());
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let (_temp_dir, ctx) = create_test_project();
        let mut project = Project::load(&ctx).unwrap();

        let first = project
            .register(ObjectKind::Volume, "/data/a.mrc", "a", "import", None)
            .unwrap();
        let second = project
            .register(ObjectKind::Volume, "/data/b.mrc", "b", "cryoten", Some(first.id))
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.derived_from, Some(1));
    }

    #[test]
    fn test_register_persists_one_line_per_object() {
        let (_temp_dir, ctx) = create_test_project();
        let mut project = Project::load(&ctx).unwrap();

        project
            .register(ObjectKind::Volume, "/data/a.mrc", "a", "import", None)
            .unwrap();
        project
            .register(ObjectKind::Volume, "/data/b.mrc", "b", "cryoten", Some(1))
            .unwrap();

        let content = fs::read_to_string(ctx.objects_file()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_registry_roundtrip_through_reload() {
        let (_temp_dir, ctx) = create_test_project();

        {
            let mut project = Project::load(&ctx).unwrap();
            project
                .register(ObjectKind::Volume, "/data/a.mrc", "raw map", "import", None)
                .unwrap();
            project
                .register(
                    ObjectKind::Volume,
                    "/out/a_enhanced.mrc",
                    "enhanced map",
                    "cryoten",
                    Some(1),
                )
                .unwrap();
        }

        let project = Project::load(&ctx).unwrap();
        assert_eq!(project.objects().len(), 2);

        let enhanced = project.get(2).unwrap();
        assert_eq!(enhanced.label, "enhanced map");
        assert_eq!(enhanced.protocol, "cryoten");
        assert_eq!(enhanced.derived_from, Some(1));

        // New registrations continue the id sequence after reload.
        let mut project = project;
        let third = project
            .register(ObjectKind::Generic, "/out/report.txt", "report", "cryoten", Some(2))
            .unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_register_rejects_unknown_parent() {
        let (_temp_dir, ctx) = create_test_project();
        let mut project = Project::load(&ctx).unwrap();

        let err = project
            .register(ObjectKind::Volume, "/out/b.mrc", "b", "cryoten", Some(42))
            .unwrap_err();

        assert!(matches!(err, CryorunError::UserError(_)));
        assert!(err.to_string().contains("unknown object id 42"));
        assert!(project.objects().is_empty());
    }

    #[test]
    fn test_ensure_imported_is_idempotent() {
        let (_temp_dir, ctx) = create_test_project();
        let mut project = Project::load(&ctx).unwrap();

        let first = project
            .ensure_imported(Path::new("/data/a.mrc"), ObjectKind::Volume, "a.mrc")
            .unwrap();
        let second = project
            .ensure_imported(Path::new("/data/a.mrc"), ObjectKind::Volume, "a.mrc")
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(project.objects().len(), 1);
        assert_eq!(project.objects()[0].protocol, "import");
    }

    #[test]
    fn test_find_by_path_returns_latest() {
        let (_temp_dir, ctx) = create_test_project();
        let mut project = Project::load(&ctx).unwrap();

        project
            .register(ObjectKind::Volume, "/out/a.mrc", "first", "cryoten", None)
            .unwrap();
        project
            .register(ObjectKind::Volume, "/out/a.mrc", "second", "cryoten", None)
            .unwrap();

        let found = project.find_by_path(Path::new("/out/a.mrc")).unwrap();
        assert_eq!(found.label, "second");
    }

    #[test]
    fn test_lineage_walks_to_root() {
        let (_temp_dir, ctx) = create_test_project();
        let mut project = Project::load(&ctx).unwrap();

        project
            .register(ObjectKind::Volume, "/data/a.mrc", "raw", "import", None)
            .unwrap();
        project
            .register(ObjectKind::Volume, "/out/b.mrc", "pass one", "cryoten", Some(1))
            .unwrap();
        project
            .register(ObjectKind::Volume, "/out/c.mrc", "pass two", "cryoten", Some(2))
            .unwrap();

        let chain = project.lineage(3);
        let labels: Vec<&str> = chain.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["pass two", "pass one", "raw"]);
    }

    #[test]
    fn test_load_reports_corrupt_line_number() {
        let (_temp_dir, ctx) = create_test_project();

        {
            let mut project = Project::load(&ctx).unwrap();
            project
                .register(ObjectKind::Volume, "/data/a.mrc", "a", "import", None)
                .unwrap();
        }

        let mut content = fs::read_to_string(ctx.objects_file()).unwrap();
        content.push_str("{not valid json\n");
        fs::write(ctx.objects_file(), content).unwrap();

        let err = Project::load(&ctx).unwrap_err();
        assert!(matches!(err, CryorunError::UserError(_)));
        assert!(err.to_string().contains("line 2"));
    }
}
