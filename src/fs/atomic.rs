//! Atomic file write operations.
//!
//! All writes follow the same pattern:
//! 1. Write content to a temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Atomically replace the target file via rename
//!
//! On POSIX systems `rename()` replaces the destination atomically when both
//! paths live on the same filesystem. On other platforms an existing target
//! is removed first, leaving a short non-atomic window. On crash a temporary
//! file named `.{filename}.tmp` may remain next to the target.

use crate::error::{CryorunError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file.
///
/// The parent directory is created if it does not exist. The target file is
/// never observable in a partial state.
///
/// # Example
///
/// ```no_run
/// use cryorun::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("tools.yaml"), b"tools: {}\n")?;
/// # Ok::<(), cryorun::error::CryorunError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CryorunError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;
    replace_file(&temp_path, path)?;

    Ok(())
}

/// Atomically write a string to a file.
///
/// Convenience wrapper around `atomic_write` for string content.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Build the temporary file path `.{filename}.tmp` in the target's directory.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CryorunError::UserError("invalid file path".to_string()))?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

/// Write content to a file and fsync it.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        CryorunError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        CryorunError::UserError(format!("failed to write to temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        CryorunError::UserError(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

/// Replace the target file with the freshly synced source file.
#[cfg(unix)]
fn replace_file(source: &Path, target: &Path) -> Result<()> {
    // rename() replaces an existing destination atomically on POSIX
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        CryorunError::UserError(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    // Sync the parent directory so the new entry is durable too
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Replace the target file with the source file.
///
/// An existing target is removed before the rename. Not fully atomic, but
/// the temp file still guarantees the content itself is never partial.
#[cfg(not(unix))]
fn replace_file(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        fs::remove_file(target).map_err(|e| {
            let _ = fs::remove_file(source);
            CryorunError::UserError(format!(
                "failed to remove existing file '{}': {}",
                target.display(),
                e
            ))
        })?;
    }

    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        CryorunError::UserError(format!(
            "failed to replace '{}': {}",
            target.display(),
            e
        ))
    })
}
