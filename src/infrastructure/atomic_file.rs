//! All-or-nothing file writes.
//!
//! Content goes to a temporary file in the destination directory which is
//! renamed over the target once fully written, so a failed export never
//! leaves a partial artifact behind.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::domain::{AppError, Result};

/// Writes `bytes` to `path` via temp file + rename.
///
/// # Errors
/// Returns an IO error if the temp file cannot be created, written or renamed.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| AppError::io(format!("Failed to create temp file in {}", dir.display()), e))?;

    tmp.write_all(bytes)
        .map_err(|e| AppError::io("Failed to write temp file", e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| AppError::io("Failed to sync temp file", e))?;

    tmp.persist(path)
        .map_err(|e| AppError::io(format!("Failed to move file into {}", path.display()), e.error))?;

    Ok(())
}
