//! Directory tree operations
//!
//! Walk, copy, and delete helpers used by the tree actions and the built-in
//! `tree` tool.

use std::path::{Path, MAIN_SEPARATOR};

use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Outcome of a tree copy that did not fail with an I/O error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Files were copied (possibly none)
    Copied { files: usize, entries: usize },
    /// Source does not exist, or source and target are the same directory
    Skipped,
    /// Source exists but is not a directory
    SourceNotDirectory,
    /// Target exists but is not a directory
    TargetNotDirectory,
    /// Target lies inside the source tree
    TargetInsideSource,
}

/// Emit the root, then `.` and `./<relative>` for every entry in sorted order
pub fn walk(root: &Path, mut sink: impl FnMut(&str)) -> Result<(), FilesystemError> {
    if root.exists() {
        sink(&root.display().to_string());
    }
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| FilesystemError::Walk {
            path: root.to_path_buf(),
            error: e.to_string(),
        })?;
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let relative = relative.display().to_string();
        if relative.is_empty() {
            sink(".");
        } else {
            sink(&format!(".{MAIN_SEPARATOR}{relative}"));
        }
    }
    Ok(())
}

/// Copy all files accepted by `filter` from `source` to `target`, keeping the layout
pub fn copy(
    source: &Path,
    target: &Path,
    filter: impl Fn(&Path) -> bool,
) -> Result<CopyOutcome, FilesystemError> {
    if !source.exists() {
        return Ok(CopyOutcome::Skipped);
    }
    if !source.is_dir() {
        return Ok(CopyOutcome::SourceNotDirectory);
    }
    if target.exists() {
        if !target.is_dir() {
            return Ok(CopyOutcome::TargetNotDirectory);
        }
        if target == source {
            return Ok(CopyOutcome::Skipped);
        }
        if target.starts_with(source) {
            return Ok(CopyOutcome::TargetInsideSource);
        }
    }

    let mut files = 0;
    let mut entries = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| FilesystemError::Walk {
            path: source.to_path_buf(),
            error: e.to_string(),
        })?;
        entries += 1;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination).map_err(|e| FilesystemError::CreateDir {
                path: destination.clone(),
                error: e.to_string(),
            })?;
            continue;
        }
        if filter(entry.path()) {
            std::fs::copy(entry.path(), &destination).map_err(|e| FilesystemError::Copy {
                from: entry.path().to_path_buf(),
                to: destination.clone(),
                error: e.to_string(),
            })?;
            files += 1;
        }
    }
    Ok(CopyOutcome::Copied { files, entries })
}

/// Delete all entries below and including `root` accepted by `filter`
///
/// A single file or an empty directory is removed right away. Otherwise
/// entries are deleted deepest first; directories that still hold
/// unselected entries are left in place.
pub fn delete(root: &Path, filter: impl Fn(&Path) -> bool) -> Result<(), FilesystemError> {
    if root.is_file() && std::fs::remove_file(root).is_ok() {
        return Ok(());
    }
    if root.is_dir() && std::fs::remove_dir(root).is_ok() {
        return Ok(());
    }
    if !root.exists() {
        return Ok(());
    }

    let mut selected = Vec::new();
    for entry in WalkDir::new(root).contents_first(true) {
        let entry = entry.map_err(|e| FilesystemError::Walk {
            path: root.to_path_buf(),
            error: e.to_string(),
        })?;
        if filter(entry.path()) {
            selected.push(entry);
        }
    }
    for entry in selected {
        let path = entry.path();
        let result = if entry.file_type().is_dir() {
            match std::fs::remove_dir(path) {
                Err(e) if path_has_entries(path) => {
                    tracing::debug!("Keeping non-empty directory {}: {e}", path.display());
                    Ok(())
                }
                other => other,
            }
        } else {
            std::fs::remove_file(path)
        };
        result.map_err(|e| FilesystemError::Delete {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

fn path_has_entries(path: &Path) -> bool {
    std::fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_some())
}
