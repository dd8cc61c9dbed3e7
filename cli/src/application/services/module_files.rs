//! Application service: guarded listing and reading of module files.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::application::guard::PathGuard;
use crate::domain::error::GuardError;
use crate::domain::files::is_skipped_dir;

/// A file read through the guard.
#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub path: PathBuf,
    pub content: String,
}

/// Recursive listing of a module directory.
///
/// Paths are relative to `module_dir`, sorted, with `.terraform` and `.git`
/// left out. Symlinks are listed but never descended into.
///
/// # Errors
///
/// `PathEscape` or `NotFound` for the directory itself; `Io` when a directory
/// cannot be read.
pub fn list_files(guard: &PathGuard, module_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, GuardError> {
    let module_dir = module_dir.as_ref();
    let base = guard.resolve(module_dir)?;
    if !base.is_dir() {
        return Err(GuardError::Io {
            path: module_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    let mut files = Vec::new();
    let mut pending = vec![base.clone()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|source| GuardError::Io {
            path: guard.root().relative(&dir),
            source,
        })?;
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                if !is_skipped_dir(&entry.file_name().to_string_lossy()) {
                    pending.push(path);
                }
            } else if let Ok(rel) = path.strip_prefix(&base) {
                files.push(rel.to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Read one file inside the working root.
///
/// # Errors
///
/// `PathEscape`, `NotFound`, or `Io` when the file cannot be read as UTF-8.
pub fn read_file(guard: &PathGuard, path: impl AsRef<Path>) -> Result<FileContent, GuardError> {
    let path = path.as_ref();
    let resolved = guard.resolve(path)?;
    let content = std::fs::read_to_string(&resolved).map_err(|source| GuardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FileContent {
        path: guard.root().relative(&resolved),
        content,
    })
}
