//! Working-root path guard.
//!
//! Every file read, write, and listing goes through [`PathGuard`]. Paths are
//! resolved against the canonical [`WorkingRoot`], symlinks included, and
//! anything landing outside it is rejected.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::domain::error::GuardError;

/// Canonical, absolute working directory. Set once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingRoot(PathBuf);

impl WorkingRoot {
    /// Canonicalize `dir` into a working root.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `dir` does not exist and `Io` when it is not a
    /// readable directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, GuardError> {
        let dir = dir.as_ref();
        let canonical = dir.canonicalize().map_err(|e| io_error(dir, e))?;
        if !canonical.is_dir() {
            return Err(GuardError::Io {
                path: dir.to_path_buf(),
                source: std::io::Error::new(ErrorKind::NotADirectory, "not a directory"),
            });
        }
        Ok(Self(canonical))
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// `path` relative to the root, or `path` unchanged when it is not inside.
    #[must_use]
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.0)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}

/// Resolves candidate paths and enforces containment in the working root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: WorkingRoot,
}

impl PathGuard {
    #[must_use]
    pub fn new(root: WorkingRoot) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &WorkingRoot {
        &self.root
    }

    /// Resolve a path that must already exist.
    ///
    /// # Errors
    ///
    /// `PathEscape` when the canonical path is outside the root, `NotFound`
    /// when it is inside but missing.
    pub fn resolve(&self, candidate: impl AsRef<Path>) -> Result<PathBuf, GuardError> {
        let candidate = candidate.as_ref();
        let resolved = self.resolve_for_write(candidate)?;
        if !resolved.exists() {
            return Err(GuardError::NotFound(candidate.to_path_buf()));
        }
        Ok(resolved)
    }

    /// Resolve a path that may not exist yet.
    ///
    /// Components are applied one at a time. Each one that exists is
    /// canonicalized on the spot, following symlinks, so a later `..` or
    /// name is applied to the real location. Missing components are applied
    /// lexically.
    ///
    /// # Errors
    ///
    /// `PathEscape` when the result is outside the root or passes through a
    /// dangling symlink; `Io` for other resolution failures.
    pub fn resolve_for_write(&self, candidate: impl AsRef<Path>) -> Result<PathBuf, GuardError> {
        let candidate = candidate.as_ref();
        let mut resolved = if candidate.is_absolute() {
            PathBuf::new()
        } else {
            self.root.as_path().to_path_buf()
        };

        for component in candidate.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::RootDir | Component::Prefix(_) => resolved.push(component.as_os_str()),
                Component::Normal(part) => {
                    resolved.push(part);
                    if std::fs::symlink_metadata(&resolved).is_ok() {
                        resolved = match resolved.canonicalize() {
                            Ok(p) => p,
                            // The entry exists (lstat succeeded) but cannot be followed.
                            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.escape(candidate)),
                            Err(e) => return Err(io_error(candidate, e)),
                        };
                    }
                }
            }
        }

        if !resolved.starts_with(self.root.as_path()) {
            return Err(self.escape(candidate));
        }
        Ok(resolved)
    }

    fn escape(&self, candidate: &Path) -> GuardError {
        GuardError::PathEscape {
            path: candidate.to_path_buf(),
            root: self.root.as_path().to_path_buf(),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> GuardError {
    if source.kind() == ErrorKind::NotFound {
        GuardError::NotFound(path.to_path_buf())
    } else {
        GuardError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
