//! Application service: recursive module discovery.
//!
//! [`ModuleScanner::scan`] returns a lazy iterator that walks the working
//! root from scratch on every call. Nothing is cached here; `module_index`
//! decides when to re-scan.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::guard::PathGuard;
use crate::domain::catalog::{ModuleCatalogEntry, ScanFailure, ScanReport};
use crate::domain::descriptor::{self, DESCRIPTOR_FILE};
use crate::domain::files::{LEGACY_OUTPUT_INTERFACE_FILE, OUTPUT_INTERFACE_FILE, is_skipped_dir};

/// One scan step: a catalog entry or a per-module failure.
pub type ScanItem = Result<Arc<ModuleCatalogEntry>, ScanFailure>;

/// Finds `facets.yaml` files below the working root.
#[derive(Debug, Clone)]
pub struct ModuleScanner {
    guard: PathGuard,
}

impl ModuleScanner {
    #[must_use]
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Start a fresh walk of the working root.
    #[must_use]
    pub fn scan(&self) -> Scan<'_> {
        tracing::debug!(root = %self.guard.root().as_path().display(), "module scan started");
        Scan {
            guard: &self.guard,
            pending: vec![self.guard.root().as_path().to_path_buf()],
        }
    }

    /// Drain a full scan into a sorted report.
    #[must_use]
    pub fn scan_report(&self) -> ScanReport {
        let mut report = ScanReport::default();
        for item in self.scan() {
            match item {
                Ok(entry) => report.entries.push(entry),
                Err(failure) => report.failures.push(failure),
            }
        }
        tracing::info!(
            modules = report.entries.len(),
            failures = report.failures.len(),
            "module scan finished"
        );
        report.sorted()
    }
}

/// Depth-first directory walk yielding one item per descriptor found.
///
/// Symlinked directories are not followed and `.terraform`/`.git` are skipped.
pub struct Scan<'a> {
    guard: &'a PathGuard,
    pending: Vec<PathBuf>,
}

impl Iterator for Scan<'_> {
    type Item = ScanItem;

    fn next(&mut self) -> Option<ScanItem> {
        while let Some(dir) = self.pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(rd) => rd,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory");
                    return Some(Err(ScanFailure {
                        path: self.guard.root().relative(&dir),
                        reason: format!("cannot read directory: {e}"),
                    }));
                }
            };

            let mut subdirs = Vec::new();
            let mut has_descriptor = false;
            for entry in entries.flatten() {
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                let name = entry.file_name();
                if file_type.is_dir() {
                    if !is_skipped_dir(&name.to_string_lossy()) {
                        subdirs.push(entry.path());
                    }
                } else if file_type.is_file() && name == DESCRIPTOR_FILE {
                    has_descriptor = true;
                }
            }
            // Reverse order on the stack so directories pop alphabetically.
            subdirs.sort_unstable_by(|a, b| b.cmp(a));
            self.pending.extend(subdirs);

            if has_descriptor {
                return Some(load_module(self.guard, &dir));
            }
        }
        None
    }
}

fn load_module(guard: &PathGuard, dir: &Path) -> ScanItem {
    let module_path = guard.root().relative(dir);
    let fail = |reason: String| {
        tracing::warn!(module = %module_path.display(), %reason, "skipping module");
        ScanFailure {
            path: module_path.clone(),
            reason,
        }
    };

    let descriptor_path = guard
        .resolve(dir.join(DESCRIPTOR_FILE))
        .map_err(|e| fail(e.to_string()))?;
    let text = std::fs::read_to_string(&descriptor_path)
        .map_err(|e| fail(format!("cannot read {DESCRIPTOR_FILE}: {e}")))?;
    let descriptor = descriptor::parse(&text).map_err(|e| fail(e.to_string()))?;

    Ok(Arc::new(ModuleCatalogEntry {
        module_path: module_path.clone(),
        absolute_path: dir.to_path_buf(),
        descriptor,
        descriptor_text: text,
        output_interface: read_output_interface(guard, dir),
    }))
}

/// Best-effort: `outputs.tf`, else the legacy `output.tf`, else nothing.
fn read_output_interface(guard: &PathGuard, dir: &Path) -> Option<String> {
    [OUTPUT_INTERFACE_FILE, LEGACY_OUTPUT_INTERFACE_FILE]
        .iter()
        .find_map(|name| {
            let path = guard.resolve(dir.join(name)).ok()?;
            std::fs::read_to_string(path).ok()
        })
}
