//! Application service: guarded dry-run/commit writer for module files.
//!
//! Every write is previewed first. In strict mode the preview hands out a
//! token that binds the path, the content on disk and the proposed content;
//! `commit` only proceeds when the caller echoes a token that still matches.

use std::collections::BTreeSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::application::guard::PathGuard;
use crate::application::services::output_types::unregistered;
use crate::domain::descriptor::{self, DESCRIPTOR_FILE};
use crate::domain::diff;
use crate::domain::error::{GuardError, WriteError};
use crate::domain::files::{self, FileRole, OUTPUT_INTERFACE_FILE};
use crate::domain::outputs::render_output_interface;

const OUTPUT_INTERFACE_HINT: &str = "Use `modgenie write outputs` for the output interface.";

/// Proposed change to one file. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunResult {
    /// Target relative to the working root.
    pub path: PathBuf,
    pub role: FileRole,
    pub exists: bool,
    pub old_content: String,
    pub new_content: String,
    pub diff: String,
    pub lines_added: usize,
    pub lines_removed: usize,
    pub valid: bool,
    pub problems: Vec<String>,
    /// Echo this to `commit` in strict mode.
    pub preview_token: String,
}

impl DryRunResult {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.exists && self.old_content == self.new_content
    }
}

/// Result of a commit.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// False when the file already held exactly this content.
    pub changed: bool,
    pub bytes_written: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
}

/// Writes module files inside the working root.
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    guard: PathGuard,
    strict: bool,
    /// Output types known to the control plane. When set, descriptors that
    /// reference any other type are invalid.
    registered_types: Option<BTreeSet<String>>,
}

impl ConfigWriter {
    #[must_use]
    pub fn new(guard: PathGuard, strict: bool) -> Self {
        Self {
            guard,
            strict,
            registered_types: None,
        }
    }

    /// Also check descriptor `inputs`/`outputs` types against `registered`.
    #[must_use]
    pub fn with_registered_types(mut self, registered: BTreeSet<String>) -> Self {
        self.registered_types = Some(registered);
        self
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Compute the diff and validity verdict for writing `content` to `path`.
    ///
    /// An invalid proposal is still returned, with `valid == false` and the
    /// problems listed; only `commit` turns it into an error.
    ///
    /// # Errors
    ///
    /// `PathEscape` for targets outside the root and `ProtectedFile` for the
    /// output-interface file.
    pub fn preview(&self, path: impl AsRef<Path>, content: &str) -> Result<DryRunResult, WriteError> {
        let target = self.target(path.as_ref())?;
        let role = FileRole::classify(&target.file_name);
        if role == FileRole::OutputInterface {
            return Err(WriteError::ProtectedFile {
                name: target.file_name,
                hint: OUTPUT_INTERFACE_HINT,
            });
        }
        let problems = content_problems(role, content, self.registered_types.as_ref());
        self.dry_run(&target, role, content, problems)
    }

    /// Re-run the preview and write the content.
    ///
    /// Writing content identical to what is on disk succeeds without touching
    /// the file.
    ///
    /// # Errors
    ///
    /// Everything `preview` returns, plus `NotPreviewed` in strict mode when
    /// `token` is missing or stale, and `InvalidContent` when validation fails.
    pub fn commit(
        &self,
        path: impl AsRef<Path>,
        content: &str,
        token: Option<&str>,
    ) -> Result<WriteOutcome, WriteError> {
        let path = path.as_ref();
        let dry = self.preview(path, content)?;
        self.check_token(&dry, token)?;
        if !dry.valid {
            return Err(WriteError::InvalidContent {
                file: dry.path.display().to_string(),
                reason: dry.problems.join("\n"),
            });
        }
        let resolved = self.guard.resolve_for_write(path)?;
        self.apply(&resolved, &dry)
    }

    /// Preview an exact-text replacement inside an existing file.
    ///
    /// # Errors
    ///
    /// `NotFound` when the file is missing, `InvalidContent` when the number
    /// of matches differs from `expected`, plus everything `preview` returns.
    pub fn edit(
        &self,
        path: impl AsRef<Path>,
        old: &str,
        new: &str,
        expected: usize,
    ) -> Result<DryRunResult, WriteError> {
        let path = path.as_ref();
        let edited = self.edited_content(path, old, new, expected)?;
        self.preview(path, &edited)
    }

    /// Commit an exact-text replacement previewed with [`Self::edit`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::edit`] and [`Self::commit`].
    pub fn commit_edit(
        &self,
        path: impl AsRef<Path>,
        old: &str,
        new: &str,
        expected: usize,
        token: Option<&str>,
    ) -> Result<WriteOutcome, WriteError> {
        let path = path.as_ref();
        let edited = self.edited_content(path, old, new, expected)?;
        self.commit(path, &edited, token)
    }

    /// Preview the rendered output-interface file for a module.
    ///
    /// # Errors
    ///
    /// `NotFound` when the module directory or its descriptor is missing.
    pub fn preview_output_interface(
        &self,
        module_dir: impl AsRef<Path>,
        attributes: &Map<String, Value>,
        interfaces: &Map<String, Value>,
    ) -> Result<DryRunResult, WriteError> {
        let target_path = self.output_interface_path(module_dir.as_ref())?;
        let target = self.target(&target_path)?;
        let content = render_output_interface(attributes, interfaces);
        self.dry_run(&target, FileRole::OutputInterface, &content, Vec::new())
    }

    /// Render and write the output-interface file, replacing it entirely.
    ///
    /// This is the only way to write `outputs.tf`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the module directory or its descriptor is missing.
    pub fn write_output_interface(
        &self,
        module_dir: impl AsRef<Path>,
        attributes: &Map<String, Value>,
        interfaces: &Map<String, Value>,
    ) -> Result<WriteOutcome, WriteError> {
        let target_path = self.output_interface_path(module_dir.as_ref())?;
        let dry = self.preview_output_interface(module_dir, attributes, interfaces)?;
        let resolved = self.guard.resolve_for_write(&target_path)?;
        self.apply(&resolved, &dry)
    }

    // ── internals ────────────────────────────────────────────────────────────

    fn target(&self, path: &Path) -> Result<Target, WriteError> {
        let resolved = self.guard.resolve_for_write(path)?;
        if resolved.is_dir() {
            return Err(WriteError::InvalidContent {
                file: path.display().to_string(),
                reason: "target is a directory".to_string(),
            });
        }
        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = self.guard.root().relative(&resolved);
        Ok(Target {
            resolved,
            relative,
            file_name,
        })
    }

    fn dry_run(
        &self,
        target: &Target,
        role: FileRole,
        content: &str,
        problems: Vec<String>,
    ) -> Result<DryRunResult, WriteError> {
        let exists = target.resolved.is_file();
        let old_content = if exists {
            std::fs::read_to_string(&target.resolved).map_err(|source| WriteError::Io {
                path: target.relative.clone(),
                source,
            })?
        } else {
            String::new()
        };
        let label = target.relative.display().to_string();
        let line_diff = diff::diff(&old_content, content, &label);
        let preview_token = preview_token(&label, &old_content, content);

        Ok(DryRunResult {
            path: target.relative.clone(),
            role,
            exists,
            valid: problems.is_empty(),
            problems,
            diff: line_diff.unified,
            lines_added: line_diff.added,
            lines_removed: line_diff.removed,
            old_content,
            new_content: content.to_string(),
            preview_token,
        })
    }

    fn check_token(&self, dry: &DryRunResult, token: Option<&str>) -> Result<(), WriteError> {
        if !self.strict {
            return Ok(());
        }
        match token {
            Some(t) if t == dry.preview_token => Ok(()),
            _ => Err(WriteError::NotPreviewed(dry.path.display().to_string())),
        }
    }

    fn apply(&self, resolved: &Path, dry: &DryRunResult) -> Result<WriteOutcome, WriteError> {
        if dry.is_unchanged() {
            tracing::debug!(path = %dry.path.display(), "content unchanged, skipping write");
            return Ok(WriteOutcome {
                path: dry.path.clone(),
                changed: false,
                bytes_written: 0,
                lines_added: 0,
                lines_removed: 0,
            });
        }
        atomic_write(resolved, dry.new_content.as_bytes()).map_err(|source| WriteError::Io {
            path: dry.path.clone(),
            source,
        })?;
        tracing::info!(
            path = %dry.path.display(),
            added = dry.lines_added,
            removed = dry.lines_removed,
            "file written"
        );
        Ok(WriteOutcome {
            path: dry.path.clone(),
            changed: true,
            bytes_written: dry.new_content.len(),
            lines_added: dry.lines_added,
            lines_removed: dry.lines_removed,
        })
    }

    fn edited_content(
        &self,
        path: &Path,
        old: &str,
        new: &str,
        expected: usize,
    ) -> Result<String, WriteError> {
        let resolved = self.guard.resolve(path)?;
        let current = std::fs::read_to_string(&resolved).map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        files::replace_exact(&current, old, new, expected).map_err(|e| WriteError::InvalidContent {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// `<module_dir>/outputs.tf`, once the module's descriptor is confirmed.
    fn output_interface_path(&self, module_dir: &Path) -> Result<PathBuf, WriteError> {
        let dir = self.guard.resolve(module_dir)?;
        if !dir.join(DESCRIPTOR_FILE).is_file() {
            return Err(GuardError::NotFound(module_dir.join(DESCRIPTOR_FILE)).into());
        }
        Ok(dir.join(OUTPUT_INTERFACE_FILE))
    }
}

struct Target {
    resolved: PathBuf,
    relative: PathBuf,
    file_name: String,
}

/// Role-specific structural checks on proposed content.
fn content_problems(role: FileRole, content: &str, registered: Option<&BTreeSet<String>>) -> Vec<String> {
    match role {
        FileRole::Descriptor => match descriptor::validate(content) {
            Ok(d) => registered
                .map(|known| unregistered(&d, known))
                .unwrap_or_default()
                .into_iter()
                .map(|t| format!("output type '{t}' is not registered; register it before using it in this module"))
                .collect(),
            Err(descriptor::DescriptorError::Shape(problems)) => problems,
            Err(e) => vec![e.to_string()],
        },
        FileRole::Terraform => files::provider_block_lines(content)
            .into_iter()
            .map(|line| {
                format!("line {line}: provider blocks are not allowed; providers are supplied by the platform")
            })
            .collect(),
        FileRole::OutputInterface | FileRole::Generic => Vec::new(),
    }
}

fn preview_token(path: &str, current: &str, proposed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update([0]);
    hasher.update(current.as_bytes());
    hasher.update([0]);
    hasher.update(proposed.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write through a temp file in the target directory, then rename over it.
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("target has no parent directory"))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
