//! File roles inside a module and the content rules attached to each.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::descriptor::DESCRIPTOR_FILE;

/// Output-interface file written by the dedicated writer.
pub const OUTPUT_INTERFACE_FILE: &str = "outputs.tf";
/// Legacy output-interface file name. Protected and read, never written.
pub const LEGACY_OUTPUT_INTERFACE_FILE: &str = "output.tf";
/// Directories never descended into.
pub const SKIPPED_DIRS: &[&str] = &[".terraform", ".git"];

static PROVIDER_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: constant pattern.
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?m)^[ \t]*provider[ \t]+"[^"]*"\s*\{"#).expect("valid regex")
});

/// How the config writer treats a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Descriptor,
    OutputInterface,
    Terraform,
    Generic,
}

impl FileRole {
    /// Classify a file by its base name.
    #[must_use]
    pub fn classify(file_name: &str) -> Self {
        if file_name == DESCRIPTOR_FILE {
            Self::Descriptor
        } else if is_output_interface(file_name) {
            Self::OutputInterface
        } else if file_name.ends_with(".tf") || file_name.ends_with(".tf.tmpl") {
            Self::Terraform
        } else {
            Self::Generic
        }
    }
}

/// `outputs.tf` or the legacy `output.tf`.
#[must_use]
pub fn is_output_interface(file_name: &str) -> bool {
    file_name == OUTPUT_INTERFACE_FILE || file_name == LEGACY_OUTPUT_INTERFACE_FILE
}

/// Whether the directory name is one the scanner and lister skip.
#[must_use]
pub fn is_skipped_dir(name: &str) -> bool {
    SKIPPED_DIRS.contains(&name)
}

/// 1-based line numbers of every `provider "..." {` block opener.
#[must_use]
pub fn provider_block_lines(content: &str) -> Vec<usize> {
    PROVIDER_BLOCK
        .find_iter(content)
        .map(|m| content[..m.start()].matches('\n').count() + 1)
        .collect()
}

/// Error from [`replace_exact`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplaceError {
    #[error("the text to replace must not be empty")]
    EmptyPattern,
    #[error("expected {expected} occurrence(s) of the text to replace, found {found}")]
    CountMismatch { expected: usize, found: usize },
}

/// Replace every exact occurrence of `old` with `new`, provided there are
/// exactly `expected` of them.
///
/// # Errors
///
/// Returns [`ReplaceError`] for an empty pattern or a count mismatch.
pub fn replace_exact(
    content: &str,
    old: &str,
    new: &str,
    expected: usize,
) -> Result<String, ReplaceError> {
    if old.is_empty() {
        return Err(ReplaceError::EmptyPattern);
    }
    let found = content.matches(old).count();
    if found != expected {
        return Err(ReplaceError::CountMismatch { expected, found });
    }
    Ok(content.replace(old, new))
}
