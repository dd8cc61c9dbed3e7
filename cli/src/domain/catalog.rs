//! Module catalog snapshot types and the pure search/pagination logic.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::descriptor::ModuleDescriptor;

/// One discovered module. Immutable once built; a new scan builds new entries.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleCatalogEntry {
    /// Module directory relative to the working root.
    pub module_path: PathBuf,
    /// Canonical module directory.
    pub absolute_path: PathBuf,
    pub descriptor: ModuleDescriptor,
    /// Raw descriptor text, used for substring search.
    #[serde(skip)]
    pub descriptor_text: String,
    /// Raw content of the output-interface file, when the module has one.
    pub output_interface: Option<String>,
}

impl ModuleCatalogEntry {
    /// Case-insensitive substring match over the descriptor text.
    #[must_use]
    pub fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty() || self.descriptor_text.to_lowercase().contains(needle_lower)
    }
}

/// A descriptor that could not be turned into a catalog entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of one scan pass: every valid entry plus every per-module failure.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub entries: Vec<Arc<ModuleCatalogEntry>>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    /// Order entries and failures by discovery path.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.entries.sort_by(|a, b| a.module_path.cmp(&b.module_path));
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub matches: Vec<Arc<ModuleCatalogEntry>>,
    pub total_count: usize,
    pub has_more: bool,
    pub page: usize,
    pub page_size: usize,
}

/// Filter `entries` by `query` and slice out `page`.
///
/// A `page_size` of zero is treated as one. Entries are ordered by module path
/// so repeated calls over the same snapshot produce the same pages.
#[must_use]
pub fn search_page(
    entries: &[Arc<ModuleCatalogEntry>],
    query: &str,
    page: usize,
    page_size: usize,
) -> SearchPage {
    let page_size = page_size.max(1);
    let needle = query.to_lowercase();
    let mut hits: Vec<&Arc<ModuleCatalogEntry>> =
        entries.iter().filter(|e| e.matches(&needle)).collect();
    hits.sort_by(|a, b| a.module_path.cmp(&b.module_path));

    let total_count = hits.len();
    let start = page.saturating_mul(page_size).min(total_count);
    let end = start.saturating_add(page_size).min(total_count);

    SearchPage {
        matches: hits[start..end].iter().map(|e| Arc::clone(*e)).collect(),
        total_count,
        has_more: end < total_count,
        page,
        page_size,
    }
}
