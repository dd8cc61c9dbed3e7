//! Application service: module catalog and paginated search.

use std::sync::Arc;

use crate::application::services::scanner::ModuleScanner;
use crate::domain::catalog::{ScanReport, SearchPage, search_page};

/// Snapshot-based catalog over [`ModuleScanner`].
///
/// A snapshot is never updated in place; [`ModuleIndex::refresh`] builds a
/// new one and swaps it in, so snapshots handed out earlier stay valid.
#[derive(Debug)]
pub struct ModuleIndex {
    scanner: ModuleScanner,
    snapshot: Option<Arc<ScanReport>>,
}

impl ModuleIndex {
    #[must_use]
    pub fn new(scanner: ModuleScanner) -> Self {
        Self {
            scanner,
            snapshot: None,
        }
    }

    /// Re-scan and replace the current snapshot.
    pub fn refresh(&mut self) -> Arc<ScanReport> {
        let report = Arc::new(self.scanner.scan_report());
        self.snapshot = Some(Arc::clone(&report));
        report
    }

    /// The current snapshot, scanning first if there is none.
    pub fn snapshot(&mut self) -> Arc<ScanReport> {
        match &self.snapshot {
            Some(s) => Arc::clone(s),
            None => self.refresh(),
        }
    }

    /// Self-contained search: re-scan, then filter and page.
    pub fn search(&mut self, query: &str, page: usize, page_size: usize) -> SearchPage {
        let snapshot = self.refresh();
        search_in(&snapshot, query, page, page_size)
    }
}

/// Filter and page a snapshot the caller already holds.
#[must_use]
pub fn search_in(snapshot: &ScanReport, query: &str, page: usize, page_size: usize) -> SearchPage {
    let result = search_page(&snapshot.entries, query, page, page_size);
    tracing::debug!(
        query,
        page,
        page_size = result.page_size,
        total = result.total_count,
        "module search"
    );
    result
}
