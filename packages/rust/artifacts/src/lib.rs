//! Durable crawl reports.
//!
//! A [`ReportWriter`] persists a finished [`CrawlResultMap`]. Two formats ship:
//! - [`MarkdownReport`]: the `crawl_results.md` document consumed by retrieval tooling
//! - [`JsonReport`]: a single JSON document listing every page

mod json;
mod markdown;

use std::path::{Path, PathBuf};

use pagetrail_shared::{CrawlResultMap, PagetrailError, ReportFormat, Result};

pub use json::{JsonReport, render_json};
pub use markdown::{MarkdownReport, render_markdown};

/// Persists crawl results once traversal has finished.
pub trait ReportWriter: Send + Sync {
    /// Write `results` for a crawl that started at `start_url`.
    fn write(&self, results: &CrawlResultMap, start_url: &str) -> Result<()>;

    /// Where the artifact ends up.
    fn path(&self) -> &Path;
}

/// Build the writer for `format` targeting `path`.
pub fn writer_for(format: ReportFormat, path: impl Into<PathBuf>) -> Box<dyn ReportWriter> {
    match format {
        ReportFormat::Markdown => Box::new(MarkdownReport::new(path)),
        ReportFormat::Json => Box::new(JsonReport::new(path)),
    }
}

/// Write `contents` to `path`, creating parent directories first.
///
/// Every I/O failure is reported as [`PagetrailError::Persistence`].
pub(crate) fn persist(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PagetrailError::persistence(path, e))?;
    }
    std::fs::write(path, contents).map_err(|e| PagetrailError::persistence(path, e))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "crawl report saved");
    Ok(())
}
