//! JSON report writer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use pagetrail_shared::{CrawlResultMap, PageResult, PagetrailError, Result};

use crate::{ReportWriter, persist};

/// Serialized shape of the JSON report.
#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    start_url: &'a str,
    generated_at: DateTime<Utc>,
    page_count: usize,
    /// Pages in visit order.
    pages: Vec<&'a PageResult>,
}

/// Writes the crawl as a pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonReport {
    path: PathBuf,
}

impl JsonReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportWriter for JsonReport {
    fn write(&self, results: &CrawlResultMap, start_url: &str) -> Result<()> {
        persist(&self.path, &render_json(results, start_url)?)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Render the JSON report.
pub fn render_json(results: &CrawlResultMap, start_url: &str) -> Result<String> {
    let doc = JsonDocument {
        start_url,
        generated_at: Utc::now(),
        page_count: results.len(),
        pages: results.values().collect(),
    };
    serde_json::to_string_pretty(&doc)
        .map_err(|e| PagetrailError::Conversion(format!("JSON serialization failed: {e}")))
}
