//! `crawl_results.md` writer.
//!
//! Layout: a title line, a summary line with the page count and start URL,
//! then one section per page in visit order with its link counts and content.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use pagetrail_shared::{CrawlResultMap, Result};

use crate::{ReportWriter, persist};

/// Writes the crawl as a single Markdown document.
#[derive(Debug, Clone)]
pub struct MarkdownReport {
    path: PathBuf,
}

impl MarkdownReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportWriter for MarkdownReport {
    fn write(&self, results: &CrawlResultMap, start_url: &str) -> Result<()> {
        persist(&self.path, &render_markdown(results, start_url))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Render the report. Every page gets a full section.
pub fn render_markdown(results: &CrawlResultMap, start_url: &str) -> String {
    let mut out = String::from("# Crawl Results\n\n");
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "**Crawled {} pages starting from {start_url}**\n",
        results.len()
    );

    for (url, page) in results {
        let _ = writeln!(out, "## {url}");
        let _ = writeln!(out, "- **Internal Links**: {}", page.internal_link_count);
        let _ = writeln!(out, "- **External Links**: {}\n", page.external_link_count);

        if let Some(content) = page.content.as_deref().filter(|c| !c.trim().is_empty()) {
            let _ = writeln!(out, "### Page Content\n{}\n", content.trim_end());
        }
    }

    out
}
