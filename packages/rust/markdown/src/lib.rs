//! HTML-to-Markdown page content extraction.
//!
//! The HTTP fetcher hands each page body to [`convert`], which picks the main
//! content container, renders tables, converts the rest with `htmd` and runs
//! the [`cleanup`] passes. The resulting Markdown is what ends up in the
//! crawl report.

mod cleanup;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use pagetrail_shared::{PagetrailError, Result};

/// Tags dropped entirely during conversion.
const SKIPPED_TAGS: &[&str] = &["script", "style", "nav", "iframe", "noscript", "svg", "form"];

/// Content containers tried in order before falling back to `<body>`.
const CONTENT_SELECTORS: &[&str] = &[
    "article .markdown",
    ".vp-doc",
    ".markdown-section",
    "[role=\"main\"]",
    "article",
    "main",
    ".content",
];

/// Page chrome removed from whichever container is picked.
///
/// A `<header>` holding an `<h1>` is the page title block (Docusaurus wraps
/// the title that way) and is kept.
const CHROME_SELECTOR: &str = "nav, header, footer, aside, .sidebar, .toc";

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert a full HTML document to clean Markdown.
///
/// Relative links in the output are resolved against `source_url` when it
/// parses.
#[instrument(skip(html), fields(url = %source_url))]
pub fn convert(html: &str, source_url: &str) -> Result<String> {
    let content_html = extract_content_html(html);
    let content_html = render_tables(&content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    let raw = converter
        .convert(&content_html)
        .map_err(|e| PagetrailError::Conversion(format!("htmd conversion failed: {e}")))?;

    let base = Url::parse(source_url).ok();
    let markdown = cleanup::run(&raw, base.as_ref());

    debug!(raw_len = raw.len(), final_len = markdown.len(), "page converted");

    Ok(markdown)
}

// ---------------------------------------------------------------------------
// Content selection
// ---------------------------------------------------------------------------

/// Pick the main content container and strip navigation chrome from it.
fn extract_content_html(html: &str) -> String {
    let doc = Html::parse_document(html);

    let container = CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| doc.select(&sel).next())
        .or_else(|| {
            Selector::parse("body")
                .ok()
                .and_then(|sel| doc.select(&sel).next())
        });

    match container {
        Some(el) => strip_chrome(&el.inner_html()),
        None => html.to_string(),
    }
}

fn strip_chrome(html: &str) -> String {
    let (Ok(chrome), Ok(h1)) = (Selector::parse(CHROME_SELECTOR), Selector::parse("h1")) else {
        return html.to_string();
    };
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&chrome)
        .filter(|el| el.value().name() != "header" || el.select(&h1).next().is_none())
        .fold(html.to_string(), |acc, el| acc.replace(&el.html(), ""))
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Swap `<table>` elements for pipe tables; `htmd` 0.1 has no table support.
fn render_tables(html: &str) -> String {
    let Ok(table_sel) = Selector::parse("table") else {
        return html.to_string();
    };
    let fragment = Html::parse_fragment(html);

    fragment.select(&table_sel).fold(html.to_string(), |acc, table| {
        acc.replacen(&table.html(), &pipe_table(&table), 1)
    })
}

fn pipe_table(table: &ElementRef) -> String {
    let (Ok(tr), Ok(cell)) = (Selector::parse("tr"), Selector::parse("th, td")) else {
        return String::new();
    };

    let rows: Vec<Vec<String>> = table
        .select(&tr)
        .map(|row| {
            row.select(&cell)
                .map(|c| c.text().collect::<String>().trim().replace('|', "\\|"))
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let mut md = String::from("\n\n");
    md.push_str(&pipe_row(&rows[0], width));
    md.push_str(&pipe_row(&vec!["---".to_string(); width], width));
    for row in &rows[1..] {
        md.push_str(&pipe_row(row, width));
    }
    md.push('\n');
    md
}

fn pipe_row(cells: &[String], width: usize) -> String {
    let mut padded = cells.to_vec();
    padded.resize(width, String::new());
    format!("| {} |\n", padded.join(" | "))
}
