//! Core domain types shared by the crawler, report writers and pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Link / FetchResult
// ---------------------------------------------------------------------------

/// A link discovered on a page, exactly as it appeared in the `href`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// What a fetcher reports back for one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    /// Whether the page was retrieved and extracted.
    pub success: bool,
    /// Failure description when `success` is false.
    pub error: Option<String>,
    /// Extracted textual content (Markdown for the HTTP fetcher).
    pub content: Option<String>,
    /// Same-host link candidates, in document order.
    pub internal_links: Vec<Link>,
    /// Links pointing at other hosts, in document order.
    pub external_links: Vec<Link>,
}

impl FetchResult {
    /// A successful fetch with the given content and links.
    pub fn ok(
        content: impl Into<String>,
        internal_links: Vec<Link>,
        external_links: Vec<Link>,
    ) -> Self {
        Self {
            success: true,
            error: None,
            content: Some(content.into()),
            internal_links,
            external_links,
        }
    }

    /// A failed fetch carrying an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Frontier entries and results
// ---------------------------------------------------------------------------

/// A URL waiting in the frontier together with its distance from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Canonical URL.
    pub url: String,
    /// Number of link hops from the crawl root (root = 0).
    pub depth: u32,
}

/// The recorded outcome for one visited page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Canonical page URL.
    pub url: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub internal_link_count: usize,
    pub external_link_count: usize,
    /// Internal links as the fetcher returned them, before canonicalization.
    #[serde(default)]
    pub raw_internal_links: Vec<Link>,
}

impl PageResult {
    /// Build the record for a page from its fetch result.
    pub fn from_fetch(url: impl Into<String>, fetched: &FetchResult) -> Self {
        Self {
            url: url.into(),
            success: fetched.success,
            error: fetched.error.clone(),
            content: fetched.content.clone(),
            internal_link_count: fetched.internal_links.len(),
            external_link_count: fetched.external_links.len(),
            raw_internal_links: fetched.internal_links.clone(),
        }
    }
}

/// Canonical URL → page result, iterated in visit order.
pub type CrawlResultMap = IndexMap<String, PageResult>;
