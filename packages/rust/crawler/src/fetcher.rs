//! The page-fetching capability and its HTTP implementation.
//!
//! The engine only ever talks to [`Fetcher`]; [`HttpFetcher`] is the shipped
//! implementation (reqwest for transport, scraper for links, pagetrail-markdown
//! for content).

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use pagetrail_shared::{CrawlConfig, FetchResult, Link, PagetrailError, Result};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("pagetrail/", env!("CARGO_PKG_VERSION"));

/// `href` schemes that never point at a page.
const NON_PAGE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Retrieves one page and reports its content and links.
///
/// A returned `Err` and an `Ok` with `success == false` are both treated as a
/// failure of that single page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResult>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Fetches pages over HTTP(S) and converts them to Markdown.
pub struct HttpFetcher {
    client: Client,
    /// Allow loopback/private targets (local mirrors, mock servers in tests).
    allow_private_hosts: bool,
}

impl HttpFetcher {
    /// Create a fetcher using the timeouts and redirect policy in `config`.
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PagetrailError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            allow_private_hosts: config.allow_private_hosts,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResult> {
        if !self.allow_private_hosts && is_ssrf_target(url) {
            warn!(%url, "SSRF protection: blocked");
            return Ok(FetchResult::failed("blocked: private or non-HTTP target"));
        }

        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| PagetrailError::fetch(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchResult::failed(format!("HTTP {status}")));
        }

        // Links are classified against the final URL after redirects.
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| PagetrailError::fetch(url.as_str(), format!("body read failed: {e}")))?;

        let (internal_links, external_links) = partition_links(&Html::parse_document(&body), &final_url);

        let content = match pagetrail_markdown::convert(&body, final_url.as_str()) {
            Ok(markdown) => Some(markdown),
            Err(e) => {
                warn!(%url, error = %e, "content extraction failed, keeping links only");
                None
            }
        };

        Ok(FetchResult {
            success: true,
            error: None,
            content,
            internal_links,
            external_links,
        })
    }
}

// ---------------------------------------------------------------------------
// Link extraction
// ---------------------------------------------------------------------------

/// Split a document's `a[href]` links into same-host and other-host lists.
///
/// Hrefs are kept verbatim; resolution against the page only decides which
/// list a link goes in. Fragment-only links count as internal.
fn partition_links(doc: &Html, page_url: &Url) -> (Vec<Link>, Vec<Link>) {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return (Vec::new(), Vec::new());
    };

    let mut internal = Vec::new();
    let mut external = Vec::new();

    for el in doc.select(&anchor) {
        let Some(href) = el.value().attr("href").map(str::trim) else {
            continue;
        };
        let lowered = href.to_ascii_lowercase();
        if href.is_empty() || NON_PAGE_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
            continue;
        }

        match page_url.join(href) {
            Ok(resolved) if resolved.host_str() == page_url.host_str() => {
                internal.push(Link::new(href));
            }
            Ok(_) => external.push(Link::new(href)),
            Err(e) => debug!(href, error = %e, "unresolvable href dropped"),
        }
    }

    (internal, external)
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}
