//! URL canonicalization relative to a crawl root.
//!
//! Every URL the engine stores or compares goes through [`normalize`] first, so
//! `https://docs.example.com/help/`, `https://docs.example.com/help#intro` and
//! `https://docs.example.com/help` all collapse to one key.

use url::Url;

use pagetrail_shared::{PagetrailError, Result};

/// Canonical form of `url`: no fragment, no trailing slash on a non-root path.
///
/// Repeated trailing slashes are all removed, so the function is idempotent;
/// a path of `/` is left alone.
pub fn normalize(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url).map_err(|e| PagetrailError::invalid_url(url, e))?;
    parsed.set_fragment(None);

    let path = parsed.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        parsed.set_path(&trimmed);
    }

    Ok(parsed.to_string())
}

/// The host and path prefix a crawl is confined to.
#[derive(Debug, Clone)]
pub struct CrawlRoot {
    url: Url,
}

impl CrawlRoot {
    /// Build a root from an already-normalized start URL.
    pub fn new(canonical_start: &str) -> Result<Self> {
        let url = Url::parse(canonical_start)
            .map_err(|e| PagetrailError::invalid_url(canonical_start, e))?;
        Ok(Self { url })
    }

    /// The root URL as a string.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Path prefix every internal link must share.
    pub fn path_prefix(&self) -> &str {
        self.url.path()
    }

    /// Resolve `raw_link` against `base`, then pull the result under the root
    /// path prefix if it resolved outside of it.
    ///
    /// Root-relative links such as `/pricing` on a crawl rooted at `/help`
    /// become `/help/pricing`.
    pub fn join_relative(&self, base: &str, raw_link: &str) -> Result<String> {
        let base_url = Url::parse(base).map_err(|e| PagetrailError::invalid_url(base, e))?;
        let mut joined = base_url
            .join(raw_link)
            .map_err(|e| PagetrailError::invalid_url(raw_link, e))?;

        let prefix = self.path_prefix();
        if !joined.path().starts_with(prefix) {
            let rooted = format!(
                "{}/{}",
                prefix.trim_end_matches('/'),
                joined.path().trim_start_matches('/')
            );
            joined.set_path(&rooted);
        }

        Ok(joined.to_string())
    }

    /// Whether `link` (an absolute URL) is a crawlable page under this root.
    ///
    /// Never fails: anything that does not parse is simply not internal.
    pub fn is_valid_internal_link(&self, link: &str) -> bool {
        if link.is_empty() || link.starts_with('#') {
            return false;
        }

        let Ok(parsed) = Url::parse(link) else {
            return false;
        };

        if parsed.host_str() != self.url.host_str()
            || parsed.port_or_known_default() != self.url.port_or_known_default()
        {
            return false;
        }

        let path = parsed.path();
        !path.is_empty() && path != "/" && path.starts_with(self.path_prefix())
    }
}
