//! Same-site crawler: URL canonicalization, page fetching, and traversal.
//!
//! This crate provides:
//! - [`canonical`]: normalize / join / validate URLs against a crawl root
//! - [`fetcher`]: the [`Fetcher`] capability and the reqwest-backed [`HttpFetcher`]
//! - [`engine`]: breadth-first, depth-bounded [`Crawler`]

pub mod canonical;
pub mod engine;
pub mod fetcher;

use std::sync::Arc;

use pagetrail_shared::{CrawlConfig, CrawlResultMap, Result};

pub use canonical::{CrawlRoot, normalize};
pub use engine::{CrawlProgress, CrawlSummary, Crawler, SilentProgress};
pub use fetcher::{Fetcher, HttpFetcher};

/// Crawl `start_url` over HTTP with the default configuration.
///
/// Returns the visited pages in visit order. See [`Crawler::crawl`] for the
/// summary-returning variant.
pub async fn scrape(start_url: &str, max_depth: i64) -> Result<CrawlResultMap> {
    let config = CrawlConfig::default();
    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let (_summary, results) = Crawler::new(fetcher, config)?
        .crawl(start_url, max_depth)
        .await?;
    Ok(results)
}
