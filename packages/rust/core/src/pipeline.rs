//! End-to-end `scrape` pipeline: start URL → crawl → report on disk.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use pagetrail_artifacts::{ReportWriter, writer_for};
use pagetrail_crawler::{CrawlProgress, CrawlSummary, Crawler, Fetcher, HttpFetcher};
use pagetrail_shared::{AppConfig, CrawlConfig, CrawlResultMap, ReportFormat, Result};

/// Configuration for one `scrape_and_save` run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// URL the crawl starts from, as given by the user.
    pub start_url: String,
    /// Maximum link hops from the start page. Negative values are rejected.
    pub max_depth: i64,
    /// Fetcher and traversal settings.
    pub crawl: CrawlConfig,
    /// Report destination.
    pub output: PathBuf,
    pub format: ReportFormat,
}

impl ScrapeConfig {
    /// Build a run configuration for `start_url` from the loaded app config.
    pub fn new(start_url: impl Into<String>, app: &AppConfig) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: i64::from(app.defaults.max_depth),
            crawl: CrawlConfig::from(app),
            output: PathBuf::from(&app.defaults.output_file),
            format: ReportFormat::Markdown,
        }
        .with_format(app.defaults.report_format)
    }

    /// Switch the report format.
    ///
    /// An output path ending in another format's extension is renamed to
    /// match, so `crawl_results.md` becomes `crawl_results.json`. Other paths
    /// are kept as given.
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        if ReportFormat::from_path(&self.output).is_some_and(|current| current != format) {
            self.output.set_extension(format.extension());
        }
        self.format = format;
        self
    }
}

/// Result of the `scrape_and_save` pipeline.
#[derive(Debug)]
pub struct ScrapeResult {
    /// Traversal statistics, including failed pages.
    pub summary: CrawlSummary,
    /// Number of pages written to the report.
    pub page_count: usize,
    /// Path of the written report.
    pub report_path: PathBuf,
    /// Total elapsed time, crawl and write.
    pub elapsed: Duration,
    /// The pages that were written, in visit order.
    pub results: CrawlResultMap,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a page is fetched and recorded.
    fn page_fetched(&self, url: &str, fetched: usize, queued: usize);
    /// Called when a page fetch fails.
    fn page_failed(&self, url: &str, error: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &ScrapeResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_fetched(&self, _url: &str, _fetched: usize, _queued: usize) {}
    fn page_failed(&self, _url: &str, _error: &str) {}
    fn done(&self, _result: &ScrapeResult) {}
}

/// Crawl `config.start_url` over HTTP and write the report.
pub async fn scrape_and_save(
    config: &ScrapeConfig,
    progress: &dyn ProgressReporter,
) -> Result<ScrapeResult> {
    scrape_and_save_until(config, progress, CancellationToken::new()).await
}

/// [`scrape_and_save`], stopping the crawl early once `cancel` fires.
///
/// Pages fetched before cancellation are still written.
pub async fn scrape_and_save_until(
    config: &ScrapeConfig,
    progress: &dyn ProgressReporter,
    cancel: CancellationToken,
) -> Result<ScrapeResult> {
    let fetcher = Arc::new(HttpFetcher::new(&config.crawl)?);
    let writer = writer_for(config.format, &config.output);
    run_and_save(fetcher, writer.as_ref(), config, progress, cancel).await
}

/// Run the pipeline with an explicit fetcher and report writer.
///
/// A report write failure is returned only after the crawl has finished.
/// Callers that need the pages even when the write fails can use
/// [`crawl_site`] and [`save_report`] directly.
#[instrument(skip_all, fields(start_url = %config.start_url, max_depth = config.max_depth))]
pub async fn run_and_save(
    fetcher: Arc<dyn Fetcher>,
    writer: &dyn ReportWriter,
    config: &ScrapeConfig,
    progress: &dyn ProgressReporter,
    cancel: CancellationToken,
) -> Result<ScrapeResult> {
    let start = Instant::now();

    info!(output = %writer.path().display(), "starting scrape pipeline");

    // --- Phase 1: Crawl ---
    let (summary, results) = crawl_site(fetcher, config, progress, cancel).await?;

    // --- Phase 2: Report ---
    save_report(writer, &results, config, progress)?;

    let result = ScrapeResult {
        page_count: results.len(),
        report_path: writer.path().to_path_buf(),
        elapsed: start.elapsed(),
        summary,
        results,
    };

    progress.done(&result);

    info!(
        page_count = result.page_count,
        pages_failed = result.summary.pages_failed,
        report = %result.report_path.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "scrape pipeline complete"
    );

    Ok(result)
}

/// Crawl phase on its own: traverse the site and return the visited pages.
pub async fn crawl_site(
    fetcher: Arc<dyn Fetcher>,
    config: &ScrapeConfig,
    progress: &dyn ProgressReporter,
    cancel: CancellationToken,
) -> Result<(CrawlSummary, CrawlResultMap)> {
    progress.phase("Crawling");
    let crawler = Crawler::new(fetcher, config.crawl.clone())?.with_cancellation(cancel);
    let (summary, results) = crawler
        .crawl_with_progress(
            &config.start_url,
            config.max_depth,
            &CrawlProgressAdapter { inner: progress },
        )
        .await?;

    if summary.cancelled {
        warn!(pages = results.len(), "crawl cancelled, saving partial results");
    }

    Ok((summary, results))
}

/// Report phase on its own. `results` is left untouched on failure.
pub fn save_report(
    writer: &dyn ReportWriter,
    results: &CrawlResultMap,
    config: &ScrapeConfig,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    progress.phase("Writing report");
    writer.write(results, &config.start_url)
}

// ---------------------------------------------------------------------------
// Crawl progress adapter
// ---------------------------------------------------------------------------

/// Adapts a `ProgressReporter` to the crawler's `CrawlProgress` interface.
struct CrawlProgressAdapter<'a> {
    inner: &'a dyn ProgressReporter,
}

impl CrawlProgress for CrawlProgressAdapter<'_> {
    fn page_fetched(&self, url: &str, fetched: usize, queued: usize) {
        self.inner.page_fetched(url, fetched, queued);
    }

    fn page_failed(&self, url: &str, error: &str) {
        self.inner.page_failed(url, error);
    }
}
