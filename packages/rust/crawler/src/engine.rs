//! Breadth-first, depth-bounded frontier traversal.
//!
//! The engine owns all crawl state (frontier, visited set, result map) as a
//! single [`CrawlState`] value. Fetches are the only suspension points: a
//! target is marked visited when it is dequeued and up to `concurrency` fetches
//! stay in flight. A fetch that finishes early frees its slot at once, but its
//! outcome waits until every earlier target is recorded, so results keep BFS
//! order. Request starts are spaced `rate_limit_ms` apart.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use pagetrail_shared::{
    CrawlConfig, CrawlResultMap, CrawlTarget, FetchResult, Link, PageResult, PagetrailError,
    Result,
};

use crate::canonical::{CrawlRoot, normalize};
use crate::fetcher::Fetcher;

// ---------------------------------------------------------------------------
// CrawlSummary
// ---------------------------------------------------------------------------

/// Summary of a completed (or cancelled) crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Canonical start URL.
    pub root_url: String,
    /// Pages fetched successfully and recorded in the result map.
    pub pages_fetched: usize,
    /// Pages whose fetch failed; omitted from the result map.
    pub pages_failed: usize,
    /// Distinct URLs marked visited.
    pub visited: usize,
    /// Discovered links dropped as unparseable or outside the root.
    pub links_skipped: usize,
    /// Failed pages (URL, error message).
    pub failures: Vec<(String, String)>,
    /// Total duration of the crawl.
    pub duration: Duration,
    /// Whether the crawl stopped early on cancellation.
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Callbacks fired as pages complete.
pub trait CrawlProgress: Send + Sync {
    /// A page was fetched and recorded.
    fn page_fetched(&self, url: &str, fetched: usize, queued: usize);
    /// A page fetch failed.
    fn page_failed(&self, url: &str, error: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl CrawlProgress for SilentProgress {
    fn page_fetched(&self, _url: &str, _fetched: usize, _queued: usize) {}
    fn page_failed(&self, _url: &str, _error: &str) {}
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Same-site crawler driving a [`Fetcher`] over a bounded link graph.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    config: CrawlConfig,
    cancel: CancellationToken,
}

impl Crawler {
    /// Create a crawler; fails if `config` is unusable (e.g. zero concurrency).
    pub fn new(fetcher: Arc<dyn Fetcher>, config: CrawlConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fetcher,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop between iterations once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Crawl every internal page within `max_depth` hops of `start_url`.
    ///
    /// Only a negative depth or an unparseable start URL fail the call; page
    /// and link failures are recorded in the summary and skipped.
    pub async fn crawl(
        &self,
        start_url: &str,
        max_depth: i64,
    ) -> Result<(CrawlSummary, CrawlResultMap)> {
        self.crawl_with_progress(start_url, max_depth, &SilentProgress)
            .await
    }

    /// [`Crawler::crawl`], reporting each page outcome to `progress`.
    #[instrument(skip_all, fields(start_url = %start_url, max_depth))]
    pub async fn crawl_with_progress(
        &self,
        start_url: &str,
        max_depth: i64,
        progress: &dyn CrawlProgress,
    ) -> Result<(CrawlSummary, CrawlResultMap)> {
        if max_depth < 0 {
            return Err(PagetrailError::invalid_argument(format!(
                "max_depth must be non-negative, got {max_depth}"
            )));
        }
        let max_depth = u32::try_from(max_depth).unwrap_or(u32::MAX);

        let root_url = normalize(start_url)?;
        let mut state = CrawlState::new(CrawlRoot::new(&root_url)?, max_depth);
        let start_time = Instant::now();

        info!(
            root = %root_url,
            concurrency = self.config.concurrency,
            rate_limit_ms = self.config.rate_limit_ms,
            "starting crawl"
        );

        let limit = self.config.concurrency as usize;
        let mut pacer = Pacer::new(Duration::from_millis(self.config.rate_limit_ms));
        let mut in_flight = FuturesUnordered::new();
        // Finished fetches keyed by dequeue number, waiting for their turn.
        let mut finished = BTreeMap::new();
        let mut launched: u64 = 0;
        let mut recorded: u64 = 0;

        loop {
            if !state.summary.cancelled && self.cancel.is_cancelled() {
                warn!(
                    queued = state.frontier.len(),
                    in_flight = in_flight.len(),
                    "crawl cancelled"
                );
                state.summary.cancelled = true;
            }

            if !state.summary.cancelled {
                while in_flight.len() < limit {
                    let Some(target) = state.next_target() else {
                        break;
                    };
                    let seq = launched;
                    launched += 1;
                    let start_at = pacer.next_slot();
                    in_flight.push(self.fetch_one(target, start_at).map(move |done| (seq, done)));
                }
            }

            // In-flight fetches finish even after cancellation.
            let Some((seq, done)) = in_flight.next().await else {
                break;
            };
            finished.insert(seq, done);

            while let Some((target, outcome)) = finished.remove(&recorded) {
                recorded += 1;
                match outcome {
                    Ok(fetched) if fetched.success => {
                        state.record_page(&target, fetched);
                        progress.page_fetched(
                            &target.url,
                            state.results.len(),
                            state.frontier.len(),
                        );
                    }
                    Ok(fetched) => {
                        let error = fetched.error.unwrap_or_else(|| "unknown error".into());
                        progress.page_failed(&target.url, &error);
                        state.record_failure(&target, error);
                    }
                    Err(e) => {
                        progress.page_failed(&target.url, &e.to_string());
                        state.record_failure(&target, e.to_string());
                    }
                }
            }
        }

        let (mut summary, results) = state.finish();
        summary.root_url = root_url;
        summary.duration = start_time.elapsed();

        info!(
            pages_fetched = summary.pages_fetched,
            pages_failed = summary.pages_failed,
            links_skipped = summary.links_skipped,
            duration_ms = summary.duration.as_millis(),
            cancelled = summary.cancelled,
            "crawl completed"
        );

        Ok((summary, results))
    }

    async fn fetch_one(
        &self,
        target: CrawlTarget,
        start_at: Option<tokio::time::Instant>,
    ) -> (CrawlTarget, Result<FetchResult>) {
        if let Some(at) = start_at {
            tokio::time::sleep_until(at).await;
        }

        info!(url = %target.url, depth = target.depth, "crawling");
        let outcome = match Url::parse(&target.url) {
            Ok(url) => self.fetcher.fetch(&url).await,
            Err(e) => Err(PagetrailError::invalid_url(&target.url, e)),
        };
        (target, outcome)
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Hands out request start times at least `interval` apart, whatever the
/// number of fetches in flight.
struct Pacer {
    interval: Duration,
    last: Option<tokio::time::Instant>,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Start time for the next request; `None` when unthrottled.
    fn next_slot(&mut self) -> Option<tokio::time::Instant> {
        if self.interval.is_zero() {
            return None;
        }
        let now = tokio::time::Instant::now();
        let slot = match self.last {
            Some(last) => (last + self.interval).max(now),
            None => now + self.interval,
        };
        self.last = Some(slot);
        Some(slot)
    }
}

// ---------------------------------------------------------------------------
// Crawl state
// ---------------------------------------------------------------------------

/// Everything one crawl mutates. Owned by [`Crawler::crawl`] alone.
struct CrawlState {
    root: CrawlRoot,
    max_depth: u32,
    frontier: VecDeque<CrawlTarget>,
    /// URLs marked at dequeue time, before their fetch starts.
    visited: HashSet<String>,
    /// URLs ever pushed onto the frontier.
    enqueued: HashSet<String>,
    results: CrawlResultMap,
    summary: CrawlSummary,
}

impl CrawlState {
    fn new(root: CrawlRoot, max_depth: u32) -> Self {
        let root_url = root.as_str().to_string();
        Self {
            frontier: VecDeque::from([CrawlTarget {
                url: root_url.clone(),
                depth: 0,
            }]),
            enqueued: HashSet::from([root_url]),
            visited: HashSet::new(),
            results: CrawlResultMap::new(),
            summary: CrawlSummary::default(),
            root,
            max_depth,
        }
    }

    /// Dequeue the next fetchable target and mark it visited.
    fn next_target(&mut self) -> Option<CrawlTarget> {
        while let Some(target) = self.frontier.pop_front() {
            if target.depth <= self.max_depth && self.visited.insert(target.url.clone()) {
                return Some(target);
            }
        }
        None
    }

    fn record_page(&mut self, target: &CrawlTarget, fetched: FetchResult) {
        self.results
            .insert(target.url.clone(), PageResult::from_fetch(&target.url, &fetched));

        if target.depth < self.max_depth {
            self.enqueue_links(target, &fetched.internal_links);
        }
    }

    fn record_failure(&mut self, target: &CrawlTarget, error: String) {
        warn!(url = %target.url, %error, "failed to crawl page");
        self.summary.failures.push((target.url.clone(), error));
    }

    /// Canonicalize `links` found on `parent` and queue the new in-scope ones.
    fn enqueue_links(&mut self, parent: &CrawlTarget, links: &[Link]) {
        for link in links {
            let canonical = match self.canonicalize(&parent.url, &link.href) {
                Ok(url) => url,
                Err(e) => {
                    warn!(href = %link.href, error = %e, "skipping invalid URL");
                    self.summary.links_skipped += 1;
                    continue;
                }
            };

            if !self.root.is_valid_internal_link(&canonical) {
                debug!(url = %canonical, "out of scope, skipping");
                self.summary.links_skipped += 1;
                continue;
            }

            if self.visited.contains(&canonical) || !self.enqueued.insert(canonical.clone()) {
                continue;
            }

            self.frontier.push_back(CrawlTarget {
                url: canonical,
                depth: parent.depth + 1,
            });
        }
    }

    fn canonicalize(&self, base: &str, href: &str) -> Result<String> {
        normalize(&self.root.join_relative(base, href)?)
    }

    fn finish(self) -> (CrawlSummary, CrawlResultMap) {
        let mut summary = self.summary;
        summary.pages_fetched = self.results.len();
        summary.pages_failed = summary.failures.len();
        summary.visited = self.visited.len();
        (summary, self.results)
    }
}

#[cfg(test)]
mod crawler_tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::fetcher::HttpFetcher;

    /// What the mock returns for one URL.
    enum MockPage {
        Links(Vec<&'static str>),
        Failed(&'static str),
        Error(&'static str),
    }

    /// In-memory site keyed by canonical URL; records every fetch.
    #[derive(Default)]
    struct MockSite {
        pages: HashMap<String, MockPage>,
        calls: Mutex<Vec<String>>,
        started: Mutex<Vec<std::time::Instant>>,
        /// Per-URL response latency.
        delays: HashMap<String, Duration>,
        /// Cancelled as soon as the first fetch starts.
        cancel_on_fetch: Option<CancellationToken>,
    }

    impl MockSite {
        fn page(mut self, url: &str, links: Vec<&'static str>) -> Self {
            self.pages.insert(url.to_string(), MockPage::Links(links));
            self
        }

        fn failing(mut self, url: &str, page: MockPage) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }

        fn slow(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn start_times(&self) -> Vec<std::time::Instant> {
            self.started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for MockSite {
        async fn fetch(&self, url: &Url) -> Result<FetchResult> {
            self.calls.lock().unwrap().push(url.to_string());
            self.started.lock().unwrap().push(std::time::Instant::now());
            if let Some(delay) = self.delays.get(url.as_str()) {
                tokio::time::sleep(*delay).await;
            }
            if let Some(token) = &self.cancel_on_fetch {
                token.cancel();
            }
            match self.pages.get(url.as_str()) {
                Some(MockPage::Links(links)) => Ok(FetchResult::ok(
                    format!("content of {url}"),
                    links.iter().map(|l| Link::new(*l)).collect(),
                    vec![Link::new("https://other.com")],
                )),
                Some(MockPage::Failed(msg)) => Ok(FetchResult::failed(*msg)),
                Some(MockPage::Error(msg)) => Err(PagetrailError::fetch(url.as_str(), *msg)),
                None => Ok(FetchResult::failed("HTTP 404 Not Found")),
            }
        }
    }

    fn config(concurrency: u32) -> CrawlConfig {
        CrawlConfig {
            concurrency,
            rate_limit_ms: 0,
            ..CrawlConfig::default()
        }
    }

    async fn run(site: Arc<MockSite>, start: &str, depth: i64) -> (CrawlSummary, CrawlResultMap) {
        Crawler::new(site, config(1))
            .unwrap()
            .crawl(start, depth)
            .await
            .unwrap()
    }

    fn keys(results: &CrawlResultMap) -> Vec<&str> {
        results.keys().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn help_center_scenario() {
        let site = Arc::new(
            MockSite::default()
                .page("https://docs.example.com/help", vec!["/help/features", "#section"])
                .page("https://docs.example.com/help/features", vec![]),
        );

        let (summary, results) = run(site.clone(), "https://docs.example.com/help", 1).await;

        assert_eq!(
            keys(&results),
            ["https://docs.example.com/help", "https://docs.example.com/help/features"]
        );
        let root = &results["https://docs.example.com/help"];
        assert!(root.success);
        assert_eq!(root.internal_link_count, 2);
        assert_eq!(root.external_link_count, 1);
        assert_eq!(root.raw_internal_links[1].href, "#section");
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.pages_failed, 0);
        assert_eq!(site.calls().len(), 2);
    }

    #[tokio::test]
    async fn depth_zero_fetches_only_root() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/a", "/docs/b"])
                .page("https://a.com/docs/a", vec![])
                .page("https://a.com/docs/b", vec![]),
        );

        let (_, results) = run(site.clone(), "https://a.com/docs/", 0).await;

        assert_eq!(keys(&results), ["https://a.com/docs"]);
        assert_eq!(site.calls(), ["https://a.com/docs"]);
    }

    #[tokio::test]
    async fn breadth_first_and_shared_child_fetched_once() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/a", "/docs/b"])
                .page("https://a.com/docs/a", vec!["/docs/c"])
                .page("https://a.com/docs/b", vec!["/docs/c/"])
                .page("https://a.com/docs/c", vec![]),
        );

        let (_, results) = run(site.clone(), "https://a.com/docs", 2).await;

        let expected = [
            "https://a.com/docs",
            "https://a.com/docs/a",
            "https://a.com/docs/b",
            "https://a.com/docs/c",
        ];
        assert_eq!(keys(&results), expected);
        assert_eq!(site.calls(), expected);
    }

    #[test]
    fn shared_child_is_enqueued_once() {
        let root = CrawlRoot::new("https://a.com/docs").unwrap();
        let mut state = CrawlState::new(root, 2);
        let first = state.next_target().unwrap();
        assert_eq!(first.depth, 0);

        let a = CrawlTarget { url: "https://a.com/docs/a".into(), depth: 1 };
        let b = CrawlTarget { url: "https://a.com/docs/b".into(), depth: 1 };
        state.enqueue_links(&a, &[Link::new("/docs/c")]);
        state.enqueue_links(&b, &[Link::new("/docs/c#intro"), Link::new("c/")]);

        let queued: Vec<_> = state.frontier.iter().map(|t| (t.url.as_str(), t.depth)).collect();
        assert_eq!(queued, [("https://a.com/docs/c", 2)]);
    }

    #[tokio::test]
    async fn cyclic_graph_terminates() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/x", "/docs", "/docs/"])
                .page("https://a.com/docs/x", vec!["/docs/y", "/docs/x#self"])
                .page("https://a.com/docs/y", vec!["/docs", "/docs/x", "/docs/gone"]),
        );

        let (summary, results) = run(site.clone(), "https://a.com/docs", 50).await;

        assert_eq!(results.len(), 3);
        assert_eq!(summary.pages_failed, 1);
        assert_eq!(summary.visited, results.len() + summary.pages_failed);
        assert_eq!(site.calls().len(), summary.visited);
    }

    #[tokio::test]
    async fn one_failed_page_does_not_stop_the_crawl() {
        let site = Arc::new(
            MockSite::default()
                .page(
                    "https://a.com/docs",
                    vec!["/docs/1", "/docs/2", "/docs/3", "/docs/4", "/docs/5"],
                )
                .page("https://a.com/docs/1", vec![])
                .page("https://a.com/docs/2", vec![])
                .failing("https://a.com/docs/3", MockPage::Error("connection reset"))
                .page("https://a.com/docs/4", vec![])
                .page("https://a.com/docs/5", vec![]),
        );

        let (summary, results) = run(site, "https://a.com/docs", 1).await;

        for n in [1, 2, 4, 5] {
            assert!(results.contains_key(&format!("https://a.com/docs/{n}")));
        }
        assert!(!results.contains_key("https://a.com/docs/3"));
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "https://a.com/docs/3");
        assert!(summary.failures[0].1.contains("connection reset"));
    }

    #[tokio::test]
    async fn unsuccessful_result_is_omitted() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/private"])
                .failing("https://a.com/docs/private", MockPage::Failed("HTTP 403 Forbidden")),
        );

        let (summary, results) = run(site, "https://a.com/docs", 1).await;

        assert_eq!(keys(&results), ["https://a.com/docs"]);
        assert_eq!(summary.failures[0].1, "HTTP 403 Forbidden");
        assert_eq!(summary.visited, 2);
    }

    #[tokio::test]
    async fn failed_root_yields_empty_map() {
        let site = Arc::new(MockSite::default());
        let (summary, results) = run(site, "https://a.com/docs", 3).await;
        assert!(results.is_empty());
        assert_eq!(summary.pages_failed, 1);
    }

    #[tokio::test]
    async fn links_outside_prefix_are_rooted() {
        let site = Arc::new(
            MockSite::default()
                .page("https://docs.example.com/help", vec!["/pricing", "https://docs.example.com/"])
                .page("https://docs.example.com/help/pricing", vec![]),
        );

        let (_, results) = run(site, "https://docs.example.com/help", 1).await;

        assert_eq!(
            keys(&results),
            ["https://docs.example.com/help", "https://docs.example.com/help/pricing"]
        );
    }

    #[tokio::test]
    async fn negative_depth_is_rejected_before_fetching() {
        let site = Arc::new(MockSite::default().page("https://a.com/docs", vec![]));
        let err = Crawler::new(site.clone(), config(1))
            .unwrap()
            .crawl("https://a.com/docs", -1)
            .await
            .unwrap_err();

        assert!(matches!(err, PagetrailError::InvalidArgument { .. }));
        assert!(site.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_start_url_is_rejected() {
        let site = Arc::new(MockSite::default());
        let err = Crawler::new(site.clone(), config(1))
            .unwrap()
            .crawl("docs.example.com without scheme", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, PagetrailError::InvalidUrl { .. }));
        assert!(site.calls().is_empty());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let site = Arc::new(MockSite::default());
        assert!(Crawler::new(site, config(0)).is_err());
    }

    #[tokio::test]
    async fn cancellation_stops_between_iterations() {
        let token = CancellationToken::new();
        let site = Arc::new(MockSite {
            cancel_on_fetch: Some(token.clone()),
            ..MockSite::default()
                .page("https://a.com/docs", vec!["/docs/a", "/docs/b"])
                .page("https://a.com/docs/a", vec![])
        });

        let (summary, results) = Crawler::new(site.clone(), config(1))
            .unwrap()
            .with_cancellation(token)
            .crawl("https://a.com/docs", 2)
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(keys(&results), ["https://a.com/docs"]);
        assert_eq!(site.calls().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_fetches_keep_bfs_order() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/a", "/docs/b", "/docs/c", "/docs/d"])
                .page("https://a.com/docs/a", vec!["/docs/a/1"])
                .page("https://a.com/docs/b", vec!["/docs/a/1", "/docs/b/1"])
                .page("https://a.com/docs/c", vec![])
                .page("https://a.com/docs/d", vec![])
                .page("https://a.com/docs/a/1", vec![])
                .page("https://a.com/docs/b/1", vec![]),
        );

        let (summary, results) = Crawler::new(site.clone(), config(3))
            .unwrap()
            .crawl("https://a.com/docs", 2)
            .await
            .unwrap();

        assert_eq!(
            keys(&results),
            [
                "https://a.com/docs",
                "https://a.com/docs/a",
                "https://a.com/docs/b",
                "https://a.com/docs/c",
                "https://a.com/docs/d",
                "https://a.com/docs/a/1",
                "https://a.com/docs/b/1",
            ]
        );
        assert_eq!(summary.visited, 7);
        assert_eq!(site.calls().len(), 7);
    }

    #[tokio::test]
    async fn rate_limit_spaces_concurrent_requests() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/a", "/docs/b", "/docs/c"])
                .page("https://a.com/docs/a", vec![])
                .page("https://a.com/docs/b", vec![])
                .page("https://a.com/docs/c", vec![]),
        );
        let crawl_config = CrawlConfig {
            rate_limit_ms: 50,
            ..config(4)
        };

        let begin = std::time::Instant::now();
        let (_, results) = Crawler::new(site.clone(), crawl_config)
            .unwrap()
            .crawl("https://a.com/docs", 1)
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        let starts = site.start_times();
        assert_eq!(starts.len(), 4);
        // The n-th request may not start before n intervals have passed.
        for (n, start) in starts.iter().enumerate() {
            let earliest = Duration::from_millis(50 * (n as u64 + 1));
            assert!(start.duration_since(begin) >= earliest, "request {n} started early");
        }
    }

    #[tokio::test]
    async fn slow_page_does_not_hold_back_later_fetches() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/a", "/docs/b", "/docs/c", "/docs/d"])
                .page("https://a.com/docs/a", vec![])
                .page("https://a.com/docs/b", vec![])
                .page("https://a.com/docs/c", vec![])
                .page("https://a.com/docs/d", vec![])
                .slow("https://a.com/docs/a", Duration::from_millis(300)),
        );

        let (_, results) = Crawler::new(site.clone(), config(2))
            .unwrap()
            .crawl("https://a.com/docs", 1)
            .await
            .unwrap();

        // b, c and d all start while a is still loading.
        let starts = site.start_times();
        assert_eq!(starts.len(), 5);
        assert!(starts[4].duration_since(starts[1]) < Duration::from_millis(250));
        assert_eq!(
            keys(&results),
            [
                "https://a.com/docs",
                "https://a.com/docs/a",
                "https://a.com/docs/b",
                "https://a.com/docs/c",
                "https://a.com/docs/d",
            ]
        );
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl CrawlProgress for RecordingProgress {
        fn page_fetched(&self, url: &str, fetched: usize, queued: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("ok {url} {fetched} {queued}"));
        }

        fn page_failed(&self, url: &str, _error: &str) {
            self.events.lock().unwrap().push(format!("fail {url}"));
        }
    }

    #[tokio::test]
    async fn progress_sees_every_outcome() {
        let site = Arc::new(
            MockSite::default()
                .page("https://a.com/docs", vec!["/docs/a", "/docs/missing"])
                .page("https://a.com/docs/a", vec![]),
        );
        let progress = RecordingProgress::default();

        Crawler::new(site, config(1))
            .unwrap()
            .crawl_with_progress("https://a.com/docs", 1, &progress)
            .await
            .unwrap();

        assert_eq!(
            *progress.events.lock().unwrap(),
            [
                "ok https://a.com/docs 1 2",
                "ok https://a.com/docs/a 2 1",
                "fail https://a.com/docs/missing",
            ]
        );
    }

    #[tokio::test]
    async fn crawl_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        let root = r##"<html><body><main>
            <h1>Docs</h1>
            <a href="/docs/guide/">Guide</a>
            <a href="#top">Top</a>
            <a href="https://other.com/">Other</a>
        </main></body></html>"##;
        let guide = r#"<html><body><main>
            <h1>Guide</h1><p>Read me.</p>
            <a href="/docs">Back</a>
            <a href="/docs/broken">Broken</a>
        </main></body></html>"#;

        for (path, body) in [("/docs", root), ("/docs/guide", guide)] {
            wiremock::Mock::given(wiremock::matchers::method("GET"))
                .and(wiremock::matchers::path(path))
                .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;
        }
        wiremock::Mock::given(wiremock::matchers::path("/docs/broken"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let crawl_config = CrawlConfig {
            allow_private_hosts: true,
            ..config(2)
        };
        let fetcher = Arc::new(HttpFetcher::new(&crawl_config).unwrap());
        let crawler = Crawler::new(fetcher, crawl_config).unwrap();
        let (summary, results) = crawler
            .crawl(&format!("{}/docs", server.uri()), 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(summary.pages_failed, 1);
        let guide_page = &results[&format!("{}/docs/guide", server.uri())];
        assert!(guide_page.content.as_deref().unwrap().contains("Read me."));
    }
}
