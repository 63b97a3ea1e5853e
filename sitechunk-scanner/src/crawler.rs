use crate::error::{Result, ScanError};
use crate::extractor::{self, ExtractedDocument};
use crate::fetcher::{ContentKind, FetchError, FetchOutcome, FetchedBody, Fetcher, HttpFetcher};
use crate::result::{CrawlOutcome, FetchedPage};
use crate::storage::PageStore;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(&FetchedPage) + Send + Sync>;

/// Bounded, domain-scoped breadth-first traversal.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    max_pages: Option<usize>,
    allowed_domains: Vec<String>,
    workers: usize,
    fetch_timeout: Duration,
    save_dir: Option<PathBuf>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    cancel: CancellationToken,
}

/// Traversal bookkeeping for one `crawl` call.
struct FrontierState {
    visited: HashSet<String>,
    queued: HashSet<String>,
    queue: VecDeque<Url>,
    fetched_count: usize,
    outcome: CrawlOutcome,
}

impl FrontierState {
    fn new(seed: Url) -> Self {
        let mut state = Self {
            visited: HashSet::new(),
            queued: HashSet::new(),
            queue: VecDeque::new(),
            fetched_count: 0,
            outcome: CrawlOutcome::default(),
        };
        state.enqueue(seed);
        state
    }

    fn enqueue(&mut self, url: Url) -> bool {
        let key = url.to_string();
        if self.visited.contains(&key) || !self.queued.insert(key) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Pop the next never-visited URL and mark it visited.
    fn next_url(&mut self) -> Option<Url> {
        while let Some(url) = self.queue.pop_front() {
            let key = url.to_string();
            self.queued.remove(&key);
            if self.visited.insert(key) {
                return Some(url);
            }
        }
        None
    }

    fn has_capacity(&self, in_flight: usize, max_pages: Option<usize>) -> bool {
        max_pages.is_none_or(|max| self.fetched_count + in_flight < max)
    }
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::new()?)))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            max_pages: None,
            allowed_domains: Vec::new(),
            workers: 1,
            fetch_timeout: crate::fetcher::DEFAULT_TIMEOUT,
            save_dir: None,
            progress_callback: None,
            result_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Domain suffixes a discovered link's host must match. Empty means unrestricted.
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains
            .into_iter()
            .map(|d| d.into().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Persist each fetched page under `dir`, which is wiped at the start of the run.
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Validate a seed before any I/O happens.
    pub fn parse_seed(seed: &str) -> Result<Url> {
        let mut url = Url::parse(seed.trim())
            .map_err(|e| ScanError::InvalidSeed(format!("{}: {}", seed, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScanError::InvalidSeed(format!(
                "{}: unsupported scheme '{}'",
                seed,
                url.scheme()
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ScanError::InvalidSeed(format!("{}: missing host", seed)));
        }

        url.set_fragment(None);
        Ok(url)
    }

    pub async fn crawl(&self, seed: &str) -> Result<CrawlOutcome> {
        self.crawl_until(seed, &self.cancel).await
    }

    /// Crawl from `seed`, stopping early when `cancel` fires. Pages fetched so far are kept.
    pub async fn crawl_until(&self, seed: &str, cancel: &CancellationToken) -> Result<CrawlOutcome> {
        let seed = Self::parse_seed(seed)?;
        info!("Starting crawl of {} with {} workers", seed, self.workers);

        let store = match &self.save_dir {
            Some(dir) => Some(PageStore::create(dir).await?),
            None => None,
        };

        let mut state = FrontierState::new(seed);
        let mut in_flight: JoinSet<(Url, FetchOutcome)> = JoinSet::new();

        loop {
            while !cancel.is_cancelled()
                && in_flight.len() < self.workers
                && state.has_capacity(in_flight.len(), self.max_pages)
            {
                let Some(url) = state.next_url() else {
                    break;
                };

                if let Some(ref callback) = self.progress_callback {
                    callback(state.fetched_count + in_flight.len(), url.to_string());
                }

                let fetcher = self.fetcher.clone();
                let timeout = self.fetch_timeout;
                in_flight.spawn(async move {
                    let outcome = match tokio::time::timeout(timeout, fetcher.fetch(&url)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(FetchError::Timeout(timeout)),
                    };
                    (url, outcome)
                });
            }

            if in_flight.is_empty() {
                break;
            }

            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                joined = in_flight.join_next() => joined,
            };

            match joined {
                Some(joined) => {
                    self.settle(&mut state, joined, store.as_ref()).await;
                }
                None => break,
            }
        }

        if cancel.is_cancelled() {
            let mut interrupted = false;
            if !in_flight.is_empty() {
                info!("Crawl cancelled with {} fetches in flight", in_flight.len());
                // Fetches that already finished still come back from join_next
                in_flight.abort_all();
                while let Some(joined) = in_flight.join_next().await {
                    interrupted |= self.settle(&mut state, joined, store.as_ref()).await;
                }
            }
            let unfinished = !state.queue.is_empty() && state.has_capacity(0, self.max_pages);
            if interrupted || unfinished {
                info!("Crawl cancelled after {} pages", state.fetched_count);
                state.outcome.cancelled = true;
            }
        }

        if let Some(max) = self.max_pages
            && state.fetched_count >= max
        {
            info!("Reached maximum page limit of {}", max);
        }

        state.outcome.visited_count = state.visited.len();
        info!(
            "Crawl complete. Fetched {} pages, {} failures",
            state.fetched_count,
            state.outcome.failed.len()
        );
        Ok(state.outcome)
    }

    /// Record one joined fetch task. Returns true when the task was aborted.
    async fn settle(
        &self,
        state: &mut FrontierState,
        joined: std::result::Result<(Url, FetchOutcome), tokio::task::JoinError>,
        store: Option<&PageStore>,
    ) -> bool {
        match joined {
            Ok((url, Ok(body))) => self.accept(state, url, body, store).await,
            Ok((url, Err(e))) => {
                warn!("Crawl error for {}: {}", url, e);
                state.outcome.failed.push(url.to_string());
            }
            Err(e) if e.is_cancelled() => return true,
            Err(e) => warn!("Fetch task failed: {}", e),
        }
        false
    }

    async fn accept(
        &self,
        state: &mut FrontierState,
        url: Url,
        body: FetchedBody,
        store: Option<&PageStore>,
    ) {
        let document = match extractor::extract(&body, Some(&url)) {
            Ok(document) => document,
            Err(ScanError::UnsupportedFormat(content_type)) => {
                warn!("Skipping {}: unsupported content type {}", url, content_type);
                state.outcome.failed.push(url.to_string());
                return;
            }
            Err(e) => {
                warn!("Could not extract {}: {}", url, e);
                ExtractedDocument::default()
            }
        };

        let kind = body.kind();
        let content = match kind {
            ContentKind::Html | ContentKind::PlainText => body.text(),
            _ => document.plain_text(),
        };

        if let Some(store) = store {
            let extension = if kind == ContentKind::Html { "html" } else { "txt" };
            if let Err(e) = store.save(&url, &content, extension).await {
                warn!("Failed to save {}: {}", url, e);
            }
        }

        let mut queued = 0;
        for link in &document.links {
            if !self.is_allowed_domain(link) {
                debug!("  -> {} outside allowed domains, skipping", link);
                continue;
            }
            if state.enqueue(link.clone()) {
                queued += 1;
            }
        }
        debug!("Queued {} new links from {}", queued, url);

        state.fetched_count += 1;
        let page = FetchedPage {
            url: url.clone(),
            status_code: body.status_code,
            content_type: body.content_type,
            response_time: body.response_time,
            content,
            document,
        };

        if let Some(ref callback) = self.result_callback {
            callback(&page);
        }
        state.outcome.pages.insert(url.to_string(), page);
    }

    pub fn is_allowed_domain(&self, url: &Url) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.allowed_domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
    }
}
