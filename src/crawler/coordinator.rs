//! Crawl orchestration
//!
//! This module ties the engine together for a single crawl invocation:
//! - Seeding the frontier with the starting URL
//! - Starting the worker pool and the quiescence detector
//! - Racing completion against stop requests and the execution timeout
//! - Tearing everything down and handing back the site map

use crate::config::{validate, Config};
use crate::crawler::fetcher::{DocumentReader, HttpDocumentReader};
use crate::crawler::frontier::Frontier;
use crate::crawler::quiescence::{DetectorOutcome, QuiescenceDetector};
use crate::crawler::site_map::{ResultSink, SiteMap};
use crate::crawler::worker::{WorkerContext, WorkerPool};
use crate::state::{StopHandle, StopReason};
use crate::url::{parse_seed, Eligibility, ScopePolicy};
use crate::{ConfigError, CrawlError};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Engine settings for one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Number of concurrent fetch workers (and the frontier buffer size)
    pub workers: usize,
    /// Per-document read timeout
    pub read_timeout: Duration,
    /// Upper bound on the whole crawl; None runs until quiescence or stop
    pub execution_timeout: Option<Duration>,
    /// How long every worker must stay idle before the crawl is complete
    pub idle_threshold: Duration,
    /// How often the quiescence detector polls
    pub poll_interval: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            read_timeout: Duration::from_millis(500),
            execution_timeout: Some(Duration::from_secs(120)),
            idle_threshold: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl CrawlSettings {
    /// Checks the settings the engine cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Validation(
                "worker count must be at least 1".to_string(),
            ));
        }

        if self.read_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "read timeout must be greater than zero".to_string(),
            ));
        }

        if self.poll_interval.is_zero() || self.idle_threshold <= self.poll_interval {
            return Err(ConfigError::Validation(format!(
                "idle threshold ({:?}) must be greater than poll interval ({:?})",
                self.idle_threshold, self.poll_interval
            )));
        }

        Ok(())
    }
}

/// Lifecycle of a crawl invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeding,
    Running,
    Completed,
    Cancelled,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeding => write!(f, "seeding"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A configured, single-use crawl
///
/// Build one with [`Crawler::new`], keep a [`StopHandle`] if the crawl may
/// need to be stopped from elsewhere, then call [`Crawler::crawl`].
pub struct Crawler<R> {
    settings: CrawlSettings,
    reader: R,
    eligibility: Arc<dyn Eligibility>,
    stop: StopHandle,
}

impl<R: DocumentReader> Crawler<R> {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `settings` - Worker count, timeouts and detector tuning
    /// * `reader` - Turns a URL into the links on that page
    /// * `eligibility` - Decides which discovered hyperlinks are followed
    pub fn new(settings: CrawlSettings, reader: R, eligibility: impl Eligibility + 'static) -> Self {
        Self {
            settings,
            reader,
            eligibility: Arc::new(eligibility),
            stop: StopHandle::new(),
        }
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Returns a handle that stops this crawl when triggered
    ///
    /// Handles may be cloned freely and triggered from any task or thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Crawls everything reachable from `seed`
    ///
    /// The seed is fetched regardless of the eligibility predicate. Returns
    /// the site map once no work remains, or `CrawlError::Terminated` if a
    /// stop request or the execution timeout fires first. Partial results
    /// are discarded on termination.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sitemapper::{CrawlSettings, Crawler, HttpDocumentReader, SameDomain};
    /// use sitemapper::config::UserAgentConfig;
    /// use url::Url;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let seed = Url::parse("https://example.com/")?;
    /// let reader = HttpDocumentReader::new(&UserAgentConfig::default())?;
    /// let crawler = Crawler::new(CrawlSettings::default(), reader, SameDomain::new(&seed)?);
    /// let site_map = crawler.crawl(seed.as_str()).await?;
    /// println!("{} pages", site_map.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(self, seed: &str) -> Result<SiteMap, CrawlError> {
        self.settings.validate()?;
        if seed.trim().is_empty() {
            return Err(ConfigError::Validation("seed URL cannot be empty".to_string()).into());
        }
        if let Some(reason) = self.stop.reason() {
            return Err(CrawlError::Terminated { reason });
        }

        let started = Instant::now();
        tracing::info!(
            phase = %CrawlPhase::Seeding,
            %seed,
            workers = self.settings.workers,
            "Starting crawl"
        );

        let frontier = Arc::new(Frontier::new(self.settings.workers));
        let sink = Arc::new(ResultSink::default());
        frontier.admit(seed);

        let pool = WorkerPool::spawn(
            self.settings.workers,
            WorkerContext {
                frontier: Arc::clone(&frontier),
                reader: self.reader.clone(),
                eligibility: Arc::clone(&self.eligibility),
                sink: Arc::clone(&sink),
                read_timeout: self.settings.read_timeout,
            },
        );

        let detector = QuiescenceDetector::new(
            pool.states(),
            Arc::clone(&frontier),
            self.settings.idle_threshold,
            self.settings.poll_interval,
        );
        let detector_cancel = CancellationToken::new();
        let _detector_guard = detector_cancel.clone().drop_guard();
        let mut detector_task = tokio::spawn(detector.run(detector_cancel.clone()));

        tracing::debug!(phase = %CrawlPhase::Running, "Seed admitted, workers running");

        let execution_timeout = self.settings.execution_timeout;
        let deadline = async move {
            match execution_timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        let phase = tokio::select! {
            outcome = &mut detector_task => match outcome? {
                DetectorOutcome::Quiescent => CrawlPhase::Completed,
                DetectorOutcome::Cancelled => CrawlPhase::Cancelled,
            },
            _ = self.stop.stopped() => CrawlPhase::Cancelled,
            _ = deadline => {
                self.stop.time_out();
                CrawlPhase::Cancelled
            }
        };

        frontier.close();

        if phase == CrawlPhase::Cancelled {
            detector_cancel.cancel();
            pool.abort();
            let reason = self.stop.reason().unwrap_or(StopReason::Requested);
            tracing::warn!(
                phase = %phase,
                %reason,
                pages = sink.page_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Crawl terminated"
            );
            return Err(CrawlError::Terminated { reason });
        }

        self.stop.complete();
        pool.join().await;

        let site_map = sink.take();
        tracing::info!(
            phase = %phase,
            pages = site_map.len(),
            failures = site_map.failures().len(),
            visited = frontier.visited_count(),
            deferred = frontier.deferred_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Crawl complete"
        );

        Ok(site_map)
    }
}

impl Crawler<HttpDocumentReader> {
    /// Builds an HTTP crawler for the site rooted at `seed`
    ///
    /// Hyperlinks are followed when their host is the seed host or matches
    /// the config's allow list, and not its deny list.
    pub fn for_site(seed: &Url, config: &Config) -> Result<Self, CrawlError> {
        validate(config)?;
        let reader = HttpDocumentReader::new(&config.user_agent)?;
        let policy = ScopePolicy::new(seed, config.scope.allow.clone(), config.scope.deny.clone())?;
        Ok(Self::new(config.crawler.settings(), reader, policy))
    }
}

/// Runs a complete HTTP crawl from a seed URL
///
/// # Arguments
///
/// * `seed` - Absolute http(s) URL to start from
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(SiteMap)` - Crawl completed
/// * `Err(CrawlError)` - Invalid seed or config, or the crawl was terminated
///
/// # Example
///
/// ```no_run
/// use sitemapper::config::load_config;
/// use sitemapper::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sitemapper.toml"))?;
/// let site_map = run_crawl("https://example.com/", &config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(seed: &str, config: &Config) -> Result<SiteMap, CrawlError> {
    let seed = parse_seed(seed)?;
    Crawler::for_site(&seed, config)?.crawl(seed.as_str()).await
}
