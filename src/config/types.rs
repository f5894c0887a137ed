use crate::crawler::CrawlSettings;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sitemapper
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-document read timeout (milliseconds)
    #[serde(rename = "read-timeout-ms", default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Total execution timeout for the whole crawl (seconds)
    #[serde(
        rename = "execution-timeout-secs",
        default = "default_execution_timeout_secs"
    )]
    pub execution_timeout_secs: u64,

    /// How long every worker must stay idle before the crawl is considered done (milliseconds)
    #[serde(rename = "idle-threshold-ms", default = "default_idle_threshold_ms")]
    pub idle_threshold_ms: u64,

    /// How often worker idleness is polled (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_workers() -> usize {
    10
}

fn default_read_timeout_ms() -> u64 {
    500
}

fn default_execution_timeout_secs() -> u64 {
    120
}

fn default_idle_threshold_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    10
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            read_timeout_ms: default_read_timeout_ms(),
            execution_timeout_secs: default_execution_timeout_secs(),
            idle_threshold_ms: default_idle_threshold_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl CrawlerConfig {
    /// Converts the file-level settings into engine settings
    pub fn settings(&self) -> CrawlSettings {
        CrawlSettings {
            workers: self.workers,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            execution_timeout: Some(Duration::from_secs(self.execution_timeout_secs)),
            idle_threshold: Duration::from_millis(self.idle_threshold_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

fn default_crawler_name() -> String {
    "sitemapper".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown summary file, if one should be written
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Extra hosts to include in or exclude from the crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeConfig {
    /// Domain patterns (e.g., "docs.example.com" or "*.example.com") crawled alongside the seed host
    #[serde(default)]
    pub allow: Vec<String>,

    /// Domain patterns never crawled, even when they match the seed host
    #[serde(default)]
    pub deny: Vec<String>,
}
