//! Document readers
//!
//! This module defines how a worker turns a URL into the links on that page:
//! - The `DocumentReader` trait the worker pool is generic over
//! - An HTTP implementation built on a shared reqwest client
//! - Error classification into `FetchError`

use crate::config::UserAgentConfig;
use crate::crawler::parser::{extract_links, extract_title};
use crate::crawler::site_map::Link;
use crate::FetchError;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

/// Retrieves a document and returns the links it contains
///
/// Implementations are cloned into every worker, so they should be cheap to
/// clone (an `Arc` or a handle type such as `reqwest::Client`).
pub trait DocumentReader: Send + Sync + Clone + 'static {
    /// Reads `url` and returns its links in document order
    ///
    /// `timeout` is the per-document budget. The worker also enforces it
    /// from the outside, so implementations that ignore it are still bounded.
    fn read(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<Link>, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sitemapper::config::UserAgentConfig;
/// use sitemapper::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Sitemapper".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: Some("https://example.com/about".to_string()),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reads documents over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpDocumentReader {
    client: Client,
}

impl HttpDocumentReader {
    /// Creates a reader with a client built from the user agent configuration
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a reader around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl DocumentReader for HttpDocumentReader {
    async fn read(&self, url: &str, timeout: Duration) -> Result<Vec<Link>, FetchError> {
        fetch_links(&self.client, url, timeout).await
    }
}

/// Fetches a URL and extracts its links
///
/// # Request Flow
///
/// 1. Send GET request (redirects followed up to the client's limit)
/// 2. Non-2xx status → `FetchError::Status`
/// 3. Content-Type present and not HTML → no links
/// 4. Parse the body, resolving against the final URL
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx, HTML or missing Content-Type | `Ok(links)` |
/// | 2xx, other Content-Type | `Ok(vec![])` |
/// | Non-2xx | `Err(Status)` |
/// | Timeout | `Err(Timeout)` |
/// | Connection, TLS, redirect or body error | `Err(Http)` |
pub async fn fetch_links(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<Link>, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    if final_url.as_str() != url {
        tracing::debug!(from = %url, to = %final_url, "Followed redirect");
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty() && !is_html(&content_type) {
        tracing::debug!(%url, %content_type, "Skipping non-HTML document");
        return Ok(Vec::new());
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify_error(url, e))?;

    if tracing::enabled!(tracing::Level::TRACE) {
        if let Some(title) = extract_title(&body) {
            tracing::trace!(%url, %title, "Fetched page");
        }
    }

    Ok(extract_links(&body, &final_url))
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
