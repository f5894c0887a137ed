//! Eligibility predicates deciding which discovered links join the frontier

use crate::url::{classify_host, extract_domain, HostScope};
use crate::{UrlError, UrlResult};
use url::Url;

/// Decides whether a discovered hyperlink should be crawled
///
/// Implementations must be pure: the pool calls this once per discovered
/// hyperlink, from many workers at once.
pub trait Eligibility: Send + Sync {
    fn is_eligible(&self, url: &str) -> bool;
}

impl<F> Eligibility for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_eligible(&self, url: &str) -> bool {
        self(url)
    }
}

/// Parses a candidate link for eligibility checks
///
/// The URL parser silently strips surrounding whitespace, but a link that
/// needed stripping was never resolved against its document, so it is
/// rejected here instead of being guessed at.
fn parse_candidate(url: &str) -> Option<Url> {
    if url.trim() != url {
        return None;
    }

    let parsed = Url::parse(url).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(parsed)
}

/// Accepts HTTP(S) links on the same host as the seed
///
/// Host comparison is case-insensitive; scheme and port may differ.
#[derive(Debug, Clone)]
pub struct SameDomain {
    host: String,
}

impl SameDomain {
    /// Builds the predicate from the crawl's seed URL
    pub fn new(seed: &Url) -> UrlResult<Self> {
        let host = extract_domain(seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self { host })
    }
}

impl Eligibility for SameDomain {
    fn is_eligible(&self, url: &str) -> bool {
        parse_candidate(url)
            .and_then(|parsed| extract_domain(&parsed))
            .is_some_and(|host| host == self.host)
    }
}

/// Same-domain filtering widened by configured allow and deny patterns
///
/// Deny patterns win over everything, including the seed host.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    seed_host: String,
    allow: Vec<String>,
    deny: Vec<String>,
}

impl ScopePolicy {
    /// Builds a policy around the seed's host
    pub fn new(seed: &Url, allow: Vec<String>, deny: Vec<String>) -> UrlResult<Self> {
        let seed_host = extract_domain(seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            seed_host,
            allow,
            deny,
        })
    }

    /// Classifies a URL's host against this policy
    ///
    /// Returns None if the URL cannot be crawled at all (unparseable or not HTTP).
    pub fn classify(&self, url: &str) -> Option<HostScope> {
        let parsed = parse_candidate(url)?;
        let host = extract_domain(&parsed)?;
        Some(classify_host(&host, &self.seed_host, &self.allow, &self.deny))
    }
}

impl Eligibility for ScopePolicy {
    fn is_eligible(&self, url: &str) -> bool {
        self.classify(url)
            .is_some_and(|scope| scope.is_traversable())
    }
}
