//! URL handling module for Sitemapper
//!
//! This module provides link resolution, domain extraction, pattern
//! matching, host classification and the eligibility predicates that keep a
//! crawl inside its domain.

mod domain;
mod eligibility;
mod resolve;

// Re-export main functions
pub use domain::{extract_domain, matches_pattern};
pub use eligibility::{Eligibility, SameDomain, ScopePolicy};
pub use resolve::resolve_link;

use crate::{UrlError, UrlResult};
use url::Url;

/// Where a host sits relative to the crawl's scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostScope {
    /// Same host as the seed URL
    Seed,
    /// Matched an allow pattern
    Allowed,
    /// Matched a deny pattern - never traversed
    Denied,
    /// Anything else - recorded as a link but never traversed
    External,
}

impl HostScope {
    /// Returns true if links on this host may join the frontier
    pub fn is_traversable(&self) -> bool {
        matches!(self, Self::Seed | Self::Allowed)
    }
}

/// Classifies a host against the seed host and the configured patterns
///
/// Checked in priority order:
/// 1. Deny patterns (highest priority)
/// 2. Seed host
/// 3. Allow patterns
/// 4. External (default)
///
/// # Examples
///
/// ```
/// use sitemapper::url::{classify_host, HostScope};
///
/// let allow = vec!["*.example.com".to_string()];
/// let deny = vec!["admin.example.com".to_string()];
///
/// assert_eq!(classify_host("example.com", "example.com", &allow, &deny), HostScope::Seed);
/// assert_eq!(classify_host("docs.example.com", "example.com", &allow, &deny), HostScope::Allowed);
/// assert_eq!(classify_host("admin.example.com", "example.com", &allow, &deny), HostScope::Denied);
/// assert_eq!(classify_host("example.org", "example.com", &allow, &deny), HostScope::External);
/// ```
pub fn classify_host(host: &str, seed_host: &str, allow: &[String], deny: &[String]) -> HostScope {
    if deny.iter().any(|pattern| matches_pattern(pattern, host)) {
        return HostScope::Denied;
    }

    if host.eq_ignore_ascii_case(seed_host) {
        return HostScope::Seed;
    }

    if allow.iter().any(|pattern| matches_pattern(pattern, host)) {
        return HostScope::Allowed;
    }

    HostScope::External
}

/// Parses and checks a seed URL
///
/// The seed must be an absolute `http` or `https` URL with a host.
pub fn parse_seed(seed: &str) -> UrlResult<Url> {
    let url = Url::parse(seed.trim())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
