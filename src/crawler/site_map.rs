//! Crawl results: the links found on every fetched page

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Mutex;

/// How a link was referenced by its page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    /// `<a href>` - followed when eligible
    Hyperlink,
    /// `<img src>` - recorded, never followed
    EmbeddedResource,
}

impl LinkKind {
    /// Returns true if links of this kind may join the frontier
    pub fn is_traversable(&self) -> bool {
        matches!(self, Self::Hyperlink)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hyperlink => write!(f, "a"),
            Self::EmbeddedResource => write!(f, "img"),
        }
    }
}

/// A single outbound reference found on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub kind: LinkKind,
    pub target: String,
}

impl Link {
    pub fn new(kind: LinkKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }

    pub fn hyperlink(target: impl Into<String>) -> Self {
        Self::new(LinkKind::Hyperlink, target)
    }

    pub fn embedded(target: impl Into<String>) -> Self {
        Self::new(LinkKind::EmbeddedResource, target)
    }
}

/// Mapping of every successfully fetched URL to the links found on it
///
/// Failed fetches are kept apart from the page map so the key set is exactly
/// the set of pages that were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteMap {
    pages: HashMap<String, Vec<Link>>,
    failures: BTreeMap<String, String>,
}

impl SiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetched pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    /// Links found on a page, in document order
    pub fn links(&self, url: &str) -> Option<&[Link]> {
        self.pages.get(url).map(Vec::as_slice)
    }

    pub fn pages(&self) -> &HashMap<String, Vec<Link>> {
        &self.pages
    }

    /// URLs whose fetch failed, with the failure message
    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }

    /// Page URLs in lexical order
    pub fn sorted_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    /// Records a page's links; returns false if the page was already present
    pub fn insert(&mut self, url: impl Into<String>, links: Vec<Link>) -> bool {
        let url = url.into();
        if self.pages.contains_key(&url) {
            return false;
        }
        self.pages.insert(url, links);
        true
    }

    /// Records a failed fetch
    pub fn record_failure(&mut self, url: impl Into<String>, message: impl Into<String>) {
        self.failures.insert(url.into(), message.into());
    }
}

/// Shared accumulator workers write their results into
#[derive(Debug, Default)]
pub(crate) struct ResultSink {
    inner: Mutex<SiteMap>,
}

impl ResultSink {
    pub(crate) fn insert(&self, url: &str, links: Vec<Link>) -> bool {
        self.inner.lock().unwrap().insert(url, links)
    }

    pub(crate) fn record_failure(&self, url: &str, message: String) {
        self.inner.lock().unwrap().record_failure(url, message);
    }

    pub(crate) fn page_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Moves the accumulated results out, leaving the sink empty
    pub(crate) fn take(&self) -> SiteMap {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_kind_traversable() {
        assert!(LinkKind::Hyperlink.is_traversable());
        assert!(!LinkKind::EmbeddedResource.is_traversable());
    }

    #[test]
    fn test_insert_once() {
        let mut map = SiteMap::new();
        assert!(map.insert("start", vec![Link::hyperlink("A")]));
        assert!(!map.insert("start", vec![]));
        assert_eq!(map.links("start"), Some(&[Link::hyperlink("A")][..]));
    }

    #[test]
    fn test_failures_are_not_pages() {
        let mut map = SiteMap::new();
        map.record_failure("broken", "HTTP 404 for broken");
        assert!(map.is_empty());
        assert!(!map.contains("broken"));
        assert_eq!(map.failures().len(), 1);
    }

    #[test]
    fn test_sorted_urls() {
        let mut map = SiteMap::new();
        map.insert("b", vec![]);
        map.insert("a", vec![]);
        map.insert("c", vec![]);
        assert_eq!(map.sorted_urls(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sink_take_empties() {
        let sink = ResultSink::default();
        sink.insert("start", vec![Link::embedded("logo.png")]);
        sink.record_failure("x", "boom".to_string());
        assert_eq!(sink.page_count(), 1);

        let map = sink.take();
        assert_eq!(map.len(), 1);
        assert_eq!(map.failures().len(), 1);
        assert_eq!(sink.page_count(), 0);
    }
}
