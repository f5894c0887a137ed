//! Statistics derived from a finished crawl
//!
//! This module provides functionality for summarizing a site map and
//! displaying the result.

use crate::crawler::{LinkKind, SiteMap};
use crate::url::extract_domain;
use std::collections::HashSet;
use url::Url;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of pages successfully read
    pub pages: u64,

    /// Number of URLs whose read failed
    pub failures: u64,

    /// Total hyperlinks found, duplicates included
    pub hyperlinks: u64,

    /// Total embedded resources found, duplicates included
    pub embedded_resources: u64,

    /// Number of distinct link targets
    pub distinct_targets: u64,

    /// Number of distinct hosts referenced by any link
    pub linked_domains: u64,

    /// Pages that contained no links at all
    pub dead_ends: u64,
}

impl CrawlStatistics {
    /// Computes statistics for a site map
    pub fn from_site_map(site_map: &SiteMap) -> Self {
        let mut stats = Self {
            pages: site_map.len() as u64,
            failures: site_map.failures().len() as u64,
            ..Self::default()
        };

        let mut targets = HashSet::new();
        let mut domains = HashSet::new();

        for links in site_map.pages().values() {
            if links.is_empty() {
                stats.dead_ends += 1;
            }

            for link in links {
                match link.kind {
                    LinkKind::Hyperlink => stats.hyperlinks += 1,
                    LinkKind::EmbeddedResource => stats.embedded_resources += 1,
                }

                if targets.insert(link.target.as_str()) {
                    if let Some(domain) = Url::parse(&link.target)
                        .ok()
                        .and_then(|url| extract_domain(&url))
                    {
                        domains.insert(domain);
                    }
                }
            }
        }

        stats.distinct_targets = targets.len() as u64;
        stats.linked_domains = domains.len() as u64;
        stats
    }

    /// Total links found, duplicates included
    pub fn total_links(&self) -> u64 {
        self.hyperlinks + self.embedded_resources
    }

    /// Percentage of attempted URLs that were read successfully
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages + self.failures;
        if attempted == 0 {
            0.0
        } else {
            (self.pages as f64 / attempted as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages read: {}", stats.pages);
    println!("  Failed reads: {}", stats.failures);
    println!("  Pages without links: {}", stats.dead_ends);
    println!();

    println!("Links:");
    println!("  Hyperlinks: {}", stats.hyperlinks);
    println!("  Embedded resources: {}", stats.embedded_resources);
    println!("  Distinct targets: {}", stats.distinct_targets);
    println!("  Linked domains: {}", stats.linked_domains);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages read)",
        stats.success_rate(),
        stats.pages,
        stats.pages + stats.failures
    );
}
