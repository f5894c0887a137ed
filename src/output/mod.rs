//! Output module for presenting crawl results
//!
//! This module handles:
//! - Printing the site map in its plain-text listing format
//! - Computing and printing crawl statistics
//! - Generating markdown summaries

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary, CrawlSummary};
pub use stats::{print_statistics, CrawlStatistics};

use crate::crawler::SiteMap;
use std::io::{self, Write};

/// Writes the site map listing, one block per page in URL order
///
/// ```text
/// Links for https://example.com/
///     a: https://example.com/about
///     img: https://example.com/logo.png
/// ```
pub fn write_site_map<W: Write>(out: &mut W, site_map: &SiteMap) -> io::Result<()> {
    for url in site_map.sorted_urls() {
        writeln!(out, "Links for {}", url)?;
        for link in site_map.links(url).unwrap_or_default() {
            writeln!(out, "\t{}: {}", link.kind, link.target)?;
        }
    }
    Ok(())
}

/// Prints the site map listing to stdout
pub fn print_site_map(site_map: &SiteMap) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_site_map(&mut out, site_map)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Link;

    #[test]
    fn test_write_site_map() {
        let mut map = SiteMap::new();
        map.insert("b", vec![Link::hyperlink("a")]);
        map.insert("a", vec![Link::hyperlink("b"), Link::embedded("pic.png")]);
        map.record_failure("c", "boom");

        let mut out = Vec::new();
        write_site_map(&mut out, &map).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Links for a\n\ta: b\n\timg: pic.png\nLinks for b\n\ta: a\n"
        );
    }

    #[test]
    fn test_write_empty_site_map() {
        let mut out = Vec::new();
        write_site_map(&mut out, &SiteMap::new()).unwrap();
        assert!(out.is_empty());
    }
}
