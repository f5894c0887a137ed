//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, failed reads, and the pages that were mapped.

use crate::crawler::SiteMap;
use crate::output::stats::CrawlStatistics;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const MAX_LISTED_PAGES: usize = 100;

/// Everything a written summary reports about one crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub seed: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: usize,
    pub config_hash: Option<String>,
    pub statistics: CrawlStatistics,
    /// Page URLs in lexical order, with their link counts
    pub pages: Vec<(String, usize)>,
    /// Failed URLs in lexical order, with the failure message
    pub failures: Vec<(String, String)>,
}

impl CrawlSummary {
    /// Builds a summary from a finished site map
    pub fn new(
        seed: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        workers: usize,
        site_map: &SiteMap,
    ) -> Self {
        let pages = site_map
            .sorted_urls()
            .into_iter()
            .map(|url| {
                let count = site_map.links(url).map_or(0, <[_]>::len);
                (url.to_string(), count)
            })
            .collect();

        let failures = site_map
            .failures()
            .iter()
            .map(|(url, message)| (url.clone(), message.clone()))
            .collect();

        Self {
            seed: seed.into(),
            started_at,
            finished_at,
            workers,
            config_hash: None,
            statistics: CrawlStatistics::from_site_map(site_map),
            pages,
            failures,
        }
    }

    /// Attaches the hash of the configuration file the crawl ran with
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Generates a markdown summary and writes it to a file
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(std::io::Error)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let stats = &summary.statistics;
    let mut md = String::new();

    md.push_str("# Sitemapper Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration_seconds()
    ));
    md.push_str(&format!("- **Workers**: {}\n", summary.workers));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Read**: {}\n", stats.pages));
    md.push_str(&format!("- **Failed Reads**: {}\n", stats.failures));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n", stats.success_rate()));
    md.push_str(&format!("- **Pages Without Links**: {}\n\n", stats.dead_ends));

    md.push_str("## Link Breakdown\n\n");
    md.push_str("| Kind | Count |\n");
    md.push_str("|------|-------|\n");
    md.push_str(&format!("| Hyperlinks | {} |\n", stats.hyperlinks));
    md.push_str(&format!(
        "| Embedded Resources | {} |\n",
        stats.embedded_resources
    ));
    md.push_str(&format!(
        "| Distinct Targets | {} |\n",
        stats.distinct_targets
    ));
    md.push_str(&format!("| Linked Domains | {} |\n\n", stats.linked_domains));

    if !summary.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Links |\n");
        md.push_str("|-----|-------|\n");

        for (url, count) in summary.pages.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!("| {} | {} |\n", url, count));
        }
        if summary.pages.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.pages.len() - MAX_LISTED_PAGES
            ));
        }
        md.push('\n');
    }

    if !summary.failures.is_empty() {
        md.push_str("## Failed Reads\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");

        for (url, message) in &summary.failures {
            md.push_str(&format!("| {} | {} |\n", url, message.replace('|', "\\|")));
        }
        md.push('\n');
    }

    md
}
