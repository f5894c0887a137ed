//! Crawler module: the concurrent traversal engine
//!
//! This module contains the core crawling logic, including:
//! - The frontier queue and its visited set
//! - A fixed pool of fetch workers
//! - Quiescence detection
//! - Document reading over HTTP and link extraction
//! - Overall crawl orchestration

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod quiescence;
mod site_map;
mod worker;

pub use coordinator::{run_crawl, CrawlPhase, CrawlSettings, Crawler};
pub use fetcher::{build_http_client, fetch_links, DocumentReader, HttpDocumentReader};
pub use frontier::{Frontier, VisitedSet};
pub use parser::{extract_links, extract_title};
pub use quiescence::{DetectorOutcome, QuiescenceDetector};
pub use site_map::{Link, LinkKind, SiteMap};
