//! Sitemapper main entry point
//!
//! This is the command-line interface for the Sitemapper site crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use sitemapper::config::{load_config_with_hash, validate, Config};
use sitemapper::output::{
    generate_markdown_summary, print_site_map, print_statistics, CrawlStatistics, CrawlSummary,
};
use sitemapper::url::parse_seed;
use sitemapper::Crawler;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sitemapper: a concurrent single-domain site mapper
///
/// Sitemapper starts at a URL, follows every hyperlink that stays on the
/// same host, and prints the links found on each page it reached.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "A concurrent single-domain site mapper", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-document read timeout in milliseconds
    #[arg(long, value_name = "MS")]
    read_timeout: Option<u64>,

    /// Overall execution timeout in seconds
    #[arg(long, value_name = "SECS")]
    execution_timeout: Option<u64>,

    /// Write a markdown summary to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let seed = parse_seed(&cli.url).with_context(|| format!("Invalid seed URL '{}'", cli.url))?;
    let summary_path = cli
        .summary
        .clone()
        .or_else(|| config.output.summary_path.as_ref().map(PathBuf::from));

    if cli.dry_run {
        handle_dry_run(&config, &seed, summary_path.as_deref());
        return Ok(());
    }

    handle_crawl(&config, &seed, config_hash, summary_path.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=info,warn"),
            1 => EnvFilter::new("sitemapper=debug,info"),
            2 => EnvFilter::new("sitemapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Results go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(read_timeout) = cli.read_timeout {
        config.crawler.read_timeout_ms = read_timeout;
    }
    if let Some(execution_timeout) = cli.execution_timeout {
        config.crawler.execution_timeout_secs = execution_timeout;
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, seed: &Url, summary_path: Option<&Path>) {
    println!("=== Sitemapper Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Read timeout: {}ms", config.crawler.read_timeout_ms);
    println!(
        "  Execution timeout: {}s",
        config.crawler.execution_timeout_secs
    );
    println!("  Idle threshold: {}ms", config.crawler.idle_threshold_ms);
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nScope:");
    println!("  Allowed ({}):", config.scope.allow.len());
    for pattern in &config.scope.allow {
        println!("    - {}", pattern);
    }
    println!("  Denied ({}):", config.scope.deny.len());
    for pattern in &config.scope.deny {
        println!("    - {}", pattern);
    }

    println!("\nOutput:");
    match summary_path {
        Some(path) => println!("  Summary: {}", path.display()),
        None => println!("  Summary: (none)"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    seed: &Url,
    config_hash: Option<String>,
    summary_path: Option<&Path>,
) -> anyhow::Result<()> {
    let crawler = Crawler::for_site(seed, config)?;

    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping crawl");
            stop.request_stop();
        }
    });

    let started_at = Utc::now();
    let site_map = crawler.crawl(seed.as_str()).await?;
    let finished_at = Utc::now();

    print_site_map(&site_map).context("Failed to write results")?;
    println!();
    print_statistics(&CrawlStatistics::from_site_map(&site_map));

    if let Some(path) = summary_path {
        let mut summary = CrawlSummary::new(
            seed.as_str(),
            started_at,
            finished_at,
            config.crawler.workers,
            &site_map,
        );
        if let Some(hash) = config_hash {
            summary = summary.with_config_hash(hash);
        }

        generate_markdown_summary(&summary, path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }

    Ok(())
}
