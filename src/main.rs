//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest site crawler.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_harvest::config::{apply_env, load_config, validate, CrawlConfig};
use sumi_harvest::crawler::{crawl, resume, CrawlResult};
use sumi_harvest::output::print_statistics;
use sumi_harvest::storage::{FsStorage, Storage};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: A polite, resumable site crawler
///
/// Sumi-Harvest crawls a single website breadth-first while respecting
/// robots.txt and politeness delays. Every page is saved as raw HTML, clean
/// text and a JSON record with metadata, page type, structured data and links.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable site crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED_URL")]
    seed_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to fetch successfully
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum link depth from the seed
    #[arg(long)]
    max_depth: Option<u32>,

    /// Minimum delay between requests in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Only crawl URLs matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    include: Vec<String>,

    /// Never crawl URLs matching this glob (repeatable, adds to the defaults)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Do not fetch or obey robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Treat redirects as failures instead of following them
    #[arg(long)]
    no_follow_redirects: bool,

    /// Root directory for crawl output
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// User agent to send and to match against robots.txt
    #[arg(long)]
    user_agent: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Fetch pages through a JavaScript rendering proxy
    #[arg(long)]
    render_proxy: bool,

    /// Rendering proxy endpoint
    #[arg(long, value_name = "URL")]
    render_proxy_url: Option<String>,

    /// Pages processed between checkpoints
    #[arg(long, value_name = "N")]
    checkpoint_interval: Option<u32>,

    /// Resume an interrupted crawl from its checkpoint or crawl directory
    #[arg(long, value_name = "PATH", conflicts_with_all = ["stats", "dry_run"])]
    resume: Option<PathBuf>,

    /// Show statistics of a crawl directory and exit
    #[arg(long, value_name = "CRAWL_DIR", conflicts_with_all = ["resume", "dry_run"])]
    stats: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["resume", "stats"])]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(crawl_dir) = &cli.stats {
        return handle_stats(crawl_dir);
    }

    if let Some(state_path) = &cli.resume {
        let fallback = match &cli.config {
            Some(_) => Some(resolve_config(&cli, false)?),
            None => None,
        };
        return report(resume(state_path, fallback).await);
    }

    let config = resolve_config(&cli, true)?;
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    tracing::info!("Starting crawl of {}", config.seed_url);
    report(crawl(config).await)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the crawl configuration from the config file and flags
///
/// Flags override file values; `--exclude` extends the exclude list. A
/// resumed crawl takes its seed from the manifest, so `require_seed` is
/// false there.
fn resolve_config(cli: &Cli, require_seed: bool) -> Result<CrawlConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => CrawlConfig::default(),
    };

    if let Some(seed) = &cli.seed_url {
        config.seed_url = seed.clone();
    }
    if require_seed && config.seed_url.trim().is_empty() {
        bail!("no seed URL given (pass SEED_URL or set seed-url in the config file)");
    }

    if let Some(max_pages) = cli.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if !cli.include.is_empty() {
        config.include_patterns = cli.include.clone();
    }
    config.exclude_patterns.extend(cli.exclude.iter().cloned());
    if cli.ignore_robots {
        config.respect_robots = false;
    }
    if cli.no_follow_redirects {
        config.follow_redirects = false;
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(user_agent) = &cli.user_agent {
        config.user_agent = user_agent.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_ms = timeout;
    }
    if cli.render_proxy {
        config.use_render_proxy = true;
    }
    if let Some(url) = &cli.render_proxy_url {
        config.render_proxy_url = Some(url.clone());
    }
    if let Some(interval) = cli.checkpoint_interval {
        config.checkpoint_interval = interval;
    }

    apply_env(&mut config);
    Ok(config)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &CrawlConfig) {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Seed URL: {}", config.seed_url);

    println!("\nLimits:");
    println!("  Max pages: {}", config.max_pages);
    println!("  Max depth: {}", config.max_depth);
    println!("  Delay: {}ms", config.delay_ms);
    println!("  Timeout: {}ms", config.timeout_ms);
    println!("  Checkpoint every: {} pages", config.checkpoint_interval);

    println!("\nPoliteness:");
    println!("  User agent: {}", config.user_agent);
    println!("  Respect robots.txt: {}", config.respect_robots);
    println!("  Follow redirects: {}", config.follow_redirects);

    println!("\nInclude Patterns ({}):", config.include_patterns.len());
    for pattern in &config.include_patterns {
        println!("  - {}", pattern);
    }

    println!("\nExclude Patterns ({}):", config.exclude_patterns.len());
    for pattern in &config.exclude_patterns {
        println!("  - {}", pattern);
    }

    println!("\nFetching:");
    if config.use_render_proxy {
        println!(
            "  Render proxy: {}",
            config.render_proxy_url.as_deref().unwrap_or_default()
        );
    } else {
        println!("  Direct HTTP");
    }

    println!("\nOutput: {}", config.output_dir.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from a crawl manifest
fn handle_stats(crawl_dir: &Path) -> Result<()> {
    let storage = FsStorage::new(crawl_dir);
    let manifest = storage
        .load_manifest()
        .with_context(|| format!("failed to read manifest in {}", crawl_dir.display()))?;

    match manifest {
        Some(manifest) => {
            println!("Crawl directory: {}\n", crawl_dir.display());
            print_statistics(&manifest);
            Ok(())
        }
        None => bail!("no manifest found in {}", crawl_dir.display()),
    }
}

/// Prints the crawl outcome; a failed crawl becomes a non-zero exit
fn report(result: CrawlResult) -> Result<()> {
    if let Some(dir) = &result.crawl_dir {
        println!("Crawl directory: {}", dir.display());
    }
    println!(
        "Pages: {} succeeded, {} failed, {} left in frontier",
        result.pages_succeeded, result.pages_failed, result.frontier_remaining
    );

    if result.success {
        tracing::info!("Crawl completed successfully");
        Ok(())
    } else {
        let error = result.error.unwrap_or_else(|| "unknown error".to_string());
        tracing::error!("Crawl failed: {}", error);
        bail!("crawl failed: {}", error)
    }
}
