//! mediacrawl main entry point
//!
//! Command-line interface for the broadcaster catalog crawler.

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use mediacrawl::adapter::{site_seeds, SiteAdapter};
use mediacrawl::config::{load_config_with_hash, Config, SiteConfig};
use mediacrawl::engine::print_summary;
use mediacrawl::{CrawlEngine, EngineSettings, Fetch, Fetcher, MediaRecord};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// mediacrawl: a rate-limited broadcaster catalog crawler
///
/// Crawls the configured sites one after another, fetching each site's
/// overview and detail pages in parallel, resolves stream qualities and
/// prints the deduplicated list of broadcasts.
#[derive(Parser, Debug)]
#[command(name = "mediacrawl")]
#[command(version = "1.0.0")]
#[command(about = "A rate-limited broadcaster catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only crawl the named site (repeatable)
    #[arg(long = "site", value_name = "NAME")]
    sites: Vec<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Print the collected records as JSON instead of a summary
    #[arg(long, conflicts_with = "dry_run")]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let sites = select_sites(&config, &cli.sites)?;

    if cli.dry_run {
        handle_dry_run(&config, &sites);
    } else {
        handle_crawl(&config, &sites, cli.json)?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mediacrawl=info,warn"),
            1 => EnvFilter::new("mediacrawl=debug,info"),
            2 => EnvFilter::new("mediacrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so --json output stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .with_file(false)
        .init();
}

fn select_sites<'a>(config: &'a Config, names: &[String]) -> anyhow::Result<Vec<&'a SiteConfig>> {
    if names.is_empty() {
        if config.sites.is_empty() {
            bail!("No [[site]] entries configured");
        }
        return Ok(config.sites.iter().collect());
    }

    names
        .iter()
        .map(|name| {
            config
                .site(name)
                .with_context(|| format!("Unknown site '{}'", name))
        })
        .collect()
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, sites: &[&SiteConfig]) {
    let today = Local::now().date_naive();
    let settings = EngineSettings::from_config(config);

    println!("=== mediacrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max subpages: {}", config.crawler.max_subpages);
    println!("  Parallelism: {}", settings.parallelism);
    println!("  Split threshold: {}", settings.split_threshold);
    println!(
        "  Per-upstream interval: {}ms",
        config.crawler.per_upstream_min_interval_ms
    );
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout_ms);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.retry_budget, config.crawler.retry_backoff_ms
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    let mut total = 0;
    println!("\nSites ({}):", sites.len());
    for site in sites {
        let seeds = site_seeds(site, today);
        total += seeds.len();
        println!("  - {} ({} seeds)", site.name, seeds.len());
        for seed in &seeds {
            println!("    * {}", seed.url);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URLs", total);
}

/// Handles the main crawl operation
fn handle_crawl(config: &Config, sites: &[&SiteConfig], json: bool) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let fetcher: Arc<dyn Fetch> = Arc::new(Fetcher::from_config(config)?);
    let engine = CrawlEngine::new(fetcher.clone(), EngineSettings::from_config(config))?;

    let mut records: Vec<MediaRecord> = Vec::new();
    let mut failed_sites = 0;

    for site in sites {
        let adapter = SiteAdapter::from_config(site, &config.crawler, fetcher.clone())?;
        let seeds = site_seeds(site, today);
        tracing::info!(site = %site.name, seeds = seeds.len(), "Crawling site");

        let outcome = engine.crawl(seeds, &adapter);
        if outcome.results.is_empty() && !outcome.failures.is_empty() {
            tracing::error!(site = %site.name, "No records collected");
            failed_sites += 1;
        }

        if !json {
            print_summary(&site.name, &outcome.summary, &outcome.failures);
            println!();
        }
        records.extend(outcome.results);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("Total records: {}", records.len());
    }

    if failed_sites == sites.len() {
        bail!("Every site failed");
    }

    Ok(())
}
