//! Sumi-Shelf main entry point
//!
//! This is the command-line interface for the Sumi-Shelf product page crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sumi_shelf::config::{load_config_with_hash, validate, Config};
use sumi_shelf::crawler::{crawl, StopReason};
use tracing_subscriber::EnvFilter;

/// Sumi-Shelf: A polite product page crawler
///
/// Sumi-Shelf crawls e-commerce domains while respecting robots.txt and
/// crawl delays, and writes the product page URLs it finds to one text file
/// per domain.
#[derive(Parser, Debug)]
#[command(name = "sumi-shelf")]
#[command(version)]
#[command(about = "A polite product page crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed domain to crawl; replaces the configured domains (repeatable)
    #[arg(short, long = "domain", value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_shelf=info,warn"),
            1 => EnvFilter::new("sumi_shelf=debug,info"),
            2 => EnvFilter::new("sumi_shelf=trace,debug"),
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

/// Builds the effective configuration from the config file and `--domain` flags
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None if cli.domains.is_empty() => {
            bail!("nothing to crawl: pass a CONFIG file or at least one --domain")
        }
        None => Config::for_domains(cli.domains.iter().cloned()),
    };

    if !cli.domains.is_empty() {
        config.domains = cli.domains.clone();
    }
    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Shelf Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Max products per domain: {}", config.crawler.max_products);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!(
        "  Default crawl delay: {}ms",
        config.crawler.default_crawl_delay_ms
    );
    println!("  Strip query strings: {}", config.crawler.strip_query);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.agent_string());
    for (name, value) in &config.headers {
        println!("  {}: {}", name, value);
    }

    println!("\nProduct Patterns ({}):", config.filters.product_patterns.len());
    for pattern in &config.filters.product_patterns {
        println!("  - {}", pattern);
    }

    println!("\nOutput directory: {}", config.output.directory);

    println!("\nDomains ({}):", config.domains.len());
    for domain in &config.domains {
        println!("  - {}", domain);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("Seed domains: {}", config.domains.join(", "));

    let reports = match crawl(config).await {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    for report in &reports {
        let why = match report.stop_reason {
            StopReason::Quiescent => "no URLs left",
            StopReason::CapReached => "product limit reached",
        };
        tracing::info!(
            "{}: {} product URLs ({})",
            report.domains.join(", "),
            report.products.len(),
            why
        );
    }
    tracing::info!("Crawl completed successfully");
    Ok(())
}
