//! Markaz scraper main entry point
//!
//! This is the command-line interface for the Markaz catalog scraper.

use clap::Parser;
use markaz_scraper::config::load_config_with_hash;
use markaz_scraper::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Markaz Scraper: a retail catalog acquisition crawler
///
/// The scraper walks the shop.markaz.app explore page, discovers the
/// category tree, enumerates product listings in a headless browser,
/// and extracts product records into a JSON catalog snapshot.
#[derive(Parser, Debug)]
#[command(name = "markaz-scraper")]
#[command(version = "1.0.0")]
#[command(about = "A retail catalog acquisition crawler", long_about = None)]
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

    /// Resume an interrupted run (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh run, ignoring any previous checkpoint
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("markaz_scraper=info,warn"),
            1 => EnvFilter::new("markaz_scraper=debug,info"),
            2 => EnvFilter::new("markaz_scraper=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &markaz_scraper::config::Config) -> anyhow::Result<()> {
    use std::path::Path;

    println!("=== Markaz Scraper Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);

    println!("\nCrawler Configuration:");
    println!("  Fetch concurrency: {}", config.crawler.fetch_concurrency);
    if config.crawler.max_products_per_subcategory == 0 {
        println!("  Max products per subcategory: unlimited");
    } else {
        println!(
            "  Max products per subcategory: {}",
            config.crawler.max_products_per_subcategory
        );
    }
    println!(
        "  Freshness window: {} days",
        config.crawler.freshness_window_days
    );
    println!(
        "  Navigation timeout: {}s",
        config.crawler.navigation_timeout_secs
    );
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Settle delay: {}ms", config.crawler.settle_millis);

    println!("\nListing Enumeration:");
    println!("  Max scroll steps: {}", config.listing.scroll_max_steps);
    println!(
        "  Stable steps before stop: {}",
        config.listing.scroll_stable_steps
    );
    println!("  Scroll pause: {}ms", config.listing.scroll_pause_millis);

    let checkpoint =
        markaz_scraper::catalog::checkpoint_path(Path::new(&config.output.catalog_path));
    println!("\nOutput:");
    println!("  Catalog: {}", config.output.catalog_path);
    println!("  Checkpoint: {}", checkpoint.display());

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl the catalog at {}", config.site.base_url);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: markaz_scraper::config::Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh run (ignoring any previous checkpoint)");
    } else {
        tracing::info!("Starting run (will resume if a checkpoint exists)");
    }

    tracing::info!(
        "Base URL: {}, fetch concurrency: {}",
        config.site.base_url,
        config.crawler.fetch_concurrency
    );

    // Run the crawler
    match crawl(config, fresh).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
