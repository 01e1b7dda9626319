//! Tiki-Harvest main entry point
//!
//! This is the command-line interface for the Tiki-Harvest catalog scraper.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tiki_harvest::config::{load_config_with_hash, Config};
use tiki_harvest::crawler::{harvest, RunOptions};
use tiki_harvest::output::{load_statistics, print_statistics, print_summary};
use tiki_harvest::storage::{open_storage, ListingVariant};
use tracing_subscriber::EnvFilter;

/// Tiki-Harvest: a catalog scraper
///
/// Walks the site's category tree, stores every category, and harvests the
/// first pages of each leaf category's product listing into SQLite.
#[derive(Parser, Debug)]
#[command(name = "tiki-harvest")]
#[command(version)]
#[command(about = "Scrape a retail category tree and its product listings", long_about = None)]
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

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Reuse the category tree already in the database
    #[arg(long)]
    skip_tree: bool,

    /// Delete stored products of the harvested variants before starting
    #[arg(long)]
    fresh: bool,

    /// Harvest only one listing variant
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantArg {
    Standard,
    Express,
}

impl From<VariantArg> for ListingVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Standard => ListingVariant::Standard,
            VariantArg::Express => ListingVariant::Express,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let options = RunOptions {
        skip_tree: cli.skip_tree,
        fresh: cli.fresh,
        variants: cli.variant.map(ListingVariant::from).into_iter().collect(),
    };

    if cli.dry_run {
        handle_dry_run(&config, &options);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(&config, &options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tiki_harvest=info,warn"),
            1 => EnvFilter::new("tiki_harvest=debug,info"),
            2 => EnvFilter::new("tiki_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated settings
fn handle_dry_run(config: &Config, options: &RunOptions) {
    println!("=== Tiki-Harvest Dry Run ===\n");

    println!("Site: {}", config.site.base_url);

    println!("\nCrawler Configuration:");
    println!("  Pages per leaf category: {}", config.crawler.pages_per_category);
    println!("  Delay between listing pages: {}ms", config.crawler.request_delay_ms);
    println!("  Max category depth: {}", config.crawler.max_depth);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Express marker: {}", config.crawler.express_marker);

    let variants = if options.variants.is_empty() {
        &config.crawler.variants
    } else {
        &options.variants
    };
    let names: Vec<&str> = variants.iter().map(|v| v.as_str()).collect();
    println!("  Variants: {}", names.join(", "));

    println!("\nSelectors:");
    println!("  Menu link: {}", config.selectors.menu_link);
    println!("  Menu label: {}", config.selectors.menu_label);
    println!("  Child item: {}", config.selectors.child_item);
    println!("  Product item: {}", config.selectors.product_item);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    if options.skip_tree {
        println!("✓ Would reuse the stored category tree");
    } else {
        println!("✓ Would walk the category tree from {}", config.site.base_url);
    }
    if options.fresh {
        println!("✓ Would clear stored products of: {}", names.join(", "));
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("failed to open database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, options: &RunOptions) -> anyhow::Result<()> {
    tracing::info!("Starting harvest of {}", config.site.base_url);

    match harvest(config, options).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
