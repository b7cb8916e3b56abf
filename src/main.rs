//! Flockmap main entry point
//!
//! This is the command-line interface for the flockmap follower-graph crawler.

use clap::Parser;
use flockmap::api::HttpApi;
use flockmap::config::load_config_with_hash;
use flockmap::crawler::{load_graph, run_crawl};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Flockmap: an incremental follower-graph crawler
///
/// Flockmap maps the follower graph around a set of seed accounts while
/// staying inside the remote service's rate limits. Progress is snapshotted
/// continuously so an interrupted crawl picks up where it left off.
#[derive(Parser, Debug)]
#[command(name = "flockmap")]
#[command(version = "0.3.0")]
#[command(about = "An incremental follower-graph crawler", long_about = None)]
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

    /// Resume from the existing snapshot (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, ignoring any previous snapshot
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the snapshot and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config).await?;
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
            0 => EnvFilter::new("flockmap=info,warn"),
            1 => EnvFilter::new("flockmap=debug,info"),
            2 => EnvFilter::new("flockmap=trace,debug"),
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
fn handle_dry_run(config: &flockmap::Config) {
    println!("=== Flockmap Dry Run ===\n");

    println!("Remote API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Request timeout: {}s", config.api.timeout_secs);

    println!("\nCrawl:");
    println!("  Expansion budget: {}", config.crawl.max_expansions);
    println!("  Lookup batch size: {}", config.crawl.batch_size);
    println!("  Follower page size: {}", config.crawl.page_size);
    println!(
        "  Strategy mix: {:.0}% popular, {:.0}% deep walk, {:.0}% breadth-first",
        config.crawl.popular_weight * 100.0,
        config.crawl.deep_walk_weight * 100.0,
        (1.0 - config.crawl.popular_weight - config.crawl.deep_walk_weight) * 100.0
    );

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.state_path);
    println!(
        "  Snapshot interval: {}s",
        config.output.snapshot_interval_secs
    );

    println!("\nSeeds ({}):", config.crawl.seeds.len());
    for seed in &config.crawl.seeds {
        println!("  - @{}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl up to {} accounts from {} seeds",
        config.crawl.max_expansions,
        config.crawl.seeds.len()
    );
}

/// Handles the --stats mode: shows statistics from the snapshot
async fn handle_stats(config: &flockmap::Config) -> Result<(), Box<dyn std::error::Error>> {
    use flockmap::output::{load_statistics, print_statistics};

    println!("Snapshot: {}\n", config.output.state_path);

    let graph = load_graph(config, false).await?;
    let stats = load_statistics(&graph);
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: flockmap::Config,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous snapshot)");
    } else {
        tracing::info!("Starting crawl (will resume from snapshot if one exists)");
    }

    tracing::info!(
        "Seeds: {}, expansion budget: {}",
        config.crawl.seeds.len(),
        config.crawl.max_expansions
    );

    let graph = load_graph(&config, fresh).await?;
    let api = Arc::new(HttpApi::new(&config.api)?);

    match run_crawl(config, api, graph).await {
        Ok(outcome) => {
            tracing::info!("Crawl completed: {}", outcome);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
