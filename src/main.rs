//! Agent-Harvest main entry point
//!
//! This is the command-line interface for the Agent-Harvest directory harvester.

use agent_harvest::config::{load_config_with_hash, Config};
use agent_harvest::harvester::run_harvest;
use agent_harvest::model::JobState;
use agent_harvest::Region;
use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Agent-Harvest: a regional directory harvester
///
/// Agent-Harvest discovers the real-estate agents of a city across every
/// specialty, enriches each one from its profile page, and stores the result
/// in SQLite with a per-region job status.
#[derive(Parser, Debug)]
#[command(name = "agent-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A regional directory harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// City to harvest
    #[arg(long, required_unless_present = "stats")]
    city: Option<String>,

    /// Two-letter state code of the city
    #[arg(long, required_unless_present = "stats")]
    state: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Report the region's job status and exit
    #[arg(long, conflicts_with_all = ["export_only", "stats", "dry_run"])]
    status: bool,

    /// Export the region's stored agents to CSV without harvesting
    #[arg(long, conflicts_with_all = ["status", "stats", "dry_run"])]
    export_only: bool,

    /// Show job statistics from the database and exit
    #[arg(long, conflicts_with_all = ["status", "export_only", "dry_run"])]
    stats: bool,

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with_all = ["status", "export_only", "stats"])]
    dry_run: bool,
}

impl Cli {
    fn region(&self) -> anyhow::Result<Region> {
        match (&self.city, &self.state) {
            (Some(city), Some(state)) if !city.trim().is_empty() && !state.trim().is_empty() => {
                Ok(Region::new(city.as_str(), state.as_str()))
            }
            _ => bail!("--city and --state are required"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let region = cli.region()?;
    if cli.status {
        handle_status(&config, &region)
    } else if cli.export_only {
        handle_export(&config, &region)
    } else if cli.dry_run {
        handle_dry_run(&config, &region)
    } else {
        handle_harvest(&config, &config_hash, &region).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("agent_harvest=info,warn"),
            1 => EnvFilter::new("agent_harvest=debug,info"),
            2 => EnvFilter::new("agent_harvest=trace,debug"),
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

fn export_dir(config: &Config) -> Option<&Path> {
    config.output.export_dir.as_deref().map(Path::new)
}

/// Handles the --dry-run mode: validates config and shows the first fetches
fn handle_dry_run(config: &Config, region: &Region) -> anyhow::Result<()> {
    use agent_harvest::harvester::discovery_urls;
    use url::Url;

    println!("=== Agent-Harvest Dry Run ===\n");

    println!("Harvester Configuration:");
    println!(
        "  Max concurrent tasks: {}",
        config.harvester.max_concurrent_tasks
    );
    println!("  Attempts per fetch: {}", config.retry.attempts);
    println!(
        "  Retry delays: page {}ms, bound {}ms, profile {}ms",
        config.retry.page_delay_ms, config.retry.bound_delay_ms, config.retry.detail_delay_ms
    );

    println!("\nTransport:");
    println!("  Endpoint: {}", config.transport.endpoint);
    println!("  Timeout: {}s", config.transport.timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    match export_dir(config) {
        Some(dir) => println!("  Exports: {}", dir.display()),
        None => println!("  Exports: disabled"),
    }

    let base = Url::parse(&config.source.base_url)?;
    let urls = discovery_urls(&base, region, &config.harvester.categories())?;

    println!("\nDiscovery pages for {} ({} categories):", region, urls.len());
    for url in &urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows job statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use agent_harvest::output::{load_statistics, print_statistics};
    use agent_harvest::storage::SqliteStorage;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --status mode: reports the region's job status
fn handle_status(config: &Config, region: &Region) -> anyhow::Result<()> {
    use agent_harvest::output::check_status;
    use agent_harvest::storage::SqliteStorage;

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let report = check_status(&storage, region);

    println!("{}", report);
    println!("{}", serde_json::to_string(&report)?);

    Ok(())
}

/// Handles the --export-only mode: writes stored agents to CSV
fn handle_export(config: &Config, region: &Region) -> anyhow::Result<()> {
    use agent_harvest::output::export_region;
    use agent_harvest::storage::SqliteStorage;

    let Some(dir) = export_dir(config) else {
        bail!("output.export-dir is not configured");
    };

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let (path, written) = export_region(&storage, region, dir)
        .with_context(|| format!("Failed to export {}", region))?;

    println!("✓ Exported {} agents to: {}", written, path.display());

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, config_hash: &str, region: &Region) -> anyhow::Result<()> {
    use agent_harvest::output::{export_path, write_records_csv};

    tracing::info!(
        "Starting harvest of {} with {} categories",
        region,
        config.harvester.categories().len()
    );

    let report = run_harvest(config, config_hash, region)
        .await
        .with_context(|| format!("Harvest of {} failed", region))?;

    if report.job.state() == JobState::Error {
        bail!("Harvest of {} failed; status recorded as ERROR", region);
    }

    tracing::info!(
        "Harvest of {} completed: {} agents ({} enriched)",
        region,
        report.records.len(),
        report.records.iter().filter(|r| r.has_details()).count()
    );

    if let Some(dir) = export_dir(config) {
        write_records_csv(&report.records, &export_path(dir, region))?;
    }

    Ok(())
}
