//! Page-Insight main entry point
//!
//! This is the command-line interface for the Page-Insight analysis engine.

use anyhow::{bail, Context};
use clap::Parser;
use page_insight::config::{load_config_with_hash, Config};
use page_insight::output::{
    generate_markdown_summary, generate_summary, load_statistics, print_statistics, print_targets,
};
use page_insight::storage::{open_storage, SqliteStorage, Storage, StoreRegistry};
use page_insight::{validate_target, CrawlStatus, Engine};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Page-Insight: structural analysis of web pages
///
/// Page-Insight stores target URLs, fetches them concurrently, and records
/// each page's document version, title, heading counts, link counts and
/// login form presence.
#[derive(Parser, Debug)]
#[command(name = "page-insight")]
#[command(version = "1.0.0")]
#[command(about = "Concurrent web page analysis", long_about = None)]
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

    /// Store one or more target URLs as queued
    #[arg(long, value_name = "URL", num_args = 1..)]
    add: Vec<String>,

    /// Analyze stored targets by ID and wait for the batch to finish
    #[arg(long, value_name = "ID", num_args = 1..)]
    crawl: Vec<i64>,

    /// Analyze every queued target
    #[arg(long)]
    crawl_queued: bool,

    /// Analyze a single URL without storing it
    #[arg(long, value_name = "URL")]
    analyze: Option<String>,

    /// List all stored targets
    #[arg(long)]
    list: bool,

    /// Delete stored targets by ID
    #[arg(long, value_name = "ID", num_args = 1..)]
    delete: Vec<i64>,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long)]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(url) = &cli.analyze {
        return handle_analyze(&config, url).await;
    }

    let db_path = Path::new(&config.output.database_path);

    if !cli.add.is_empty() {
        handle_add(db_path, &cli.add)?;
    }

    if !cli.delete.is_empty() {
        handle_delete(db_path, &cli.delete)?;
    }

    if !cli.crawl.is_empty() || cli.crawl_queued {
        handle_crawl(&config, db_path, cli.crawl.clone(), cli.crawl_queued).await?;
    }

    if cli.list {
        let storage = open_storage(db_path)?;
        print_targets(&storage.list_targets()?);
    }

    if cli.stats {
        handle_stats(db_path)?;
    }

    if cli.export_summary {
        handle_export_summary(&config, &config_hash)?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_insight=info,warn"),
            1 => EnvFilter::new("page_insight=debug,info"),
            2 => EnvFilter::new("page_insight=trace,debug"),
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

/// Handles --analyze: runs one analysis and prints it
async fn handle_analyze(config: &Config, url: &str) -> anyhow::Result<()> {
    let engine = Engine::from_config(config)?;
    let result = engine
        .analyze(url)
        .await
        .with_context(|| format!("Analysis of {} failed", url))?;

    println!("URL: {}", url);
    println!("HTML version: {}", result.document_version);
    println!("Title: {}", result.title);
    println!("Headings: {}", result.headings.summary());
    println!("Internal links: {}", result.internal_link_count);
    println!("External links: {}", result.external_link_count);
    println!("Broken links: {}", result.broken_link_count);
    println!(
        "Login form: {}",
        if result.has_login_form { "yes" } else { "no" }
    );

    Ok(())
}

/// Handles --add: validates and stores targets as queued
fn handle_add(db_path: &Path, urls: &[String]) -> anyhow::Result<()> {
    // Validate everything before storing anything
    let mut targets = Vec::with_capacity(urls.len());
    for url in urls {
        let parsed = validate_target(url).with_context(|| format!("Invalid target '{}'", url))?;
        targets.push(parsed);
    }

    let mut storage = open_storage(db_path)?;
    for target in targets {
        let id = storage.insert_target(target.as_str())?;
        println!("Added [{}] {}", id, target);
    }

    Ok(())
}

/// Handles --delete: removes targets by ID
fn handle_delete(db_path: &Path, ids: &[i64]) -> anyhow::Result<()> {
    let mut storage = open_storage(db_path)?;
    let removed = storage.delete_targets(ids)?;
    println!("Deleted {} of {} target(s)", removed, ids.len());
    Ok(())
}

/// Drops repeated IDs, keeping the first occurrence of each
///
/// A target must be dispatched at most once per batch.
fn dedup_ids(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Handles --crawl / --crawl-queued: runs a batch and waits for it
async fn handle_crawl(
    config: &Config,
    db_path: &Path,
    mut ids: Vec<i64>,
    include_queued: bool,
) -> anyhow::Result<()> {
    let storage = open_storage(db_path)?;
    if include_queued {
        ids.extend(storage.list_ids_by_status(CrawlStatus::Queued)?);
    }
    let ids = dedup_ids(ids);

    if ids.is_empty() {
        bail!("No targets to analyze");
    }

    let engine = Engine::from_config(config)?;
    let registry: Arc<StoreRegistry<SqliteStorage>> = Arc::new(StoreRegistry::new(storage));

    let dispatch = engine.run_batch(ids, Arc::clone(&registry))?;

    if !dispatch.unresolvable.is_empty() {
        let listed: Vec<String> = dispatch.unresolvable.iter().map(i64::to_string).collect();
        println!("Unresolvable IDs: {}", listed.join(", "));
    }
    println!("Dispatched {} target(s)", dispatch.dispatched);

    let mut handle = dispatch.handle;
    let interrupted = tokio::select! {
        _ = handle.wait() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracing::warn!("Interrupted, cancelling batch");
        handle.cancel();
    }
    let report = handle.wait().await;

    println!(
        "Batch finished: {} done, {} fetch errors, {} parse errors, {} cancelled",
        report.done, report.fetch_errors, report.parse_errors, report.cancelled
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(db_path: &Path) -> anyhow::Result<()> {
    println!("Database: {}\n", db_path.display());

    let storage = open_storage(db_path)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    println!("=== Exporting Analysis Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = open_storage(Path::new(&config.output.database_path))?;

    tracing::info!("Loading target data from database...");
    let summary = generate_summary(&storage, config_hash)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}
