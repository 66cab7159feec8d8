//! sitegrab command-line entry point

use anyhow::Context;
use clap::Parser;
use sitegrab::config::{CrawlConfig, ScrapeOptions, SeedEntry, UrlInput};
use sitegrab::crawler::CrawlEngine;
use sitegrab::resource::{CrawlGraph, ResourceState};
use sitegrab::save::{FsSaver, ResourceSaver};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// sitegrab: recursive web-resource crawler
///
/// Fetches the given pages, extracts their sub-resources (images, styles,
/// scripts, links), optionally follows discovered page links, and writes
/// everything to local files with deterministic names.
#[derive(Parser, Debug)]
#[command(name = "sitegrab")]
#[command(about = "Crawl pages and their sub-resources into local files", long_about = None)]
struct Cli {
    /// Seed URLs to crawl
    #[arg(value_name = "URL", required_unless_present = "options")]
    urls: Vec<String>,

    /// Output directory for fetched resources
    #[arg(short = 'o', long)]
    directory: Option<PathBuf>,

    /// JSON options document; exposes the full options surface,
    /// including explicit "subdirectories": null
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Follow discovered page links as new crawl roots
    #[arg(short, long)]
    recursive: bool,

    /// Depth limit for recursive link following
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Maximum concurrent in-flight requests
    #[arg(short, long, value_name = "N")]
    concurrency: Option<usize>,

    /// Fallback filename for resources without a derivable name
    #[arg(long)]
    default_filename: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let options = build_options(&cli)?;
    let config = CrawlConfig::from_options(options).context("invalid options")?;
    let save_root = config.absolute_directory_path.clone();

    tracing::info!("starting crawl with {} seed(s)", config.urls.len());
    let engine = CrawlEngine::new(config)?;
    let outcome = engine.run().await;

    print_summary(&outcome.graph);
    if outcome.cancelled {
        println!("Crawl cancelled before completion");
    }

    match save_root {
        Some(root) => {
            let report = FsSaver::new(root.clone()).save(&outcome.graph).await?;
            println!(
                "Saved {} resource(s) to {} ({} skipped)",
                report.saved,
                root.display(),
                report.skipped
            );
        }
        None => {
            tracing::info!("no output directory configured, nothing written to disk");
        }
    }

    Ok(())
}

/// Builds options from the JSON document (when given) with CLI flags applied
/// on top.
fn build_options(cli: &Cli) -> anyhow::Result<ScrapeOptions> {
    let mut options = match &cli.options {
        Some(path) => sitegrab::config::load_options(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ScrapeOptions::default(),
    };

    if !cli.urls.is_empty() {
        options.urls = UrlInput::Many(
            cli.urls
                .iter()
                .map(|url| SeedEntry::Bare(url.clone()))
                .collect(),
        );
    }
    if cli.directory.is_some() {
        options.directory = cli.directory.clone();
    }
    if cli.recursive {
        options.recursive = true;
    }
    if cli.max_depth.is_some() {
        options.max_depth = cli.max_depth;
    }
    if cli.concurrency.is_some() {
        options.concurrency = cli.concurrency;
    }
    if cli.default_filename.is_some() {
        options.default_filename = cli.default_filename.clone();
    }

    Ok(options)
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitegrab=info,warn"),
            1 => EnvFilter::new("sitegrab=debug,info"),
            2 => EnvFilter::new("sitegrab=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_summary(graph: &CrawlGraph) {
    println!("Crawl summary:");
    println!("  Resources discovered: {}", graph.len());
    for state in [
        ResourceState::Resolved,
        ResourceState::Fetched,
        ResourceState::Failed,
        ResourceState::Pending,
    ] {
        let count = graph.count_in_state(state);
        if count > 0 {
            println!("  {}: {}", state, count);
        }
    }
}
