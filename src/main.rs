//! Shiori CLI - web novel crawler.

use anyhow::{Context, Result};
use clap::Parser;
use shiori::config::Config;
use shiori::console::Console;
use shiori::crawler::{CrawlOutcome, Crawler, RandomPacer};
use shiori::scrapers::{HttpFetcher, ProfileScraper};
use shiori::writer::TextFileWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Downloads a web novel into a single text file.
///
/// Anything not given on the command line is asked for interactively.
#[derive(Parser, Debug)]
#[command(name = "shiori")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Title of the novel to search for.
    title: Option<String>,

    /// Site to search (see --list-sites).
    #[arg(long)]
    site: Option<String>,

    /// Path to the config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to write the novel into.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// List supported sites and exit.
    #[arg(long)]
    list_sites: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    let console = Console::new();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let registry = config.registry();

    if args.list_sites {
        console.site_list(registry.ids());
        return Ok(());
    }

    console.heading("Shiori - Web Novel Crawler");

    let title = match args.title {
        Some(title) => title,
        None => console
            .prompt("Novel title:")
            .context("Failed to read novel title")?,
    };
    if title.is_empty() {
        console.fail("No novel title given");
        return Ok(());
    }

    let site_id = match args.site {
        Some(site) => site,
        None => {
            console.site_list(registry.ids());
            console
                .prompt("Site (e.g. hongxiu):")
                .context("Failed to read site")?
        }
    };

    let profile = match registry.get(&site_id) {
        Ok(profile) => profile.clone(),
        Err(e) => {
            console.fail(e);
            return Ok(());
        }
    };

    let fetcher =
        Arc::new(HttpFetcher::new(&config.scraping).context("Failed to create HTTP client")?);
    let scraper = ProfileScraper::new(profile, fetcher);

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.paths.output_directory.clone());
    let writer = TextFileWriter::new(output_dir);
    let pacer = RandomPacer::from_config(&config.scraping);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt, stopping after the current chapter");
            shutdown.cancel();
        }
    });

    let outcome = Crawler::new(&scraper, &pacer, &writer)
        .with_console(Console::new())
        .with_cancellation(cancel)
        .crawl(&title)
        .await;

    match outcome {
        CrawlOutcome::Done(report) => {
            if !report.skipped.is_empty() {
                console.caution(format_args!(
                    "{} of {} chapters could not be downloaded",
                    report.skipped.len(),
                    report.chapters_attempted
                ));
            }
            console.done(format_args!(
                "Saved {} chapters to {}",
                report.chapters_saved,
                report.path.display()
            ));
        }
        CrawlOutcome::Aborted(reason) => {
            console.fail(format_args!("Crawl of \"{title}\" stopped: {reason}"));
        }
        CrawlOutcome::WriteFailed { novel_title, error } => {
            console.fail(format_args!("Could not save \"{novel_title}\": {error}"));
        }
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level.
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("shiori=info,warn"),
        1 => EnvFilter::new("shiori=debug,info"),
        _ => EnvFilter::new("shiori=trace,debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
