//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest crawl engine.

use anyhow::Context as _;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use sumi_harvest::config::{load_job_with_hash, CrawlJob};
use sumi_harvest::HarvestEngine;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a declarative crawl engine
///
/// Reads a crawl job (JSON or TOML), fetches its pages with a static HTTP
/// client or a headless browser, and prints the extracted records as JSON.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A declarative crawl engine", long_about = None)]
struct Cli {
    /// Path to a JSON or TOML job file
    #[arg(value_name = "JOB", required_unless_present = "engines")]
    job: Option<PathBuf>,

    /// Validate the job and print the report without crawling
    #[arg(long, conflicts_with = "engines")]
    validate: bool,

    /// List the supported fetch engines and exit
    #[arg(long)]
    engines: bool,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

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

    let engine = HarvestEngine::new();

    if cli.engines {
        emit_json(&engine.engines(), cli.output.as_deref())?;
        return Ok(());
    }

    let Some(path) = cli.job.as_deref() else {
        anyhow::bail!("a job file is required");
    };

    tracing::info!("Loading job from: {}", path.display());
    let job = match load_job_with_hash(path) {
        Ok((job, hash)) => {
            tracing::info!("Job loaded successfully (hash: {})", hash);
            job
        }
        Err(e) => {
            tracing::error!("Failed to load job: {}", e);
            return Err(e).with_context(|| format!("cannot load {}", path.display()));
        }
    };

    let succeeded = if cli.validate {
        handle_validate(&engine, &job, cli.output.as_deref())?
    } else {
        handle_crawl(&engine, &job, cli.output.as_deref()).await?
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries the JSON result, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --validate: prints the report, returns whether the job is valid
fn handle_validate(engine: &HarvestEngine, job: &CrawlJob, output: Option<&Path>) -> anyhow::Result<bool> {
    let report = engine.validate(job);
    for error in &report.errors {
        tracing::error!("{}", error);
    }
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }
    emit_json(&report, output)?;
    Ok(report.valid)
}

/// Handles the crawl itself, returns whether the run succeeded
async fn handle_crawl(engine: &HarvestEngine, job: &CrawlJob, output: Option<&Path>) -> anyhow::Result<bool> {
    tracing::info!(
        "Engine: {}, fields: {}, list mode: {}, pagination: {}",
        job.fetch_engine,
        job.fields.len(),
        job.navigation.is_some(),
        job.pagination_enabled()
    );

    let outcome = engine.submit(job).await;

    if outcome.success {
        tracing::info!("Crawl completed: {} records, {} errors", outcome.total_items, outcome.errors.len());
    } else {
        tracing::error!("Crawl failed with {} error(s)", outcome.errors.len());
    }

    emit_json(&outcome, output)?;
    Ok(outcome.success)
}

/// Pretty-prints `value` as JSON to `output`, or stdout when absent
fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n").with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!("Result written to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
