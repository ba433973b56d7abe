//! Sumi-Shutter main entry point
//!
//! This is the command-line interface for the Sumi-Shutter screenshot crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_shutter::config::{load_config_with_hash, Config};
use sumi_shutter::events::EventSubscription;
use sumi_shutter::output::{export_archive, write_job_summary};
use sumi_shutter::render::BackendLauncher;
use sumi_shutter::{CaptureEvent, Job, JobRequest, JobStatus, Orchestrator};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Sumi-Shutter: a same-domain screenshot crawler
///
/// Sumi-Shutter crawls a website breadth-first from URL, stays on the same
/// host, and stores a full-page screenshot plus a thumbnail of every page it
/// reaches.
#[derive(Parser, Debug)]
#[command(name = "sumi-shutter")]
#[command(version)]
#[command(about = "A same-domain screenshot crawler", long_about = None)]
struct Cli {
    /// Page to start crawling from (https:// is assumed when no scheme is given)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to capture
    #[arg(short, long, value_name = "N")]
    pages: Option<usize>,

    /// Stream events as newline-delimited JSON on stdout
    #[arg(long)]
    json: bool,

    /// Write a zip of the full-size screenshots once the job completes
    #[arg(long)]
    archive: bool,

    /// Write a markdown summary of the job to FILE
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

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

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let orchestrator = Orchestrator::new(config, launcher()?)?;

    // Subscribe before submitting so the first events are not missed.
    let events = orchestrator.subscribe();
    let handle = orchestrator
        .submit(JobRequest {
            source_url: cli.url.clone(),
            page_limit: cli.pages,
        })
        .await?;
    let job_id = handle.id();

    if !cli.json && !cli.quiet {
        println!("Job {} started for {}", job_id, cli.url);
    }

    follow_events(&orchestrator, events, job_id, cli.json, cli.quiet).await?;
    handle.wait().await?;

    let job = orchestrator
        .get(job_id)
        .await
        .with_context(|| format!("Job {} disappeared from the registry", job_id))?;

    report(&job, cli.json)?;

    if job.status == JobStatus::Completed {
        if cli.archive {
            let dest = orchestrator.artifact_store().root().to_path_buf();
            let archived = job.clone();
            let path = tokio::task::spawn_blocking(move || export_archive(&archived, &dest))
                .await
                .context("Archive task failed")??;
            if !cli.json {
                println!("Archive written to {}", path.display());
            }
        }

        if let Some(path) = &cli.summary {
            write_job_summary(&job, path)?;
            if !cli.json {
                println!("Summary written to {}", path.display());
            }
        }
    }

    if job.status == JobStatus::Failed {
        bail!(
            "Job {} failed: {}",
            job.id,
            job.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_shutter=info,warn"),
            1 => EnvFilter::new("sumi_shutter=debug,info"),
            2 => EnvFilter::new("sumi_shutter=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

#[cfg(feature = "chromium")]
fn launcher() -> anyhow::Result<Arc<dyn BackendLauncher>> {
    Ok(Arc::new(sumi_shutter::render::ChromiumLauncher))
}

#[cfg(not(feature = "chromium"))]
fn launcher() -> anyhow::Result<Arc<dyn BackendLauncher>> {
    bail!("sumi-shutter was built without the `chromium` feature; no render backend is available")
}

/// Prints the job's events until its terminal event
///
/// Ctrl-C cancels the job; the crawl then finishes its current page and
/// completes with what it has captured.
async fn follow_events(
    orchestrator: &Orchestrator,
    mut events: EventSubscription,
    job_id: Uuid,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut cancel_requested = false;

    loop {
        let next = tokio::select! {
            event = events.next() => event,
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                cancel_requested = true;
                tracing::warn!("Interrupted, stopping after the current page");
                orchestrator.cancel(job_id).await;
                continue;
            }
        };

        let Some(event) = next else {
            break;
        };
        if event.job_id != job_id {
            continue;
        }

        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else if !quiet {
            print_event(&event.event);
        }

        if event.event.is_terminal() {
            break;
        }
    }

    Ok(())
}

fn print_event(event: &CaptureEvent) {
    match event {
        CaptureEvent::PageDiscovered { url } => println!("  → {}", url),
        CaptureEvent::PageCaptured { title, screenshot_ref, .. } => {
            let title = if title.is_empty() { "(untitled)" } else { title };
            println!("  ✓ {} [{}]", title, screenshot_ref.full_image_url);
        }
        CaptureEvent::PageFailed { url, error } => println!("  ✗ {}: {}", url, error),
        CaptureEvent::JobCompleted {
            total_pages,
            limit_reached,
        } => {
            println!(
                "Done: {} pages captured{}",
                total_pages,
                if *limit_reached { " (page limit reached)" } else { "" }
            );
        }
        CaptureEvent::JobFailed { error } => println!("Job failed: {}", error),
    }
}

/// Prints the final status view
fn report(job: &Job, json: bool) -> anyhow::Result<()> {
    let status = job.status_view();

    if json {
        println!("{}", serde_json::to_string(&status)?);
        return Ok(());
    }

    println!("\n=== Job {} ===", status.job_id);
    println!("  URL: {}", status.url);
    println!("  Domain: {}", status.domain);
    println!("  Status: {}", status.status);
    println!("  Screenshots: {}", status.screenshots_count);
    if let Some(seconds) = job.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    if let Some(error) = &status.error {
        println!("  Error: {}", error);
    }

    Ok(())
}
