//! Crawler coordinator - the crawl loop of one job
//!
//! Pulls URLs from the [`Frontier`] one at a time, hands each to the
//! [`CapturePipeline`] and feeds discovered links back into the frontier.
//! At most one page is in flight per job; the loop ends when the frontier is
//! exhausted, the page limit is reached, or the job is cancelled.

use super::frontier::Frontier;
use super::pipeline::{CapturePipeline, PageOutcome};
use super::probe::ContentProbe;
use crate::config::Config;
use crate::events::EventBroadcaster;
use crate::jobs::{JobRegistry, Screenshot};
use crate::render::RenderBackend;
use crate::storage::JobArtifacts;
use crate::ShutterError;
use std::time::Instant;
use tokio::sync::watch;
use url::Url;
use uuid::Uuid;

/// How often progress is logged, in processed pages
const PROGRESS_INTERVAL: usize = 10;

/// Summary of a finished crawl loop
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Captured pages in capture order
    pub screenshots: Vec<Screenshot>,

    /// Number of captured pages
    pub total_pages: usize,

    /// URLs handed out, captured or not
    pub pages_visited: usize,

    /// True when the loop stopped because the page limit was hit
    pub limit_reached: bool,

    /// True when the loop stopped on a cancellation request
    pub cancelled: bool,
}

/// Main crawl loop of a single job
pub struct Coordinator {
    job_id: Uuid,
    frontier: Frontier,
    pipeline: CapturePipeline,
    artifacts: JobArtifacts,
    cancel: Option<watch::Receiver<bool>>,
}

impl Coordinator {
    /// Creates a coordinator seeded with `source`
    ///
    /// `probe` enables the Content-Type check before each page is rendered.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: Uuid,
        source: &Url,
        page_limit: usize,
        config: &Config,
        registry: JobRegistry,
        events: EventBroadcaster,
        artifacts: JobArtifacts,
        probe: Option<ContentProbe>,
    ) -> Self {
        let pipeline = CapturePipeline::new(
            job_id,
            config,
            registry,
            events,
            artifacts.clone(),
            probe,
        );

        Self {
            job_id,
            frontier: Frontier::new(source, page_limit),
            pipeline,
            artifacts,
            cancel: None,
        }
    }

    /// Stops the loop before the next page once `cancel` turns true
    ///
    /// A page that is already being captured is finished first.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs the crawl loop to completion
    ///
    /// Per-page failures are reported as events and never end the loop. The
    /// only error returned is a failure to create the job's artifact
    /// directory, which makes every capture impossible.
    pub async fn run(mut self, backend: &dyn RenderBackend) -> Result<CrawlOutcome, ShutterError> {
        self.artifacts.prepare().await?;

        tracing::info!(
            "Starting crawl of {} for job {} (limit {})",
            self.frontier.domain(),
            self.job_id,
            self.frontier.page_limit()
        );

        let start_time = Instant::now();
        let mut screenshots = Vec::new();
        let mut failures = 0usize;
        let mut cancelled = false;

        loop {
            if self.is_cancelled() {
                tracing::info!("Job {} cancelled", self.job_id);
                cancelled = true;
                break;
            }

            let Some(entry) = self.frontier.next() else {
                break;
            };

            match self.pipeline.capture(backend, &entry).await {
                PageOutcome::Captured { screenshot, links } => {
                    let queued = self.frontier.ingest(links, entry.depth + 1);
                    tracing::debug!("Queued {} new links from {}", queued, entry.url);
                    screenshots.push(screenshot);
                }
                PageOutcome::Failed { .. } => failures += 1,
            }

            let processed = self.frontier.visited_count();
            if processed % PROGRESS_INTERVAL == 0 {
                let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(0.001);
                tracing::info!(
                    "Progress: {} pages processed, {} pending, {:.2} pages/sec",
                    processed,
                    self.frontier.pending_count(),
                    rate
                );
            }
        }

        let limit_reached = !cancelled && self.frontier.limit_reached();
        tracing::info!(
            "Crawl of {} finished: {} captured, {} failed in {:?}{}",
            self.frontier.domain(),
            screenshots.len(),
            failures,
            start_time.elapsed(),
            if limit_reached { " (page limit reached)" } else { "" }
        );

        Ok(CrawlOutcome {
            total_pages: screenshots.len(),
            pages_visited: self.frontier.visited_count(),
            screenshots,
            limit_reached,
            cancelled,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}
