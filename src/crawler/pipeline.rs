//! Per-page capture pipeline
//!
//! One call to [`CapturePipeline::capture`] takes a single URL from
//! "discovered" to either a stored [`Screenshot`] or a `page-failed` event.
//! Nothing that goes wrong here escapes as an error: the crawl loop always
//! gets a [`PageOutcome`] back and moves on to the next URL.

use super::frontier::FrontierEntry;
use super::parser::parse_html;
use super::probe::{ContentProbe, ProbeResult};
use crate::config::Config;
use crate::events::{CaptureEvent, EventBroadcaster, ScreenshotRef};
use crate::jobs::{JobRegistry, RegistryError, Screenshot};
use crate::render::{with_page, RenderBackend, RenderError, RenderPage};
use crate::storage::{JobArtifacts, StorageError};
use crate::thumbnail::{thumbnail, ThumbnailError, ThumbnailSpec};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Extra time granted on top of the navigation timeout for reading the
/// document and taking the screenshot
const CAPTURE_GRACE: Duration = Duration::from_secs(30);

/// Why a single page could not be captured
#[derive(Debug, Error)]
pub enum PageFailure {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Expected HTML, got {content_type}")]
    NotHtml { content_type: String },

    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

/// Result of processing one URL
#[derive(Debug)]
pub enum PageOutcome {
    /// Page stored; `links` are the hrefs found in the rendered DOM
    Captured { screenshot: Screenshot, links: Vec<Url> },

    /// Page skipped; a `page-failed` event has been emitted
    Failed { error: String },
}

/// What a browser tab produced for one URL
struct Rendered {
    title: String,
    html: String,
    raster: Vec<u8>,
}

/// Captures pages for one job
pub struct CapturePipeline {
    job_id: Uuid,
    registry: JobRegistry,
    events: EventBroadcaster,
    artifacts: JobArtifacts,
    probe: Option<ContentProbe>,
    navigation_timeout: Duration,
    settle_delay: Duration,
    thumbnail: ThumbnailSpec,
}

impl CapturePipeline {
    pub fn new(
        job_id: Uuid,
        config: &Config,
        registry: JobRegistry,
        events: EventBroadcaster,
        artifacts: JobArtifacts,
        probe: Option<ContentProbe>,
    ) -> Self {
        Self {
            job_id,
            registry,
            events,
            artifacts,
            probe,
            navigation_timeout: config.crawler.navigation_timeout(),
            settle_delay: config.crawler.settle_delay(),
            thumbnail: ThumbnailSpec::from(&config.thumbnail),
        }
    }

    /// Processes one URL end to end
    pub async fn capture(&self, backend: &dyn RenderBackend, entry: &FrontierEntry) -> PageOutcome {
        let url = entry.url.to_string();

        self.events.broadcast(
            self.job_id,
            CaptureEvent::PageDiscovered { url: url.clone() },
        );

        match self.try_capture(backend, &entry.url).await {
            Ok((screenshot, links)) => {
                tracing::info!(
                    "Captured {} (depth {}, {} links)",
                    url,
                    entry.depth,
                    links.len()
                );
                self.events.broadcast(
                    self.job_id,
                    CaptureEvent::PageCaptured {
                        url,
                        title: screenshot.title.clone(),
                        screenshot_ref: ScreenshotRef {
                            id: screenshot.id,
                            thumbnail_url: screenshot.thumbnail_url.clone(),
                            full_image_url: screenshot.full_image_url.clone(),
                        },
                    },
                );
                PageOutcome::Captured { screenshot, links }
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!("Failed to capture {}: {}", url, error);
                self.events.broadcast(
                    self.job_id,
                    CaptureEvent::PageFailed {
                        url,
                        error: error.clone(),
                    },
                );
                PageOutcome::Failed { error }
            }
        }
    }

    async fn try_capture(
        &self,
        backend: &dyn RenderBackend,
        url: &Url,
    ) -> Result<(Screenshot, Vec<Url>), PageFailure> {
        if let Some(probe) = &self.probe {
            let probed = probe.probe(url.as_str()).await;
            if let ProbeResult::NotHtml { content_type } = probed {
                return Err(PageFailure::NotHtml { content_type });
            }
        }

        let rendered = self.render(backend, url).await?;
        let parsed = parse_html(&rendered.html, url);

        // Prefer what the browser reports; fall back to the <title> in the DOM.
        let title = if rendered.title.trim().is_empty() {
            parsed.title.unwrap_or_default()
        } else {
            rendered.title.trim().to_string()
        };

        let spec = self.thumbnail;
        let raster = rendered.raster;
        let (raster, preview) = tokio::task::spawn_blocking(move || {
            let preview = thumbnail(&raster, spec);
            (raster, preview)
        })
        .await
        .map_err(|e| PageFailure::Task(e.to_string()))?;
        let preview = preview?;

        let id = Uuid::new_v4();
        let full_image_path = self.artifacts.write_full_image(id, &raster).await?;
        let thumbnail_path = self.artifacts.write_thumbnail(id, &preview).await?;

        let screenshot = Screenshot {
            id,
            title,
            source_url: url.to_string(),
            full_image_path,
            thumbnail_path,
            thumbnail_url: self.artifacts.thumbnail_url(id),
            full_image_url: self.artifacts.full_image_url(id),
        };
        self.registry
            .append_screenshot(self.job_id, screenshot.clone())
            .await?;

        Ok((screenshot, parsed.links))
    }

    /// Navigates a fresh tab and collects title, DOM and raster
    async fn render(&self, backend: &dyn RenderBackend, url: &Url) -> Result<Rendered, PageFailure> {
        let target = url.to_string();
        let navigation_timeout = self.navigation_timeout;
        let settle_delay = self.settle_delay;
        let ceiling = navigation_timeout + settle_delay + CAPTURE_GRACE;

        with_page(backend, |mut page| async move {
            let attempt = tokio::time::timeout(
                ceiling,
                render_page(&mut *page, &target, navigation_timeout, settle_delay),
            )
            .await;

            let result = match attempt {
                Ok(rendered) => rendered.map_err(PageFailure::from),
                Err(_) => Err(PageFailure::Render(RenderError::Timeout {
                    url: target,
                    seconds: ceiling.as_secs(),
                })),
            };
            (page, result)
        })
        .await
    }
}

async fn render_page(
    page: &mut dyn RenderPage,
    url: &str,
    navigation_timeout: Duration,
    settle_delay: Duration,
) -> Result<Rendered, RenderError> {
    page.navigate(url, navigation_timeout).await?;

    if !settle_delay.is_zero() {
        tokio::time::sleep(settle_delay).await;
    }

    let title = match page.title().await {
        Ok(title) => title,
        Err(e) => {
            tracing::debug!("No title for {}: {}", url, e);
            String::new()
        }
    };
    let html = page.html().await?;
    let raster = page.capture_full_page().await?;

    Ok(Rendered { title, html, raster })
}
