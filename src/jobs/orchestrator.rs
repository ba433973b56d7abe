use super::job::{Job, JobStatusView, ScreenshotView};
use super::registry::{JobRegistry, RegistryError};
use crate::config::{validate, Config};
use crate::crawler::{ContentProbe, Coordinator, CrawlOutcome};
use crate::events::{CaptureEvent, EventBroadcaster, EventSubscription};
use crate::render::{BackendLauncher, LaunchOptions};
use crate::storage::ArtifactStore;
use crate::url::validate_source_url;
use crate::ShutterError;
use futures::FutureExt;
use serde::Deserialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// A request to crawl and capture a site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub source_url: String,

    /// Requested page limit; clamped to the configured maximum
    #[serde(default)]
    pub page_limit: Option<usize>,
}

impl JobRequest {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            page_limit: None,
        }
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = Some(page_limit);
        self
    }
}

/// Handle to a submitted job's background task
#[derive(Debug)]
pub struct JobHandle {
    job_id: Uuid,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.job_id
    }

    /// Waits until the job has reached a terminal state
    pub async fn wait(self) -> Result<(), ShutterError> {
        self.task
            .await
            .map_err(|e| ShutterError::Aborted(e.to_string()))
    }
}

/// Entry point for creating and tracking jobs
///
/// `submit` validates the request, registers the job and returns
/// immediately; the crawl runs on its own tokio task. Each job launches its
/// own browser, so concurrent jobs never share tabs. When the crawl loop
/// exits, the final state is written to the registry first and the terminal
/// event is broadcast second, so an observer reacting to `job-completed` or
/// `job-failed` always finds the registry already up to date.
///
/// Subscribe before submitting to be sure to see every event of a job.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<Config>,
    registry: JobRegistry,
    events: EventBroadcaster,
    launcher: Arc<dyn BackendLauncher>,
    store: ArtifactStore,
    probe: Option<ContentProbe>,
    cancels: Arc<Mutex<HashMap<Uuid, watch::Sender<bool>>>>,
}

impl Orchestrator {
    /// Creates an orchestrator from a validated configuration
    pub fn new(config: Config, launcher: Arc<dyn BackendLauncher>) -> Result<Self, ShutterError> {
        validate(&config)?;

        let probe = if config.crawler.probe_content_type {
            Some(ContentProbe::new(&config.user_agent)?)
        } else {
            None
        };

        Ok(Self {
            store: ArtifactStore::new(&config.output.screenshots_dir),
            config: Arc::new(config),
            registry: JobRegistry::new(),
            events: EventBroadcaster::new(),
            launcher,
            probe,
            cancels: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    pub fn artifact_store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Validates a request and starts its crawl in the background
    ///
    /// Fails for an invalid source URL or a zero page limit, in which case no
    /// job is created.
    pub async fn submit(&self, request: JobRequest) -> Result<JobHandle, ShutterError> {
        let source = validate_source_url(&request.source_url)?;
        if request.page_limit == Some(0) {
            return Err(ShutterError::InvalidPageLimit(0));
        }
        let page_limit = self.config.crawler.effective_page_limit(request.page_limit);

        let job = self.registry.create(&source, page_limit).await;
        let job_id = job.id;
        tracing::info!(
            "Accepted job {} for {} (page limit {})",
            job_id,
            source,
            page_limit
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.cancels.lock().await.insert(job_id, cancel_tx);

        let orchestrator = self.clone();
        let task = tokio::spawn(async move {
            orchestrator
                .run_job(job_id, source, page_limit, cancel_rx)
                .await;
        });

        Ok(JobHandle { job_id, task })
    }

    /// Submits a job and waits for it to finish
    pub async fn run(&self, request: JobRequest) -> Result<Job, ShutterError> {
        let handle = self.submit(request).await?;
        let job_id = handle.id();
        handle.wait().await?;

        self.registry
            .get(job_id)
            .await
            .ok_or_else(|| RegistryError::NotFound(job_id).into())
    }

    pub async fn get(&self, job_id: Uuid) -> Option<Job> {
        self.registry.get(job_id).await
    }

    pub async fn status(&self, job_id: Uuid) -> Option<JobStatusView> {
        self.registry.status(job_id).await
    }

    pub async fn results(&self, job_id: Uuid) -> Option<Vec<ScreenshotView>> {
        self.registry.results(job_id).await
    }

    pub async fn jobs(&self) -> Vec<JobStatusView> {
        self.registry.list().await
    }

    /// Asks a running job to stop after its current page
    ///
    /// Returns false if the job is unknown or already finished.
    pub async fn cancel(&self, job_id: Uuid) -> bool {
        match self.cancels.lock().await.get(&job_id) {
            Some(tx) => {
                tx.send_replace(true);
                true
            }
            None => false,
        }
    }

    /// Subscribes to the events of every job
    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    /// Subscribes to the events of one job
    pub fn subscribe_job(&self, job_id: Uuid) -> EventSubscription {
        self.events.subscribe_job(job_id)
    }

    async fn run_job(self, job_id: Uuid, source: Url, page_limit: usize, cancel: watch::Receiver<bool>) {
        let result = self.crawl(job_id, &source, page_limit, cancel).await;
        self.finalize(job_id, result).await;
        self.cancels.lock().await.remove(&job_id);
    }

    /// Launches a browser, runs the crawl loop and always shuts the browser down
    async fn crawl(
        &self,
        job_id: Uuid,
        source: &Url,
        page_limit: usize,
        cancel: watch::Receiver<bool>,
    ) -> Result<CrawlOutcome, ShutterError> {
        let options = LaunchOptions::from(&self.config.browser);
        let mut backend = self.launcher.launch(&options).await?;

        let coordinator = Coordinator::new(
            job_id,
            source,
            page_limit,
            &self.config,
            self.registry.clone(),
            self.events.clone(),
            self.store.for_job(job_id),
            self.probe.clone(),
        )
        .with_cancellation(cancel);

        let result = AssertUnwindSafe(coordinator.run(backend.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ShutterError::Aborted(panic_message(panic.as_ref()))));

        if let Err(e) = backend.shutdown().await {
            tracing::warn!("Failed to shut down browser for job {}: {}", job_id, e);
        }

        result
    }

    /// Writes the terminal state, then emits the terminal event
    async fn finalize(&self, job_id: Uuid, result: Result<CrawlOutcome, ShutterError>) {
        match result {
            Ok(outcome) => {
                let total_pages = outcome.total_pages;
                let limit_reached = outcome.limit_reached;

                if let Err(e) = self.registry.mark_completed(job_id, outcome.screenshots).await {
                    tracing::error!("Failed to record completion of job {}: {}", job_id, e);
                }
                tracing::info!("Job {} completed with {} pages", job_id, total_pages);

                self.events.broadcast(
                    job_id,
                    CaptureEvent::JobCompleted {
                        total_pages,
                        limit_reached,
                    },
                );
            }
            Err(e) => {
                let error = e.to_string();
                tracing::error!("Job {} failed: {}", job_id, error);

                if let Err(e) = self.registry.mark_failed(job_id, error.clone()).await {
                    tracing::error!("Failed to record failure of job {}: {}", job_id, e);
                }

                self.events.broadcast(job_id, CaptureEvent::JobFailed { error });
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "crawl task panicked".to_string()
    }
}
