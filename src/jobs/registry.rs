use super::job::{Job, JobStatus, JobStatusView, Screenshot, ScreenshotView};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

/// Errors raised by the job registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job {id} is already {status}")]
    AlreadyTerminal { id: Uuid, status: JobStatus },
}

/// In-memory map of job id to job state
///
/// The single source of truth for status and result queries. Each job is
/// written only by the crawl task that owns it; readers may observe a job
/// mid-flight, with a partial screenshot list while it is still processing.
/// Jobs are kept for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job in the `processing` state
    pub async fn create(&self, source_url: &Url, page_limit: usize) -> Job {
        let domain = crate::url::extract_domain(source_url).unwrap_or_default();
        let job = Job::new(source_url.to_string(), domain, page_limit);

        self.jobs.write().await.insert(job.id, job.clone());
        tracing::debug!("Registered job {} for {}", job.id, job.source_url);
        job
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    pub async fn status(&self, id: Uuid) -> Option<JobStatusView> {
        self.jobs.read().await.get(&id).map(Job::status_view)
    }

    /// Ordered results of a job; empty unless the job has completed
    pub async fn results(&self, id: Uuid) -> Option<Vec<ScreenshotView>> {
        self.jobs.read().await.get(&id).map(Job::results)
    }

    /// Status of every known job, oldest first
    pub async fn list(&self) -> Vec<JobStatusView> {
        let jobs = self.jobs.read().await;
        let mut views: Vec<JobStatusView> = jobs.values().map(Job::status_view).collect();
        views.sort_by_key(|view| view.start_time);
        views
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Appends a captured page to a running job
    pub async fn append_screenshot(&self, id: Uuid, screenshot: Screenshot) -> Result<(), RegistryError> {
        self.update(id, |job| job.screenshots.push(screenshot)).await
    }

    /// Moves a job to `completed` with its final screenshot list
    pub async fn mark_completed(&self, id: Uuid, screenshots: Vec<Screenshot>) -> Result<(), RegistryError> {
        self.update(id, |job| {
            job.screenshots = screenshots;
            job.status = JobStatus::Completed;
            job.end_time = Some(Utc::now());
        })
        .await
    }

    /// Moves a job to `failed`; screenshots captured so far are kept
    pub async fn mark_failed(&self, id: Uuid, error: impl Into<String>) -> Result<(), RegistryError> {
        let error = error.into();
        self.update(id, |job| {
            job.error = Some(error);
            job.status = JobStatus::Failed;
            job.end_time = Some(Utc::now());
        })
        .await
    }

    /// Applies a mutation to a job that is still processing
    async fn update<F>(&self, id: Uuid, mutate: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(RegistryError::NotFound(id))?;

        if job.status.is_terminal() {
            return Err(RegistryError::AlreadyTerminal {
                id,
                status: job.status,
            });
        }

        mutate(job);
        Ok(())
    }
}
