//! Job and screenshot records

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Crawl task is running
    Processing,

    /// Crawl finished; zero captured pages is still a completed job
    Completed,

    /// A job-fatal error stopped the crawl
    Failed,
}

impl JobStatus {
    /// Terminal states are never left again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub id: Uuid,
    pub title: String,
    pub source_url: String,
    pub full_image_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub thumbnail_url: String,
    pub full_image_url: String,
}

/// One crawl-and-capture run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub source_url: String,
    pub domain: String,
    pub page_limit: usize,
    pub screenshots: Vec<Screenshot>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Job {
    pub(crate) fn new(source_url: String, domain: String, page_limit: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Processing,
            source_url,
            domain,
            page_limit,
            screenshots: Vec::new(),
            error: None,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Snapshot for status queries
    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.id,
            status: self.status,
            url: self.source_url.clone(),
            domain: self.domain.clone(),
            screenshots_count: self.screenshots.len(),
            start_time: self.start_time,
            end_time: self.end_time,
            error: self.error.clone(),
        }
    }

    /// Ordered results; empty until the job has completed
    pub fn results(&self) -> Vec<ScreenshotView> {
        if self.status != JobStatus::Completed {
            return Vec::new();
        }
        self.screenshots.iter().map(ScreenshotView::from).collect()
    }

    /// Wall-clock duration, once the job has ended
    pub fn duration_seconds(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds())
    }
}

/// Answer to a status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub url: String,
    pub domain: String,
    pub screenshots_count: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// One entry of a results query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotView {
    pub id: Uuid,
    pub title: String,
    pub source_url: String,
    pub thumbnail_url: String,
}

impl From<&Screenshot> for ScreenshotView {
    fn from(screenshot: &Screenshot) -> Self {
        Self {
            id: screenshot.id,
            title: screenshot.title.clone(),
            source_url: screenshot.source_url.clone(),
            thumbnail_url: screenshot.thumbnail_url.clone(),
        }
    }
}
