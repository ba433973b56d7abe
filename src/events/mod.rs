//! Capture lifecycle events
//!
//! Every job publishes a stream of [`CaptureEvent`]s while it runs. Events are
//! wrapped in a [`JobEvent`] carrying the job id and fanned out to observers
//! through an [`EventBroadcaster`].
//!
//! On the wire an event is a flat JSON object tagged by `type`:
//!
//! ```json
//! {"jobId":"…","type":"page-captured","url":"https://example.com/","title":"Home",
//!  "screenshotRef":{"id":"…","thumbnailUrl":"…","fullImageUrl":"…"}}
//! ```

mod broadcaster;

pub use broadcaster::{EventBroadcaster, EventSubscription};

use serde::Serialize;
use uuid::Uuid;

/// Locators for the two artifacts of a captured page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRef {
    pub id: Uuid,
    pub thumbnail_url: String,
    pub full_image_url: String,
}

/// Something that happened while a job was running
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CaptureEvent {
    /// Processing of a URL has started
    PageDiscovered { url: String },

    /// A page was rendered and both artifacts were stored
    PageCaptured {
        url: String,
        title: String,
        screenshot_ref: ScreenshotRef,
    },

    /// A page could not be captured; the crawl goes on
    PageFailed { url: String, error: String },

    /// Last event of a successful job
    JobCompleted {
        total_pages: usize,
        limit_reached: bool,
    },

    /// Last event of a job that hit a fatal error
    JobFailed { error: String },
}

impl CaptureEvent {
    /// Returns true for the event that closes a job's stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::JobCompleted { .. } | Self::JobFailed { .. })
    }

    /// The page URL this event is about, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::PageDiscovered { url }
            | Self::PageCaptured { url, .. }
            | Self::PageFailed { url, .. } => Some(url),
            Self::JobCompleted { .. } | Self::JobFailed { .. } => None,
        }
    }
}

/// A [`CaptureEvent`] addressed to one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub job_id: Uuid,
    #[serde(flatten)]
    pub event: CaptureEvent,
}
