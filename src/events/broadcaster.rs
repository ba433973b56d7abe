use super::{CaptureEvent, JobEvent};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default number of events buffered per subscriber
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of job events to every subscribed observer
///
/// Cloneable and cheap to pass around; clones share the same channel.
/// Delivery is best-effort: publishing with no subscribers is a no-op, and a
/// subscriber that falls behind skips the events it missed instead of
/// slowing the crawl down.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<JobEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Delivers an event to all current subscribers
    pub fn broadcast(&self, job_id: Uuid, event: CaptureEvent) {
        tracing::trace!("Broadcasting {:?} for job {}", event, job_id);
        // Err only means nobody is listening.
        let _ = self.tx.send(JobEvent { job_id, event });
    }

    /// Subscribes to events of every job
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            job_id: None,
        }
    }

    /// Subscribes to the events of a single job
    pub fn subscribe_job(&self, job_id: Uuid) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            job_id: Some(job_id),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of an [`EventBroadcaster`]
#[derive(Debug)]
pub struct EventSubscription {
    rx: broadcast::Receiver<JobEvent>,
    job_id: Option<Uuid>,
}

impl EventSubscription {
    /// Waits for the next matching event
    ///
    /// Returns `None` once every broadcaster handle has been dropped.
    pub async fn next(&mut self) -> Option<JobEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Collects events until the subscribed job's terminal event
    ///
    /// Only meaningful for a job-scoped subscription.
    pub async fn until_terminal(mut self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            let done = event.event.is_terminal();
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    fn matches(&self, event: &JobEvent) -> bool {
        self.job_id.map_or(true, |id| id == event.job_id)
    }
}
