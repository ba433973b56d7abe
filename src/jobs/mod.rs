//! Job tracking
//!
//! A [`Job`] is one crawl-and-capture run. The [`JobRegistry`] holds every
//! job for the lifetime of the process and answers status and result
//! queries; the [`Orchestrator`] accepts requests, runs each crawl on its own
//! task and reconciles the outcome into the registry.
//!
//! ```text
//!            submit                 crawl loop exits
//!   request ───────▶ processing ───────────────────▶ completed
//!                         │
//!                         └── launch failure / crawl error / panic ──▶ failed
//! ```

mod job;
mod orchestrator;
mod registry;

pub use job::{Job, JobStatus, JobStatusView, Screenshot, ScreenshotView};
pub use orchestrator::{JobHandle, JobRequest, Orchestrator};
pub use registry::{JobRegistry, RegistryError};
