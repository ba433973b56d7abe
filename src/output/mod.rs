//! Output module for packaging job results
//!
//! This module handles:
//! - Exporting a completed job's full-size images as a zip archive
//! - Generating markdown summaries of a job

mod archive;
mod summary;

pub use archive::{archive_file_name, entry_name, export_archive, sanitize_file_name, write_archive};
pub use summary::{format_job_summary, write_job_summary};

use crate::jobs::JobStatus;
use thiserror::Error;

/// Errors that can occur while producing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Screenshots are not ready yet (job is {0})")]
    NotReady(JobStatus),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
