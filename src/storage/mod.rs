//! Artifact storage
//!
//! Captured rasters live on disk under a job-scoped directory:
//!
//! ```text
//! <screenshots-dir>/<job-id>/hd/<screenshot-id>.png
//! <screenshots-dir>/<job-id>/thumbnails/<screenshot-id>.jpg
//! ```
//!
//! The crawl engine only ever writes here. Serving, archiving and cleanup
//! belong to the layers on top.

mod artifacts;

pub use artifacts::{ArtifactStore, JobArtifacts};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting artifacts
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
