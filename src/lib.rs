//! Sumi-Shutter: a same-domain screenshot crawler
//!
//! This crate crawls a website breadth-first from a single URL, captures a
//! full-page screenshot and a thumbnail of every same-domain page it finds,
//! and streams capture progress to subscribed observers while the job runs.

pub mod config;
pub mod crawler;
pub mod events;
pub mod jobs;
pub mod output;
pub mod render;
pub mod storage;
pub mod thumbnail;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Shutter operations
#[derive(Debug, Error)]
pub enum ShutterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid source URL: {0}")]
    Url(#[from] UrlError),

    #[error("Page limit must be a positive integer, got {0}")]
    InvalidPageLimit(usize),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Job registry error: {0}")]
    Registry(#[from] jobs::RegistryError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl task aborted: {0}")]
    Aborted(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL is required")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Shutter operations
pub type Result<T> = std::result::Result<T, ShutterError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use events::{CaptureEvent, EventBroadcaster, JobEvent};
pub use jobs::{Job, JobRegistry, JobRequest, JobStatus, Orchestrator, Screenshot};
pub use url::{domain_of, is_valid_url, normalize_url, resolve_link};
