//! Render backend abstraction
//!
//! The crawl engine never talks to a browser directly. It launches a
//! [`RenderBackend`] once per job through a [`BackendLauncher`], opens one
//! [`RenderPage`] per URL via [`with_page`], and shuts the backend down when
//! the crawl loop exits.
//!
//! - `chromium` (feature `chromium`): headless Chromium over CDP
//! - `testing`: an in-memory site used by the test suites

#[cfg(feature = "chromium")]
mod chromium;
pub mod testing;

#[cfg(feature = "chromium")]
pub use chromium::{ChromiumBackend, ChromiumLauncher};

use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a render backend
#[derive(Debug, Error)]
pub enum RenderError {
    /// The browser could not be started; fatal for the job
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Page is already closed")]
    PageClosed,
}

/// Settings a launcher needs to start a browser for one job
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl From<&crate::config::BrowserConfig> for LaunchOptions {
    fn from(config: &crate::config::BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
        }
    }
}

/// A single browser tab
#[async_trait]
pub trait RenderPage: Send {
    /// Navigates to `url` and waits for the page's load event
    ///
    /// Implementations must give up after `timeout` and report
    /// [`RenderError::Timeout`].
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Current document title (may be empty)
    async fn title(&mut self) -> Result<String, RenderError>;

    /// Serialized DOM after rendering
    async fn html(&mut self) -> Result<String, RenderError>;

    /// PNG raster of the entire page, not just the viewport
    async fn capture_full_page(&mut self) -> Result<Vec<u8>, RenderError>;

    /// Releases the tab; later calls fail with [`RenderError::PageClosed`]
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// A running browser owned by one job
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, RenderError>;

    /// Stops the browser process
    async fn shutdown(&mut self) -> Result<(), RenderError>;
}

/// Starts render backends
#[async_trait]
pub trait BackendLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderBackend>, RenderError>;
}

/// Runs `op` against a fresh page and always closes the page afterwards
///
/// The operation receives the page by value and hands it back together with
/// its result, so the close happens on success, failure and timeout alike.
/// A failure to close is logged and never replaces the operation's result.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_shutter::render::{with_page, RenderBackend, RenderError};
///
/// # async fn example(backend: &dyn RenderBackend) -> Result<(), RenderError> {
/// let title: String = with_page(backend, |mut page| async move {
///     let result = async {
///         page.navigate("https://example.com/", Duration::from_secs(30)).await?;
///         page.title().await
///     }
///     .await;
///     (page, result)
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_page<T, E, F, Fut>(backend: &dyn RenderBackend, op: F) -> Result<T, E>
where
    E: From<RenderError>,
    F: FnOnce(Box<dyn RenderPage>) -> Fut,
    Fut: Future<Output = (Box<dyn RenderPage>, Result<T, E>)>,
{
    let page = backend.open_page().await?;
    let (mut page, result) = op(page).await;

    if let Err(e) = page.close().await {
        tracing::warn!("Failed to close page: {}", e);
    }

    result
}
