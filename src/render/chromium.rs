//! Headless Chromium backend (chromiumoxide)
//!
//! One browser process per job. The CDP handler is driven by a background
//! task that lives as long as the backend; `shutdown` closes the browser and
//! stops that task.

use super::{BackendLauncher, LaunchOptions, RenderBackend, RenderError, RenderPage};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launches a fresh headless Chromium for each job
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl BackendLauncher for ChromiumLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderBackend>, RenderError> {
        let backend = ChromiumBackend::launch(options).await?;
        Ok(Box::new(backend))
    }
}

/// A running Chromium process
pub struct ChromiumBackend {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumBackend {
    /// Starts Chromium with the given viewport
    pub async fn launch(options: &LaunchOptions) -> Result<Self, RenderError> {
        info!(
            "Launching Chromium ({}x{}, headless: {})",
            options.viewport_width, options.viewport_height, options.headless
        );

        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport_width, options.viewport_height)
            .viewport(Viewport {
                width: options.viewport_width,
                height: options.viewport_height,
                ..Default::default()
            })
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if !options.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler,
        })
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, RenderError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Launch("browser already shut down".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Capture(format!("Failed to open page: {}", e)))?;

        Ok(Box::new(ChromiumPage { page: Some(page) }))
    }

    async fn shutdown(&mut self) -> Result<(), RenderError> {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed waiting for browser exit: {}", e);
            }
            info!("Chromium shut down");
        }
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromiumBackend {
    fn drop(&mut self) {
        // Dropping the Browser kills the child process; the handler task
        // would otherwise outlive it.
        self.handler.abort();
    }
}

struct ChromiumPage {
    page: Option<Page>,
}

impl ChromiumPage {
    fn page(&self) -> Result<&Page, RenderError> {
        self.page.as_ref().ok_or(RenderError::PageClosed)
    }
}

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        let page = self.page()?;

        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(RenderError::Timeout {
                url: url.to_string(),
                seconds: timeout.as_secs(),
            }),
        }
    }

    async fn title(&mut self) -> Result<String, RenderError> {
        let title = self
            .page()?
            .get_title()
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))?;
        Ok(title.unwrap_or_default())
    }

    async fn html(&mut self) -> Result<String, RenderError> {
        self.page()?
            .content()
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))
    }

    async fn capture_full_page(&mut self) -> Result<Vec<u8>, RenderError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        self.page()?
            .screenshot(params)
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        let page = self.page.take().ok_or(RenderError::PageClosed)?;
        page.close()
            .await
            .map_err(|e| RenderError::Capture(format!("Failed to close page: {}", e)))
    }
}
