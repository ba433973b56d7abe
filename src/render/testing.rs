//! In-memory render backend for tests
//!
//! [`SiteFixture`] describes a synthetic site as a map of URL to page. The
//! [`TestLauncher`] hands out backends that "render" those pages: navigation
//! succeeds for known URLs, titles and HTML come from the fixture, and
//! screenshots are small but real PNG rasters.
//!
//! ```
//! use sumi_shutter::render::testing::{SiteFixture, TestLauncher};
//!
//! let site = SiteFixture::new()
//!     .page("https://site.test/", "Home", &["/a", "/b"])
//!     .page("https://site.test/a", "A", &["/"])
//!     .hanging("https://site.test/b");
//! let launcher = TestLauncher::new(site.clone());
//! ```

use super::{BackendLauncher, LaunchOptions, RenderBackend, RenderError, RenderPage};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// How a fixture URL behaves when navigated to
#[derive(Debug, Clone)]
enum PageBehavior {
    Render { title: String, html: String },
    Hang,
    Fail(String),
}

#[derive(Debug, Default)]
struct SiteState {
    pages: HashMap<String, PageBehavior>,
    navigations: Vec<String>,
    open_pages: usize,
    launches: usize,
    shutdowns: usize,
}

/// A synthetic website shared between a test and the backends it launches
#[derive(Debug, Clone, Default)]
pub struct SiteFixture {
    state: Arc<Mutex<SiteState>>,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page whose body links to each entry of `links`
    pub fn page(self, url: &str, title: &str, links: &[&str]) -> Self {
        let anchors: String = links
            .iter()
            .map(|href| format!("<a href=\"{}\">{}</a>", href, href))
            .collect();
        let html = format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, anchors
        );
        self.raw_page(url, title, &html)
    }

    /// Adds a page with explicit HTML
    pub fn raw_page(self, url: &str, title: &str, html: &str) -> Self {
        self.insert(
            url,
            PageBehavior::Render {
                title: title.to_string(),
                html: html.to_string(),
            },
        )
    }

    /// Adds a page whose navigation never finishes
    pub fn hanging(self, url: &str) -> Self {
        self.insert(url, PageBehavior::Hang)
    }

    /// Adds a page whose navigation fails immediately
    pub fn failing(self, url: &str, message: &str) -> Self {
        self.insert(url, PageBehavior::Fail(message.to_string()))
    }

    /// URLs navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Pages opened and not yet closed
    pub fn open_pages(&self) -> usize {
        self.lock().open_pages
    }

    pub fn launches(&self) -> usize {
        self.lock().launches
    }

    pub fn shutdowns(&self) -> usize {
        self.lock().shutdowns
    }

    fn insert(self, url: &str, behavior: PageBehavior) -> Self {
        self.lock().pages.insert(url.to_string(), behavior);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Launcher producing backends over a [`SiteFixture`]
#[derive(Debug, Clone)]
pub struct TestLauncher {
    site: SiteFixture,
    launch_error: Option<String>,
}

impl TestLauncher {
    pub fn new(site: SiteFixture) -> Self {
        Self {
            site,
            launch_error: None,
        }
    }

    /// A launcher whose browser never starts
    pub fn failing(site: SiteFixture, message: &str) -> Self {
        Self {
            site,
            launch_error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl BackendLauncher for TestLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderBackend>, RenderError> {
        if let Some(message) = &self.launch_error {
            return Err(RenderError::Launch(message.clone()));
        }

        self.site.lock().launches += 1;
        Ok(Box::new(TestBackend {
            site: self.site.clone(),
            viewport: (options.viewport_width, options.viewport_height),
        }))
    }
}

struct TestBackend {
    site: SiteFixture,
    viewport: (u32, u32),
}

#[async_trait]
impl RenderBackend for TestBackend {
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, RenderError> {
        self.site.lock().open_pages += 1;
        Ok(Box::new(TestPage {
            site: self.site.clone(),
            viewport: self.viewport,
            current: None,
            closed: false,
        }))
    }

    async fn shutdown(&mut self) -> Result<(), RenderError> {
        self.site.lock().shutdowns += 1;
        Ok(())
    }
}

struct TestPage {
    site: SiteFixture,
    viewport: (u32, u32),
    current: Option<(String, String)>,
    closed: bool,
}

impl TestPage {
    fn loaded(&self) -> Result<&(String, String), RenderError> {
        if self.closed {
            return Err(RenderError::PageClosed);
        }
        self.current
            .as_ref()
            .ok_or_else(|| RenderError::Capture("no document loaded".to_string()))
    }
}

#[async_trait]
impl RenderPage for TestPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        if self.closed {
            return Err(RenderError::PageClosed);
        }

        let behavior = {
            let mut state = self.site.lock();
            state.navigations.push(url.to_string());
            state.pages.get(url).cloned()
        };

        match behavior {
            Some(PageBehavior::Render { title, html }) => {
                self.current = Some((title, html));
                Ok(())
            }
            Some(PageBehavior::Hang) => {
                let _ = tokio::time::timeout(timeout, std::future::pending::<()>()).await;
                Err(RenderError::Timeout {
                    url: url.to_string(),
                    seconds: timeout.as_secs(),
                })
            }
            Some(PageBehavior::Fail(message)) => Err(RenderError::Navigation {
                url: url.to_string(),
                message,
            }),
            None => Err(RenderError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn title(&mut self) -> Result<String, RenderError> {
        Ok(self.loaded()?.0.clone())
    }

    async fn html(&mut self) -> Result<String, RenderError> {
        Ok(self.loaded()?.1.clone())
    }

    async fn capture_full_page(&mut self) -> Result<Vec<u8>, RenderError> {
        let (title, _) = self.loaded()?;
        // Full-page captures are taller than the viewport.
        let (width, height) = (self.viewport.0.max(1), self.viewport.1.max(1) * 2);
        let shade = (title.len() % 200) as u8;
        let raster = RgbImage::from_pixel(width, height, Rgb([shade, 90, 180]));

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(raster)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RenderError::Capture(e.to_string()))?;
        Ok(bytes)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if self.closed {
            return Err(RenderError::PageClosed);
        }
        self.closed = true;
        self.site.lock().open_pages -= 1;
        Ok(())
    }
}
