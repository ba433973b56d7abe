use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of pages captured when the caller does not ask for a limit
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Hard ceiling on pages per job, applied regardless of caller input
pub const MAX_PAGE_LIMIT: usize = 300;

/// Default per-page navigation timeout in seconds
pub const DEFAULT_NAVIGATION_TIMEOUT: u64 = 90;

/// Main configuration structure for Sumi-Shutter
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub browser: BrowserConfig,
    pub thumbnail: ThumbnailConfig,
    pub output: OutputConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Page limit used when a request does not specify one
    #[serde(rename = "default-page-limit")]
    pub default_page_limit: usize,

    /// Upper bound for any requested page limit
    #[serde(rename = "max-page-limit")]
    pub max_page_limit: usize,

    /// Per-page navigation timeout (seconds)
    #[serde(rename = "navigation-timeout")]
    pub navigation_timeout: u64,

    /// Extra wait after navigation settles, before capture (milliseconds)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Send a HEAD request first and skip targets that are not HTML
    #[serde(rename = "probe-content-type")]
    pub probe_content_type: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            settle_delay_ms: 500,
            probe_content_type: true,
        }
    }
}

impl CrawlerConfig {
    /// Resolves the page limit for a job
    ///
    /// Uses the requested value when present, otherwise the configured default,
    /// and clamps the result to `1..=max_page_limit`.
    pub fn effective_page_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_limit)
            .clamp(1, self.max_page_limit.max(1))
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,

    /// Explicit Chrome/Chromium executable; auto-detected when absent
    #[serde(rename = "chrome-path")]
    pub chrome_path: Option<PathBuf>,

    /// Viewport width in pixels
    #[serde(rename = "viewport-width")]
    pub viewport_width: u32,

    /// Viewport height in pixels
    #[serde(rename = "viewport-height")]
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

/// Thumbnail box and encoding configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            quality: 60,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for per-job artifact folders
    #[serde(rename = "screenshots-dir")]
    pub screenshots_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            screenshots_dir: PathBuf::from("./screenshots"),
        }
    }
}

/// User agent identification for the content probe
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "SumiShutter".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}
