//! Content-Type probing
//!
//! Before a browser tab is spent on a URL, a cheap HEAD request checks that
//! the target is a document at all. Only a positive non-HTML answer skips the
//! page: servers that reject HEAD, time out, or omit the header get the
//! benefit of the doubt and are rendered anyway.

use crate::config::UserAgentConfig;
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;

/// MIME types that are rendered as pages
const HTML_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Outcome of a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// Server reported an HTML document
    Html,

    /// Server reported something that is not a page
    NotHtml {
        /// The Content-Type received
        content_type: String,
    },

    /// No usable answer; treat as a page
    Unknown,
}

/// Builds the HTTP client used for probing
///
/// # Example
///
/// ```no_run
/// use sumi_shutter::config::UserAgentConfig;
/// use sumi_shutter::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues HEAD requests to classify URLs
#[derive(Debug, Clone)]
pub struct ContentProbe {
    client: Client,
}

impl ContentProbe {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Classifies `url` by its Content-Type header
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                return ProbeResult::Unknown;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("HEAD {} returned {}", url, response.status());
            return ProbeResult::Unknown;
        }

        let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
        else {
            return ProbeResult::Unknown;
        };

        classify(&content_type)
    }
}

fn classify(content_type: &str) -> ProbeResult {
    let mime = content_type.split(';').next().unwrap_or("").trim();

    if mime.is_empty() {
        ProbeResult::Unknown
    } else if HTML_TYPES.contains(&mime) {
        ProbeResult::Html
    } else {
        ProbeResult::NotHtml {
            content_type: content_type.to_string(),
        }
    }
}
