//! Crawler module for page discovery and capture
//!
//! This module contains the core crawling logic, including:
//! - The breadth-first frontier with dedup and domain scoping
//! - Link extraction from rendered HTML
//! - Content-Type probing before rendering
//! - The per-page capture pipeline
//! - The crawl loop tying them together

mod coordinator;
mod frontier;
mod parser;
mod pipeline;
mod probe;

pub use coordinator::{Coordinator, CrawlOutcome};
pub use frontier::{Frontier, FrontierEntry};
pub use parser::{parse_html, ParsedPage};
pub use pipeline::{CapturePipeline, PageFailure, PageOutcome};
pub use probe::{build_http_client, ContentProbe, ProbeResult};
