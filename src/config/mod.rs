//! Configuration module for Sumi-Shutter
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional, so an empty file (or no file at all) yields
//! [`Config::default()`].
//!
//! # Example
//!
//! ```no_run
//! use sumi_shutter::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shutter.toml")).unwrap();
//! println!("Thumbnails are {}x{}", config.thumbnail.width, config.thumbnail.height);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    BrowserConfig, Config, CrawlerConfig, OutputConfig, ThumbnailConfig, UserAgentConfig,
    DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
