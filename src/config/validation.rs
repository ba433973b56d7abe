use crate::config::types::{
    BrowserConfig, Config, CrawlerConfig, OutputConfig, ThumbnailConfig, UserAgentConfig,
};
use crate::ConfigError;

/// Longest per-page navigation timeout accepted (seconds)
const MAX_NAVIGATION_TIMEOUT: u64 = 600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_browser_config(&config.browser)?;
    validate_thumbnail_config(&config.thumbnail)?;
    validate_output_config(&config.output)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_page_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "max_page_limit must be >= 1, got {}",
            config.max_page_limit
        )));
    }

    if config.default_page_limit < 1 || config.default_page_limit > config.max_page_limit {
        return Err(ConfigError::Validation(format!(
            "default_page_limit must be between 1 and {}, got {}",
            config.max_page_limit, config.default_page_limit
        )));
    }

    if config.navigation_timeout < 1 || config.navigation_timeout > MAX_NAVIGATION_TIMEOUT {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout must be between 1 and {}s, got {}s",
            MAX_NAVIGATION_TIMEOUT, config.navigation_timeout
        )));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.viewport_width < 1 || config.viewport_height < 1 {
        return Err(ConfigError::Validation(format!(
            "viewport must be at least 1x1, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    if let Some(path) = &config.chrome_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates thumbnail configuration
fn validate_thumbnail_config(config: &ThumbnailConfig) -> Result<(), ConfigError> {
    if config.width < 1 || config.height < 1 {
        return Err(ConfigError::Validation(format!(
            "thumbnail box must be at least 1x1, got {}x{}",
            config.width, config.height
        )));
    }

    if config.quality < 1 || config.quality > 100 {
        return Err(ConfigError::Validation(format!(
            "thumbnail quality must be between 1 and 100, got {}",
            config.quality
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.screenshots_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "screenshots_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user agent name cannot be empty".to_string(),
        ));
    }

    if !config.name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "user agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    Ok(())
}
