use crate::config::types::CrawlConfig;
use crate::url::GlobPattern;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_seed_url(&config.seed_url)?;
    validate_limits(config)?;
    validate_user_agent(&config.user_agent)?;
    validate_patterns(&config.include_patterns)?;
    validate_patterns(&config.exclude_patterns)?;
    validate_render_proxy(config)?;
    Ok(())
}

/// Validates the seed URL: present, absolute, HTTP(S) and with a host
fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    if seed.trim().is_empty() {
        return Err(ConfigError::Validation(
            "seed_url cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates numeric crawl bounds
fn validate_limits(config: &CrawlConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 and delay_ms >= 0 always hold for unsigned values

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 1, got {}",
            config.timeout_ms
        )));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    Ok(())
}

/// Validates the user agent string
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user_agent contains control characters: '{}'",
            user_agent.escape_debug()
        )));
    }

    Ok(())
}

/// Validates include/exclude globs
fn validate_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        if pattern.trim().is_empty() {
            return Err(ConfigError::InvalidPattern(
                "URL pattern cannot be empty".to_string(),
            ));
        }
        GlobPattern::new(pattern)?;
    }
    Ok(())
}

/// Validates render proxy settings when the proxy strategy is enabled
fn validate_render_proxy(config: &CrawlConfig) -> Result<(), ConfigError> {
    if !config.use_render_proxy {
        return Ok(());
    }

    let endpoint = config.render_proxy_url.as_deref().ok_or_else(|| {
        ConfigError::Validation("use_render_proxy requires render_proxy_url".to_string())
    })?;

    Url::parse(endpoint).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid render_proxy_url '{}': {}", endpoint, e))
    })?;

    if config
        .render_proxy_key
        .as_deref()
        .map_or(true, |k| k.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "use_render_proxy requires render_proxy_key".to_string(),
        ));
    }

    Ok(())
}
