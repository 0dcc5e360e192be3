use crate::config::types::{CrawlConfig, RENDER_PROXY_KEY_ENV};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Keys are kebab-case and every key except `seed-url` has a default, so a
/// minimal file may contain nothing but the seed. The seed itself may also be
/// supplied later (for example from the command line), which is why this
/// function does not validate; call [`validate`] once the configuration is
/// fully resolved.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Max pages: {}", config.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<CrawlConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text
pub fn parse_config(content: &str) -> Result<CrawlConfig, ConfigError> {
    let mut config: CrawlConfig = toml::from_str(content)?;
    apply_env(&mut config);
    Ok(config)
}

/// Loads a configuration file and validates it
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Loaded configuration that is ready to crawl with
/// * `Err(ConfigError)` - Failed to load, parse, or validate
pub fn load_and_validate(path: &Path) -> Result<CrawlConfig, ConfigError> {
    let config = load_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Fills settings that may come from the environment
///
/// Only the render proxy key is read from the environment, and only when the
/// file did not set one.
pub fn apply_env(config: &mut CrawlConfig) {
    if config.render_proxy_key.is_none() {
        if let Ok(key) = std::env::var(RENDER_PROXY_KEY_ENV) {
            if !key.trim().is_empty() {
                config.render_proxy_key = Some(key.trim().to_string());
            }
        }
    }
}
