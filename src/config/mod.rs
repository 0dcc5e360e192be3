//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating crawl configuration.
//! Configuration comes from an optional TOML file (kebab-case keys) and is
//! usually overridden by command line flags before being validated.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::{load_config, validate};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! validate(&config).unwrap();
//! println!("Crawler will fetch at most {} pages", config.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CrawlConfig, DEFAULT_EXCLUDE_PATTERNS, RENDER_PROXY_KEY_ENV};

// Re-export parser and validation functions
pub use parser::{apply_env, load_and_validate, load_config, parse_config};
pub use validation::validate;
