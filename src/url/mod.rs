//! URL handling module for Sumi-Harvest
//!
//! This module provides URL normalization, domain helpers, and the glob
//! matching used by include/exclude filters.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, is_same_site, path_and_query, strip_www};
pub use matcher::{GlobPattern, UrlFilter};
pub use normalize::{normalize_parsed, normalize_url};
