use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted for the render proxy API key
pub const RENDER_PROXY_KEY_ENV: &str = "SUMI_HARVEST_RENDER_PROXY_KEY";

/// URL globs excluded from every crawl unless overridden
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/*.pdf",
    "**/*.jpg",
    "**/*.jpeg",
    "**/*.png",
    "**/*.gif",
    "**/*.svg",
    "**/*.webp",
    "**/*.ico",
    "**/*.css",
    "**/*.js",
    "**/*.zip",
    "**/*.gz",
    "**/*.tar",
    "**/*.mp3",
    "**/*.mp4",
    "**/*.avi",
    "**/*.mov",
    "**/*.woff",
    "**/*.woff2",
    "**/*.ttf",
    "**/*.eot",
    "**/*.xml",
    "**/*.json",
];

/// Crawl configuration
///
/// Resolved once before a crawl starts and never mutated afterwards. The
/// resolved value is written into the crawl manifest so a resumed crawl runs
/// with exactly the same settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// URL the crawl starts from; its host becomes the crawl domain
    #[serde(default)]
    pub seed_url: String,

    /// Maximum number of successfully fetched pages
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum link depth from the seed (seed is depth 0)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Minimum time between requests (milliseconds)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// URL globs a page must match (when non-empty) to be crawled
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// URL globs that are never crawled; checked before includes
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Whether robots.txt rules and crawl-delay are enforced
    #[serde(default = "default_true")]
    pub respect_robots: bool,

    /// Whether HTTP redirects are followed
    #[serde(default = "default_true")]
    pub follow_redirects: bool,

    /// Root directory for `<domain>/<timestamp>/` crawl folders
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// User agent sent on every request and matched against robots.txt
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fetch pages through the rendering proxy instead of direct HTTP
    #[serde(default)]
    pub use_render_proxy: bool,

    /// Endpoint of the rendering proxy service
    #[serde(default)]
    pub render_proxy_url: Option<String>,

    /// API key for the rendering proxy; never persisted
    #[serde(default, skip_serializing)]
    pub render_proxy_key: Option<String>,

    /// Number of processed pages between checkpoints
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u32,
}

impl CrawlConfig {
    /// Creates a configuration with default settings for the given seed
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            ..Self::default()
        }
    }

    /// Configured politeness delay
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Configured per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            delay_ms: default_delay_ms(),
            include_patterns: Vec::new(),
            exclude_patterns: default_exclude_patterns(),
            respect_robots: true,
            follow_redirects: true,
            output_dir: default_output_dir(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            use_render_proxy: false,
            render_proxy_url: None,
            render_proxy_key: None,
            checkpoint_interval: default_checkpoint_interval(),
        }
    }
}

fn default_max_pages() -> u32 {
    50
}

fn default_max_depth() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_exclude_patterns() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./crawls")
}

fn default_user_agent() -> String {
    format!(
        "SumiHarvest/{} (+https://github.com/sumi-harvest)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_checkpoint_interval() -> u32 {
    10
}
