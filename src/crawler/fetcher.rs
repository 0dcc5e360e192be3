//! Page fetch strategies
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Direct fetching with manual redirect handling
//! - Fetching through a JavaScript rendering proxy
//! - Error classification into HTTP status codes

use crate::config::CrawlConfig;
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Maximum redirect hops followed for one page
pub const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Redirect error: {0}")]
    Redirect(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Redirected to already visited {0}")]
    AlreadyVisited(String),
}

impl FetchError {
    /// HTTP status to record for this failure
    ///
    /// Status errors carry their real code and timeouts are 408; anything
    /// else is inferred from the error message, 0 when unknown.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::HttpStatus { status, .. } => *status,
            Self::Timeout(_) => 408,
            other => infer_status_code(&other.to_string()),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

static STATUS_PATTERNS: Lazy<Vec<(Regex, u16)>> = Lazy::new(|| {
    [
        (r"(?i)\b404\b|not found", 404),
        (r"(?i)\b403\b|forbidden", 403),
        (r"(?i)\b500\b|internal server error", 500),
        (r"(?i)\b408\b|timeout|timed out", 408),
    ]
    .into_iter()
    .filter_map(|(pattern, status)| Regex::new(pattern).ok().map(|regex| (regex, status)))
    .collect()
});

/// Best-effort HTTP status inference from an error message
///
/// # Examples
///
/// ```
/// use sumi_harvest::crawler::infer_status_code;
///
/// assert_eq!(infer_status_code("server said: Not Found"), 404);
/// assert_eq!(infer_status_code("operation timed out"), 408);
/// assert_eq!(infer_status_code("connection refused"), 0);
/// ```
pub fn infer_status_code(message: &str) -> u16 {
    STATUS_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(message))
        .map_or(0, |(_, status)| *status)
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the content was served from, after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value, if present
    pub content_type: Option<String>,

    /// Page body
    pub body: String,
}

/// Tells a fetcher whether the crawl has already visited a URL
pub type VisitedCheck<'a> = dyn Fn(&Url) -> bool + Send + Sync + 'a;

/// A strategy for turning a URL into page HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page
    ///
    /// A redirect hop onto a URL `visited` reports as seen ends the fetch
    /// with [`FetchError::AlreadyVisited`] before that URL is requested.
    async fn fetch(&self, url: &Url, visited: &VisitedCheck) -> Result<FetchedPage, FetchError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Builds an HTTP client with the configured user agent and timeout
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `redirect` - Redirect policy for the client
pub fn build_http_client(config: &CrawlConfig, redirect: Policy) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Direct HTTP fetching
///
/// # Request Flow
///
/// 1. Send GET request
/// 2. Handle redirects manually (max 10 hops)
///    - Track visited URLs to detect loops
///    - Stop before a hop onto a URL the crawl already visited
///    - Any 3xx is a failure when redirects are disabled
/// 3. Non-2xx responses are failures
/// 4. A Content-Type other than HTML/XHTML is a failure
pub struct HttpFetcher {
    client: Client,
    follow_redirects: bool,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, Policy::none())?,
            follow_redirects: config.follow_redirects,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, visited: &VisitedCheck) -> Result<FetchedPage, FetchError> {
        let mut current = url.clone();
        let mut seen = HashSet::from([current.to_string()]);

        for _ in 0..=MAX_REDIRECTS {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                if !self.follow_redirects {
                    return Err(FetchError::HttpStatus {
                        status: status.as_u16(),
                        url: current.to_string(),
                    });
                }

                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        FetchError::Redirect(format!("{} from {} without Location", status, current))
                    })?;
                let next = current.join(location).map_err(|e| {
                    FetchError::Redirect(format!("invalid Location '{}': {}", location, e))
                })?;

                if !seen.insert(next.to_string()) {
                    return Err(FetchError::Redirect(format!("redirect loop at {}", next)));
                }
                if visited(&next) {
                    return Err(FetchError::AlreadyVisited(next.to_string()));
                }

                debug!("{} redirected ({}) to {}", current, status.as_u16(), next);
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                    url: current.to_string(),
                });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            if let Some(ct) = &content_type {
                if !is_html(ct) {
                    return Err(FetchError::UnsupportedContentType(ct.clone()));
                }
            }

            let body = response.text().await?;
            return Ok(FetchedPage {
                final_url: current,
                status: status.as_u16(),
                content_type,
                body,
            });
        }

        Err(FetchError::Redirect(format!(
            "more than {} redirects starting at {}",
            MAX_REDIRECTS, url
        )))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Fetching through a JavaScript rendering proxy
///
/// Sends `GET <endpoint>?api_key=<key>&url=<page>&render_js=true` and treats
/// the proxied body as the page HTML.
pub struct RenderProxyFetcher {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl RenderProxyFetcher {
    pub fn new(config: &CrawlConfig, endpoint: Url, api_key: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, Policy::limited(MAX_REDIRECTS))?,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl PageFetcher for RenderProxyFetcher {
    async fn fetch(&self, url: &Url, _visited: &VisitedCheck) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("url", url.as_str()),
                ("render_js", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(FetchedPage {
            final_url: url.clone(),
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "render-proxy"
    }
}

/// Picks the fetch strategy the configuration asks for
pub fn build_fetcher(config: &CrawlConfig) -> Result<Box<dyn PageFetcher>, HarvestError> {
    if !config.use_render_proxy {
        return Ok(Box::new(HttpFetcher::new(config)?));
    }

    let endpoint = config.render_proxy_url.as_deref().ok_or_else(|| {
        ConfigError::Validation("render proxy enabled but no render-proxy-url set".to_string())
    })?;
    let endpoint = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("render-proxy-url '{}': {}", endpoint, e)))?;
    let api_key = config.render_proxy_key.clone().ok_or_else(|| {
        ConfigError::Validation("render proxy enabled but no API key set".to_string())
    })?;

    Ok(Box::new(RenderProxyFetcher::new(config, endpoint, api_key)?))
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_status_code() {
        assert_eq!(infer_status_code("HTTP 404"), 404);
        assert_eq!(infer_status_code("page not found"), 404);
        assert_eq!(infer_status_code("403 Forbidden"), 403);
        assert_eq!(infer_status_code("Internal Server Error"), 500);
        assert_eq!(infer_status_code("request timeout"), 408);
        assert_eq!(infer_status_code("dns error"), 0);
    }

    #[test]
    fn test_infer_ignores_embedded_digits() {
        assert_eq!(infer_status_code("connect to 127.0.0.1:40400 refused"), 0);
    }

    #[test]
    fn test_fetch_error_status_codes() {
        let err = FetchError::HttpStatus {
            status: 503,
            url: "https://example.com/".to_string(),
        };
        assert_eq!(err.status_code(), 503);
        assert_eq!(FetchError::Timeout("slow".to_string()).status_code(), 408);
        assert_eq!(
            FetchError::Network("connection refused".to_string()).status_code(),
            0
        );
        assert_eq!(
            FetchError::UnsupportedContentType("application/pdf".to_string()).status_code(),
            0
        );
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("Application/XHTML+XML"));
        assert!(!is_html("application/pdf"));
        assert!(!is_html("text/plain"));
    }

    #[test]
    fn test_build_fetcher_strategies() {
        let config = CrawlConfig::new("https://example.com/");
        assert_eq!(build_fetcher(&config).unwrap().name(), "http");

        let mut config = CrawlConfig::new("https://example.com/");
        config.use_render_proxy = true;
        assert!(build_fetcher(&config).is_err());

        config.render_proxy_url = Some("https://render.example.net/api".to_string());
        config.render_proxy_key = Some("key".to_string());
        assert_eq!(build_fetcher(&config).unwrap().name(), "render-proxy");
    }

    #[test]
    fn test_every_status_pattern_compiles() {
        assert_eq!(STATUS_PATTERNS.len(), 4);
    }
}
