//! Robots.txt handling module
//!
//! This module provides functionality for fetching and parsing robots.txt
//! files. A site's robots.txt is fetched once per crawl run and consulted for
//! every dequeued URL.

mod parser;

pub use parser::RobotsPolicy;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Upper bound on the robots.txt request timeout
const ROBOTS_TIMEOUT_CAP: Duration = Duration::from_secs(10);

/// Fetches and parses robots.txt for a crawl origin
///
/// Any failure (network error, timeout, non-2xx status, unreadable body)
/// yields a fully permissive policy rather than an error.
///
/// # Arguments
///
/// * `client` - HTTP client to use
/// * `origin` - Any URL on the site; only its scheme, host and port are used
/// * `user_agent` - The user agent string to send
/// * `timeout` - Request timeout, capped at ten seconds
pub async fn fetch_robots(
    client: &Client,
    origin: &Url,
    user_agent: &str,
    timeout: Duration,
) -> RobotsPolicy {
    let robots_url = match origin.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot build robots.txt URL for {}: {}", origin, e);
            return RobotsPolicy::allow_all();
        }
    };

    debug!("Fetching {}", robots_url);

    let response = client
        .get(robots_url.clone())
        .header(reqwest::header::USER_AGENT, user_agent)
        .timeout(timeout.min(ROBOTS_TIMEOUT_CAP))
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to fetch {}: {}, allowing all", robots_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(
            "{} returned HTTP {}, allowing all",
            robots_url,
            response.status().as_u16()
        );
        return RobotsPolicy::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let policy = RobotsPolicy::parse(&body);
            debug!(
                "Parsed {} ({} sitemaps declared)",
                robots_url,
                policy.sitemaps().len()
            );
            policy
        }
        Err(e) => {
            warn!("Failed to read {}: {}, allowing all", robots_url, e);
            RobotsPolicy::allow_all()
        }
    }
}
