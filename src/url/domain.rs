use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host without a leading `www.`
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Checks whether two URLs belong to the same site
///
/// Hosts are compared case-insensitively and with any `www.` prefix removed,
/// so `https://www.example.com/` and `https://example.com/` are the same site.
/// Ports and schemes are ignored.
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(a), Some(b)) => strip_www(&a) == strip_www(&b),
        _ => false,
    }
}

/// Returns the path with its query string, the form robots.txt rules and
/// URL globs are matched against
pub fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_strip_www() {
        assert_eq!(strip_www("www.example.com"), "example.com");
        assert_eq!(strip_www("example.com"), "example.com");
        assert_eq!(strip_www("blog.example.com"), "blog.example.com");
    }

    #[test]
    fn test_same_site_ignores_www() {
        let a = Url::parse("https://www.example.com/a").unwrap();
        let b = Url::parse("https://example.com/b").unwrap();
        assert!(is_same_site(&a, &b));
    }

    #[test]
    fn test_subdomain_is_different_site() {
        let a = Url::parse("https://blog.example.com/").unwrap();
        let b = Url::parse("https://example.com/").unwrap();
        assert!(!is_same_site(&a, &b));
    }

    #[test]
    fn test_path_and_query() {
        let url = Url::parse("https://example.com/search?q=rust#top").unwrap();
        assert_eq!(path_and_query(&url), "/search?q=rust");

        let url = Url::parse("https://example.com").unwrap();
        assert_eq!(path_and_query(&url), "/");
    }
}
