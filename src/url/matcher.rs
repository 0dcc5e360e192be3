use crate::url::domain::path_and_query;
use crate::ConfigError;
use regex::{Regex, RegexBuilder};
use url::Url;

/// A compiled URL glob
///
/// Glob syntax:
/// - `**` matches any run of characters, including `/`
/// - `*` matches any run of characters except `/`
/// - `?` matches a single character except `/`
/// - every other character matches itself
///
/// Matching is case-insensitive and anchored at both ends.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compiles a glob
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_harvest::url::GlobPattern;
    ///
    /// let pattern = GlobPattern::new("/blog/*").unwrap();
    /// assert!(pattern.is_match("/blog/hello"));
    /// assert!(!pattern.is_match("/blog/2024/hello"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Returns the glob as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Tests a candidate string against the glob
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Tests a URL against the glob, using both its path+query and its full form
    pub fn matches_url(&self, url: &Url) -> bool {
        self.is_match(&path_and_query(url)) || self.is_match(url.as_str())
    }
}

/// Translates glob syntax into an anchored regular expression
fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    regex.push_str(".*");
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    regex.push('$');
    regex
}

/// Include/exclude URL filter
///
/// Exclusions are checked first and always win. When any include globs are
/// configured a URL must match at least one of them.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    include: Vec<GlobPattern>,
    exclude: Vec<GlobPattern>,
}

impl UrlFilter {
    /// Compiles include and exclude globs into a filter
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: include
                .iter()
                .map(|p| GlobPattern::new(p))
                .collect::<Result<_, _>>()?,
            exclude: exclude
                .iter()
                .map(|p| GlobPattern::new(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Checks whether the URL passes the filter
    pub fn allows(&self, url: &Url) -> bool {
        if self.exclude.iter().any(|p| p.matches_url(url)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|p| p.matches_url(url))
    }
}
