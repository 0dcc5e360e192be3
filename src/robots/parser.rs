//! Robots.txt parser implementation
//!
//! Parses robots.txt content into ordered user-agent groups and answers
//! permission and crawl-delay queries against them. Parsing never fails:
//! lines that cannot be understood are skipped.

use crate::url::path_and_query;
use regex::Regex;
use url::Url;

/// A single Allow/Disallow rule with its precompiled matcher
#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    matcher: Regex,
    /// Length of the pattern with wildcards and the end anchor removed
    specificity: usize,
}

impl Rule {
    fn new(pattern: &str, allow: bool) -> Option<Self> {
        let pattern = encode_non_ascii(pattern);
        let matcher = Regex::new(&pattern_to_regex(&pattern)).ok()?;
        let specificity = pattern.chars().filter(|c| *c != '*' && *c != '$').count();
        Some(Self {
            allow,
            matcher,
            specificity,
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

/// Converts a robots.txt path pattern into an anchored regex
///
/// `*` matches any run of characters and a trailing `$` anchors the end of
/// the path. Every other character is literal.
fn pattern_to_regex(pattern: &str) -> String {
    let (body, anchored) = match pattern.strip_suffix('$') {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    let mut regex = String::with_capacity(body.len() + 4);
    regex.push('^');
    for c in body.chars() {
        if c == '*' {
            regex.push_str(".*");
        } else {
            regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    if anchored {
        regex.push('$');
    }
    regex
}

/// One user-agent group: its tokens, rules in file order and crawl delay
#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<f64>,
}

impl Group {
    fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.crawl_delay.is_none()
    }
}

/// Parsed robots.txt policy
///
/// Built once per crawl (and again on resume) and queried for every
/// dequeued URL.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    groups: Vec<Group>,
    sitemaps: Vec<String>,
}

impl RobotsPolicy {
    /// Parses raw robots.txt content
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_harvest::RobotsPolicy;
    ///
    /// let robots = RobotsPolicy::parse("User-agent: *\nDisallow: /private");
    /// assert!(!robots.is_allowed("/private/x", "MyBot"));
    /// assert!(robots.is_allowed("/public", "MyBot"));
    /// ```
    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut sitemaps = Vec::new();

        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                "user-agent" => {
                    let agent = value.to_lowercase();
                    match groups.last_mut() {
                        // Consecutive User-agent lines share the rules that follow
                        Some(group) if group.is_empty() => group.agents.push(agent),
                        _ => groups.push(Group {
                            agents: vec![agent],
                            ..Group::default()
                        }),
                    }
                }
                "allow" | "disallow" => {
                    if let Some(group) = groups.last_mut() {
                        if let Some(rule) = Rule::new(value, key == "allow") {
                            group.rules.push(rule);
                        }
                    }
                }
                "crawl-delay" => {
                    if let Some(group) = groups.last_mut() {
                        if let Ok(delay) = value.parse::<f64>() {
                            if delay.is_finite() && delay >= 0.0 {
                                group.crawl_delay = Some(delay);
                            }
                        }
                    }
                }
                "sitemap" => sitemaps.push(value.to_string()),
                _ => {}
            }
        }

        Self { groups, sitemaps }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is used when robots.txt is disabled, missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Sitemap URLs declared in the file, in order
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - A full URL or a path (e.g., "/page.html?x=1")
    /// * `user_agent` - The user agent string
    ///
    /// # Returns
    ///
    /// * `true` - If no rule forbids the path
    /// * `false` - If the most specific matching rule is a Disallow
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        let Some(group) = self.select_group(user_agent) else {
            return true;
        };

        let path = request_path(url);
        let mut best: Option<&Rule> = None;
        for rule in group.rules.iter().filter(|r| r.matches(&path)) {
            best = match best {
                None => Some(rule),
                Some(current) if rule.specificity > current.specificity => Some(rule),
                Some(current) if rule.specificity == current.specificity && rule.allow => {
                    Some(rule)
                }
                keep => keep,
            };
        }

        best.map_or(true, |rule| rule.allow)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If the selected group declares no crawl delay
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.select_group(user_agent)?.crawl_delay
    }

    /// Picks the group governing `user_agent`
    ///
    /// Exact token match first, then the longest declared token contained in
    /// the agent string, then the `*` group.
    fn select_group(&self, user_agent: &str) -> Option<&Group> {
        let agent = user_agent.trim().to_lowercase();

        if let Some(group) = self
            .groups
            .iter()
            .find(|g| g.agents.iter().any(|a| *a == agent))
        {
            return Some(group);
        }

        let mut best: Option<(&Group, usize)> = None;
        for group in &self.groups {
            for token in group.agents.iter().filter(|a| a.as_str() != "*") {
                if agent.contains(token.as_str())
                    && best.map_or(true, |(_, len)| token.len() > len)
                {
                    best = Some((group, token.len()));
                }
            }
        }
        if let Some((group, _)) = best {
            return Some(group);
        }

        self.groups
            .iter()
            .find(|g| g.agents.iter().any(|a| a == "*"))
    }
}

/// Reduces a URL or bare path to the `path + query` form rules match against
fn request_path(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        return path_and_query(&parsed);
    }

    let path = encode_non_ascii(url);
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

/// Percent-encodes non-ASCII characters the way URL paths carry them
///
/// Rules and request paths are compared in this form, so `/café` in a rule
/// matches the `/caf%C3%A9` a parsed URL yields.
fn encode_non_ascii(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            encoded.push(c);
        } else {
            for byte in c.encode_utf8(&mut [0; 4]).bytes() {
                encoded.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    encoded
}
