//! Route matching logic.
//!
//! # Responsibilities
//! - Match request hostname (exact or `*.suffix`, case-insensitive)
//! - Match path prefix on segment boundaries (case-sensitive)
//!
//! # Design Decisions
//! - Host matching is case-insensitive, port ignored
//! - Path matching is case-sensitive
//! - `/media` matches `/media` and `/media/x`, never `/mediaserver`
//! - No regex to guarantee O(n) matching

/// The parts of an inbound request that routing looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestTarget<'a> {
    /// Hostname without port, lowercase.
    pub host: &'a str,
    pub path: &'a str,
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, target: &RequestTarget<'_>) -> bool;
}

/// Matches the request hostname.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    pattern: HostPattern,
}

#[derive(Debug, Clone)]
enum HostPattern {
    Exact(String),
    /// `*.example.org`, stored as `.example.org`.
    Suffix(String),
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into().to_lowercase();
        let pattern = match host.strip_prefix('*') {
            Some(suffix) if suffix.starts_with('.') => HostPattern::Suffix(suffix.to_string()),
            _ => HostPattern::Exact(host),
        };
        Self { pattern }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        let host = target.host;
        match &self.pattern {
            HostPattern::Exact(expected) => host.eq_ignore_ascii_case(expected),
            HostPattern::Suffix(suffix) => {
                host.len() > suffix.len()
                    && host.to_ascii_lowercase().ends_with(suffix.as_str())
            }
        }
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing slash is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: trimmed.to_string(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        // "/" (stored as "") matches everything
        if self.prefix.is_empty() {
            return true;
        }
        match target.path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
