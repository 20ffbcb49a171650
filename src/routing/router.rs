//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile route configs into immutable rules, resolving targets from env
//! - Look up the matching rule for a request
//! - Return matched rule or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Host rules always checked before path-prefix rules
//! - Within a kind: higher priority first, then config order
//! - Explicit None rather than silent default

use crate::config::{EnvMap, RouteConfig};
use crate::config::validation::is_supported_protocol;
use crate::routing::matcher::{HostMatcher, Matcher, PathPrefixMatcher, RequestTarget};

/// Which predicate a rule matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Host,
    PathPrefix,
}

/// Internal service a rule forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Hostname, possibly with an embedded port.
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Lowercase scheme without the trailing colon.
    pub protocol: String,
    pub require_port: bool,
}

impl Target {
    /// Names of the settings that must be fixed before this target is usable.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("host");
        }
        if self.require_port && self.port.is_none() {
            missing.push("port");
        }
        if !is_supported_protocol(&self.protocol) {
            missing.push("protocol");
        }
        missing
    }

    /// Hostname without any embedded port. IPv6 literals come back bracketed.
    pub fn hostname(&self) -> Option<String> {
        self.host.as_deref().map(|h| split_host_port(h).0)
    }

    /// Port to connect on: the explicit one, else one embedded in the host.
    pub fn effective_port(&self) -> Option<u16> {
        self.port
            .or_else(|| self.host.as_deref().and_then(|h| split_host_port(h).1))
    }
}

/// Split `name:port`, `[v6]:port` or a bare IPv6 literal into host and port.
fn split_host_port(host: &str) -> (String, Option<u16>) {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((addr, after)) => (
                format!("[{addr}]"),
                after.strip_prefix(':').and_then(|p| p.parse().ok()),
            ),
            None => (host.to_string(), None),
        };
    }

    match host.split_once(':') {
        Some((name, port)) if !port.contains(':') => match port.parse() {
            Ok(port) => (name.to_string(), Some(port)),
            Err(_) => (host.to_string(), None),
        },
        // More than one colon: unbracketed IPv6
        Some(_) => (format!("[{host}]"), None),
        None => (host.to_string(), None),
    }
}

/// A compiled route rule.
#[derive(Debug)]
pub struct RouteRule {
    pub name: String,
    pub kind: MatchKind,
    pub priority: u32,
    /// Base path removed from the front of the request path (`/` = none).
    pub strip_prefix: String,
    pub target: Target,
    matcher: Box<dyn Matcher>,
}

impl RouteRule {
    /// Compile a route config, filling target gaps from the environment.
    pub fn compile(config: &RouteConfig, env: &EnvMap) -> Self {
        let (kind, matcher, default_strip): (MatchKind, Box<dyn Matcher>, String) =
            match (&config.host, &config.path_prefix) {
                (Some(host), _) if !host.is_empty() => {
                    (MatchKind::Host, Box::new(HostMatcher::new(host.clone())), "/".into())
                }
                (_, Some(prefix)) => (
                    MatchKind::PathPrefix,
                    Box::new(PathPrefixMatcher::new(prefix.clone())),
                    prefix.clone(),
                ),
                // Rejected by validation
                _ => (MatchKind::PathPrefix, Box::new(NeverMatcher), "/".into()),
            };

        Self {
            name: config.name.clone(),
            kind,
            priority: config.priority,
            strip_prefix: config.strip_prefix.clone().unwrap_or(default_strip),
            target: resolve_target(config, env),
            matcher,
        }
    }

    pub fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.matcher.matches(target)
    }
}

/// Environment values (`<PREFIX>_HOST`, `_PORT`, `_PROTO`) win over the file.
fn resolve_target(config: &RouteConfig, env: &EnvMap) -> Target {
    let mut host = config.target_host.clone().filter(|h| !h.is_empty());
    let mut port = config.target_port;
    let mut protocol = config.target_protocol.clone();

    if let Some(prefix) = &config.env_prefix {
        if let Some(value) = env.get(&format!("{prefix}_HOST")) {
            host = Some(value.to_string());
        }
        if let Some(value) = env.get(&format!("{prefix}_PORT")) {
            match value.parse::<u16>() {
                Ok(p) => port = Some(p),
                Err(_) => {
                    tracing::warn!(route = %config.name, value = %value, "Ignoring invalid port from environment");
                }
            }
        }
        if let Some(value) = env.get(&format!("{prefix}_PROTO")) {
            protocol = Some(value.to_string());
        }
    }

    Target {
        host,
        port,
        protocol: protocol
            .map(|p| p.trim_end_matches(':').to_ascii_lowercase())
            .unwrap_or_else(|| "http".to_string()),
        require_port: config.require_port,
    }
}

#[derive(Debug)]
struct NeverMatcher;

impl Matcher for NeverMatcher {
    fn matches(&self, _target: &RequestTarget<'_>) -> bool {
        false
    }
}

/// Immutable rule table.
#[derive(Debug, Default)]
pub struct Router {
    host_rules: Vec<RouteRule>,
    prefix_rules: Vec<RouteRule>,
}

impl Router {
    /// Compile the configured routes.
    pub fn from_config(routes: &[RouteConfig], env: &EnvMap) -> Self {
        let (mut host_rules, mut prefix_rules): (Vec<_>, Vec<_>) = routes
            .iter()
            .map(|r| RouteRule::compile(r, env))
            .partition(|r| r.kind == MatchKind::Host);

        // Stable sort keeps config order among equal priorities
        host_rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        prefix_rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self {
            host_rules,
            prefix_rules,
        }
    }

    /// Find the rule for a request. Host rules shadow prefix rules.
    pub fn match_request(&self, target: &RequestTarget<'_>) -> Option<&RouteRule> {
        self.host_rules
            .iter()
            .chain(self.prefix_rules.iter())
            .find(|rule| rule.matches(target))
    }

    /// Rule names in evaluation order.
    pub fn route_names(&self) -> Vec<&str> {
        self.host_rules
            .iter()
            .chain(self.prefix_rules.iter())
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.host_rules.len() + self.prefix_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
