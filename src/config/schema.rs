//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping requests to internal targets.
    pub routes: Vec<RouteConfig>,

    /// Request rewriting rules for forwarded traffic.
    pub forwarding: ForwardingConfig,

    /// CORS headers attached to every gateway response.
    pub cors: CorsConfig,

    /// Hardened response headers and body limits.
    pub security: SecurityConfig,

    /// Shared-secret gating of proxied routes.
    pub auth: AuthConfig,

    /// Built-in endpoints served on control hosts.
    pub service: ServiceConfig,

    /// Comment API backed by the key/value store.
    pub comments: CommentsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single route rule as written in the config file.
///
/// Exactly one of `host` and `path_prefix` must be set. Target fields may be
/// left empty and filled from the environment through `env_prefix`
/// (`<PREFIX>_HOST`, `<PREFIX>_PORT`, `<PREFIX>_PROTO`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Hostname to match (exact, case-insensitive).
    pub host: Option<String>,

    /// Path prefix to match (segment-aware).
    pub path_prefix: Option<String>,

    /// Route priority within its kind (higher = checked first).
    pub priority: u32,

    /// Base path removed before forwarding. Defaults to `path_prefix` for
    /// prefix routes and `/` for host routes.
    pub strip_prefix: Option<String>,

    /// Environment variable prefix used to resolve the target.
    pub env_prefix: Option<String>,

    /// Target hostname (may include a port).
    pub target_host: Option<String>,

    /// Target port.
    pub target_port: Option<u16>,

    /// Target protocol, `http` when unset.
    pub target_protocol: Option<String>,

    /// Whether a missing port is a configuration error.
    pub require_port: bool,
}

/// Request rewriting rules for forwarded traffic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Edge-injected headers removed before forwarding.
    pub strip_headers: Vec<String>,

    /// Header carrying the original client IP (read before stripping).
    pub client_ip_header: String,

    /// Use the socket peer address when the client IP header is absent.
    pub fallback_to_peer_addr: bool,

    /// Let the transport follow target-issued redirects.
    pub follow_redirects: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            strip_headers: [
                "cf-connecting-ip",
                "cf-ipcountry",
                "cf-ray",
                "cf-visitor",
                "cdn-loop",
                "x-forwarded-proto",
                "x-forwarded-for",
                "x-real-ip",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            client_ip_header: "cf-connecting-ip".to_string(),
            fallback_to_peer_addr: true,
            follow_redirects: true,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Attach CORS headers at all.
    pub enabled: bool,

    /// Value of `Access-Control-Allow-Origin`.
    pub allow_origin: String,

    /// Value of `Access-Control-Allow-Methods`.
    pub allow_methods: String,

    /// Value of `Access-Control-Allow-Headers`.
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Any origin may read responses. Restrict this for exposed deployments.
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization, X-Requested-With".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Overwrite security headers on relayed responses.
    pub enable_headers: bool,
    pub frame_options: String,
    pub content_type_options: String,
    pub referrer_policy: String,
    pub permissions_policy: String,
    /// `Strict-Transport-Security` value; not sent when unset.
    pub hsts: Option<String>,
    /// `Content-Security-Policy` value; not sent when unset.
    pub content_security_policy: Option<String>,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            frame_options: "SAMEORIGIN".to_string(),
            content_type_options: "nosniff".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            permissions_policy: "accelerometer=(), camera=(), microphone=()".to_string(),
            hsts: None,
            content_security_policy: None,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Shared-secret gating configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token compared against the query parameter. Overrides `token_env`.
    pub token: Option<String>,

    /// Environment variable holding the token.
    pub token_env: String,

    /// Query parameter carrying the caller's token.
    pub query_param: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: "PROXY_AUTH_TOKEN".to_string(),
            query_param: "token".to_string(),
        }
    }
}

/// What to do when the frontend URL points back at the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RedirectPolicy {
    /// Always redirect.
    Always,
    /// Answer with the info document instead of redirecting to itself.
    #[default]
    SkipSameTarget,
}

/// Built-in service endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Hostnames the endpoints answer on. `*.example.com` matches by suffix.
    pub hosts: Vec<String>,

    /// Name reported by the info document.
    pub name: String,

    /// Deployment environment label.
    pub environment: String,

    /// Where `GET /` redirects to, if anywhere.
    pub frontend_url: Option<String>,

    pub redirect_policy: RedirectPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            name: "SkyRoute Gateway".to_string(),
            environment: "production".to_string(),
            frontend_url: None,
            redirect_policy: RedirectPolicy::default(),
        }
    }
}

/// Comment API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enabled: bool,

    /// Request path of the API.
    pub path: String,

    /// Hostnames the API answers on; empty means every host.
    pub hosts: Vec<String>,

    /// Lifetime of a stored comment in seconds.
    pub ttl_secs: u64,

    /// Maximum content length in characters.
    pub max_content_chars: usize,

    /// Maximum number of keys read per listing.
    pub list_limit: usize,

    /// JSON snapshot loaded at startup and written on shutdown.
    pub persistence_path: Option<String>,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "/api/comments".to_string(),
            hosts: Vec::new(),
            ttl_secs: 60 * 60 * 24 * 30, // 30 days
            max_content_chars: 2000,
            list_limit: 1000,
            persistence_path: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
