//! Header manipulation and security headers.
//!
//! # Responsibilities
//! - Strip edge-injected and hop-by-hop headers before forwarding
//! - Add Host, X-Forwarded-For, X-Real-IP, X-Forwarded-Proto, X-Forwarded-Host
//! - Overwrite hardened security headers on relayed responses
//!
//! # Design Decisions
//! - The client IP is read before stripping, since the edge header carrying
//!   it is itself stripped
//! - X-Forwarded-For is appended to, never replaced, if a value survives
//!   stripping

use std::net::SocketAddr;

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_SECURITY_POLICY, HOST,
    REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};

use crate::config::{ForwardingConfig, SecurityConfig};
use crate::security::{HeaderSet, InvalidHeader};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// Connection-scoped headers that must not cross the proxy.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Per-request facts needed to rewrite headers.
#[derive(Debug, Clone)]
pub struct ForwardContext<'a> {
    /// Value for the outbound Host header.
    pub target_host: &'a str,
    pub client_ip: Option<String>,
    /// Scheme the caller used, without colon.
    pub inbound_scheme: &'a str,
    /// Hostname the caller used.
    pub inbound_host: &'a str,
}

/// Pre-parsed request rewriting rules.
#[derive(Debug, Clone)]
pub struct RequestRewriter {
    strip: Vec<HeaderName>,
    client_ip_header: Option<HeaderName>,
    fallback_to_peer_addr: bool,
}

impl RequestRewriter {
    pub fn from_config(config: &ForwardingConfig) -> Self {
        let strip = config
            .strip_headers
            .iter()
            .filter_map(|name| match HeaderName::try_from(name.as_str()) {
                Ok(h) => Some(h),
                Err(_) => {
                    tracing::warn!(header = %name, "Ignoring invalid header name in strip list");
                    None
                }
            })
            .collect();

        Self {
            strip,
            client_ip_header: HeaderName::try_from(config.client_ip_header.as_str()).ok(),
            fallback_to_peer_addr: config.fallback_to_peer_addr,
        }
    }

    /// Original client IP: the edge header if present, else the socket peer.
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        let from_header = self
            .client_ip_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        from_header.or_else(|| {
            if self.fallback_to_peer_addr {
                peer.map(|addr| addr.ip().to_string())
            } else {
                None
            }
        })
    }

    /// Build the outbound header map from the inbound one.
    pub fn rewrite(&self, inbound: &HeaderMap, ctx: &ForwardContext<'_>) -> HeaderMap {
        let mut headers = inbound.clone();

        for name in &self.strip {
            headers.remove(name);
        }
        strip_hop_by_hop(&mut headers);
        // The transport computes the length of the body it actually sends
        headers.remove(CONTENT_LENGTH);

        set_str(&mut headers, HOST, ctx.target_host);

        if let Some(ip) = &ctx.client_ip {
            let forwarded = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
                Some(existing) if !existing.trim().is_empty() => format!("{}, {}", existing, ip),
                _ => ip.clone(),
            };
            set_str(&mut headers, X_FORWARDED_FOR, &forwarded);
            set_str(&mut headers, X_REAL_IP, ip);
        }

        set_str(&mut headers, X_FORWARDED_PROTO, ctx.inbound_scheme);
        set_str(&mut headers, X_FORWARDED_HOST, ctx.inbound_host);

        headers
    }
}

fn set_str(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => tracing::warn!(header = %name, "Dropping header with invalid value"),
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(axum::http::header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Hardened headers overwritten on relayed responses.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    headers: HeaderSet,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, InvalidHeader> {
        let mut headers = HeaderSet::new();
        if config.enable_headers {
            headers.push(X_FRAME_OPTIONS, &config.frame_options)?;
            headers.push(X_CONTENT_TYPE_OPTIONS, &config.content_type_options)?;
            headers.push(REFERRER_POLICY, &config.referrer_policy)?;
            headers.push(PERMISSIONS_POLICY, &config.permissions_policy)?;
            if let Some(hsts) = &config.hsts {
                headers.push(STRICT_TRANSPORT_SECURITY, hsts)?;
            }
            if let Some(csp) = &config.content_security_policy {
                headers.push(CONTENT_SECURITY_POLICY, csp)?;
            }
        }
        Ok(Self { headers })
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        self.headers.apply(headers);
    }
}
