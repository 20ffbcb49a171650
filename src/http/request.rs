//! Request inspection.
//!
//! # Responsibilities
//! - Reconstruct the caller's URL (scheme, host, port, path, query)
//! - Extract routing-relevant information (host, path)
//!
//! # Design Decisions
//! - An absolute request URI wins over the Host header
//! - Scheme falls back to the edge's X-Forwarded-Proto, then `http`
//! - Hostname is lowercased once here so matchers never allocate

use axum::http::header::{HeaderMap, HOST};
use axum::http::uri::{Authority, Uri};

use crate::routing::RequestTarget;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The URL the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUrl {
    /// Scheme without colon.
    pub scheme: String,
    /// Lowercase hostname without port; empty if the caller sent none.
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
}

impl InboundUrl {
    /// Rebuild the caller's URL from the request line and headers.
    pub fn from_request(uri: &Uri, headers: &HeaderMap) -> Self {
        let authority = uri.authority().cloned().or_else(|| {
            headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| Authority::try_from(h.trim()).ok())
        });

        let scheme = uri
            .scheme_str()
            .map(str::to_string)
            .or_else(|| {
                headers
                    .get("x-forwarded-proto")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim().to_ascii_lowercase())
                    .filter(|v| v == "http" || v == "https")
            })
            .unwrap_or_else(|| "http".to_string());

        let (host, port) = match &authority {
            Some(a) => (
                a.host().trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase(),
                a.port_u16(),
            ),
            None => (String::new(), None),
        };

        let path = match uri.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        Self {
            scheme,
            host,
            port,
            path,
            query: uri.query().map(str::to_string),
        }
    }

    /// Explicit port, or the scheme's default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or(match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        })
    }

    /// View used by the routing matchers.
    pub fn routing_target(&self) -> RequestTarget<'_> {
        RequestTarget {
            host: &self.host,
            path: &self.path,
        }
    }
}
