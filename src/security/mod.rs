//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request:
//!     → auth.rs (capability check, e.g. shared token)
//!     → headers.rs (strip edge headers, add X-Forwarded-*)
//!     → Forward to target
//!
//! Every response:
//!     → headers.rs (hardened headers on relayed responses)
//!     → cors.rs (CORS headers on everything)
//! ```
//!
//! # Design Decisions
//! - Header values are parsed once at construction, never per request
//! - Fail closed: an authenticator rejection stops the request before
//!   any outbound request is built

pub mod auth;
pub mod cors;
pub mod headers;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

pub use auth::{AllowAll, AuthDecision, Authenticator, QueryTokenAuth};
pub use cors::CorsPolicy;
pub use headers::{ForwardContext, SecurityHeaders};

/// A configured header value that isn't valid on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for header {name}: {value:?}")]
pub struct InvalidHeader {
    pub name: String,
    pub value: String,
}

/// Fixed headers written onto responses, overwriting existing values.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header; fails if the value contains forbidden bytes.
    pub fn push(&mut self, name: HeaderName, value: &str) -> Result<(), InvalidHeader> {
        let parsed = HeaderValue::from_str(value).map_err(|_| InvalidHeader {
            name: name.to_string(),
            value: value.to_string(),
        })?;
        self.entries.push((name, parsed));
        Ok(())
    }

    /// Overwrite every header in the set.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.entries {
            headers.insert(name.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
