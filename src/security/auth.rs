//! Capability checks in front of proxied routes.
//!
//! The gateway asks an [`Authenticator`] whether a matched request may be
//! forwarded before any outbound request is built.

use std::fmt;
use std::sync::Arc;

use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use crate::config::{AuthConfig, EnvMap};

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    /// Rejected, with a short reason safe to show the caller.
    Deny(String),
}

/// Decides whether a request may reach its target.
pub trait Authenticator: Send + Sync + fmt::Debug {
    fn authorize(&self, request: &Parts) -> AuthDecision;
}

/// Lets everything through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authorize(&self, _request: &Parts) -> AuthDecision {
        AuthDecision::Allow
    }
}

/// Requires a shared secret in a query parameter.
#[derive(Clone)]
pub struct QueryTokenAuth {
    param: String,
    token: String,
}

impl QueryTokenAuth {
    pub fn new(param: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for QueryTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryTokenAuth")
            .field("param", &self.param)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Authenticator for QueryTokenAuth {
    fn authorize(&self, request: &Parts) -> AuthDecision {
        let query = request.uri.query().unwrap_or("");
        let supplied = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == self.param.as_str())
            .map(|(_, value)| value.into_owned());

        match supplied {
            Some(value) if bool::from(value.as_bytes().ct_eq(self.token.as_bytes())) => {
                AuthDecision::Allow
            }
            _ => AuthDecision::Deny("Unauthorized: Missing or invalid token.".to_string()),
        }
    }
}

/// Token gating is active only when a token is configured.
pub fn from_config(config: &AuthConfig, env: &EnvMap) -> Arc<dyn Authenticator> {
    let token = config
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| env.get(&config.token_env).map(str::to_string));

    match token {
        Some(token) => {
            tracing::info!(param = %config.query_param, "Proxy token gating enabled");
            Arc::new(QueryTokenAuth::new(config.query_param.clone(), token))
        }
        None => Arc::new(AllowAll),
    }
}
