//! The forwarding gateway.
//!
//! # Responsibilities
//! - Answer CORS preflights without touching any target
//! - Serve built-in endpoints and the comment API
//! - Match a route, check authorization and target settings
//! - Rewrite the request, relay the response, map failures to statuses
//!
//! # Design Decisions
//! - One `Gateway` per config generation; it is immutable and shared
//! - Every response leaves through `handle`, which attaches CORS headers
//! - No retries and no gateway-level timeout; the transport decides

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::comments::store::KvStore;
use crate::comments::CommentsApi;
use crate::config::{EnvMap, GatewayConfig};
use crate::http::request::InboundUrl;
use crate::http::response;
use crate::observability::metrics;
use crate::proxy::error::GatewayError;
use crate::proxy::rewrite::build_target_url;
use crate::proxy::upstream::{Upstream, UpstreamRequest};
use crate::routing::{RouteRule, Router};
use crate::security::headers::{strip_hop_by_hop, RequestRewriter};
use crate::security::{
    auth, AuthDecision, Authenticator, CorsPolicy, ForwardContext, InvalidHeader, SecurityHeaders,
};
use crate::service::ServiceEndpoints;

/// Failure to assemble a gateway from configuration.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Header(#[from] InvalidHeader),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Stateless request handler for one configuration generation.
pub struct Gateway {
    router: Router,
    upstream: Arc<dyn Upstream>,
    authenticator: Arc<dyn Authenticator>,
    rewriter: RequestRewriter,
    security_headers: SecurityHeaders,
    cors: CorsPolicy,
    service: Option<ServiceEndpoints>,
    comments: Option<CommentsApi>,
    max_body_size: usize,
}

impl Gateway {
    /// Compile `config` against `env`. The transport and comment store are
    /// passed in so they can outlive a config reload.
    pub fn new(
        config: &GatewayConfig,
        env: &EnvMap,
        upstream: Arc<dyn Upstream>,
        store: Arc<dyn KvStore>,
    ) -> Result<Self, BuildError> {
        let router = Router::from_config(&config.routes, env);
        let route_names = router.route_names().into_iter().map(str::to_string).collect();

        let gateway = Self {
            upstream,
            authenticator: auth::from_config(&config.auth, env),
            rewriter: RequestRewriter::from_config(&config.forwarding),
            security_headers: SecurityHeaders::from_config(&config.security)?,
            cors: CorsPolicy::from_config(&config.cors)?,
            service: ServiceEndpoints::from_config(&config.service, route_names),
            comments: CommentsApi::from_config(&config.comments, store, config.security.max_body_size),
            max_body_size: config.security.max_body_size,
            router,
        };

        tracing::info!(
            routes = gateway.router.len(),
            cors = gateway.cors.is_enabled(),
            service_endpoints = gateway.service.is_some(),
            comments = gateway.comments.is_some(),
            "Gateway configured"
        );
        Ok(gateway)
    }

    /// Replace the authenticator consulted before forwarding.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Handle one inbound request. Never fails; errors become responses.
    pub async fn handle(&self, request: Request<Body>, peer: Option<SocketAddr>) -> Response {
        let start_time = Instant::now();
        let method = request.method().clone();
        let inbound = InboundUrl::from_request(request.uri(), request.headers());

        let (mut response, route) = self.dispatch(request, &inbound, peer).await;
        self.cors.apply(response.headers_mut());

        let status = response.status();
        metrics::record_request(method.as_str(), status.as_u16(), &route, start_time);
        tracing::info!(
            method = %method,
            host = %inbound.host,
            path = %inbound.path,
            route = %route,
            status = status.as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Request handled"
        );

        response
    }

    async fn dispatch(
        &self,
        request: Request<Body>,
        inbound: &InboundUrl,
        peer: Option<SocketAddr>,
    ) -> (Response, String) {
        // 1. CORS preflight
        if request.method() == Method::OPTIONS {
            return (response::empty(StatusCode::NO_CONTENT), "preflight".into());
        }

        // 2. Built-in endpoints on control hosts
        if let Some(service) = &self.service {
            if let Some(response) = service.respond(request.method(), inbound) {
                return (response, "service".into());
            }
        }

        // 3. Comment API
        if let Some(comments) = &self.comments {
            if comments.matches(inbound) {
                return (comments.handle(request, inbound).await, "comments".into());
            }
        }

        // 4. Match Route
        let Some(rule) = self.router.match_request(&inbound.routing_target()) else {
            tracing::warn!(host = %inbound.host, path = %inbound.path, "No route matched");
            return (GatewayError::RouteNotFound.into_response(), "none".into());
        };

        let response = match self.proxy(rule, request, inbound, peer).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        };
        (response, rule.name.clone())
    }

    async fn proxy(
        &self,
        rule: &RouteRule,
        request: Request<Body>,
        inbound: &InboundUrl,
        peer: Option<SocketAddr>,
    ) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();

        // 5. Capability check
        if let AuthDecision::Deny(reason) = self.authenticator.authorize(&parts) {
            tracing::warn!(route = %rule.name, "Request rejected by authenticator");
            return Err(GatewayError::Unauthorized(reason));
        }

        // 6. Target must be fully configured
        let missing = rule.target.missing_settings();
        if !missing.is_empty() {
            tracing::error!(route = %rule.name, missing = ?missing, "Route target is not configured");
            return Err(GatewayError::Misconfigured {
                route: rule.name.clone(),
                missing,
            });
        }
        let url = build_target_url(inbound, &rule.target, &rule.strip_prefix).map_err(|e| {
            GatewayError::InvalidTarget {
                route: rule.name.clone(),
                reason: e.to_string(),
            }
        })?;
        let target_host = rule.target.hostname().unwrap_or_default();

        // 7. Rewrite and forward
        let body = if parts.method == Method::GET || parts.method == Method::HEAD {
            None
        } else {
            let bytes = axum::body::to_bytes(body, self.max_body_size)
                .await
                .map_err(|_| GatewayError::PayloadTooLarge {
                    limit: self.max_body_size,
                })?;
            Some(bytes)
        };

        let ctx = ForwardContext {
            target_host: &target_host,
            client_ip: self.rewriter.client_ip(&parts.headers, peer),
            inbound_scheme: &inbound.scheme,
            inbound_host: &inbound.host,
        };
        let headers = self.rewriter.rewrite(&parts.headers, &ctx);

        tracing::debug!(route = %rule.name, url = %url, "Forwarding request");

        let upstream_request = UpstreamRequest {
            method: parts.method,
            url,
            headers,
            body,
        };

        match self.upstream.send(upstream_request).await {
            Ok(mut response) => {
                strip_hop_by_hop(response.headers_mut());
                self.security_headers.apply(response.headers_mut());
                Ok(response)
            }
            Err(source) => {
                tracing::error!(route = %rule.name, target = %target_host, error = %source, "Upstream error");
                metrics::record_upstream_error(&rule.name);
                Err(GatewayError::Upstream {
                    target: target_host,
                    host: inbound.host.clone(),
                    source,
                })
            }
        }
    }
}
