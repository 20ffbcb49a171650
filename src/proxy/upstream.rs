//! Outbound transport.
//!
//! The gateway never talks to the network directly; it hands a fully
//! rewritten [`UpstreamRequest`] to an [`Upstream`] and relays whatever comes
//! back. Tests substitute a recording implementation.

use std::error::Error as _;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Response};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use url::Url;

use crate::config::{ForwardingConfig, TimeoutConfig};

/// A rewritten request ready to be sent to a target.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` for GET/HEAD.
    pub body: Option<Bytes>,
}

/// Network-level failure contacting a target.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's own message is generic; the useful part is in the sources
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        if err.is_timeout() {
            UpstreamError::Timeout(message)
        } else if err.is_connect() {
            UpstreamError::Connect(message)
        } else {
            UpstreamError::Transport(message)
        }
    }
}

/// Performs one HTTP round trip.
pub trait Upstream: Send + Sync {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<Response<Body>, UpstreamError>>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeouts: &TimeoutConfig, forwarding: &ForwardingConfig) -> Result<Self, reqwest::Error> {
        let redirect = if forwarding.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .redirect(redirect)
            // Targets live on the internal network
            .no_proxy()
            .build()?;

        Ok(Self { client })
    }
}

impl Upstream for HttpUpstream {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'_, Result<Response<Body>, UpstreamError>> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        Box::pin(async move {
            let upstream = builder.send().await?;

            let status = upstream.status();
            let headers = upstream.headers().clone();
            let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            Ok(response)
        })
    }
}
