//! Gateway error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response;
use crate::proxy::upstream::UpstreamError;

/// Every way the gateway answers a request without relaying a target response.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No rule matched. The caller must fix the URL.
    #[error("Not Found")]
    RouteNotFound,

    /// The authenticator rejected the request.
    #[error("{0}")]
    Unauthorized(String),

    /// A rule matched but its target can't be used. The operator must fix it.
    #[error("Configuration error: route '{route}' is missing target {}", .missing.join(", "))]
    Misconfigured {
        route: String,
        missing: Vec<&'static str>,
    },

    /// Target settings are present but don't form a valid URL.
    #[error("Configuration error: route '{route}' has an invalid target: {reason}")]
    InvalidTarget { route: String, reason: String },

    /// The request body could not be read within the size limit.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Network-level failure talking to the target. The caller may retry.
    #[error("Tunnel error connecting to {target} for {host}: {source}")]
    Upstream {
        target: String,
        host: String,
        #[source]
        source: UpstreamError,
    },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Misconfigured { .. } | GatewayError::InvalidTarget { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        response::error(self.status(), &self.to_string())
    }
}
