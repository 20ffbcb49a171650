//! Responses produced by the gateway itself.
//!
//! # Responsibilities
//! - JSON bodies with a consistent content type
//! - Uniform `{"error": "..."}` bodies for every gateway error
//!
//! # Design Decisions
//! - Error bodies carry a short message only, never internal details
//! - CORS headers are added later, once, for every response

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serialize `body` as compact JSON.
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    encode(status, serde_json::to_vec(body))
}

/// Serialize `body` as two-space indented JSON.
pub fn json_pretty<T: Serialize>(status: StatusCode, body: &T) -> Response {
    encode(status, serde_json::to_vec_pretty(body))
}

fn encode(status: StatusCode, bytes: serde_json::Result<Vec<u8>>) -> Response {
    match bytes {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Body of every gateway-produced error.
#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// `{"error": message}` with the given status.
pub fn error(status: StatusCode, message: &str) -> Response {
    json(status, &ErrorBody { error: message })
}

/// Bodiless response.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body() {
        let response = error(StatusCode::NOT_FOUND, "Not Found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"error":"Not Found"}"#);
    }

    #[tokio::test]
    async fn test_pretty_json() {
        let response = json_pretty(StatusCode::CREATED, &serde_json::json!({ "a": 1 }));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), "{\n  \"a\": 1\n}");
    }
}
