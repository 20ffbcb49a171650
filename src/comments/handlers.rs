use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{HeaderValue, ALLOW, CACHE_CONTROL};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::comments::model::{CommentCreated, CommentList, CommentPayload};
use crate::comments::service::{CommentError, CommentService};
use crate::comments::store::KvStore;
use crate::config::CommentsConfig;
use crate::http::request::InboundUrl;
use crate::http::response::{self, ErrorBody};
use crate::routing::{HostMatcher, Matcher};

/// HTTP surface of the comment service.
#[derive(Clone)]
pub struct CommentsApi {
    service: CommentService,
    path: String,
    hosts: Vec<HostMatcher>,
    max_body_size: usize,
}

impl CommentsApi {
    /// `None` unless comments are enabled.
    pub fn from_config(
        config: &CommentsConfig,
        store: Arc<dyn KvStore>,
        max_body_size: usize,
    ) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        Some(Self {
            service: CommentService::new(store, config),
            path: config.path.clone(),
            hosts: config.hosts.iter().map(HostMatcher::new).collect(),
            max_body_size,
        })
    }

    /// Whether the request addresses the API.
    pub fn matches(&self, inbound: &InboundUrl) -> bool {
        if inbound.path != self.path {
            return false;
        }
        let target = inbound.routing_target();
        self.hosts.is_empty() || self.hosts.iter().any(|m| m.matches(&target))
    }

    pub async fn handle(&self, request: Request<Body>, inbound: &InboundUrl) -> Response {
        let method = request.method().clone();
        let result = if method == Method::GET {
            self.get(inbound).await
        } else if method == Method::POST {
            self.post(request).await
        } else {
            Err(CommentError::MethodNotAllowed)
        };

        match result {
            Ok(response) => response,
            Err(err) => {
                if let CommentError::Storage(e) = &err {
                    tracing::error!(error = %e, "Comment storage failed");
                }
                let mut response = reply(err.status(), &ErrorBody { error: &err.to_string() });
                if matches!(err, CommentError::MethodNotAllowed) {
                    response
                        .headers_mut()
                        .insert(ALLOW, HeaderValue::from_static("GET, POST, OPTIONS"));
                }
                response
            }
        }
    }

    async fn get(&self, inbound: &InboundUrl) -> Result<Response, CommentError> {
        let post_id = inbound
            .query
            .as_deref()
            .and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(key, _)| key == "postId")
                    .map(|(_, value)| value.into_owned())
            })
            .filter(|id| !id.is_empty())
            .ok_or(CommentError::MissingPostId)?;

        let comments = self.service.list(&post_id).await?;
        Ok(reply(
            StatusCode::OK,
            &CommentList {
                post_id: &post_id,
                comments: &comments,
            },
        ))
    }

    async fn post(&self, request: Request<Body>) -> Result<Response, CommentError> {
        let bytes = axum::body::to_bytes(request.into_body(), self.max_body_size)
            .await
            .map_err(|_| CommentError::PayloadTooLarge)?;
        let payload: CommentPayload =
            serde_json::from_slice(&bytes).map_err(|_| CommentError::InvalidJson)?;

        let comment = self.service.create(payload).await?;
        Ok(reply(
            StatusCode::CREATED,
            &CommentCreated {
                post_id: &comment.post_id,
                comment: &comment,
            },
        ))
    }
}

/// Pretty JSON that must never be cached.
fn reply<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let mut response = response::json_pretty(status, body);
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::store::MemoryKv;
    use axum::http::header::CONTENT_TYPE;

    fn api(hosts: Vec<String>) -> CommentsApi {
        let config = CommentsConfig {
            enabled: true,
            hosts,
            ..Default::default()
        };
        CommentsApi::from_config(&config, Arc::new(MemoryKv::new()), 1024).unwrap()
    }

    fn inbound(host: &str, path: &str, query: Option<&str>) -> InboundUrl {
        InboundUrl {
            scheme: "https".into(),
            host: host.into(),
            port: None,
            path: path.into(),
            query: query.map(Into::into),
        }
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/comments")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_disabled_by_default() {
        let api = CommentsApi::from_config(&CommentsConfig::default(), Arc::new(MemoryKv::new()), 1024);
        assert!(api.is_none());
    }

    #[test]
    fn test_matches_path_and_hosts() {
        let open = api(Vec::new());
        assert!(open.matches(&inbound("any.example.org", "/api/comments", None)));
        assert!(!open.matches(&inbound("any.example.org", "/api/comments/x", None)));

        let restricted = api(vec!["blog.example.org".into()]);
        assert!(restricted.matches(&inbound("blog.example.org", "/api/comments", None)));
        assert!(!restricted.matches(&inbound("nas.example.org", "/api/comments", None)));
    }

    #[tokio::test]
    async fn test_post_then_get() {
        let api = api(Vec::new());
        let at = inbound("blog.example.org", "/api/comments", None);

        let created = api
            .handle(post(r#"{"postId":"p1","author":"Ann","content":"Nice shot"}"#), &at)
            .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(created.headers()[CACHE_CONTROL], "no-store");
        assert_eq!(created.headers()[CONTENT_TYPE], response::JSON_CONTENT_TYPE);
        let body = body_json(created).await;
        assert_eq!(body["postId"], "p1");
        assert_eq!(body["comment"]["author"], "Ann");

        let query = inbound("blog.example.org", "/api/comments", Some("postId=p1"));
        let request = Request::builder().uri("/api/comments?postId=p1").body(Body::empty()).unwrap();
        let listed = api.handle(request, &query).await;
        assert_eq!(listed.status(), StatusCode::OK);
        let body = body_json(listed).await;
        assert_eq!(body["postId"], "p1");
        assert_eq!(body["comments"].as_array().unwrap().len(), 1);
        assert_eq!(body["comments"][0]["content"], "Nice shot");
    }

    #[tokio::test]
    async fn test_error_responses() {
        let api = api(Vec::new());
        let at = inbound("blog.example.org", "/api/comments", None);

        let missing = api
            .handle(Request::builder().body(Body::empty()).unwrap(), &at)
            .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.headers()[CACHE_CONTROL], "no-store");
        assert_eq!(body_json(missing).await["error"], "Missing \"postId\" query parameter.");

        let invalid = api.handle(post("{not json"), &at).await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(invalid).await["error"], "Invalid JSON payload.");

        let short = api
            .handle(post(r#"{"postId":"p1","author":"J","content":"hi"}"#), &at)
            .await;
        assert_eq!(short.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let too_big = api.handle(post(&"x".repeat(2048)), &at).await;
        assert_eq!(too_big.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let delete = api
            .handle(
                Request::builder().method(Method::DELETE).body(Body::empty()).unwrap(),
                &at,
            )
            .await;
        assert_eq!(delete.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(delete.headers()[ALLOW], "GET, POST, OPTIONS");
    }
}
