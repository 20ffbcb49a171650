use axum::http::header::{HeaderValue, LOCATION};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use url::Url;

use crate::config::{RedirectPolicy, ServiceConfig};
use crate::http::request::InboundUrl;
use crate::http::response;
use crate::routing::{HostMatcher, Matcher, RequestTarget};

#[derive(Serialize)]
struct ServiceInfo<'a> {
    message: &'a str,
    environment: &'a str,
    routes: &'a [String],
    #[serde(rename = "frontendUrl", skip_serializing_if = "Option::is_none")]
    frontend_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Serialize)]
struct InvalidFrontend<'a> {
    error: &'static str,
    detail: &'a str,
}

/// Endpoints the gateway answers itself on its control hosts.
#[derive(Debug)]
pub struct ServiceEndpoints {
    hosts: Vec<HostMatcher>,
    name: String,
    environment: String,
    /// Parse failures are kept and reported per request.
    frontend: Option<Result<Url, String>>,
    redirect_policy: RedirectPolicy,
    routes: Vec<String>,
}

impl ServiceEndpoints {
    /// `None` when no control host is configured.
    pub fn from_config(config: &ServiceConfig, routes: Vec<String>) -> Option<Self> {
        if config.hosts.is_empty() {
            return None;
        }

        let frontend = config
            .frontend_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(|u| Url::parse(u.trim()).map_err(|e| e.to_string()));
        if let Some(Err(e)) = &frontend {
            tracing::warn!(error = %e, "Configured frontend URL is invalid");
        }

        Some(Self {
            hosts: config.hosts.iter().map(HostMatcher::new).collect(),
            name: config.name.clone(),
            environment: config.environment.clone(),
            frontend,
            redirect_policy: config.redirect_policy,
            routes,
        })
    }

    fn is_control_host(&self, host: &str) -> bool {
        let target = RequestTarget { host, path: "/" };
        self.hosts.iter().any(|m| m.matches(&target))
    }

    /// Answer the request if it addresses a built-in endpoint.
    pub fn respond(&self, method: &Method, inbound: &InboundUrl) -> Option<Response> {
        if method != Method::GET || !self.is_control_host(&inbound.host) {
            return None;
        }

        match inbound.path.as_str() {
            "/" => Some(self.root(inbound)),
            "/health" => Some(response::json(
                StatusCode::OK,
                &HealthStatus {
                    status: "ok",
                    timestamp: None,
                },
            )),
            "/healthcheck" => Some(response::json(
                StatusCode::OK,
                &HealthStatus {
                    status: "ok",
                    timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
                },
            )),
            "/favicon.ico" => Some(response::empty(StatusCode::NO_CONTENT)),
            _ => None,
        }
    }

    fn root(&self, inbound: &InboundUrl) -> Response {
        let destination = match &self.frontend {
            None => return self.info(None, None),
            Some(Err(detail)) => {
                return response::json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &InvalidFrontend {
                        error: "Invalid frontend URL provided",
                        detail,
                    },
                )
            }
            Some(Ok(url)) => url,
        };

        if self.redirect_policy == RedirectPolicy::SkipSameTarget && is_same_target(destination, inbound) {
            return self.info(
                Some(destination.as_str()),
                Some("Skipped redirect because the target matches the current request host."),
            );
        }

        redirect(destination)
    }

    fn info(&self, frontend_url: Option<&str>, note: Option<&str>) -> Response {
        response::json(
            StatusCode::OK,
            &ServiceInfo {
                message: &self.name,
                environment: &self.environment,
                routes: &self.routes,
                frontend_url,
                note,
            },
        )
    }
}

fn redirect(destination: &Url) -> Response {
    let mut response = response::empty(StatusCode::FOUND);
    match HeaderValue::from_str(destination.as_str()) {
        Ok(location) => {
            response.headers_mut().insert(LOCATION, location);
            response
        }
        Err(_) => response::error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid frontend URL provided"),
    }
}

/// Same host, port, scheme and path, ignoring trailing slashes.
fn is_same_target(destination: &Url, inbound: &InboundUrl) -> bool {
    fn normalize(path: &str) -> &str {
        match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        }
    }

    destination
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case(&inbound.host))
        && destination.port_or_known_default() == inbound.effective_port()
        && destination.scheme() == inbound.scheme
        && normalize(destination.path()) == normalize(&inbound.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(frontend_url: Option<&str>, policy: RedirectPolicy) -> ServiceConfig {
        ServiceConfig {
            hosts: vec!["gw.example.org".into(), "*.workers.dev".into()],
            frontend_url: frontend_url.map(Into::into),
            redirect_policy: policy,
            ..Default::default()
        }
    }

    fn endpoints(frontend_url: Option<&str>, policy: RedirectPolicy) -> ServiceEndpoints {
        ServiceEndpoints::from_config(&config(frontend_url, policy), vec!["media".into()]).unwrap()
    }

    fn inbound(scheme: &str, host: &str, path: &str) -> InboundUrl {
        InboundUrl {
            scheme: scheme.into(),
            host: host.into(),
            port: None,
            path: path.into(),
            query: None,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_disabled_without_hosts() {
        assert!(ServiceEndpoints::from_config(&ServiceConfig::default(), Vec::new()).is_none());
    }

    #[test]
    fn test_only_control_hosts_and_get() {
        let service = endpoints(None, RedirectPolicy::Always);
        assert!(service
            .respond(&Method::GET, &inbound("https", "nas.example.org", "/health"))
            .is_none());
        assert!(service
            .respond(&Method::POST, &inbound("https", "gw.example.org", "/health"))
            .is_none());
        assert!(service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/media"))
            .is_none());
        assert!(service
            .respond(&Method::GET, &inbound("https", "edge.workers.dev", "/health"))
            .is_some());
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let service = endpoints(None, RedirectPolicy::Always);

        let health = service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/health"))
            .unwrap();
        assert_eq!(body_json(health).await, serde_json::json!({ "status": "ok" }));

        let check = service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/healthcheck"))
            .unwrap();
        let body = body_json(check).await;
        assert_eq!(body["status"], "ok");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

        let favicon = service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/favicon.ico"))
            .unwrap();
        assert_eq!(favicon.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_root_without_frontend_is_info() {
        let service = endpoints(None, RedirectPolicy::SkipSameTarget);
        let response = service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/"))
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "SkyRoute Gateway");
        assert_eq!(body["environment"], "production");
        assert_eq!(body["routes"], serde_json::json!(["media"]));
    }

    #[test]
    fn test_root_redirects_to_frontend() {
        let service = endpoints(Some("https://www.example.org/app"), RedirectPolicy::SkipSameTarget);
        let response = service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/"))
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "https://www.example.org/app");
    }

    #[tokio::test]
    async fn test_redirect_to_self_is_skipped() {
        let service = endpoints(Some("https://gw.example.org/"), RedirectPolicy::SkipSameTarget);
        let response = service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/"))
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["frontendUrl"], "https://gw.example.org/");
        assert!(body["note"].as_str().unwrap().contains("Skipped redirect"));

        // Scheme differs, so it is not the same target
        let response = service
            .respond(&Method::GET, &inbound("http", "gw.example.org", "/"))
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);

        let always = endpoints(Some("https://gw.example.org/"), RedirectPolicy::Always);
        let response = always
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/"))
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_invalid_frontend_url() {
        let service = endpoints(Some("not a url"), RedirectPolicy::Always);
        let response = service
            .respond(&Method::GET, &inbound("https", "gw.example.org", "/"))
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid frontend URL provided");
        assert!(body["detail"].is_string());
    }

    #[test]
    fn test_same_target_ignores_trailing_slash_and_default_port() {
        let url = Url::parse("https://gw.example.org:443/app/").unwrap();
        let mut same = inbound("https", "gw.example.org", "/app");
        assert!(is_same_target(&url, &same));
        same.port = Some(8443);
        assert!(!is_same_target(&url, &same));
    }
}
