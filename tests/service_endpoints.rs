//! Built-in endpoints and the comment API over a real socket.

use reqwest::header::{CACHE_CONTROL, HOST, LOCATION};
use reqwest::StatusCode;
use serde_json::{json, Value};
use skyroute_gateway::comments::KvStore;
use skyroute_gateway::config::{EnvMap, GatewayConfig, RedirectPolicy, RouteConfig};

mod common;

fn control_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.service.hosts = vec!["127.0.0.1".into()];
    config.service.environment = "staging".into();
    config.comments.enabled = true;
    config
}

#[tokio::test]
async fn test_health_endpoints() {
    let gateway = common::spawn_gateway(control_config(), EnvMap::new()).await;
    let client = common::client();

    let res = client.get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "ok" }));

    let res = client.get(gateway.url("/healthcheck")).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

    let res = client.get(gateway.url("/favicon.ico")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_endpoints_only_on_control_hosts() {
    let backend = common::start_mock_backend("from nas").await;
    let mut config = control_config();
    config.routes.push(RouteConfig {
        name: "nas".into(),
        host: Some("nas.example.org".into()),
        target_host: Some(backend.ip().to_string()),
        target_port: Some(backend.port()),
        ..Default::default()
    });
    let gateway = common::spawn_gateway(config, EnvMap::new()).await;

    let res = common::client()
        .get(gateway.url("/health"))
        .header(HOST, "nas.example.org")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "from nas");
}

#[tokio::test]
async fn test_root_info_and_redirect() {
    let gateway = common::spawn_gateway(control_config(), EnvMap::new()).await;
    let res = common::client().get(gateway.url("/")).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "SkyRoute Gateway");
    assert_eq!(body["environment"], "staging");

    let mut config = control_config();
    config.service.frontend_url = Some("https://www.example.org/".into());
    let gateway = common::spawn_gateway(config, EnvMap::new()).await;
    let res = common::client().get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "https://www.example.org/");
}

#[tokio::test]
async fn test_redirect_loop_is_skipped() {
    let mut config = control_config();
    // Points at the gateway itself once the port is known
    config.service.redirect_policy = RedirectPolicy::SkipSameTarget;
    let gateway = common::spawn_gateway(config.clone(), EnvMap::new()).await;
    config.service.frontend_url = Some(format!("http://127.0.0.1:{}/", gateway.addr.port()));
    gateway.reload(config).await;

    let res = common::client().get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["note"].as_str().unwrap().contains("Skipped redirect"));
}

#[tokio::test]
async fn test_comment_round_trip() {
    let gateway = common::spawn_gateway(control_config(), EnvMap::new()).await;
    let client = common::client();

    let res = client
        .post(gateway.url("/api/comments"))
        .json(&json!({ "postId": "taipei-101", "author": "Jackie", "content": "Great flight!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()[CACHE_CONTROL], "no-store");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let created: Value = res.json().await.unwrap();
    let id = created["comment"]["id"].as_str().unwrap().to_string();

    let keys = gateway.store.list("comments:taipei-101:", 10).await.unwrap();
    assert_eq!(keys, vec![format!("comments:taipei-101:{}", id)]);

    let res = client
        .get(gateway.url("/api/comments?postId=taipei-101"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Value = res.json().await.unwrap();
    assert_eq!(listed["postId"], "taipei-101");
    assert_eq!(listed["comments"][0]["id"], id.as_str());
    assert_eq!(listed["comments"][0]["author"], "Jackie");
}

#[tokio::test]
async fn test_comment_validation_over_http() {
    let gateway = common::spawn_gateway(control_config(), EnvMap::new()).await;
    let client = common::client();

    let res = client.get(gateway.url("/api/comments")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(gateway.url("/api/comments"))
        .header("content-type", "application/json")
        .body("{")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON payload.");

    let res = client
        .post(gateway.url("/api/comments"))
        .json(&json!({ "postId": "p", "content": "x".repeat(2001) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
