// Router-level tests for the home page, backed by the in-memory store

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::Arc;
use storeprobe_api::home::AppState;
use storeprobe_api::views::ViewRenderer;
use storeprobe_core::memory::InMemoryConnector;
use storeprobe_core::{BenchmarkRunner, ClientProfile, ProxyBypassList};
use tower::ServiceExt;

const TABLE: &str = "sc-test-1-session";

fn test_app(store: &InMemoryConnector) -> Router {
    let runner = BenchmarkRunner::new(
        Arc::new(store.clone()),
        TABLE,
        ProxyBypassList::defaults(),
    );
    let views = ViewRenderer::new().unwrap();
    storeprobe_api::app(AppState::new(runner, views))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_home_renders_after_benchmark() {
    let store = InMemoryConnector::new();
    let (status, body) = get(test_app(&store), "/?times=5").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>Home | Store Probe</title>"));
    assert!(body.contains(r#"<h1 class="govuk-heading-xl">Home</h1>"#));
    assert_eq!(store.read_count(), 40);
    assert_eq!(store.open_clients(), 0);
}

#[tokio::test]
async fn test_home_alias_route() {
    let store = InMemoryConnector::new();
    let (status, _) = get(test_app(&store), "/home?times=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.read_count(), 8);
}

#[tokio::test]
async fn test_default_times_is_100() {
    let store = InMemoryConnector::new();
    let (status, _) = get(test_app(&store), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.read_count(), 800);
}

#[tokio::test]
async fn test_zero_times_issues_no_reads() {
    let store = InMemoryConnector::new();
    let (status, _) = get(test_app(&store), "/?times=0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.read_count(), 0);
    // Clients are still connected once per profile per phase
    assert_eq!(store.connections().len(), 4);
}

#[tokio::test]
async fn test_invalid_times_rejected_before_any_read() {
    for uri in ["/?times=abc", "/?times=", "/?times=12x", "/?times=-1"] {
        let store = InMemoryConnector::new();
        let (status, body) = get(test_app(&store), uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "\"times\" must be a number");
        assert_eq!(store.read_count(), 0, "{}", uri);
        assert!(store.connections().is_empty(), "{}", uri);
    }
}

#[tokio::test]
async fn test_store_failure_returns_500() {
    let store = InMemoryConnector::failing_on_read(3);
    let (status, body) = get(test_app(&store), "/?times=2").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Internal server error");
    assert_eq!(store.read_count(), 3);
    assert_eq!(store.open_clients(), 0);
}

#[tokio::test]
async fn test_phases_use_their_own_bypass() {
    let store = InMemoryConnector::new();
    let (status, _) = get(test_app(&store), "/?times=1").await;
    assert_eq!(status, StatusCode::OK);

    let connections = store.connections();
    assert_eq!(connections.len(), 4);
    assert_eq!(connections[0].0, ClientProfile::Plain);
    assert_eq!(connections[1].0, ClientProfile::KeepAlive);
    assert_eq!(connections[0].1, ProxyBypassList::defaults());
    assert!(connections[2].1.is_empty());
    assert!(connections[3].1.is_empty());
}

#[tokio::test]
async fn test_health() {
    let store = InMemoryConnector::new();
    let (status, body) = get(test_app(&store), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(store.read_count(), 0);
}
