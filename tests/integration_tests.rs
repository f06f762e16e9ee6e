// Integration tests: HTTP routes, auth middleware, degraded-daemon behavior

use axum_test::TestServer;
use dockgate::auth::{StaticTokenVerifier, TokenVerifier};
use dockgate::config::AppConfig;
use dockgate::docker::DockerClient;
use dockgate::routes;
use dockgate::service::DockerService;
use std::sync::Arc;

const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[auth]
api_token = "test-token"

[streaming]
channel_capacity = 8
send_timeout_secs = 5
ping_interval_secs = 30

[logs]
default_tail = 50
"#;

fn test_app() -> axum::Router {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    let client = Arc::new(DockerClient::new());
    let service = Arc::new(DockerService::new(client));
    let verifier: Arc<dyn TokenVerifier> = Arc::new(StaticTokenVerifier::new("test-token"));
    routes::app(service, verifier, config)
}

#[tokio::test]
async fn test_healthz_always_answers() {
    let server = TestServer::new(test_app());
    let response = server.get("/healthz").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
    assert!(json.get("docker_connected").and_then(|v| v.as_bool()).is_some());
}

#[tokio::test]
async fn test_version_endpoint_reports_build_info() {
    let server = TestServer::new(test_app());
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json.get("name").and_then(|v| v.as_str()), Some("dockgate"));
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_containers_requires_bearer_token() {
    let server = TestServer::new(test_app());
    let response = server.get("/containers").await;
    response.assert_status_unauthorized();
    let json: serde_json::Value = response.json();
    assert_eq!(
        json.get("detail").and_then(|v| v.as_str()),
        Some("Invalid token")
    );
}

#[tokio::test]
async fn test_containers_rejects_wrong_token() {
    let server = TestServer::new(test_app());
    let response = server
        .get("/containers")
        .authorization_bearer("wrong-token")
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_containers_with_token_passes_auth() {
    let server = TestServer::new(test_app());
    let response = server
        .get("/containers")
        .authorization_bearer("test-token")
        .await;
    // 200 with a daemon, 503 without one; either way auth passed.
    let status = response.status_code().as_u16();
    assert!(status == 200 || status == 503, "unexpected status {status}");
}

#[tokio::test]
async fn test_unknown_container_is_404_or_503() {
    let server = TestServer::new(test_app());
    let response = server
        .get("/containers/dockgate-test-no-such-container")
        .authorization_bearer("test-token")
        .await;
    let status = response.status_code().as_u16();
    assert!(status == 404 || status == 503, "unexpected status {status}");
    let json: serde_json::Value = response.json();
    assert!(json.get("detail").is_some());
}

#[tokio::test]
async fn test_system_info_requires_token_too() {
    let server = TestServer::new(test_app());
    let response = server.get("/system/info").await;
    response.assert_status_unauthorized();
}

// --- WebSocket handshake tests (require http_transport + ws feature) ---
// Rejections happen before the upgrade, so a failed handshake carries a
// proper HTTP status instead of a close frame.

/// Build TestServer with http_transport (required for WebSocket tests).
fn test_server_with_http() -> TestServer {
    TestServer::builder().http_transport().build(test_app())
}

#[tokio::test]
async fn test_ws_stats_rejects_bad_token_before_upgrade() {
    let server = test_server_with_http();
    let response = server
        .get_websocket("/stats/ws/some-container")
        .add_query_param("token", "wrong-token")
        .expect_failure()
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_ws_events_rejects_missing_token_before_upgrade() {
    let server = test_server_with_http();
    let response = server.get_websocket("/events/ws").expect_failure().await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_ws_logs_unknown_target_rejected_before_upgrade() {
    let server = test_server_with_http();
    let response = server
        .get_websocket("/logs/ws/dockgate-test-no-such-container")
        .add_query_param("token", "test-token")
        .expect_failure()
        .await;
    // 404 with a daemon, 503 without one; never an accepted upgrade.
    let status = response.status_code().as_u16();
    assert!(status == 404 || status == 503, "unexpected status {status}");
}
