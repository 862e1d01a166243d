use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use proxscan_core::{
    Association, Config, MockPlatform, RawScanResult, ScanConfig, ScanCoordinator, WifiPlatform,
};
use proxscan_server::api::create_router;
use proxscan_server::state::AppState;
use serde_json::Value;

fn build_server(platform: &Arc<MockPlatform>) -> TestServer {
    let config = Config {
        scan: ScanConfig {
            wait_timeout_secs: 1,
        },
        ..Config::default()
    };
    let coordinator =
        ScanCoordinator::new(Arc::clone(platform) as Arc<dyn WifiPlatform>, &config.scan);
    platform.attach(coordinator.sink());

    let state = AppState::from_parts(config, coordinator).shared();
    TestServer::new(create_router(state)).unwrap()
}

fn scripted_platform() -> Arc<MockPlatform> {
    let platform = Arc::new(MockPlatform::new());
    platform.set_association(Some(Association::new("aa:bb:cc:00:00:01", "home")));
    platform.deliver_on_scan(
        vec![
            RawScanResult::new("aa:bb:cc:00:00:01", "home"),
            RawScanResult::new("aa:bb:cc:00:00:02", "cafe"),
        ],
        Duration::from_millis(20),
    );
    platform
}

#[tokio::test]
async fn health_reports_ok() {
    let server = build_server(&scripted_platform());

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn first_call_is_answered_from_association() {
    let platform = scripted_platform();
    let server = build_server(&platform);

    let body: Value = server.get("/api/networks?fresh=true").await.json();
    let networks = body["networks"].as_array().unwrap();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0]["BSSID"], "aa:bb:cc:00:00:01");
    assert_eq!(networks[0]["attached"], true);
    assert_eq!(platform.scan_calls(), 0);
}

#[tokio::test]
async fn fresh_scan_returns_delivered_networks_once() {
    let platform = scripted_platform();
    let server = build_server(&platform);
    server.get("/api/networks").await.assert_status_ok();

    let body: Value = server.get("/api/networks?fresh=true").await.json();
    assert_eq!(body["fresh"], true);
    let networks = body["networks"].as_array().unwrap();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[0]["attached"], true);
    assert_eq!(networks[1]["BSSID"], "aa:bb:cc:00:00:02");
    assert_eq!(networks[1]["SSID"], "cafe");
    assert_eq!(networks[1]["attached"], false);
    assert_eq!(platform.scan_calls(), 1);

    // Consumed: only the association is left.
    let body: Value = server.get("/api/networks").await.json();
    assert_eq!(body["networks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn radio_off_lists_nothing() {
    let platform = scripted_platform();
    platform.set_radio_enabled(false);
    let server = build_server(&platform);

    let body: Value = server.get("/api/networks?fresh=true").await.json();
    assert!(body["networks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn proximity_report_and_acknowledgement() {
    let platform = scripted_platform();
    let server = build_server(&platform);
    server.get("/api/networks").await.assert_status_ok();

    let response = server.post("/api/proximity/ack").await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "nothing_to_acknowledge");

    let body: Value = server.get("/api/proximity?fresh=true").await.json();
    assert_eq!(body["changed"], true);
    let aps = body["message"]["proximity"]["wifiaps"].as_array().unwrap();
    assert_eq!(aps.len(), 2);

    server.post("/api/proximity/ack").await.assert_status_ok();

    let body: Value = server.get("/api/proximity?fresh=true").await.json();
    assert_eq!(body["changed"], false);
}

#[tokio::test]
async fn proximity_without_networks_has_no_message() {
    let platform = Arc::new(MockPlatform::new());
    let server = build_server(&platform);

    let body: Value = server.get("/api/proximity").await.json();
    assert!(body["message"].is_null());
    server
        .post("/api/proximity/ack")
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let server = build_server(&scripted_platform());

    let response = server.get("/api/nope").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = build_server(&scripted_platform());

    let body: Value = server.get("/api/openapi.json").await.json();
    assert!(body["paths"]["/api/networks"].is_object());
    assert!(body["paths"]["/api/proximity/ack"].is_object());
}
