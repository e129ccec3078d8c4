//! Tests for health check endpoints.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storeBackend"], "memory");
    assert_eq!(body["storeConnected"], true);
    assert!(
        body["metrics"].get("viewsTracked").is_some(),
        "Response should carry a metrics snapshot"
    );
}

/// Metrics in /health reflect tracked traffic.
#[tokio::test]
async fn test_health_reports_metrics() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;

    ctx.server
        .post("/api/analytics/track/view")
        .json(&fixtures::track_view(
            version["id"].as_str().unwrap(),
            &fixtures::session_id(),
        ))
        .await
        .assert_status_ok();

    let body: Value = ctx.server.get("/health").await.json();
    assert_eq!(body["metrics"]["viewsTracked"], 1);
    assert_eq!(body["metrics"]["presentationsCreated"], 1);
    assert_eq!(body["metrics"]["versionsCreated"], 1);
}

#[tokio::test]
async fn test_health_unreachable_store() {
    let ctx = TestContext::new().await;
    ctx.set_store_failure(true);

    let response = ctx.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["storeConnected"], false);

    let response = ctx.server.get("/health/ready").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    ctx.set_store_failure(false);
    ctx.server.get("/health/ready").await.assert_status_ok();
}

/// Test /health/live always returns 200
#[tokio::test]
async fn test_liveness_always_ok() {
    let ctx = TestContext::new().await;
    ctx.set_store_failure(true);

    let response = ctx.server.get("/health/live").await;
    response.assert_status_ok();
}
