//! End-to-end tests for view and engagement tracking.
//!
//! Flow: POST /api/analytics/track/view → session record + rollup →
//! POST /api/analytics/track/engagement → GET /api/analytics/...

use axum::http::StatusCode;
use integration_tests::{
    fixtures,
    setup::{str_field, TestContext},
};
use serde_json::{json, Value};

/// One view plus one engagement update shows up in both analytics reports.
#[tokio::test]
async fn test_view_then_engagement_e2e() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let version_id = str_field(&version, "id");
    let presentation_id = str_field(&version, "presentationId");
    let session = fixtures::session_id();

    let response = ctx
        .server
        .post("/api/analytics/track/view")
        .json(&fixtures::track_view(version_id, &session))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["sessionId"], session.as_str());
    assert_eq!(body["data"]["device"], "mobile");

    let response = ctx
        .server
        .post("/api/analytics/track/engagement")
        .json(&fixtures::engagement(&session, 45.0, 80.0))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["timeSpent"], 45.0);
    assert_eq!(body["data"]["scrollDepth"], 80.0);

    let response = ctx
        .server
        .get(&format!("/api/analytics/version/{}", version_id))
        .await;
    response.assert_status_ok();
    let summary: Value = response.json::<Value>()["data"].clone();
    assert_eq!(summary["totalViews"], 1);
    assert_eq!(summary["uniqueSessions"], 1);
    assert_eq!(summary["avgTimeSpent"], 45.0);
    assert_eq!(summary["avgScrollDepth"], 80.0);
    assert_eq!(summary["views"].as_array().unwrap().len(), 1);

    let response = ctx
        .server
        .get(&format!("/api/analytics/presentation/{}", presentation_id))
        .await;
    response.assert_status_ok();
    let analytics: Value = response.json::<Value>()["data"].clone();
    assert_eq!(analytics["totalViews"], 1);
    assert_eq!(analytics["uniqueViewers"], 1);
    assert_eq!(analytics["avgTimeSpent"], 45.0);
    assert_eq!(analytics["scrollDepthAvg"], 80.0);
    assert_eq!(analytics["deviceBreakdown"]["mobile"], 1);
    assert_eq!(analytics["deviceBreakdown"]["desktop"], 0);
    assert_eq!(analytics["locationData"][0]["country"], "PL");
    assert_eq!(analytics["locationData"][0]["count"], 1);

    let sections: Vec<&str> = analytics["topSections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["sectionId"].as_str().unwrap())
        .collect();
    assert!(sections.contains(&"hero"));
    assert!(sections.contains(&"offer"));

    assert_eq!(ctx.metrics.views_tracked.get(), 1);
    assert_eq!(ctx.metrics.sessions_created.get(), 1);
    assert_eq!(ctx.metrics.engagement_updates.get(), 1);
}

/// Repeat views from one session count as views but not as new viewers.
#[tokio::test]
async fn test_repeat_views_same_session() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let version_id = str_field(&version, "id");
    let presentation_id = str_field(&version, "presentationId");
    let session = fixtures::session_id();

    let mut record_ids = Vec::new();
    for _ in 0..3 {
        let response = ctx
            .server
            .post("/api/analytics/track/view")
            .json(&fixtures::track_view(version_id, &session))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        record_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }
    assert!(record_ids.iter().all(|id| id == &record_ids[0]));

    let body: Value = ctx
        .server
        .get(&format!("/api/analytics/presentation/{}", presentation_id))
        .await
        .json();
    assert_eq!(body["data"]["totalViews"], 3);
    assert_eq!(body["data"]["uniqueViewers"], 1);

    let body: Value = ctx
        .server
        .get(&format!("/api/analytics/version/{}", version_id))
        .await
        .json();
    assert_eq!(body["data"]["uniqueSessions"], 1);
}

/// Each distinct session adds a unique viewer; average time covers all of them.
#[tokio::test]
async fn test_average_time_across_sessions() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let version_id = str_field(&version, "id");
    let presentation_id = str_field(&version, "presentationId");

    for time_spent in [10.0, 20.0, 30.0] {
        let session = fixtures::session_id();
        ctx.server
            .post("/api/analytics/track/view")
            .json(&fixtures::track_view(version_id, &session))
            .await
            .assert_status_ok();
        ctx.server
            .post("/api/analytics/track/engagement")
            .json(&json!({ "sessionId": session, "timeSpent": time_spent }))
            .await
            .assert_status_ok();
    }

    let body: Value = ctx
        .server
        .get(&format!("/api/analytics/presentation/{}", presentation_id))
        .await
        .json();
    assert_eq!(body["data"]["uniqueViewers"], 3);
    assert_eq!(body["data"]["avgTimeSpent"], 20.0);
}

/// Server-observed address and user agent fill in what the client omitted.
#[tokio::test]
async fn test_view_uses_forwarded_client_info() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let version_id = str_field(&version, "id");

    let response = ctx
        .server
        .post("/api/analytics/track/view")
        .add_header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
        .add_header("User-Agent", fixtures::IPHONE_UA)
        .json(&json!({ "versionId": version_id, "sessionId": "s-forwarded" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["ipAddress"], "203.0.113.9");
    assert_eq!(body["data"]["userAgent"], fixtures::IPHONE_UA);
}

/// Oversized request headers are trimmed to fit rather than failing the ping.
#[tokio::test]
async fn test_view_with_oversized_headers() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let long_agent = format!("{} {}", fixtures::IPHONE_UA, "x".repeat(600));

    let response = ctx
        .server
        .post("/api/analytics/track/view")
        .add_header("User-Agent", long_agent)
        .add_header("X-Forwarded-For", "f".repeat(64))
        .json(&json!({ "versionId": str_field(&version, "id"), "sessionId": "s-long" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(str_field(&body["data"], "userAgent").chars().count(), 512);
    assert!(body["data"]["ipAddress"].is_null());
    assert_eq!(ctx.metrics.tracking_rejected.get(), 0);
}

/// A client-sent value over the limit is refused without being echoed back.
#[tokio::test]
async fn test_view_oversized_body_field_not_echoed() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let secret = "leak".repeat(200);

    let response = ctx
        .server
        .post("/api/analytics/track/view")
        .json(&json!({
            "versionId": str_field(&version, "id"),
            "sessionId": "s-big",
            "userAgent": secret
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!response.text().contains("leakleak"));
    assert_eq!(ctx.store.inner().session_count(), 0);
}

#[tokio::test]
async fn test_view_unknown_version() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/analytics/track/view")
        .json(&fixtures::track_view(
            "00000000-0000-0000-0000-000000000000",
            "s1",
        ))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND_002");
    assert_eq!(ctx.store.inner().session_count(), 0);
}

#[tokio::test]
async fn test_engagement_unknown_session() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/analytics/track/engagement")
        .json(&fixtures::engagement("never-viewed", 5.0, 10.0))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND_003");
}

/// Out-of-range engagement is rejected and leaves the record untouched.
#[tokio::test]
async fn test_engagement_scroll_depth_out_of_range() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let version_id = str_field(&version, "id");
    let session = fixtures::session_id();

    ctx.server
        .post("/api/analytics/track/view")
        .json(&fixtures::track_view(version_id, &session))
        .await
        .assert_status_ok();

    let response = ctx
        .server
        .post("/api/analytics/track/engagement")
        .json(&json!({ "sessionId": session, "scrollDepth": 150 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
    assert_eq!(ctx.metrics.tracking_rejected.get(), 1);

    let body: Value = ctx
        .server
        .get(&format!("/api/analytics/version/{}", version_id))
        .await
        .json();
    assert_eq!(body["data"]["views"][0]["scrollDepth"], 0.0);
}

#[tokio::test]
async fn test_view_missing_session_id() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;

    let response = ctx
        .server
        .post("/api/analytics/track/view")
        .json(&json!({ "versionId": str_field(&version, "id"), "sessionId": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.store.inner().session_count(), 0);
}

#[tokio::test]
async fn test_view_malformed_body() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/analytics/track/view")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALID_001");
}

/// Rollup write failures are logged and counted but never reach the client.
#[tokio::test]
async fn test_rollup_failure_not_surfaced() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let version_id = str_field(&version, "id");
    let presentation_id = str_field(&version, "presentationId");
    let session = fixtures::session_id();

    ctx.set_store_failure(true);

    ctx.server
        .post("/api/analytics/track/view")
        .json(&fixtures::track_view(version_id, &session))
        .await
        .assert_status_ok();
    ctx.server
        .post("/api/analytics/track/engagement")
        .json(&fixtures::engagement(&session, 30.0, 50.0))
        .await
        .assert_status_ok();

    assert_eq!(ctx.metrics.rollup_failures.get(), 2);
    assert_eq!(ctx.store.inner().session_count(), 1);

    ctx.set_store_failure(false);

    let body: Value = ctx
        .server
        .get(&format!("/api/analytics/presentation/{}", presentation_id))
        .await
        .json();
    assert_eq!(body["data"]["totalViews"], 0);

    // the session itself was recorded
    let body: Value = ctx
        .server
        .get(&format!("/api/analytics/version/{}", version_id))
        .await
        .json();
    assert_eq!(body["data"]["totalViews"], 1);
    assert_eq!(body["data"]["avgTimeSpent"], 30.0);
}

#[tokio::test]
async fn test_analytics_unknown_ids() {
    let ctx = TestContext::new().await;
    let missing = "00000000-0000-0000-0000-000000000000";

    let response = ctx
        .server
        .get(&format!("/api/analytics/presentation/{}", missing))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND_006");

    // unknown versions report an empty summary
    let response = ctx
        .server
        .get(&format!("/api/analytics/version/{}", missing))
        .await;
    response.assert_status_ok();
    let summary: Value = response.json::<Value>()["data"].clone();
    assert_eq!(summary["versionId"], missing);
    assert_eq!(summary["totalViews"], 0);
    assert_eq!(summary["uniqueSessions"], 0);
    assert_eq!(summary["avgTimeSpent"], 0.0);
    assert!(summary["views"].as_array().unwrap().is_empty());

    let response = ctx.server.get("/api/analytics/version/not-a-uuid").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
