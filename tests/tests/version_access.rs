//! Tests for token-gated version access.
//!
//! GET /api/versions/:slug resolves the token to a view or edit level and
//! returns the presentation with the version's variables substituted.
//! Refused requests must never carry presentation content.

use axum::http::StatusCode;
use integration_tests::{
    fixtures,
    setup::{str_field, TestContext},
};
use serde_json::{json, Value};

fn assert_refused(body: &Value, code: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], code);
    assert!(body.get("data").is_none(), "refusal leaked data: {}", body);
}

/// View token opens the version read-only with variables filled in.
#[tokio::test]
async fn test_open_with_view_token() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let slug = str_field(&version, "versionSlug");

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", slug))
        .add_query_param("token", str_field(&version, "viewToken"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["slug"], slug);
    assert_eq!(data["isEditable"], false);
    assert_eq!(data["recipientName"], "Jane Buyer");

    let metadata = &data["presentation"]["content"]["metadata"];
    assert_eq!(metadata["title"], "Proposal for Acme");
    // unknown placeholders stay verbatim
    assert_eq!(metadata["description"], "Annual Plan / {{missing}}");

    assert_eq!(ctx.metrics.access_view.get(), 1);
}

#[tokio::test]
async fn test_open_with_edit_token() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", str_field(&version, "versionSlug")))
        .add_query_param("token", str_field(&version, "editToken"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["isEditable"], true);
    assert_eq!(ctx.metrics.access_edit.get(), 1);
}

#[tokio::test]
async fn test_open_with_bearer_token() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", str_field(&version, "versionSlug")))
        .add_header(
            "Authorization",
            format!("Bearer {}", str_field(&version, "viewToken")),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["isEditable"], false);
}

/// Tokens of one version do not open another.
#[tokio::test]
async fn test_wrong_token_refused() {
    let ctx = TestContext::new().await;
    let first = ctx.presentation_with_version().await;
    let second = ctx.presentation_with_version().await;

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", str_field(&first, "versionSlug")))
        .add_query_param("token", str_field(&second, "viewToken"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_refused(&response.json(), "ACCESS_001");
    assert_eq!(ctx.metrics.access_denied.get(), 1);
}

#[tokio::test]
async fn test_missing_token_refused() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", str_field(&version, "versionSlug")))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_refused(&response.json(), "ACCESS_001");
}

#[tokio::test]
async fn test_expired_version_gone() {
    let ctx = TestContext::new().await;
    let presentation_id = ctx.create_presentation("Expired offer").await;
    let version = ctx
        .issue_version(fixtures::expired_version(&presentation_id))
        .await;

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", str_field(&version, "versionSlug")))
        .add_query_param("token", str_field(&version, "editToken"))
        .await;
    response.assert_status(StatusCode::GONE);
    assert_refused(&response.json(), "ACCESS_003");
    assert_eq!(ctx.metrics.access_expired.get(), 1);
}

/// An invalid token on an expired version still reads as invalid.
#[tokio::test]
async fn test_token_checked_before_expiry() {
    let ctx = TestContext::new().await;
    let presentation_id = ctx.create_presentation("Expired offer").await;
    let version = ctx
        .issue_version(fixtures::expired_version(&presentation_id))
        .await;

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", str_field(&version, "versionSlug")))
        .add_query_param("token", "not-a-real-token")
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_refused(&response.json(), "ACCESS_001");
}

#[tokio::test]
async fn test_password_protected_version() {
    let ctx = TestContext::new().await;
    let presentation_id = ctx.create_presentation("Private offer").await;
    let version = ctx
        .issue_version(fixtures::protected_version(&presentation_id, "s3cret"))
        .await;
    assert!(version.get("passwordHash").is_none());

    let slug = str_field(&version, "versionSlug");
    let token = str_field(&version, "viewToken");

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", slug))
        .add_query_param("token", token)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_refused(&response.json(), "ACCESS_004");

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", slug))
        .add_query_param("token", token)
        .add_query_param("password", "wrong")
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_refused(&response.json(), "ACCESS_004");

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", slug))
        .add_query_param("token", token)
        .add_query_param("password", "s3cret")
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_unknown_slug() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .get("/api/versions/doesnotexist")
        .add_query_param("token", "whatever")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_refused(&response.json(), "NOT_FOUND_002");
}

/// Variables can be replaced with the edit token only.
#[tokio::test]
async fn test_update_variables_requires_edit_token() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let slug = str_field(&version, "versionSlug");
    let new_vars = json!({ "clientName": "Globex", "offerTitle": "Starter" });

    let response = ctx
        .server
        .put(&format!("/api/versions/{}", slug))
        .json(&json!({ "token": str_field(&version, "viewToken"), "variables": new_vars }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_refused(&response.json(), "ACCESS_002");

    let response = ctx
        .server
        .put(&format!("/api/versions/{}", slug))
        .json(&json!({ "token": str_field(&version, "editToken"), "variables": new_vars }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["data"]["variables"]["clientName"],
        "Globex"
    );

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", slug))
        .add_query_param("token", str_field(&version, "viewToken"))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["data"]["presentation"]["content"]["metadata"]["title"],
        "Proposal for Globex"
    );
}

#[tokio::test]
async fn test_update_variables_with_bearer() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;

    let response = ctx
        .server
        .put(&format!("/api/versions/{}", str_field(&version, "versionSlug")))
        .add_header(
            "Authorization",
            format!("Bearer {}", str_field(&version, "editToken")),
        )
        .json(&json!({ "variables": { "clientName": "Initech" } }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["data"]["variables"]["clientName"],
        "Initech"
    );
}

/// Deleting a version revokes its links.
#[tokio::test]
async fn test_delete_version() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let slug = str_field(&version, "versionSlug");

    let response = ctx.server.delete(&format!("/api/versions/{}", slug)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], true);

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", slug))
        .add_query_param("token", str_field(&version, "viewToken"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
