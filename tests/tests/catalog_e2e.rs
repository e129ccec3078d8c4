//! End-to-end tests for presentations, versions, templates and the deal
//! webhook.

use axum::http::StatusCode;
use integration_tests::{
    fixtures,
    setup::{str_field, TestContext},
};
use serde_json::{json, Value};

#[tokio::test]
async fn test_presentation_lifecycle() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/presentations")
        .json(&fixtures::new_presentation("Q3 Enterprise Offer"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json::<Value>()["data"].clone();
    let id = str_field(&created, "id").to_string();
    assert_eq!(created["ownerId"], ctx.owner.id.to_string());
    assert_eq!(created["templateId"], "sales-proposal");
    assert!(str_field(&created, "slug").starts_with("q3-enterprise-offer-"));

    let response = ctx.server.get(&format!("/api/presentations/{}", id)).await;
    response.assert_status_ok();
    let detail: Value = response.json::<Value>()["data"].clone();
    assert_eq!(detail["title"], "Q3 Enterprise Offer");
    assert_eq!(detail["versions"].as_array().unwrap().len(), 0);
    assert_eq!(detail["analytics"]["totalViews"], 0);

    let response = ctx
        .server
        .put(&format!("/api/presentations/{}", id))
        .json(&json!({ "title": "Q4 Enterprise Offer" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json::<Value>()["data"].clone();
    assert_eq!(updated["title"], "Q4 Enterprise Offer");
    // content is untouched by a title-only patch
    assert_eq!(updated["content"], created["content"]);

    let response = ctx.server.delete(&format!("/api/presentations/{}", id)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], true);

    let response = ctx.server.get(&format!("/api/presentations/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND_001");
}

#[tokio::test]
async fn test_presentation_validation() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/presentations")
        .json(&json!({ "title": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALID_001");
    assert!(body["details"].is_array());
}

#[tokio::test]
async fn test_presentation_list_pagination_and_search() {
    let ctx = TestContext::new().await;
    for title in ["Alpha Deal", "Beta Deal", "Gamma Pitch"] {
        ctx.create_presentation(title).await;
    }

    let response = ctx
        .server
        .get("/api/presentations")
        .add_query_param("page", 1)
        .add_query_param("limit", 2)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);

    let body: Value = ctx
        .server
        .get("/api/presentations")
        .add_query_param("page", 2)
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let body: Value = ctx
        .server
        .get("/api/presentations")
        .add_query_param("search", "deal")
        .await
        .json();
    assert_eq!(body["pagination"]["total"], 2);

    let body: Value = ctx.server.get("/api/presentations").await.json();
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
}

#[tokio::test]
async fn test_version_issue_and_list() {
    let ctx = TestContext::new().await;
    let presentation_id = ctx.create_presentation("Multi-recipient").await;

    let first = ctx
        .issue_version(fixtures::new_version(&presentation_id))
        .await;
    let view_token = str_field(&first, "viewToken");
    let edit_token = str_field(&first, "editToken");
    assert_eq!(view_token.len(), 32);
    assert_ne!(view_token, edit_token);
    assert_eq!(
        str_field(&first, "viewUrl"),
        format!(
            "{}/view/{}?token={}",
            fixtures::FRONTEND_URL,
            str_field(&first, "versionSlug"),
            view_token
        )
    );
    assert!(str_field(&first, "editUrl").contains(edit_token));

    ctx.issue_version(fixtures::new_version(&presentation_id))
        .await;

    let response = ctx
        .server
        .get(&format!("/api/versions/presentation/{}", presentation_id))
        .await;
    response.assert_status_ok();
    let listed: Vec<Value> = response.json::<Value>()["data"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|v| v["viewCount"] == 0));
    assert!(listed.iter().all(|v| v["viewUrl"].is_string()));

    let detail: Value = ctx
        .server
        .get(&format!("/api/presentations/{}", presentation_id))
        .await
        .json();
    assert_eq!(detail["data"]["versions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_version_for_unknown_presentation() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/versions")
        .json(&fixtures::new_version("00000000-0000-0000-0000-000000000000"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND_001");

    let response = ctx
        .server
        .get("/api/versions/presentation/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_version_rejects_bad_email() {
    let ctx = TestContext::new().await;
    let presentation_id = ctx.create_presentation("Validation").await;

    let mut body = fixtures::new_version(&presentation_id);
    body["recipientEmail"] = json!("not-an-email");

    let response = ctx.server.post("/api/versions").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_001");
}

/// Deleting a presentation removes its versions.
#[tokio::test]
async fn test_presentation_delete_cascades() {
    let ctx = TestContext::new().await;
    let version = ctx.presentation_with_version().await;
    let presentation_id = str_field(&version, "presentationId");

    ctx.server
        .post("/api/analytics/track/view")
        .json(&fixtures::track_view(
            str_field(&version, "id"),
            &fixtures::session_id(),
        ))
        .await
        .assert_status_ok();
    assert_eq!(ctx.store.inner().session_count(), 1);

    ctx.server
        .delete(&format!("/api/presentations/{}", presentation_id))
        .await
        .assert_status_ok();

    let response = ctx
        .server
        .get(&format!("/api/versions/{}", str_field(&version, "versionSlug")))
        .add_query_param("token", str_field(&version, "viewToken"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.inner().session_count(), 0);
}

#[tokio::test]
async fn test_templates() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/api/templates").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let slugs: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert!(slugs.contains(&"sales-proposal"));

    let response = ctx.server.get("/api/templates/sales-proposal").await;
    response.assert_status_ok();
    let template: Value = response.json::<Value>()["data"].clone();
    let keys: Vec<&str> = template["requiredVariables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["key"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"clientName"));

    let response = ctx.server.get("/api/templates/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND_004");
}

/// Authored templates are stored and served next to the built-in ones.
#[tokio::test]
async fn test_create_template() {
    let ctx = TestContext::new().await;
    let body = json!({
        "name": "Renewal",
        "slug": "renewal",
        "description": "Yearly renewal offer",
        "requiredVariables": [{ "key": "clientName", "type": "text", "label": "Client" }],
        "defaultContent": {
            "metadata": { "title": "Renewal for {{clientName}}" },
            "sections": [{ "id": "hero", "blocks": [] }]
        }
    });

    let response = ctx.server.post("/api/templates").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json::<Value>()["data"].clone();
    assert_eq!(created["slug"], "renewal");
    assert_eq!(created["builtin"], false);

    let response = ctx.server.get("/api/templates/renewal").await;
    response.assert_status_ok();
    let fetched: Value = response.json::<Value>()["data"].clone();
    assert_eq!(fetched["defaultContent"]["metadata"]["title"], "Renewal for {{clientName}}");

    let listed: Value = ctx.server.get("/api/templates").await.json();
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);

    // taken slug
    let response = ctx.server.post("/api/templates").json(&body).await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "STORE_001");

    let response = ctx
        .server
        .post("/api/templates")
        .json(&json!({ "name": "Bad", "slug": "Bad Slug" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_001");
}

/// A deal delivery produces a presentation, a version and a success log.
#[tokio::test]
async fn test_deal_webhook_generates_proposal() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/webhooks/deal")
        .json(&fixtures::deal_payload(42))
        .await;
    response.assert_status_ok();
    let outcome: Value = response.json::<Value>()["data"].clone();
    assert!(str_field(&outcome, "viewUrl").starts_with(fixtures::FRONTEND_URL));
    assert!(str_field(&outcome, "editUrl").contains("/edit/"));

    let presentation_id = str_field(&outcome, "presentationId");
    let detail: Value = ctx
        .server
        .get(&format!("/api/presentations/{}", presentation_id))
        .await
        .json();
    assert_eq!(detail["data"]["versions"][0]["recipientName"], "Acme");
    assert_eq!(ctx.metrics.webhooks_received.get(), 1);

    let response = ctx
        .server
        .get("/api/webhooks/logs")
        .add_query_param("limit", 5)
        .await;
    response.assert_status_ok();
    let logs: Value = response.json::<Value>()["data"].clone();
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["dealId"], "42");
    assert_eq!(logs[0]["status"], "success");
    assert_eq!(logs[0]["generatedId"], presentation_id);
}

#[tokio::test]
async fn test_deal_webhook_rejects_malformed_payload() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/webhooks/deal")
        .json(&json!({ "event": "updated.deal" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);

    let logs: Value = ctx.server.get("/api/webhooks/logs").await.json();
    assert!(logs["data"].as_array().unwrap().is_empty());
}

/// A delivery that fails after the presentation is written leaves nothing
/// behind but the error log.
#[tokio::test]
async fn test_deal_webhook_failure_leaves_no_presentation() {
    let ctx = TestContext::new().await;
    ctx.store.set_version_insert_failure(true);

    let response = ctx
        .server
        .post("/api/webhooks/deal")
        .json(&fixtures::deal_payload(77))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["success"], false);

    let body: Value = ctx.server.get("/api/presentations").await.json();
    assert_eq!(body["pagination"]["total"], 0);
    assert_eq!(ctx.metrics.presentations_created.get(), 0);
    assert_eq!(ctx.metrics.webhook_failures.get(), 1);

    let logs: Value = ctx.server.get("/api/webhooks/logs").await.json();
    assert_eq!(logs["data"][0]["dealId"], "77");
    assert_eq!(logs["data"][0]["status"], "error");
    assert!(logs["data"][0]["generatedId"].is_null());
}
