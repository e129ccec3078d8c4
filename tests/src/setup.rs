//! Common test setup functions.

use std::sync::Arc;

use api::{router, AppState};
use axum::http::StatusCode;
use axum_test::TestServer;
use proposal_core::Owner;
use proposal_store::Store;
use serde_json::Value;
use telemetry::Metrics;

use crate::fixtures;
use crate::mocks::FailingStore;

/// Test context around the real router.
///
/// - the router is built exactly as the binary builds it
/// - storage is a [`FailingStore`] so rollup failures can be injected
/// - the metrics registry is kept so tests can read counters directly
pub struct TestContext {
    pub store: Arc<FailingStore>,
    pub metrics: Arc<Metrics>,
    pub owner: Owner,
    pub server: TestServer,
}

impl TestContext {
    /// Create a new test context with all components initialized.
    pub async fn new() -> Self {
        let store = Arc::new(FailingStore::new());
        let owner = store
            .upsert_owner(Owner::new("sales@example.com", "Sales Team", None))
            .await
            .expect("Failed to create owner");

        let metrics = Arc::new(Metrics::new());
        let state = AppState::with_metrics(
            store.clone() as Arc<dyn Store>,
            owner.clone(),
            fixtures::FRONTEND_URL,
            metrics.clone(),
        )
        .expect("Failed to build app state");

        let server = TestServer::new(router(state)).expect("Failed to create test server");

        Self {
            store,
            metrics,
            owner,
            server,
        }
    }

    /// Creates a presentation and returns its id.
    pub async fn create_presentation(&self, title: &str) -> String {
        let response = self
            .server
            .post("/api/presentations")
            .json(&fixtures::new_presentation(title))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        body["data"]["id"]
            .as_str()
            .expect("presentation id")
            .to_string()
    }

    /// Issues a version from `body` and returns the response `data`.
    pub async fn issue_version(&self, body: Value) -> Value {
        let response = self.server.post("/api/versions").json(&body).await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        body["data"].clone()
    }

    /// Presentation plus one default version; returns the version `data`.
    pub async fn presentation_with_version(&self) -> Value {
        let presentation_id = self.create_presentation("Q3 Proposal").await;
        self.issue_version(fixtures::new_version(&presentation_id))
            .await
    }

    /// Simulate rollup and ping failures in the store.
    pub fn set_store_failure(&self, should_fail: bool) {
        self.store.set_should_fail(should_fail);
    }
}

/// Reads a string field from a JSON value.
pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing string field '{}' in {}", key, value))
}
