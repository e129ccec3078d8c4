//! Mock implementations for testing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use proposal_core::substitute::VariableMap;
use proposal_core::{
    ClientMetadata, EngagementUpdate, Error, Owner, Presentation, PresentationPatch, Result,
    Rollup, SessionRecord, Template, Version, WebhookLog,
};
use proposal_store::{
    MemoryStore, Page, PresentationListing, PresentationQuery, SessionUpsert, Store,
};

/// Store that delegates to a [`MemoryStore`] and can be told to fail.
///
/// When failing, the rollup writes and the health ping return errors while
/// everything else keeps working, so tests can check which failures reach
/// the client. Version inserts can be failed separately.
#[derive(Clone)]
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    should_fail: Arc<Mutex<bool>>,
    fail_version_inserts: Arc<Mutex<bool>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
            should_fail: Arc::new(Mutex::new(false)),
            fail_version_inserts: Arc::new(Mutex::new(false)),
        }
    }

    /// The wrapped store, for inspecting state behind the API.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// Makes `insert_version` fail until reset.
    pub fn set_version_insert_failure(&self, fail: bool) {
        *self.fail_version_inserts.lock() = fail;
    }

    fn check(&self) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::internal("Mock store failure"));
        }
        Ok(())
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn upsert_owner(&self, owner: Owner) -> Result<Owner> {
        self.inner.upsert_owner(owner).await
    }

    async fn get_owner(&self, id: Uuid) -> Result<Owner> {
        self.inner.get_owner(id).await
    }

    async fn insert_presentation(&self, presentation: Presentation) -> Result<Presentation> {
        self.inner.insert_presentation(presentation).await
    }

    async fn get_presentation(&self, id: Uuid) -> Result<Presentation> {
        self.inner.get_presentation(id).await
    }

    async fn list_presentations(&self, query: &PresentationQuery) -> Result<Page<PresentationListing>> {
        self.inner.list_presentations(query).await
    }

    async fn update_presentation(
        &self,
        id: Uuid,
        patch: PresentationPatch,
        now: DateTime<Utc>,
    ) -> Result<Presentation> {
        self.inner.update_presentation(id, patch, now).await
    }

    async fn delete_presentation(&self, id: Uuid) -> Result<()> {
        self.inner.delete_presentation(id).await
    }

    async fn insert_version(&self, version: Version) -> Result<Version> {
        if *self.fail_version_inserts.lock() {
            return Err(Error::internal("Mock version insert failure"));
        }
        self.inner.insert_version(version).await
    }

    async fn get_version(&self, id: Uuid) -> Result<Version> {
        self.inner.get_version(id).await
    }

    async fn get_version_by_slug(&self, slug: &str) -> Result<Version> {
        self.inner.get_version_by_slug(slug).await
    }

    async fn list_versions(&self, presentation_id: Uuid) -> Result<Vec<Version>> {
        self.inner.list_versions(presentation_id).await
    }

    async fn update_variables(
        &self,
        id: Uuid,
        variables: VariableMap,
        now: DateTime<Utc>,
    ) -> Result<Version> {
        self.inner.update_variables(id, variables, now).await
    }

    async fn delete_version(&self, id: Uuid) -> Result<()> {
        self.inner.delete_version(id).await
    }

    async fn upsert_session(
        &self,
        version_id: Uuid,
        session_id: &str,
        metadata: ClientMetadata,
        now: DateTime<Utc>,
    ) -> Result<SessionUpsert> {
        self.inner
            .upsert_session(version_id, session_id, metadata, now)
            .await
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        self.inner.find_session(session_id).await
    }

    async fn apply_engagement(
        &self,
        record_id: Uuid,
        update: &EngagementUpdate,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        self.inner.apply_engagement(record_id, update, now).await
    }

    async fn sessions_for_version(&self, version_id: Uuid) -> Result<Vec<SessionRecord>> {
        self.inner.sessions_for_version(version_id).await
    }

    async fn sessions_for_presentation(&self, presentation_id: Uuid) -> Result<Vec<SessionRecord>> {
        self.inner.sessions_for_presentation(presentation_id).await
    }

    async fn get_rollup(&self, presentation_id: Uuid) -> Result<Rollup> {
        self.inner.get_rollup(presentation_id).await
    }

    async fn record_view(
        &self,
        presentation_id: Uuid,
        new_session: bool,
        now: DateTime<Utc>,
    ) -> Result<Rollup> {
        self.check()?;
        self.inner.record_view(presentation_id, new_session, now).await
    }

    async fn set_avg_time_spent(
        &self,
        presentation_id: Uuid,
        avg_time_spent: f64,
        now: DateTime<Utc>,
    ) -> Result<Rollup> {
        self.check()?;
        self.inner
            .set_avg_time_spent(presentation_id, avg_time_spent, now)
            .await
    }

    async fn insert_template(&self, template: Template) -> Result<Template> {
        self.inner.insert_template(template).await
    }

    async fn get_template_by_slug(&self, slug: &str) -> Result<Template> {
        self.inner.get_template_by_slug(slug).await
    }

    async fn list_templates(&self) -> Result<Vec<Template>> {
        self.inner.list_templates().await
    }

    async fn insert_webhook_log(&self, log: WebhookLog) -> Result<WebhookLog> {
        self.inner.insert_webhook_log(log).await
    }

    async fn update_webhook_log(&self, log: WebhookLog) -> Result<WebhookLog> {
        self.inner.update_webhook_log(log).await
    }

    async fn list_webhook_logs(&self, limit: usize) -> Result<Vec<WebhookLog>> {
        self.inner.list_webhook_logs(limit).await
    }

    async fn ping(&self) -> Result<()> {
        self.check()?;
        self.inner.ping().await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_store_only_fails_rollups_and_ping() {
        let store = FailingStore::new();
        store.set_should_fail(true);

        assert!(store.ping().await.is_err());
        assert!(store
            .record_view(Uuid::new_v4(), true, Utc::now())
            .await
            .is_err());
        assert!(store.list_webhook_logs(10).await.unwrap().is_empty());

        store.set_should_fail(false);
        assert!(store.ping().await.is_ok());
    }
}
