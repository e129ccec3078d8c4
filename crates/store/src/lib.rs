//! Storage port for the proposal engine.
//!
//! Services hold an `Arc<dyn Store>`; the in-memory [`MemoryStore`] is the
//! bundled backend. Implementations must make these operations atomic:
//!
//! - [`Store::upsert_session`]: find-or-create keyed on (version, session id)
//! - [`Store::apply_engagement`]: overwrite/union/append on one record
//! - [`Store::record_view`]: rollup counter increments

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use proposal_core::substitute::VariableMap;
use proposal_core::{
    ClientMetadata, EngagementUpdate, Owner, Presentation, PresentationPatch, Result, Rollup,
    SessionRecord, Template, Version, WebhookLog,
};

pub mod memory;

pub use memory::MemoryStore;

/// Result of a session find-or-create.
#[derive(Debug, Clone)]
pub struct SessionUpsert {
    pub record: SessionRecord,
    /// True when this call created the record.
    pub created: bool,
}

/// Listing query for presentations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub search: Option<String>,
}

impl Default for PresentationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

/// Presentation with its version count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationListing {
    #[serde(flatten)]
    pub presentation: Presentation,
    pub version_count: usize,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slices `all` to the requested page. Pages are 1-based.
    pub fn slice(all: Vec<T>, page: usize, limit: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = all.len();
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Self {
            items,
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Persistence for presentations, versions, sessions and rollups.
#[async_trait]
pub trait Store: Send + Sync {
    // === Owners ===

    /// Inserts an owner, or returns the existing one with the same email.
    async fn upsert_owner(&self, owner: Owner) -> Result<Owner>;

    async fn get_owner(&self, id: Uuid) -> Result<Owner>;

    // === Presentations ===

    /// Inserts a presentation together with its empty rollup.
    ///
    /// Fails with `NotFound` if the owner is unknown and `Conflict` if the
    /// slug is taken.
    async fn insert_presentation(&self, presentation: Presentation) -> Result<Presentation>;

    async fn get_presentation(&self, id: Uuid) -> Result<Presentation>;

    /// Newest first, filtered by a case-insensitive title/slug search.
    async fn list_presentations(&self, query: &PresentationQuery) -> Result<Page<PresentationListing>>;

    async fn update_presentation(
        &self,
        id: Uuid,
        patch: PresentationPatch,
        now: DateTime<Utc>,
    ) -> Result<Presentation>;

    /// Deletes a presentation with its versions, their sessions and its rollup.
    async fn delete_presentation(&self, id: Uuid) -> Result<()>;

    // === Versions ===

    /// Fails with `NotFound` if the presentation is unknown and `Conflict`
    /// if the slug or either token is already in use.
    async fn insert_version(&self, version: Version) -> Result<Version>;

    async fn get_version(&self, id: Uuid) -> Result<Version>;

    async fn get_version_by_slug(&self, slug: &str) -> Result<Version>;

    /// Newest first.
    async fn list_versions(&self, presentation_id: Uuid) -> Result<Vec<Version>>;

    async fn update_variables(
        &self,
        id: Uuid,
        variables: VariableMap,
        now: DateTime<Utc>,
    ) -> Result<Version>;

    /// Deletes a version and its session records.
    async fn delete_version(&self, id: Uuid) -> Result<()>;

    // === Sessions ===

    /// Finds or creates the record for (version, session id).
    ///
    /// An existing record only has its last ping moved forward.
    async fn upsert_session(
        &self,
        version_id: Uuid,
        session_id: &str,
        metadata: ClientMetadata,
        now: DateTime<Utc>,
    ) -> Result<SessionUpsert>;

    /// First record created for a client session id, across versions.
    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Applies an engagement update to one record.
    async fn apply_engagement(
        &self,
        record_id: Uuid,
        update: &EngagementUpdate,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord>;

    /// Records for a version, in creation order.
    async fn sessions_for_version(&self, version_id: Uuid) -> Result<Vec<SessionRecord>>;

    /// Records for every version of a presentation, in creation order.
    async fn sessions_for_presentation(&self, presentation_id: Uuid) -> Result<Vec<SessionRecord>>;

    // === Rollups ===

    async fn get_rollup(&self, presentation_id: Uuid) -> Result<Rollup>;

    /// Counts a view, and a unique viewer when `new_session`.
    async fn record_view(
        &self,
        presentation_id: Uuid,
        new_session: bool,
        now: DateTime<Utc>,
    ) -> Result<Rollup>;

    async fn set_avg_time_spent(
        &self,
        presentation_id: Uuid,
        avg_time_spent: f64,
        now: DateTime<Utc>,
    ) -> Result<Rollup>;

    // === Templates ===

    /// Fails with `Conflict` if the slug is taken.
    async fn insert_template(&self, template: Template) -> Result<Template>;

    async fn get_template_by_slug(&self, slug: &str) -> Result<Template>;

    /// Ordered by slug.
    async fn list_templates(&self) -> Result<Vec<Template>>;

    // === Webhook logs ===

    /// Appends a log entry; only the newest entries are retained.
    async fn insert_webhook_log(&self, log: WebhookLog) -> Result<WebhookLog>;

    /// Replaces a log entry by id.
    async fn update_webhook_log(&self, log: WebhookLog) -> Result<WebhookLog>;

    /// Newest first.
    async fn list_webhook_logs(&self, limit: usize) -> Result<Vec<WebhookLog>>;

    // === Health ===

    /// Cheap liveness check of the backend.
    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
