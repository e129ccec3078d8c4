//! Presentation management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use proposal_core::schema::{validate_new_presentation, validate_presentation_patch};
use proposal_core::{NewPresentation, Presentation, PresentationPatch, Result, Rollup};
use proposal_store::{Page, PresentationListing, PresentationQuery, Store};
use telemetry::Metrics;

/// A version as listed on its presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDigest {
    pub id: Uuid,
    pub version_slug: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub view_count: usize,
}

/// A presentation with its versions and rollup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationDetail {
    #[serde(flatten)]
    pub presentation: Presentation,
    pub versions: Vec<VersionDigest>,
    pub analytics: Rollup,
}

/// Creates and edits presentations on behalf of one owner.
#[derive(Clone)]
pub struct Presentations {
    store: Arc<dyn Store>,
    metrics: Arc<Metrics>,
    owner_id: Uuid,
}

impl Presentations {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<Metrics>, owner_id: Uuid) -> Self {
        Self {
            store,
            metrics,
            owner_id,
        }
    }

    pub async fn list(&self, query: &PresentationQuery) -> Result<Page<PresentationListing>> {
        self.store.list_presentations(query).await
    }

    pub async fn get(&self, id: Uuid) -> Result<PresentationDetail> {
        let presentation = self.store.get_presentation(id).await?;
        let analytics = self.store.get_rollup(id).await?;

        let mut versions = Vec::new();
        for version in self.store.list_versions(id).await? {
            let view_count = self.store.sessions_for_version(version.id).await?.len();
            versions.push(VersionDigest {
                id: version.id,
                version_slug: version.version_slug,
                recipient_name: version.recipient_name,
                recipient_email: version.recipient_email,
                created_at: version.created_at,
                view_count,
            });
        }

        Ok(PresentationDetail {
            presentation,
            versions,
            analytics,
        })
    }

    /// Validates and stores a new presentation with an empty rollup.
    pub async fn create(&self, new: NewPresentation, now: DateTime<Utc>) -> Result<Presentation> {
        validate_new_presentation(&new)?;

        let presentation = self
            .store
            .insert_presentation(Presentation::new(self.owner_id, new, now))
            .await?;

        self.metrics.presentations_created.inc();
        info!(
            presentation_id = %presentation.id,
            slug = %presentation.slug,
            "Presentation created"
        );
        Ok(presentation)
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: PresentationPatch,
        now: DateTime<Utc>,
    ) -> Result<Presentation> {
        validate_presentation_patch(&patch)?;
        self.store.update_presentation(id, patch, now).await
    }

    /// Deletes the presentation, its versions and all their sessions.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete_presentation(id).await?;
        info!(presentation_id = %id, "Presentation deleted");
        Ok(())
    }
}
