//! Recipient versions: issuing, listing and token-gated access.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use proposal_core::error::AccessErrorCode;
use proposal_core::schema::{validate_new_version, validate_variables};
use proposal_core::substitute::{substitute, VariableMap};
use proposal_core::{
    authorize, authorize_edit, AccessLevel, NewVersion, Presentation, Result, Version,
};
use proposal_store::Store;
use telemetry::Metrics;

use crate::links::{LinkBuilder, VersionLinks};

/// A version together with its shareable links.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedVersion {
    #[serde(flatten)]
    pub version: Version,
    #[serde(flatten)]
    pub links: VersionLinks,
}

/// A version as listed for its presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionListing {
    #[serde(flatten)]
    pub version: Version,
    pub view_count: usize,
    #[serde(flatten)]
    pub links: VersionLinks,
}

/// What a recipient sees when opening a version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionView {
    pub id: Uuid,
    pub slug: String,
    /// Presentation with the version's variables substituted into content.
    pub presentation: Presentation,
    pub recipient_name: Option<String>,
    pub is_editable: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Versions {
    store: Arc<dyn Store>,
    metrics: Arc<Metrics>,
    links: LinkBuilder,
}

impl Versions {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<Metrics>, links: LinkBuilder) -> Self {
        Self {
            store,
            metrics,
            links,
        }
    }

    /// Issues a new version; `NotFound` if the presentation does not exist.
    pub async fn create(&self, new: NewVersion, now: DateTime<Utc>) -> Result<IssuedVersion> {
        validate_new_version(&new)?;

        let version = self.store.insert_version(Version::issue(new, now)?).await?;
        let links = self.links.links(&version)?;

        self.metrics.versions_created.inc();
        info!(
            version_id = %version.id,
            presentation_id = %version.presentation_id,
            slug = %version.version_slug,
            protected = version.is_password_protected(),
            "Version issued"
        );
        Ok(IssuedVersion { version, links })
    }

    /// Versions of a presentation, newest first.
    pub async fn list(&self, presentation_id: Uuid) -> Result<Vec<VersionListing>> {
        self.store.get_presentation(presentation_id).await?;

        let mut listings = Vec::new();
        for version in self.store.list_versions(presentation_id).await? {
            let view_count = self.store.sessions_for_version(version.id).await?.len();
            let links = self.links.links(&version)?;
            listings.push(VersionListing {
                version,
                view_count,
                links,
            });
        }
        Ok(listings)
    }

    pub async fn delete(&self, slug: &str) -> Result<()> {
        let version = self.store.get_version_by_slug(slug).await?;
        self.store.delete_version(version.id).await?;
        info!(version_id = %version.id, slug = %slug, "Version deleted");
        Ok(())
    }

    /// Opens a version for a recipient.
    ///
    /// The token is checked first, then expiry, then the password. Nothing
    /// about the presentation is returned unless all three pass.
    pub async fn open(
        &self,
        slug: &str,
        token: &str,
        password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<VersionView> {
        let version = self.store.get_version_by_slug(slug).await?;

        let level = match authorize(&version, token, password, now) {
            Ok(level) => level,
            Err(e) => {
                if e.is_access(AccessErrorCode::Expired) {
                    self.metrics.access_expired.inc();
                } else {
                    self.metrics.access_denied.inc();
                }
                warn!(slug = %slug, code = e.error_code(), "Version access refused");
                return Err(e);
            }
        };

        match level {
            AccessLevel::View => self.metrics.access_view.inc(),
            AccessLevel::Edit => self.metrics.access_edit.inc(),
        }

        let mut presentation = self.store.get_presentation(version.presentation_id).await?;
        presentation.content = substitute(&presentation.content, &version.variables);

        Ok(VersionView {
            id: version.id,
            slug: version.version_slug,
            presentation,
            recipient_name: version.recipient_name,
            is_editable: level.can_edit(),
            expires_at: version.expires_at,
        })
    }

    /// Replaces a version's variables. Requires the edit token.
    ///
    /// Absent variables leave the stored map unchanged.
    pub async fn update_variables(
        &self,
        slug: &str,
        token: &str,
        variables: Option<VariableMap>,
        now: DateTime<Utc>,
    ) -> Result<Version> {
        let version = self.store.get_version_by_slug(slug).await?;

        if let Err(e) = authorize_edit(&version, token) {
            self.metrics.access_denied.inc();
            return Err(e);
        }

        let Some(variables) = variables else {
            return Ok(version);
        };
        validate_variables(&variables)?;

        let updated = self
            .store
            .update_variables(version.id, variables, now)
            .await?;
        info!(version_id = %updated.id, slug = %slug, "Version variables updated");
        Ok(updated)
    }
}
