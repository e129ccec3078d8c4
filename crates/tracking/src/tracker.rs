//! View and engagement recording.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use proposal_core::error::NotFoundCode;
use proposal_core::schema::{validate_track_engagement, validate_track_view};
use proposal_core::{mean, Error, Result, SessionRecord, TrackEngagement, TrackView};
use proposal_store::Store;
use telemetry::Metrics;

use crate::enrichment::UserAgentEnricher;

/// Records presentation views and engagement against session records.
#[derive(Clone)]
pub struct SessionTracker {
    store: Arc<dyn Store>,
    metrics: Arc<Metrics>,
    enricher: Arc<UserAgentEnricher>,
}

impl SessionTracker {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            metrics,
            enricher: Arc::new(UserAgentEnricher::new()),
        }
    }

    /// Finds or creates the record for (version, session) and counts the view.
    ///
    /// The presentation's view counter is always incremented; the unique
    /// viewer counter only when the record was newly created.
    pub async fn record_view(&self, view: TrackView, now: DateTime<Utc>) -> Result<SessionRecord> {
        let start = Instant::now();

        if let Err(e) = validate_track_view(&view) {
            self.metrics.tracking_rejected.inc();
            return Err(e);
        }

        let version = self.store.get_version(view.version_id).await?;

        let TrackView {
            version_id,
            session_id,
            mut metadata,
        } = view;
        self.enricher.enrich(&mut metadata);

        let upsert = self
            .store
            .upsert_session(version_id, &session_id, metadata, now)
            .await?;

        if upsert.created {
            self.metrics.sessions_created.inc();
        }
        self.metrics.views_tracked.inc();

        // counter failures after the session write are logged, not surfaced
        if let Err(e) = self
            .store
            .record_view(version.presentation_id, upsert.created, now)
            .await
        {
            self.rollup_failed(version.presentation_id, &e);
        }

        self.metrics.track_view_latency_ms.observe_since(start);
        debug!(
            version_id = %version_id,
            session_id = %session_id,
            created = upsert.created,
            "View tracked"
        );

        Ok(upsert.record)
    }

    /// Records a view whose client info is completed from request headers.
    ///
    /// The ping is validated as the client sent it; observed values are
    /// merged afterwards and never cause a rejection.
    pub async fn record_observed_view(
        &self,
        mut view: TrackView,
        ip: Option<String>,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        if let Err(e) = validate_track_view(&view) {
            self.metrics.tracking_rejected.inc();
            return Err(e);
        }
        view.metadata.fill_observed(ip, user_agent);
        self.record_view(view, now).await
    }

    /// Applies an engagement update to the session's record.
    ///
    /// When time spent changes, the presentation's average time spent is
    /// recomputed from the version's records. That recompute is best
    /// effort and never fails the call.
    pub async fn record_engagement(
        &self,
        engagement: TrackEngagement,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        let start = Instant::now();

        if let Err(e) = validate_track_engagement(&engagement) {
            self.metrics.tracking_rejected.inc();
            return Err(e);
        }

        let existing = self
            .store
            .find_session(&engagement.session_id)
            .await?
            .ok_or_else(|| Error::not_found(NotFoundCode::Session))?;

        let record = self
            .store
            .apply_engagement(existing.id, &engagement.update, now)
            .await?;
        self.metrics.engagement_updates.inc();

        if engagement.update.time_spent.is_some() {
            self.recompute_avg_time_spent(record.version_id, now).await;
        }

        self.metrics.track_engagement_latency_ms.observe_since(start);
        debug!(
            session_id = %record.session_id,
            version_id = %record.version_id,
            time_spent = record.time_spent,
            scroll_depth = record.scroll_depth,
            "Engagement recorded"
        );

        Ok(record)
    }

    async fn recompute_avg_time_spent(&self, version_id: Uuid, now: DateTime<Utc>) {
        let version = match self.store.get_version(version_id).await {
            Ok(version) => version,
            Err(e) => {
                warn!(version_id = %version_id, error = %e, "Rollup recompute skipped");
                self.metrics.rollup_failures.inc();
                return;
            }
        };

        let result = async {
            let sessions = self.store.sessions_for_version(version_id).await?;
            let avg = mean(sessions.iter().map(|s| s.time_spent));
            self.store
                .set_avg_time_spent(version.presentation_id, avg, now)
                .await
        }
        .await;

        match result {
            Ok(rollup) => info!(
                presentation_id = %version.presentation_id,
                avg_time_spent = rollup.avg_time_spent,
                "Rollup updated"
            ),
            Err(e) => self.rollup_failed(version.presentation_id, &e),
        }
    }

    fn rollup_failed(&self, presentation_id: Uuid, error: &Error) {
        warn!(presentation_id = %presentation_id, error = %error, "Rollup update failed");
        self.metrics.rollup_failures.inc();
    }
}
