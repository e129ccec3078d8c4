//! Tracking and analytics endpoints.

use axum::extract::State;
use chrono::Utc;
use uuid::Uuid;

use proposal_core::{SessionRecord, TrackEngagement, TrackView};
use tracking::{PresentationAnalytics, VersionSummary};

use crate::extractors::{ApiJson, ApiPath, ClientInfo};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// POST /api/analytics/track/view
///
/// Client address and user agent default to what the server saw when the
/// body does not carry them.
pub async fn track_view(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(view): ApiJson<TrackView>,
) -> Result<ApiResponse<SessionRecord>, ApiError> {
    let record = state
        .tracker
        .record_observed_view(view, client.ip, client.user_agent, Utc::now())
        .await?;
    Ok(ApiResponse::ok(record))
}

/// POST /api/analytics/track/engagement
pub async fn track_engagement(
    State(state): State<AppState>,
    ApiJson(engagement): ApiJson<TrackEngagement>,
) -> Result<ApiResponse<SessionRecord>, ApiError> {
    let record = state
        .tracker
        .record_engagement(engagement, Utc::now())
        .await?;
    Ok(ApiResponse::ok(record))
}

/// GET /api/analytics/presentation/:id
pub async fn presentation_analytics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<PresentationAnalytics>, ApiError> {
    Ok(ApiResponse::ok(state.analytics.presentation(id).await?))
}

/// GET /api/analytics/version/:id
pub async fn version_analytics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<VersionSummary>, ApiError> {
    Ok(ApiResponse::ok(state.analytics.version(id).await?))
}
