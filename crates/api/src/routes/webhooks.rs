//! CRM webhook endpoints.

use axum::extract::{Query, State};
use chrono::Utc;
use serde::Deserialize;

use catalog::{DealOutcome, DealPayload};
use proposal_core::WebhookLog;

use crate::extractors::ValidatedJson;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// POST /api/webhooks/deal
pub async fn deal(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DealPayload>,
) -> Result<ApiResponse<DealOutcome>, ApiError> {
    let outcome = state.webhook.handle(payload, Utc::now()).await?;
    Ok(ApiResponse::ok(outcome))
}

/// GET /api/webhooks/logs?limit=
pub async fn logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<ApiResponse<Vec<WebhookLog>>, ApiError> {
    Ok(ApiResponse::ok(state.webhook.logs(query.limit).await?))
}
