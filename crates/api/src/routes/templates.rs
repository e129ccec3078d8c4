//! Template catalogue endpoints.

use axum::extract::State;
use chrono::Utc;

use proposal_core::{NewTemplate, Template};

use crate::extractors::{ApiPath, ValidatedJson};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// GET /api/templates
pub async fn list(State(state): State<AppState>) -> Result<ApiResponse<Vec<Template>>, ApiError> {
    Ok(ApiResponse::ok(state.templates.list(Utc::now()).await?))
}

/// GET /api/templates/:slug
pub async fn get(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<ApiResponse<Template>, ApiError> {
    Ok(ApiResponse::ok(state.templates.get(&slug, Utc::now()).await?))
}

/// POST /api/templates
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(new): ValidatedJson<NewTemplate>,
) -> Result<ApiResponse<Template>, ApiError> {
    Ok(ApiResponse::created(
        state.templates.create(new, Utc::now()).await?,
    ))
}
