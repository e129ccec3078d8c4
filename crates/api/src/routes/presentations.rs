//! Presentation endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use catalog::PresentationDetail;
use proposal_core::{NewPresentation, Presentation, PresentationPatch};
use proposal_store::{PresentationListing, PresentationQuery};

use crate::extractors::{ApiPath, ValidatedJson};
use crate::response::{ApiError, ApiResponse, MessageResponse};
use crate::state::AppState;

/// GET /api/presentations?page=&limit=&search=
pub async fn list(
    State(state): State<AppState>,
    query: Option<Query<PresentationQuery>>,
) -> Result<ApiResponse<Vec<PresentationListing>>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let page = state.presentations.list(&query).await?;
    Ok(ApiResponse::paged(page))
}

/// GET /api/presentations/:id
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<PresentationDetail>, ApiError> {
    Ok(ApiResponse::ok(state.presentations.get(id).await?))
}

/// POST /api/presentations
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(new): ValidatedJson<NewPresentation>,
) -> Result<ApiResponse<Presentation>, ApiError> {
    let presentation = state.presentations.create(new, Utc::now()).await?;
    Ok(ApiResponse::created(presentation))
}

/// PUT /api/presentations/:id
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(patch): ValidatedJson<PresentationPatch>,
) -> Result<ApiResponse<Presentation>, ApiError> {
    let presentation = state.presentations.update(id, patch, Utc::now()).await?;
    Ok(ApiResponse::ok(presentation))
}

/// DELETE /api/presentations/:id
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.presentations.delete(id).await?;
    Ok(MessageResponse::new("Presentation deleted successfully"))
}
