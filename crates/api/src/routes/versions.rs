//! Version endpoints.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use catalog::{IssuedVersion, VersionListing, VersionView};
use proposal_core::substitute::VariableMap;
use proposal_core::{extract_access_token, NewVersion, Version};

use crate::extractors::{ApiJson, ApiPath, AuthorizationHeader, ValidatedJson, VersionAccess};
use crate::response::{ApiError, ApiResponse, MessageResponse};
use crate::state::AppState;

/// `PUT /api/versions/:slug` body.
#[derive(Debug, Deserialize)]
pub struct UpdateVersionBody {
    /// Edit token; `Authorization: Bearer` is used when absent.
    pub token: Option<String>,
    pub variables: Option<VariableMap>,
}

/// POST /api/versions
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(new): ValidatedJson<NewVersion>,
) -> Result<ApiResponse<IssuedVersion>, ApiError> {
    let issued = state.versions.create(new, Utc::now()).await?;
    Ok(ApiResponse::created(issued))
}

/// GET /api/versions/:slug?token=&password=
pub async fn open(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    access: VersionAccess,
) -> Result<ApiResponse<VersionView>, ApiError> {
    let view = state
        .versions
        .open(&slug, &access.token, access.password.as_deref(), Utc::now())
        .await?;
    Ok(ApiResponse::ok(view))
}

/// PUT /api/versions/:slug
pub async fn update(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    AuthorizationHeader(auth): AuthorizationHeader,
    ApiJson(body): ApiJson<UpdateVersionBody>,
) -> Result<ApiResponse<Version>, ApiError> {
    let token = extract_access_token(body.token.as_deref(), auth.as_deref())?;
    let version = state
        .versions
        .update_variables(&slug, &token, body.variables, Utc::now())
        .await?;
    Ok(ApiResponse::ok(version))
}

/// DELETE /api/versions/:slug
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.versions.delete(&slug).await?;
    Ok(MessageResponse::new("Version deleted successfully"))
}

/// GET /api/versions/presentation/:presentation_id
pub async fn list_for_presentation(
    State(state): State<AppState>,
    ApiPath(presentation_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Vec<VersionListing>>, ApiError> {
    Ok(ApiResponse::ok(state.versions.list(presentation_id).await?))
}
