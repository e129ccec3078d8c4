//! Request extractors.
//!
//! Rejections are converted into [`ApiError`] so every failure uses the
//! same error envelope.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use validator::Validate;

use proposal_core::extract_access_token;
use proposal_core::schema::describe_errors;

use crate::response::ApiError;

/// JSON body that is parsed but not validated here.
///
/// Used where the service validates the payload itself.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        Ok(Self(value))
    }
}

/// JSON body that must also pass its `Validate` rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|e| ApiError::validation("VALID_001", describe_errors(&e)))?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

/// Path parameters with rejections in the error envelope.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize)]
struct AccessQuery {
    token: Option<String>,
    password: Option<String>,
}

/// Credentials for opening a version.
///
/// The token comes from `?token=` or `Authorization: Bearer`; the password
/// from `?password=`.
#[derive(Debug, Clone)]
pub struct VersionAccess {
    pub token: String,
    pub password: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for VersionAccess
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<AccessQuery>::try_from_uri(&parts.uri)
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let token = extract_access_token(query.token.as_deref(), authorization(parts))?;

        Ok(VersionAccess {
            token,
            password: query.password.filter(|p| !p.is_empty()),
        })
    }
}

/// Raw `Authorization` header value.
#[derive(Debug, Clone)]
pub struct AuthorizationHeader(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizationHeader
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthorizationHeader(authorization(parts).map(str::to_string)))
    }
}

fn authorization(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

/// Client address and user agent as seen by the server.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        // first hop of X-Forwarded-For, then X-Real-IP
        let ip = header_str("X-Forwarded-For")
            .and_then(|xff| xff.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .or_else(|| header_str("X-Real-IP"))
            .map(str::to_string);

        let user_agent = header_str(header::USER_AGENT.as_str()).map(str::to_string);

        Ok(ClientInfo { ip, user_agent })
    }
}
