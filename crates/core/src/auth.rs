//! Version access tokens.
//!
//! Every version has a view token and an edit token. A presented token is
//! classified against both, then the version's expiry and password gates
//! are applied in that order:
//!
//! 1. token matches neither: `ACCESS_001`
//! 2. expiry passed: `ACCESS_003`
//! 3. password missing or wrong: `ACCESS_004`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{AccessErrorCode, Error, Result};
use crate::version::Version;

/// Access granted by a token. `Edit` implies `View`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    View,
    Edit,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }

    pub fn can_edit(&self) -> bool {
        *self == Self::Edit
    }
}

/// Classifies a token against a version's tokens in constant time.
///
/// Both comparisons always run so timing does not reveal which token
/// (if any) matched.
pub fn classify(version: &Version, token: &str) -> Option<AccessLevel> {
    let is_edit: bool = token.as_bytes().ct_eq(version.edit_token.as_bytes()).into();
    let is_view: bool = token.as_bytes().ct_eq(version.view_token.as_bytes()).into();

    if is_edit {
        Some(AccessLevel::Edit)
    } else if is_view {
        Some(AccessLevel::View)
    } else {
        None
    }
}

/// Authorizes a read of `version`.
pub fn authorize(
    version: &Version,
    token: &str,
    password: Option<&str>,
    now: DateTime<Utc>,
) -> Result<AccessLevel> {
    let level = classify(version, token)
        .ok_or_else(|| Error::access(AccessErrorCode::InvalidToken, "Invalid token"))?;

    if version.is_expired(now) {
        return Err(Error::access(
            AccessErrorCode::Expired,
            "This version has expired",
        ));
    }

    if !version.verify_password(password) {
        return Err(Error::access(
            AccessErrorCode::PasswordRequired,
            "Password required",
        ));
    }

    Ok(level)
}

/// Authorizes a mutation of `version`; only the edit token is accepted.
pub fn authorize_edit(version: &Version, token: &str) -> Result<()> {
    match classify(version, token) {
        Some(AccessLevel::Edit) => Ok(()),
        Some(AccessLevel::View) => Err(Error::access(
            AccessErrorCode::EditTokenRequired,
            "Edit token required",
        )),
        None => Err(Error::access(
            AccessErrorCode::InvalidToken,
            "Invalid edit token",
        )),
    }
}

/// Extracts the access token from a request.
///
/// Checks in order:
/// 1. `?token=<token>`
/// 2. `Authorization: Bearer <token>`
pub fn extract_access_token(query_token: Option<&str>, auth_header: Option<&str>) -> Result<String> {
    if let Some(token) = query_token.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    if let Some(token) = auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Ok(token.to_string());
    }

    Err(Error::access(
        AccessErrorCode::InvalidToken,
        "Access token is required",
    ))
}
