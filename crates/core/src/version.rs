//! Versions: per-recipient shares of a presentation.
//!
//! A version carries its own view and edit tokens, a variable map that is
//! substituted into the parent's content on read, and optional password and
//! expiry gates.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::limits::{TOKEN_LEN, VERSION_SLUG_LEN};
use crate::substitute::VariableMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: Uuid,
    pub presentation_id: Uuid,
    pub version_slug: String,
    pub view_token: String,
    pub edit_token: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub variables: VariableMap,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub presentation_id: Uuid,
    #[validate(length(max = 200))]
    pub recipient_name: Option<String>,
    #[validate(email)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub variables: VariableMap,
    #[validate(length(min = 1, max = 256))]
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewVersion {
    pub fn for_presentation(presentation_id: Uuid) -> Self {
        Self {
            presentation_id,
            recipient_name: None,
            recipient_email: None,
            variables: VariableMap::new(),
            password: None,
            expires_at: None,
        }
    }
}

impl Version {
    /// Issues a version with fresh slug and tokens.
    ///
    /// Fails only if the password cannot be hashed.
    pub fn issue(new: NewVersion, now: DateTime<Utc>) -> Result<Self> {
        let password_hash = new.password.as_deref().map(hash_password).transpose()?;
        let (view_token, edit_token) = token_pair();

        Ok(Self {
            id: Uuid::new_v4(),
            presentation_id: new.presentation_id,
            version_slug: random_id(VERSION_SLUG_LEN),
            view_token,
            edit_token,
            recipient_name: new.recipient_name,
            recipient_email: new.recipient_email,
            variables: new.variables,
            password_hash,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the expiry has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Checks a candidate password. Unprotected versions accept anything.
    pub fn verify_password(&self, candidate: Option<&str>) -> bool {
        let Some(stored) = self.password_hash.as_deref() else {
            return true;
        };
        let Some(candidate) = candidate else {
            return false;
        };
        PasswordHash::new(stored)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Replaces the variable map.
    pub fn set_variables(&mut self, variables: VariableMap, now: DateTime<Utc>) {
        self.variables = variables;
        self.updated_at = now;
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("failed to hash password: {}", e)))
}

/// Two distinct high-entropy tokens.
fn token_pair() -> (String, String) {
    let view = random_id(TOKEN_LEN);
    loop {
        let edit = random_id(TOKEN_LEN);
        if edit != view {
            return (view, edit);
        }
    }
}

/// Random lowercase hex id of `len` chars (at most 64).
pub(crate) fn random_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    if len > id.len() {
        id.push_str(&Uuid::new_v4().simple().to_string());
    }
    id.truncate(len);
    id
}
