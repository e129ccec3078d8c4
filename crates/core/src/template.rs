//! Presentation templates.
//!
//! A template is a default content tree whose strings carry `{{key}}`
//! placeholders, plus descriptors for the variables a version should fill.
//! Built-in templates ship with the binary; authors can store more.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::content::ContentTree;
use crate::presentation::PresentationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Text,
    Number,
    Date,
}

/// A variable the template expects, with its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TemplateVariable {
    /// Placeholder key; dotted keys address nested values.
    #[validate(length(min = 1, max = 128))]
    pub key: String,
    #[serde(rename = "type")]
    pub kind: VariableKind,
    #[serde(default)]
    pub value: Value,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub label: String,
}

impl TemplateVariable {
    pub fn new(key: &str, kind: VariableKind, value: Value, label: &str) -> Self {
        Self {
            key: key.to_string(),
            kind,
            value,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    /// Unique across built-in and stored templates.
    pub slug: String,
    pub description: String,
    pub required_variables: Vec<TemplateVariable>,
    pub default_content: ContentTree,
    pub default_settings: PresentationSettings,
    /// Shipped with the binary rather than stored.
    pub builtin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Template {
    /// Builds a stored template with a fresh id.
    pub fn from_new(new: NewTemplate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            slug: new.slug,
            description: new.description,
            required_variables: new.required_variables,
            default_content: new.default_content,
            default_settings: new.default_settings.unwrap_or_default(),
            builtin: false,
            created_at: Some(now),
        }
    }
}

/// `POST /api/templates` body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_template_slug"))]
    pub slug: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 100), nested)]
    #[serde(default)]
    pub required_variables: Vec<TemplateVariable>,
    #[serde(default)]
    pub default_content: ContentTree,
    pub default_settings: Option<PresentationSettings>,
}

/// Lowercase ASCII letters, digits and inner dashes.
fn validate_template_slug(slug: &str) -> Result<(), ValidationError> {
    let charset_ok = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !charset_ok || slug.starts_with('-') || slug.ends_with('-') {
        return Err(ValidationError::new("slug_format"));
    }
    Ok(())
}
