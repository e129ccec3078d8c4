//! Owners, presentations and their settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::content::ContentTree;
use crate::limits::MAX_SLUG_STEM_LEN;

/// Default template reference for new presentations.
pub const DEFAULT_TEMPLATE_ID: &str = "sales-proposal";

/// Account that owns presentations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: Uuid,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Owner {
    pub fn new(email: impl Into<String>, name: impl Into<String>, company: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            company,
            created_at: Utc::now(),
        }
    }
}

/// A proposal authored once and shared through versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    /// Globally unique, URL-safe.
    pub slug: String,
    pub template_id: String,
    pub content: ContentTree,
    pub settings: PresentationSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Presentation {
    /// Creates a presentation with a fresh id and a slug derived from the title.
    pub fn new(owner_id: Uuid, new: NewPresentation, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            owner_id,
            slug: slug_for(&new.title, id),
            title: new.title,
            template_id: new
                .template_id
                .unwrap_or_else(|| DEFAULT_TEMPLATE_ID.to_string()),
            content: new.content,
            settings: new.settings.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the fields present in a patch.
    pub fn apply(&mut self, patch: PresentationPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        self.updated_at = now;
    }

    /// Case-insensitive match on title or slug.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.slug.to_lowercase().contains(&needle)
    }
}

/// Creation payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPresentation {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub template_id: Option<String>,
    #[serde(default)]
    pub content: ContentTree,
    pub settings: Option<PresentationSettings>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresentationPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub content: Option<ContentTree>,
    pub settings: Option<PresentationSettings>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection: Option<Protection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingSettings>,
    /// Keys this build does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#FF5A5F".into(),
            secondary_color: "#6366F1".into(),
            font_family: "Inter, sans-serif".into(),
            logo_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protection {
    #[serde(default)]
    pub gated_content: bool,
    #[serde(default)]
    pub require_email: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSettings {
    pub enable_analytics: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_analytics_id: Option<String>,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            enable_analytics: true,
            google_analytics_id: None,
        }
    }
}

/// Lowercase ASCII stem of a title, words joined by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_STEM_LEN {
            break;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Slug stem plus a suffix taken from the id.
fn slug_for(title: &str, id: Uuid) -> String {
    let suffix = &id.simple().to_string()[..8];
    match slugify(title) {
        stem if stem.is_empty() => suffix.to_string(),
        stem => format!("{stem}-{suffix}"),
    }
}
