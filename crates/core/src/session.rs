//! Viewer sessions and the tracking payloads that feed them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::limits::{MAX_ELEMENT_ID_LEN, MAX_IP_LEN, MAX_USER_AGENT_LEN};

/// Browser-side context sent with a view ping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetadata {
    /// IPv6 max is 45 chars
    #[validate(length(max = 45))]
    pub ip_address: Option<String>,
    #[validate(length(max = 512))]
    pub user_agent: Option<String>,
    #[validate(length(max = 128))]
    pub country: Option<String>,
    #[validate(length(max = 128))]
    pub city: Option<String>,
    /// desktop / mobile / tablet, free-form
    #[validate(length(max = 128))]
    pub device: Option<String>,
    #[validate(length(max = 128))]
    pub browser: Option<String>,
    #[validate(length(max = 128))]
    pub os: Option<String>,
}

impl ClientMetadata {
    /// Fills the address and user agent the client left out with what the
    /// server observed.
    ///
    /// Observed values always fit the field limits: an over-long address is
    /// dropped and an over-long user agent is cut at a char boundary.
    pub fn fill_observed(&mut self, ip: Option<String>, user_agent: Option<String>) {
        if self.ip_address.is_none() {
            self.ip_address = ip.filter(|ip| ip.chars().count() <= MAX_IP_LEN);
        }
        if self.user_agent.is_none() {
            self.user_agent = user_agent.map(|ua| truncate_chars(ua, MAX_USER_AGENT_LEN));
        }
    }
}

fn truncate_chars(mut s: String, max: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
    s
}

/// One click in the append-only click log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    #[validate(length(min = 1, max = 256))]
    pub element_id: String,
    /// Client clock, not trusted for ordering.
    pub timestamp: DateTime<Utc>,
}

/// Engagement record for one (version, browser session) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    pub version_id: Uuid,
    /// Client-generated, stable per browser session.
    pub session_id: String,
    /// Cumulative seconds, last write wins.
    pub time_spent: f64,
    /// Percent, last write wins.
    pub scroll_depth: f64,
    /// Distinct section ids in first-seen order.
    pub sections_viewed: Vec<String>,
    pub clicks: Vec<ClickEvent>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// First seen.
    pub viewed_at: DateTime<Utc>,
    pub last_ping: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        version_id: Uuid,
        session_id: impl Into<String>,
        metadata: ClientMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        let ClientMetadata {
            ip_address,
            user_agent,
            country,
            city,
            device,
            browser,
            os,
        } = metadata;

        Self {
            id: Uuid::new_v4(),
            version_id,
            session_id: session_id.into(),
            time_spent: 0.0,
            scroll_depth: 0.0,
            sections_viewed: Vec::new(),
            clicks: Vec::new(),
            device,
            browser,
            os,
            user_agent,
            ip_address,
            country,
            city,
            viewed_at: now,
            last_ping: now,
        }
    }

    /// Records activity without changing engagement.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_ping = now;
    }

    /// Applies each present field of an update.
    ///
    /// Time spent and scroll depth overwrite, sections are unioned, clicks
    /// are appended.
    pub fn apply(&mut self, update: &EngagementUpdate, now: DateTime<Utc>) {
        if let Some(time_spent) = update.time_spent {
            self.time_spent = time_spent;
        }
        if let Some(scroll_depth) = update.scroll_depth {
            self.scroll_depth = scroll_depth;
        }
        if let Some(sections) = &update.sections_viewed {
            for section in sections {
                if !self.sections_viewed.contains(section) {
                    self.sections_viewed.push(section.clone());
                }
            }
        }
        if let Some(clicks) = &update.clicks {
            self.clicks.extend(clicks.iter().cloned());
        }
        self.last_ping = now;
    }
}

/// Partial engagement update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EngagementUpdate {
    /// Seconds
    #[validate(range(min = 0.0))]
    pub time_spent: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub scroll_depth: Option<f64>,
    #[validate(length(max = 500), custom(function = "validate_section_ids"))]
    pub sections_viewed: Option<Vec<String>>,
    #[validate(length(max = 500), nested)]
    pub clicks: Option<Vec<ClickEvent>>,
}

impl EngagementUpdate {
    pub fn is_empty(&self) -> bool {
        self.time_spent.is_none()
            && self.scroll_depth.is_none()
            && self.sections_viewed.is_none()
            && self.clicks.is_none()
    }
}

/// `POST /api/analytics/track/view` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackView {
    pub version_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub metadata: ClientMetadata,
}

/// `POST /api/analytics/track/engagement` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackEngagement {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub update: EngagementUpdate,
}

fn validate_section_ids(ids: &[String]) -> Result<(), ValidationError> {
    if let Some(bad) = ids
        .iter()
        .find(|id| id.is_empty() || id.len() > MAX_ELEMENT_ID_LEN)
    {
        let mut err = ValidationError::new("invalid_section_id");
        err.message = Some(
            format!(
                "section id must be 1-{} chars, got {}",
                MAX_ELEMENT_ID_LEN,
                bad.len()
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}
