//! Inbound CRM webhook log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Pending,
    Success,
    Error,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// One received deal webhook and what came of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLog {
    pub id: Uuid,
    pub deal_id: String,
    /// Raw deal payload as received.
    pub deal_data: Value,
    pub status: WebhookStatus,
    /// Presentation created from the deal.
    pub generated_id: Option<Uuid>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookLog {
    pub fn pending(deal_id: impl Into<String>, deal_data: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deal_id: deal_id.into(),
            deal_data,
            status: WebhookStatus::Pending,
            generated_id: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn succeed(&mut self, presentation_id: Uuid, now: DateTime<Utc>) {
        self.status = WebhookStatus::Success;
        self.generated_id = Some(presentation_id);
        self.updated_at = now;
    }

    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = WebhookStatus::Error;
        self.error = Some(error.into());
        self.updated_at = now;
    }
}
