//! Test fixtures and request body generators.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

pub const FRONTEND_URL: &str = "https://proposals.example.com";

pub const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

/// Presentation body whose content carries `{{clientName}}` and `{{offerTitle}}`.
pub fn new_presentation(title: &str) -> Value {
    json!({
        "title": title,
        "content": {
            "metadata": {
                "title": "Proposal for {{clientName}}",
                "description": "{{offerTitle}} / {{missing}}"
            },
            "sections": [
                { "id": "hero", "blocks": [] },
                { "id": "offer", "blocks": [] }
            ]
        }
    })
}

/// Version body addressed to Acme.
pub fn new_version(presentation_id: &str) -> Value {
    json!({
        "presentationId": presentation_id,
        "recipientName": "Jane Buyer",
        "recipientEmail": "jane@acme.example",
        "variables": {
            "clientName": "Acme",
            "offerTitle": "Annual Plan"
        }
    })
}

/// Version body with an expiry an hour in the past.
pub fn expired_version(presentation_id: &str) -> Value {
    let mut body = new_version(presentation_id);
    body["expiresAt"] = json!(Utc::now() - Duration::hours(1));
    body
}

/// Version body protected by `password`.
pub fn protected_version(presentation_id: &str, password: &str) -> Value {
    let mut body = new_version(presentation_id);
    body["password"] = json!(password);
    body
}

pub fn track_view(version_id: &str, session_id: &str) -> Value {
    json!({
        "versionId": version_id,
        "sessionId": session_id,
        "userAgent": IPHONE_UA,
        "device": "mobile",
        "country": "PL",
        "city": "Warsaw"
    })
}

pub fn engagement(session_id: &str, time_spent: f64, scroll_depth: f64) -> Value {
    json!({
        "sessionId": session_id,
        "timeSpent": time_spent,
        "scrollDepth": scroll_depth,
        "sectionsViewed": ["hero", "offer"]
    })
}

/// Fresh client session id.
pub fn session_id() -> String {
    format!("sess-{}", Uuid::new_v4().simple())
}

/// Deal webhook body as the CRM sends it.
pub fn deal_payload(deal_id: i64) -> Value {
    json!({
        "event": "updated.deal",
        "current": {
            "id": deal_id,
            "title": "Website relaunch",
            "value": 12500.0,
            "currency": "EUR",
            "person_id": { "name": "Jane Buyer", "email": ["jane@acme.example"] },
            "org_id": { "name": "Acme" },
            "expected_close_date": "2026-12-01",
            "stage_id": 4
        },
        "previous": { "stage_id": 3 }
    })
}
